// Backend wire payloads
// Request and response bodies exchanged with the assistant backend.

use serde::{Deserialize, Serialize};

use super::message::DocumentAnalysis;

/// POST /chat/ request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub query: &'a str,
}

/// POST /chat/ success body.
///
/// `response` is optional here so that a 2xx body without it is reported as
/// a protocol failure rather than a decode error.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub response: Option<String>,
}

/// POST /document/analyze success body
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub analysis: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AnalysisEnvelope {
    pub fn is_success(&self) -> bool {
        self.success.unwrap_or(false)
    }

    /// Decode the closed analysis record; any missing field is an error.
    pub fn into_analysis(self) -> Result<DocumentAnalysis, String> {
        let value = self
            .analysis
            .ok_or_else(|| "response has no analysis record".to_string())?;
        serde_json::from_value(value).map_err(|e| format!("invalid analysis record: {}", e))
    }
}

/// Error body returned by the backend on failure (`{"detail": "..."}`).
///
/// FastAPI validation errors carry a list in `detail`; only string details
/// are surfaced to the user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorDetail {
    /// Best-effort extraction of a user-facing detail string from a raw body
    pub fn extract(body: &str) -> Option<String> {
        let parsed: ErrorDetail = serde_json::from_str(body).ok()?;
        parsed.text()
    }

    pub fn text(&self) -> Option<String> {
        let from_detail = match &self.detail {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            _ => None,
        };
        from_detail
            .or_else(|| self.message.clone())
            .filter(|s| !s.trim().is_empty())
    }
}

/// POST /users/login request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// POST /users/login success body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}
