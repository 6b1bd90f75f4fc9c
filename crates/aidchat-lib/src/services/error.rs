// Client Error Types
// Every pipeline failure is terminal for that invocation and surfaced as text.

use thiserror::Error;

/// Generic message shown when a chat call fails without a server detail
pub const CHAT_FAILED_MESSAGE: &str = "AI response failed";
/// Generic message shown when the request never completed
pub const NETWORK_FAILED_MESSAGE: &str = "Network error or server not responding";
/// Generic message shown when a document analysis fails without a server detail
pub const DOCUMENT_FAILED_MESSAGE: &str = "Document analysis failed";
/// Message shown when no credential is available
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please login first";

/// Client Error
#[derive(Error, Debug)]
pub enum ClientError {
    /// No credential at call time; no network call was made
    #[error("Please login first")]
    AuthMissing,

    /// The request never completed (connect, DNS, timeout, body read)
    #[error("Cannot reach backend: {0}")]
    Transport(String),

    /// A response arrived but was not a usable success
    #[error("Backend error{}: {reason}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Protocol {
        status: Option<u16>,
        detail: Option<String>,
        reason: String,
    },

    /// Credential storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Token encryption error
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rejected locally before any request
    #[error("{0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl ClientError {
    pub fn protocol(status: Option<u16>, detail: Option<String>, reason: impl Into<String>) -> Self {
        ClientError::Protocol {
            status,
            detail,
            reason: reason.into(),
        }
    }

    /// Server-supplied detail, if the failure carried one
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Protocol { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Text to show the user: server detail when present, otherwise the
    /// generic message for the failure class.
    pub fn user_message(&self, protocol_fallback: &str) -> String {
        match self {
            ClientError::AuthMissing => LOGIN_REQUIRED_MESSAGE.to_string(),
            ClientError::Transport(_) => NETWORK_FAILED_MESSAGE.to_string(),
            ClientError::Protocol { detail, .. } => detail
                .clone()
                .unwrap_or_else(|| protocol_fallback.to_string()),
            other => other.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, ClientError::Protocol { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::protocol(
                err.status().map(|s| s.as_u16()),
                None,
                format!("malformed response body: {}", err),
            )
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::protocol(None, None, format!("malformed response body: {}", err))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Stable error codes for front-ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorCode {
    AuthMissing,
    Transport,
    Protocol,
    Storage,
    Encryption,
    InvalidConfig,
    InvalidInput,
    Io,
}

impl ClientErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientErrorCode::AuthMissing => "AUTH_MISSING",
            ClientErrorCode::Transport => "TRANSPORT_FAILURE",
            ClientErrorCode::Protocol => "PROTOCOL_FAILURE",
            ClientErrorCode::Storage => "STORAGE_ERROR",
            ClientErrorCode::Encryption => "ENCRYPTION_ERROR",
            ClientErrorCode::InvalidConfig => "INVALID_CONFIG",
            ClientErrorCode::InvalidInput => "INVALID_INPUT",
            ClientErrorCode::Io => "IO_ERROR",
        }
    }
}

impl ClientError {
    pub fn code(&self) -> ClientErrorCode {
        match self {
            ClientError::AuthMissing => ClientErrorCode::AuthMissing,
            ClientError::Transport(_) => ClientErrorCode::Transport,
            ClientError::Protocol { .. } => ClientErrorCode::Protocol,
            ClientError::Storage(_) => ClientErrorCode::Storage,
            ClientError::Encryption(_) => ClientErrorCode::Encryption,
            ClientError::InvalidConfig(_) => ClientErrorCode::InvalidConfig,
            ClientError::InvalidInput(_) => ClientErrorCode::InvalidInput,
            ClientError::Io(_) => ClientErrorCode::Io,
        }
    }
}

impl From<ClientError> for String {
    fn from(err: ClientError) -> Self {
        err.to_string()
    }
}
