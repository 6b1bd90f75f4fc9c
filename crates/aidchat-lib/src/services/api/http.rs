// HTTP Backend Implementation
//
// Talks to the assistant backend over JSON and multipart requests.
// Default endpoint: http://localhost:8000

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};

use super::{AssistantBackend, DocumentUpload, ANALYZE_PATH, CHAT_PATH, LOGIN_PATH};
use crate::models::api::{
    AnalysisEnvelope, ChatReply, ChatRequest, ErrorDetail, LoginRequest, LoginResponse,
};
use crate::models::DocumentAnalysis;
use crate::services::credential::Credential;
use crate::services::error::{ClientError, ClientResult};
use crate::utils::config::ClientConfig;

/// reqwest-based backend
pub struct HttpBackend {
    config: ClientConfig,
    client: Client,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// Status plus raw body, read fully before any interpretation
struct RawResponse {
    status: StatusCode,
    body: String,
}

impl RawResponse {
    async fn read(response: Response) -> ClientResult<Self> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(format!("reading response body: {}", e)))?;
        Ok(Self { status, body })
    }

    /// Non-2xx responses become protocol failures carrying any server detail
    fn ensure_success(&self) -> ClientResult<()> {
        if self.status.is_success() {
            return Ok(());
        }
        Err(self.failure(format!("unexpected status {}", self.status)))
    }

    fn failure(&self, reason: impl Into<String>) -> ClientError {
        ClientError::protocol(
            Some(self.status.as_u16()),
            ErrorDetail::extract(&self.body),
            reason,
        )
    }

    fn json<T: serde::de::DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| self.failure(format!("malformed response body: {}", e)))
    }
}

#[async_trait]
impl AssistantBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn chat(&self, credential: &Credential, query: &str) -> ClientResult<String> {
        let url = self.config.endpoint(CHAT_PATH);
        log::debug!("[http] POST {} ({} chars)", url, query.chars().count());

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.token())
            .json(&ChatRequest { query })
            .send()
            .await?;

        let raw = RawResponse::read(response).await?;
        raw.ensure_success()?;

        let reply: ChatReply = raw.json()?;
        match reply.response {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(raw.failure("reply has no response text")),
        }
    }

    async fn analyze_document(
        &self,
        credential: &Credential,
        upload: DocumentUpload,
    ) -> ClientResult<DocumentAnalysis> {
        let url = self.config.endpoint(ANALYZE_PATH);
        log::debug!(
            "[http] POST {} ({}, {} bytes)",
            url,
            upload.content_type,
            upload.bytes.len()
        );

        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|e| ClientError::InvalidConfig(format!("upload content type: {}", e)))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.token())
            .multipart(form)
            .send()
            .await?;

        let raw = RawResponse::read(response).await?;
        raw.ensure_success()?;

        let envelope: AnalysisEnvelope = raw.json()?;
        if !envelope.is_success() {
            let detail = envelope
                .message
                .clone()
                .or_else(|| ErrorDetail::extract(&raw.body));
            return Err(ClientError::protocol(
                Some(raw.status.as_u16()),
                detail,
                "analysis not successful",
            ));
        }

        envelope.into_analysis().map_err(|reason| raw.failure(reason))
    }

    async fn login(&self, email: &str, password: &str) -> ClientResult<Credential> {
        let url = self.config.endpoint(LOGIN_PATH);
        log::debug!("[http] POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let raw = RawResponse::read(response).await?;
        raw.ensure_success()?;

        let login: LoginResponse = raw.json()?;
        login
            .access_token
            .and_then(Credential::new)
            .ok_or_else(|| raw.failure("login response has no access token"))
    }
}
