// Assistant Backend Module
//
// The remote inference / analysis service is a black box reached through the
// `AssistantBackend` trait. `HttpBackend` is the production implementation;
// tests substitute scripted doubles to inject failures.

pub mod http;

use std::path::Path;

use async_trait::async_trait;

pub use http::HttpBackend;

use super::credential::Credential;
use super::error::ClientResult;
use crate::models::DocumentAnalysis;

/// Endpoint paths relative to the API base URL
pub const CHAT_PATH: &str = "/chat/";
pub const ANALYZE_PATH: &str = "/document/analyze";
pub const LOGIN_PATH: &str = "/users/login";

/// Extensions offered by the file picker. The server decides what it accepts.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "doc", "docx", "txt"];

/// Trait for the backend collaborator
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Human-readable backend name for logs
    fn name(&self) -> &str;

    /// Send one chat query and return the reply text
    async fn chat(&self, credential: &Credential, query: &str) -> ClientResult<String>;

    /// Upload a document and return its structured analysis
    async fn analyze_document(
        &self,
        credential: &Credential,
        upload: DocumentUpload,
    ) -> ClientResult<DocumentAnalysis>;

    /// Exchange email/password for a bearer token
    async fn login(&self, email: &str, password: &str) -> ClientResult<Credential>;
}

/// A file selected for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Read a file from disk
    pub async fn from_path(path: &Path) -> ClientResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Soft client-side filter
    pub fn has_supported_extension(&self) -> bool {
        self.extension()
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
