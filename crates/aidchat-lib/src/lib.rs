// AidChat client core
// Session transcript, credential gate and the chat / document-analysis
// pipelines, shared by every front-end.

pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

// Re-export the types front-ends use directly
pub use models::*;
pub use services::{
    AssistantBackend, AuthService, ChatOutcome, ChatSession, ClientError, ClientErrorCode,
    ClientResult, ConversationView, Credential, CredentialStore, DocumentOutcome, DocumentUpload,
    HttpBackend, IgnoreReason, InMemoryCredentialStore, SqliteCredentialStore,
};
pub use utils::config::ClientConfig;
pub use utils::database::Database;
