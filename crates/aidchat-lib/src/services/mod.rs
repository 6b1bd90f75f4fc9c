// Services module
// Credential gate, backend client, transcript and the two request pipelines

pub mod api;
pub mod auth;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod transcript;
pub mod view;

pub use api::{AssistantBackend, DocumentUpload, HttpBackend};
pub use auth::AuthService;
pub use credential::{
    Credential, CredentialGate, CredentialStore, InMemoryCredentialStore, SqliteCredentialStore,
};
pub use error::{ClientError, ClientErrorCode, ClientResult};
pub use pipeline::{ChatOutcome, DocumentOutcome, IgnoreReason};
pub use session::ChatSession;
pub use transcript::Transcript;
pub use view::{ConversationView, Frame, ViewModel};
