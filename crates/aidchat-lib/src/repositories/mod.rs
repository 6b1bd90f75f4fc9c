// Repository Layer
// SQLite-backed persistence; only the session credential is stored.

pub mod credential_repo;

pub use credential_repo::CredentialRepository;
