// Login / Logout
// Exchanges email and password for a bearer token and writes it to the
// credential store. Nothing else reads or refreshes the token.

use std::sync::Arc;

use super::api::AssistantBackend;
use super::credential::{Credential, CredentialStore};
use super::error::{ClientError, ClientResult};

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed, please try again later";

/// Login/logout against one backend and one credential store
#[derive(Clone)]
pub struct AuthService {
    backend: Arc<dyn AssistantBackend>,
    store: Arc<dyn CredentialStore>,
}

impl AuthService {
    pub fn new(backend: Arc<dyn AssistantBackend>, store: Arc<dyn CredentialStore>) -> Self {
        Self { backend, store }
    }

    /// Log in and persist the token. Email is trimmed and lowercased.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Credential> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }

        let credential = self.backend.login(&email, password).await?;
        self.store.persist(&credential)?;
        log::info!("[credential] Logged in as {}", email);
        Ok(credential)
    }

    /// Forget the stored token. Returns whether one was present.
    pub fn logout(&self) -> ClientResult<bool> {
        let had_token = self.store.load()?.is_some();
        self.store.clear()?;
        log::info!("[credential] Logged out");
        Ok(had_token)
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.store.load(), Ok(Some(_)))
    }
}

/// Text shown for a failed login
pub fn login_failure_text(err: &ClientError) -> String {
    err.user_message(LOGIN_FAILED_MESSAGE)
}
