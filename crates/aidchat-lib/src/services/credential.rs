// Credential Store and Gate
//
// The bearer token is the only authorization state this client inspects,
// and only for presence. It is written once at login, read before every
// pipeline call, and persisted (sealed) across restarts.

use std::sync::{Arc, RwLock};

use super::crypto::{open, seal};
use super::error::{ClientError, ClientResult};
use crate::repositories::CredentialRepository;
use crate::utils::database::Database;

/// Opaque bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token; blank tokens count as absent
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Process-wide token storage
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> ClientResult<Option<Credential>>;
    fn persist(&self, credential: &Credential) -> ClientResult<()>;
    fn clear(&self) -> ClientResult<()>;
}

/// Credential store sealed into the SQLite database
pub struct SqliteCredentialStore {
    repo: CredentialRepository,
}

impl SqliteCredentialStore {
    pub fn new(db: Database) -> Self {
        Self {
            repo: CredentialRepository::new(db),
        }
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn load(&self) -> ClientResult<Option<Credential>> {
        let Some(sealed) = self.repo.load().map_err(ClientError::Storage)? else {
            return Ok(None);
        };
        let token = open(&sealed).map_err(|e| ClientError::Encryption(e.to_string()))?;
        Ok(Credential::new(token))
    }

    fn persist(&self, credential: &Credential) -> ClientResult<()> {
        let sealed =
            seal(credential.token()).map_err(|e| ClientError::Encryption(e.to_string()))?;
        self.repo.save(&sealed).map_err(ClientError::Storage)?;
        log::info!("[credential] Session credential stored");
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        if self.repo.delete().map_err(ClientError::Storage)? {
            log::info!("[credential] Session credential cleared");
        }
        Ok(())
    }
}

/// Credential store that lives only as long as the process
#[derive(Default)]
pub struct InMemoryCredentialStore {
    token: RwLock<Option<Credential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Credential::new(token)),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> ClientResult<Option<Credential>> {
        self.token
            .read()
            .map(|guard| guard.clone())
            .map_err(|e| ClientError::Storage(e.to_string()))
    }

    fn persist(&self, credential: &Credential) -> ClientResult<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        *guard = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Presence check run at view mount and before every pipeline call
#[derive(Clone)]
pub struct CredentialGate {
    store: Arc<dyn CredentialStore>,
}

impl CredentialGate {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Returns the current credential or `ClientError::AuthMissing`.
    ///
    /// A store that cannot be read is treated the same as an empty one.
    pub fn require_credential(&self) -> ClientResult<Credential> {
        match self.store.load() {
            Ok(Some(credential)) => Ok(credential),
            Ok(None) => Err(ClientError::AuthMissing),
            Err(e) => {
                log::warn!("[credential] Could not read stored credential: {}", e);
                Err(ClientError::AuthMissing)
            }
        }
    }
}
