// Subcommand implementations and the wiring they share

pub mod analyze;
pub mod ask;
pub mod chat;
pub mod login;
pub mod logout;

use std::path::PathBuf;
use std::sync::Arc;

use aidchat_lib::utils::database::database_path_in;
use aidchat_lib::utils::shared_store::sanitize_error;
use aidchat_lib::{
    AuthService, ChatSession, ClientConfig, Database, HttpBackend, SqliteCredentialStore,
};
use anyhow::{anyhow, Context as _, Result};

/// Resolved configuration plus the backend and credential store built from it
pub struct Context {
    pub config: ClientConfig,
    backend: Arc<HttpBackend>,
    store: Arc<SqliteCredentialStore>,
}

impl Context {
    /// Load configuration from the chosen data directory, apply the
    /// remaining command-line overrides and open the credential database.
    pub fn new(
        base_url: Option<&str>,
        timeout_secs: Option<u64>,
        data_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let mut config =
            ClientConfig::load_from(data_dir).map_err(|e| anyhow!(sanitize_error(&e)))?;
        if let Some(url) = base_url {
            config = config.with_base_url(url).map_err(|e| anyhow!(e))?;
        }
        if let Some(secs) = timeout_secs {
            config.request_timeout_secs = (secs > 0).then_some(secs);
        }
        Self::from_config(config)
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let data_dir = config.data_dir().map_err(|e| anyhow!(e))?;
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating {}", sanitize_error(&data_dir.display().to_string())))?;
        let db = Database::new(database_path_in(&data_dir))
            .map_err(|e| anyhow!("opening credential database: {}", sanitize_error(&e)))?;

        let backend = HttpBackend::new(config.clone())?;
        log::debug!("[session] Using backend {}", config.api_base_url);

        Ok(Self {
            config,
            backend: Arc::new(backend),
            store: Arc::new(SqliteCredentialStore::new(db)),
        })
    }

    pub fn session(&self) -> ChatSession {
        ChatSession::new(self.backend.clone(), self.store.clone())
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.backend.clone(), self.store.clone())
    }
}

pub const LOGIN_HINT: &str = "Please login first (run `aidchat login --email <email>`)";
