// Client configuration
// Defaults, then config.toml in the data directory, then environment. The
// data directory itself comes from the caller, then the environment, then
// the platform app directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::shared_store::get_app_data_dir;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const CONFIG_FILE: &str = "config.toml";

pub const ENV_API_BASE_URL: &str = "AIDCHAT_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "AIDCHAT_REQUEST_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "AIDCHAT_DATA_DIR";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClientConfig {
    /// Backend root, without trailing slash
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Transport-level timeout; `None` leaves requests unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// Where the credential database lives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: None,
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Resolve the effective configuration for this process.
    ///
    /// `data_dir` pins the directory config.toml is read from and the
    /// credential database lives in. `.env` is loaded first so its values
    /// act as environment overrides.
    pub fn load_from(data_dir: Option<PathBuf>) -> Result<Self, String> {
        let _ = dotenvy::dotenv();

        let pinned = data_dir.or_else(|| env_non_empty(ENV_DATA_DIR).map(PathBuf::from));
        let data_dir = match pinned.clone() {
            Some(dir) => dir,
            None => get_app_data_dir()?,
        };

        let mut config = Self::from_file(&data_dir.join(CONFIG_FILE))?;
        config.apply_env()?;
        if config.data_dir.is_none() || pinned.is_some() {
            config.data_dir = Some(data_dir);
        }
        config.api_base_url = normalize_base_url(&config.api_base_url)?;
        Ok(config)
    }

    /// Parse a config file; a missing file yields the defaults
    pub fn from_file(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        toml::from_str(&raw).map_err(|e| format!("Invalid {}: {}", path.display(), e))
    }

    fn apply_env(&mut self) -> Result<(), String> {
        if let Some(url) = env_non_empty(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(raw) = env_non_empty(ENV_REQUEST_TIMEOUT_SECS) {
            let secs = raw
                .parse::<u64>()
                .map_err(|_| format!("{} must be a whole number of seconds", ENV_REQUEST_TIMEOUT_SECS))?;
            self.request_timeout_secs = (secs > 0).then_some(secs);
        }
        Ok(())
    }

    pub fn with_base_url(mut self, url: &str) -> Result<Self, String> {
        self.api_base_url = normalize_base_url(url)?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn data_dir(&self) -> Result<PathBuf, String> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_app_data_dir(),
        }
    }

    /// Absolute URL for an endpoint path such as `/chat/`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), path)
    }
}

/// Trim, drop the trailing slash and require an http(s) URL with a host
pub fn normalize_base_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err("API base URL must not be empty".to_string());
    }
    let parsed =
        url::Url::parse(trimmed).map_err(|e| format!("Invalid API base URL '{}': {}", trimmed, e))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(format!(
            "API base URL must use http:// or https:// and include a host: {}",
            trimmed
        ));
    }
    Ok(trimmed.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
