//! Application configuration management.
//!
//! Holds the backend address, where the session token is kept, the request
//! timeout and the last username used to sign in.
//!
//! Configuration is stored at `~/.config/itmano/config.json`. The
//! `ITMANO_API_URL` environment variable overrides the stored API address.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_TIMEOUT_SECS;
use crate::auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "itmano";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend address used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Environment variable overriding the backend address
pub const API_URL_ENV: &str = "ITMANO_API_URL";

/// Where the session token is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// JSON file in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Not persisted; every run starts signed out
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub token_storage: TokenStorage,
    pub request_timeout_secs: Option<u64>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Backend address: environment, then config file, then the default.
    pub fn api_base_url(&self) -> String {
        let env = std::env::var(API_URL_ENV).ok();
        Self::resolve_api_url(env.as_deref(), self.api_base_url.as_deref())
    }

    fn resolve_api_url(env: Option<&str>, configured: Option<&str>) -> String {
        [env, configured]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Build the configured token store
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        Ok(match self.token_storage {
            TokenStorage::File => Arc::new(FileTokenStore::new(self.cache_dir()?)),
            TokenStorage::Keyring => Arc::new(KeyringTokenStore::new()),
            TokenStorage::Memory => Arc::new(MemoryTokenStore::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_url_precedence() {
        assert_eq!(Config::resolve_api_url(None, None), DEFAULT_API_URL);
        assert_eq!(
            Config::resolve_api_url(None, Some("https://api.itmano.com/api/")),
            "https://api.itmano.com/api"
        );
        assert_eq!(
            Config::resolve_api_url(Some("http://127.0.0.1:9000/api"), Some("https://api.itmano.com/api")),
            "http://127.0.0.1:9000/api"
        );
        assert_eq!(
            Config::resolve_api_url(Some("  "), Some("https://api.itmano.com/api")),
            "https://api.itmano.com/api"
        );
    }

    #[test]
    fn test_request_timeout() {
        let mut config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        config.request_timeout_secs = Some(12);
        assert_eq!(config.request_timeout(), Duration::from_secs(12));
        config.request_timeout_secs = Some(0);
        assert_eq!(config.request_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_parse_config_file() {
        let json = r#"{"api_base_url": "https://api.itmano.com/api", "token_storage": "keyring", "last_username": "alice"}"#;
        let config: Config = serde_json::from_str(json).expect("config should parse");
        assert_eq!(config.token_storage, TokenStorage::Keyring);
        assert_eq!(config.last_username.as_deref(), Some("alice"));
        assert_eq!(config.request_timeout_secs, None);

        let empty: Config = serde_json::from_str("{}").expect("empty config should parse");
        assert_eq!(empty.token_storage, TokenStorage::File);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("itmano").join(CONFIG_FILE);

        let missing = Config::load_from(&path).expect("missing file is the default");
        assert_eq!(missing.last_username, None);

        let config = Config {
            last_username: Some("alice".to_string()),
            token_storage: TokenStorage::Memory,
            ..Default::default()
        };
        config.save_to(&path).expect("save");
        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.last_username.as_deref(), Some("alice"));
        assert_eq!(loaded.token_storage, TokenStorage::Memory);
    }

    #[test]
    fn test_corrupt_config_names_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).expect_err("corrupt config should fail");
        let message = err.to_string();
        assert!(message.starts_with("Failed to parse config file"), "{}", message);
        assert!(message.contains(CONFIG_FILE));
    }
}
