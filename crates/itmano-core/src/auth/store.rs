use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Durable storage for the credential token.
///
/// Exactly one token is stored under a fixed key; absence means anonymous.
/// Implementations never inspect the token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;

    fn save(&self, token: &str) -> Result<()>;

    /// Remove the stored token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;

    /// When the stored token was written, for backends that record it
    fn saved_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedToken {
    token: String,
    saved_at: DateTime<Utc>,
}

/// Token persisted as JSON in the cache directory.
pub struct FileTokenStore {
    cache_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    fn read(&self) -> Result<Option<PersistedToken>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let persisted: PersistedToken =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(persisted))
    }

    #[cfg(unix)]
    fn restrict_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .context("Failed to restrict session file permissions")
    }

    #[cfg(not(unix))]
    fn restrict_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.read()?.map(|p| p.token))
    }

    fn save(&self, token: &str) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }
        let persisted = PersistedToken {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&persisted)?;
        std::fs::write(&path, contents).context("Failed to write session file")?;
        Self::restrict_permissions(&path)?;
        debug!(path = %path.display(), "Token saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
            debug!(path = %path.display(), "Token removed");
        }
        Ok(())
    }

    fn saved_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read()?.map(|p| p.saved_at))
    }
}

/// Token kept in process memory only; lost on exit.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let guard = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("itmano"));

        assert_eq!(store.load().unwrap(), None);
        store.save("abc123").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc123"));
        assert!(store.saved_at().unwrap().is_some());

        store.save("def456").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("def456"));
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().to_path_buf());

        store.clear().unwrap();
        store.save("abc123").unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(store.saved_at().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().to_path_buf());
        std::fs::write(store.path(), "not json").unwrap();
        assert!(store.load().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().to_path_buf());
        store.save("abc123").unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::with_token("abc123");
        assert_eq!(store.load().unwrap().as_deref(), Some("abc123"));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.save("xyz").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("xyz"));
        assert_eq!(store.saved_at().unwrap(), None);
    }
}
