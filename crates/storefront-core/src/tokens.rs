//! Durable token storage.
//!
//! The access/refresh pair lives in `${STOREFRONT_HOME}/tokens.json` with
//! restricted permissions (0600). Only the session manager writes tokens; the
//! HTTP adapter reads the access token on every request. Tokens are never
//! logged or displayed in full.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// Access + refresh token pair as issued by `/auth/login`, `/auth/register`
/// and `/auth/refresh`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &mask_token(&self.access_token))
            .field(
                "refresh_token",
                &self.refresh_token.as_deref().map(mask_token),
            )
            .finish()
    }
}

/// Persistent key-value home of the token pair.
pub trait TokenStore: Send + Sync {
    /// Returns the stored pair, or `None` when logged out.
    fn load(&self) -> Result<Option<TokenPair>>;
    /// Replaces the stored pair.
    fn save(&self, tokens: &TokenPair) -> Result<()>;
    /// Removes the stored pair. Returns whether anything was removed.
    fn clear(&self) -> Result<bool>;
}

/// Token store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location under the storefront home.
    pub fn default_location() -> Self {
        Self::new(paths::tokens_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        let path = &self.path;
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read tokens from {}", path.display()))?;
        if contents.trim().is_empty() {
            return Ok(None);
        }

        let tokens: TokenPair = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse tokens from {}", path.display()))?;
        if tokens.access_token.is_empty() {
            return Ok(None);
        }
        Ok(Some(tokens))
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        let path = &self.path;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(tokens).context("Failed to serialize tokens")?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(path, contents)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

/// In-process token store, for tests and embedders without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        let guard = self
            .tokens
            .lock()
            .map_err(|_poisoned| anyhow::anyhow!("token store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        let mut guard = self
            .tokens
            .lock()
            .map_err(|_poisoned| anyhow::anyhow!("token store lock poisoned"))?;
        *guard = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<bool> {
        let mut guard = self
            .tokens
            .lock()
            .map_err(|_poisoned| anyhow::anyhow!("token store lock poisoned"))?;
        Ok(guard.take().is_some())
    }
}

/// Returns a masked version of a token for display (first 8 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.chars().count() <= 12 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(8).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn pair(access: &str, refresh: &str) -> TokenPair {
        TokenPair {
            access_token: access.to_string(),
            refresh_token: Some(refresh.to_string()),
        }
    }

    #[test]
    fn test_file_store_missing_file_is_logged_out() {
        let dir = tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));
        assert!(store.load().unwrap().is_none());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn test_file_store_save_load_clear() {
        let dir = tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("tokens.json"));

        store.save(&pair("access-1", "refresh-1")).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair("access-1", "refresh-1")));

        store.save(&pair("access-2", "refresh-2")).unwrap();
        assert_eq!(
            store.load().unwrap().unwrap().access_token,
            "access-2".to_string()
        );

        assert!(store.clear().unwrap());
        assert!(store.load().unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));
        store.save(&pair("access", "refresh")).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, "not json").unwrap();
        assert!(FileTokenStore::new(path).load().is_err());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&pair("a", "r")).unwrap();
        assert!(store.load().unwrap().is_some());
        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn test_debug_masks_tokens() {
        let debug = format!("{:?}", pair("eyJhbGciOiJIUzI1NiJ9.payload", "short"));
        assert!(!debug.contains("payload"));
        assert!(debug.contains("eyJhbGci..."));
        assert!(debug.contains("***"));
    }
}
