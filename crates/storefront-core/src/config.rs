//! Configuration management for the storefront client.
//!
//! Loads configuration from ${STOREFRONT_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Env var that overrides `[api].base_url`.
pub const BASE_URL_ENV: &str = "STOREFRONT_BASE_URL";

/// REST API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL including the version prefix (e.g. `/api/v1`)
    pub base_url: String,
    /// Per-request timeout in seconds (0 disables)
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Config::DEFAULT_BASE_URL.to_string(),
            timeout_secs: Config::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Returns the request timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

/// Catalog paging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { page_size: 12 }
    }
}

/// Admin panel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub page_size: u32,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { page_size: 100 }
    }
}

pub mod paths {
    //! Path resolution for storefront configuration and data.
    //!
    //! `STOREFRONT_HOME` resolution order:
    //! 1. `STOREFRONT_HOME` environment variable (if set)
    //! 2. ~/.config/storefront (default)

    use std::path::PathBuf;

    /// Returns the storefront home directory.
    ///
    /// Falls back to the current directory when no home directory exists.
    pub fn storefront_home() -> PathBuf {
        if let Ok(home) = std::env::var("STOREFRONT_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("storefront"))
            .unwrap_or_else(|| PathBuf::from(".storefront"))
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        storefront_home().join("config.toml")
    }

    /// Returns the path to the persisted token pair.
    pub fn tokens_path() -> PathBuf {
        storefront_home().join("tokens.json")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// REST API connection settings
    pub api: ApiConfig,

    /// Catalog paging
    pub catalog: CatalogConfig,

    /// Admin panel paging
    pub admin: AdminConfig,
}

impl Config {
    const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the API base URL with precedence: env > config > default.
    ///
    /// # Errors
    /// Returns an error if the chosen URL does not parse.
    pub fn resolve_base_url(&self) -> Result<url::Url> {
        resolve_base_url(std::env::var(BASE_URL_ENV).ok().as_deref(), &self.api.base_url)
    }

    /// Creates a default config file at the given path.
    /// Fails if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a config TOML from Rust defaults.
    pub fn generate() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to serialize default config")
    }

    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

fn resolve_base_url(env_value: Option<&str>, config_value: &str) -> Result<url::Url> {
    let chosen = env_value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| Some(config_value.trim()).filter(|v| !v.is_empty()))
        .unwrap_or(Config::DEFAULT_BASE_URL);

    // Trailing slash so relative joins keep the version prefix.
    let normalized = format!("{}/", chosen.trim_end_matches('/'));
    url::Url::parse(&normalized).with_context(|| format!("Invalid API base URL: {chosen}"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000/api/v1");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.catalog.page_size, 12);
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "[api]\nbase_url = \"https://shop.test/api/v1\"\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api.base_url, "https://shop.test/api/v1");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.admin.page_size, 100);
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[api\nbase_url = ").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("base_url ="));
        let parsed = Config::load_from(&config_path).unwrap();
        assert_eq!(parsed.api.base_url, "http://localhost:8000/api/v1");
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "# existing").unwrap();

        let err = Config::init(&config_path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&config_path).unwrap(), "# existing");
    }

    #[test]
    fn test_timeout_zero_disables() {
        let api = ApiConfig {
            timeout_secs: 0,
            ..ApiConfig::default()
        };
        assert!(api.timeout().is_none());
        assert_eq!(
            ApiConfig::default().timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_base_url_precedence_and_normalization() {
        let url = resolve_base_url(Some("http://env.test/api/v1/"), "http://cfg.test").unwrap();
        assert_eq!(url.as_str(), "http://env.test/api/v1/");

        let url = resolve_base_url(Some("  "), "http://cfg.test/api/v1").unwrap();
        assert_eq!(url.as_str(), "http://cfg.test/api/v1/");

        let url = resolve_base_url(None, "").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/");

        assert!(resolve_base_url(None, "not a url").is_err());
    }

    #[test]
    fn test_generate_roundtrips_defaults() {
        let generated = Config::generate().unwrap();
        let parsed: Config = toml::from_str(&generated).unwrap();
        assert_eq!(parsed.api.base_url, Config::default().api.base_url);
    }
}
