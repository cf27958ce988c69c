//! Settings for reaching the port-manager and tuning reconciliation.
//!
//! Stored in JSON format at `~/.portsync/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Default port-manager address.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Default quiet period before a background re-check runs.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Settings data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the port-manager API, without the `/api/...` path.
    #[serde(default = "default_base_url", rename = "baseUrl")]
    pub base_url: String,

    /// Debounce window for background re-checks, in milliseconds.
    #[serde(default = "default_debounce_ms", rename = "debounceMs")]
    pub debounce_ms: u64,

    /// Per-request timeout in seconds. `None` keeps the HTTP client default.
    #[serde(default, rename = "requestTimeoutSecs")]
    pub request_timeout_secs: Option<u64>,

    /// Serve a repeated check for an unchanged document from the cache.
    #[serde(default = "default_true", rename = "memoizeChecks")]
    pub memoize_checks: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: None,
            memoize_checks: true,
        }
    }
}

impl Settings {
    /// The debounce window as a `Duration`.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// The request timeout as a `Duration`, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Configuration store for the settings file.
///
/// Handles reading and writing settings to `~/.portsync/config.json`.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portsync/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".portsync").join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Path of the settings file.
    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load settings from disk.
    ///
    /// Returns default settings if the file doesn't exist.
    pub async fn load(&self) -> Result<Settings> {
        if !self.config_path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save settings to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).await.map_err(|e| {
                    Error::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }

    /// Set the port-manager base URL.
    pub async fn set_base_url(&self, base_url: &str) -> Result<()> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Base URL must start with http:// or https://: {}",
                base_url
            )));
        }

        let mut settings = self.load().await?;
        settings.base_url = trimmed.to_string();
        self.save(&settings).await
    }

    /// Set the debounce window in milliseconds.
    pub async fn set_debounce_ms(&self, debounce_ms: u64) -> Result<()> {
        let mut settings = self.load().await?;
        settings.debounce_ms = debounce_ms;
        self.save(&settings).await
    }

    /// Set the per-request timeout in seconds (`None` to clear it).
    pub async fn set_request_timeout_secs(&self, timeout: Option<u64>) -> Result<()> {
        let mut settings = self.load().await?;
        settings.request_timeout_secs = timeout;
        self.save(&settings).await
    }

    /// Enable or disable memoized checks.
    pub async fn set_memoize_checks(&self, enabled: bool) -> Result<()> {
        let mut settings = self.load().await?;
        settings.memoize_checks = enabled;
        self.save(&settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_store() -> (ConfigStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        (ConfigStore::with_path(path), dir)
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _dir) = test_store().await;
        let settings = store.load().await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.debounce(), Duration::from_millis(300));
        assert!(settings.request_timeout().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _dir) = test_store().await;

        let settings = Settings {
            base_url: "http://manager.local:9000".to_string(),
            debounce_ms: 500,
            request_timeout_secs: Some(15),
            memoize_checks: false,
        };
        store.save(&settings).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.request_timeout(), Some(Duration::from_secs(15)));
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let (store, _dir) = test_store().await;
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"baseUrl": "https://ports.example"}"#).unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.base_url, "https://ports.example");
        assert_eq!(loaded.debounce_ms, DEFAULT_DEBOUNCE_MS);
        assert!(loaded.memoize_checks);
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let (store, _dir) = test_store().await;
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.load().await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_setters() {
        let (store, _dir) = test_store().await;

        store.set_base_url("http://10.0.0.5:8000/").await.unwrap();
        store.set_debounce_ms(750).await.unwrap();
        store.set_request_timeout_secs(Some(5)).await.unwrap();
        store.set_memoize_checks(false).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.base_url, "http://10.0.0.5:8000");
        assert_eq!(loaded.debounce_ms, 750);
        assert_eq!(loaded.request_timeout_secs, Some(5));
        assert!(!loaded.memoize_checks);

        assert!(store.set_base_url("ftp://nope").await.is_err());
    }
}
