//! # Sync Configuration
//!
//! Where the remote backend lives, who the signed-in user is, where the
//! guest database is, and what to do after a successful upload.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     IRONLOG_REMOTE_URL=https://project.example.co                      │
//! │     IRONLOG_ACCESS_TOKEN=eyJ...                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/ironlog/sync.toml (Linux)                                │
//! │     ~/Library/Application Support/app.ironlog.IronLog/sync.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [remote]
//! url = "https://project.example.co"
//! anon_key = "public-anon-key"
//! access_token = "session-token"
//! user_id = "6f1c..."
//! timeout_secs = 30
//!
//! [local]
//! database_path = "/home/me/.local/share/ironlog/ironlog.db"
//!
//! [sync]
//! cleanup_after_sync = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Remote Settings
// =============================================================================

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Project base URL; tables live under `{url}/rest/v1/`.
    #[serde(default)]
    pub url: Option<String>,

    /// Public API key sent as `apikey`.
    #[serde(default)]
    pub anon_key: String,

    /// Session token of the signed-in user.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Owner written into every remote row.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            url: None,
            anon_key: String::new(),
            access_token: None,
            user_id: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl RemoteSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Local Settings
// =============================================================================

/// Location of the guest-mode database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSettings {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("app", "ironlog", "IronLog")
        .map(|dirs| dirs.data_dir().join("ironlog.db"))
        .unwrap_or_else(|| PathBuf::from("ironlog.db"))
}

impl Default for LocalSettings {
    fn default() -> Self {
        LocalSettings {
            database_path: default_database_path(),
        }
    }
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Behavior of the upload run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Delete synced local rows after a successful upload.
    #[serde(default = "default_true")]
    pub cleanup_after_sync: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            cleanup_after_sync: true,
        }
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub local: LocalSettings,

    #[serde(default)]
    pub sync: SyncSettings,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if let Some(ref raw) = self.remote.url {
            let parsed = url::Url::parse(raw)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(SyncError::InvalidUrl(format!(
                    "Remote URL must start with http:// or https://, got: {}",
                    raw
                )));
            }
        }

        if self.remote.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Returns an error unless everything a remote upload needs is set.
    pub fn require_remote(&self) -> SyncResult<()> {
        if self.remote.url.is_none() {
            return Err(SyncError::InvalidConfig("remote.url is not set".into()));
        }
        if self.remote.anon_key.is_empty() {
            return Err(SyncError::InvalidConfig("remote.anon_key is not set".into()));
        }
        if self.remote.access_token.is_none() || self.remote.user_id.is_none() {
            return Err(SyncError::InvalidConfig(
                "remote session is missing; sign in before syncing".into(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("IRONLOG_REMOTE_URL") {
            debug!(url = %url, "Overriding remote URL from environment");
            self.remote.url = Some(url);
        }

        if let Some(key) = lookup("IRONLOG_ANON_KEY") {
            self.remote.anon_key = key;
        }

        if let Some(token) = lookup("IRONLOG_ACCESS_TOKEN") {
            self.remote.access_token = Some(token);
        }

        if let Some(user_id) = lookup("IRONLOG_USER_ID") {
            debug!(user_id = %user_id, "Overriding user ID from environment");
            self.remote.user_id = Some(user_id);
        }

        if let Some(timeout) = lookup("IRONLOG_REMOTE_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(t) => self.remote.timeout_secs = t,
                Err(_) => warn!(value = %timeout, "Ignoring non-numeric remote timeout"),
            }
        }

        if let Some(path) = lookup("IRONLOG_DATABASE_PATH") {
            self.local.database_path = PathBuf::from(path);
        }

        if let Some(flag) = lookup("IRONLOG_CLEANUP_AFTER_SYNC") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.sync.cleanup_after_sync = true,
                "0" | "false" | "no" => self.sync.cleanup_after_sync = false,
                _ => warn!(value = %flag, "Unknown cleanup flag in environment"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("app", "ironlog", "IronLog")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.remote.url, None);
        assert_eq!(config.remote.timeout_secs, 30);
        assert!(config.sync.cleanup_after_sync);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SyncConfig::default();

        config.remote.url = Some("ftp://example.com".to_string());
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.remote.url = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.remote.url = Some("https://project.example.co".to_string());
        assert!(config.validate().is_ok());

        config.remote.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn test_require_remote() {
        let mut config = SyncConfig::default();
        assert!(config.require_remote().is_err());

        config.remote.url = Some("https://project.example.co".into());
        config.remote.anon_key = "anon".into();
        assert!(config.require_remote().is_err());

        config.remote.access_token = Some("token".into());
        config.remote.user_id = Some("user-1".into());
        assert!(config.require_remote().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("IRONLOG_REMOTE_URL", "https://env.example.co"),
            ("IRONLOG_USER_ID", "user-42"),
            ("IRONLOG_REMOTE_TIMEOUT_SECS", "not-a-number"),
            ("IRONLOG_CLEANUP_AFTER_SYNC", "false"),
            ("IRONLOG_DATABASE_PATH", "/tmp/guest.db"),
        ]
        .into_iter()
        .collect();

        let mut config = SyncConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.remote.url.as_deref(), Some("https://env.example.co"));
        assert_eq!(config.remote.user_id.as_deref(), Some("user-42"));
        assert_eq!(config.remote.timeout_secs, 30);
        assert!(!config.sync.cleanup_after_sync);
        assert_eq!(config.local.database_path, PathBuf::from("/tmp/guest.db"));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sync.toml");

        let mut config = SyncConfig::default();
        config.remote.url = Some("https://project.example.co".into());
        config.remote.anon_key = "anon".into();
        config.sync.cleanup_after_sync = false;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: SyncConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.remote.url, config.remote.url);
        assert_eq!(loaded.remote.anon_key, "anon");
        assert!(!loaded.sync.cleanup_after_sync);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: SyncConfig = toml::from_str(
            r#"
            [remote]
            url = "https://project.example.co"
            "#,
        )
        .unwrap();

        assert_eq!(config.remote.timeout_secs, 30);
        assert!(config.sync.cleanup_after_sync);
    }
}
