//! Wayfinder configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::search::WATCHDOG_TIMEOUT;

/// Main Wayfinder configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search backend configuration
    pub search: SearchConfig,

    /// Streaming behaviour
    pub streaming: StreamingConfig,

    /// Conversation storage
    pub storage: StorageConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are ignored; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => Self::candidates().into_iter().find(|p| p.exists())?,
        };
        let content = fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    /// Implicit config locations, in priority order
    fn candidates() -> Vec<PathBuf> {
        // Project-local config: .wayfinder.yml
        let mut candidates = vec![PathBuf::from(".wayfinder.yml")];

        // User config: ~/.config/wayfinder/wayfinder.yml
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("wayfinder").join("wayfinder.yml"));
        }
        candidates
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Search backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Backend base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the search endpoint, shared by the stream and blocking calls
    #[serde(rename = "search-path")]
    pub search_path: String,

    /// Environment variable holding an API key sent as `x-api-key`
    #[serde(rename = "api-key-env", skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Blocking request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            search_path: "/search".to_string(),
            api_key_env: None,
            timeout_ms: 120_000,
        }
    }
}

impl SearchConfig {
    /// Full URL of the search endpoint
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.search_path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// API key from the configured environment variable, if set
    pub fn get_api_key(&self) -> Option<String> {
        let var = self.api_key_env.as_deref()?;
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Some(key.trim().to_string()),
            _ => {
                debug!(%var, "get_api_key: variable not set, sending no key");
                None
            }
        }
    }
}

/// Streaming behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Try the event stream before the blocking call
    pub enabled: bool,

    /// Deadline for a streamed answer in milliseconds
    #[serde(rename = "watchdog-ms")]
    pub watchdog_ms: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            watchdog_ms: WATCHDOG_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Conversation storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory of chat session files
    #[serde(rename = "sessions-dir")]
    pub sessions_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/wayfinder/sessions on Linux)
        let sessions_dir = dirs::data_dir()
            .map(|d| d.join("wayfinder").join("sessions"))
            .unwrap_or_else(|| PathBuf::from(".wayfinder-sessions"))
            .to_string_lossy()
            .into_owned();

        Self { sessions_dir }
    }
}

impl StorageConfig {
    /// Sessions directory with `~/` expanded
    pub fn sessions_path(&self) -> PathBuf {
        match self.sessions_dir.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.sessions_dir)),
            None => PathBuf::from(&self.sessions_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.streaming.enabled);
        assert_eq!(config.streaming.watchdog_ms, 60_000);
        assert_eq!(config.search.endpoint(), "http://localhost:3000/api/search");
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
search:
  base-url: https://travel.example.com/api/
  search-path: search
  api-key-env: WAYFINDER_KEY
  timeout-ms: 30000

streaming:
  enabled: false
  watchdog-ms: 45000

storage:
  sessions-dir: /var/lib/wayfinder

log-level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.search.endpoint(), "https://travel.example.com/api/search");
        assert_eq!(config.search.api_key_env.as_deref(), Some("WAYFINDER_KEY"));
        assert_eq!(config.search.timeout_ms, 30_000);
        assert!(!config.streaming.enabled);
        assert_eq!(config.streaming.watchdog_ms, 45_000);
        assert_eq!(config.storage.sessions_path(), PathBuf::from("/var/lib/wayfinder"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
streaming:
  enabled: false
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.streaming.enabled);
        assert_eq!(config.streaming.watchdog_ms, 60_000);
        assert_eq!(config.search.search_path, "/search");
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("wayfinder.yml");
        fs::write(&path, "log-level: warn\nsearch:\n  base-url: http://127.0.0.1:9\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.search.base_url, "http://127.0.0.1:9");
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("absent.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    fn test_api_key_absent_without_env_name() {
        assert!(SearchConfig::default().get_api_key().is_none());
    }
}
