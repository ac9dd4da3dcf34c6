//! # Client Configuration
//!
//! Configuration for reaching the Stockdesk backend.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     STOCKDESK_API_URL=https://shop.example.com/api/                     │
//! │     STOCKDESK_API_TOKEN=...                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/stockdesk/client.toml (Linux)                             │
//! │     ~/Library/Application Support/com.stockdesk.stockdesk/client.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     localhost backend, auto-generated terminal id                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # client.toml
//! [api]
//! base_url = "https://shop.example.com/api/"
//! token = "..."
//! request_timeout_secs = 15
//! connect_timeout_secs = 5
//!
//! [terminal]
//! id = "counter-1"
//! operator = "Meera"
//!
//! [retry]
//! max_retries = 3
//! initial_backoff_ms = 200
//! max_backoff_secs = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Settings
// =============================================================================

/// How to reach the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL every route is joined onto.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token, sent on every request when set.
    #[serde(default)]
    pub token: Option<String>,

    /// Whole-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api/".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_connect_timeout() -> u64 {
    5
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            token: None,
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// =============================================================================
// Terminal Settings
// =============================================================================

/// Identity of this till.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// Terminal identifier. Auto-generated on first run if not provided.
    pub id: String,

    /// Person at the till; recorded as `receivedBy` on settlements.
    #[serde(default)]
    pub operator: Option<String>,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        TerminalSettings {
            id: Uuid::new_v4().to_string(),
            operator: None,
        }
    }
}

// =============================================================================
// Retry Settings
// =============================================================================

/// Backoff for catalog lookups. Submissions are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries after the first attempt. 0 disables retrying.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Ceiling for any single delay (seconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    200
}
fn default_max_backoff() -> u64 {
    5
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub terminal: TerminalSettings,

    #[serde(default)]
    pub retry: RetrySettings,
}

impl ClientConfig {
    /// Creates a new config with defaults and a generated terminal ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        self.base_url()?;

        if self.api.request_timeout_secs == 0 || self.api.connect_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeouts must be greater than 0".into(),
            ));
        }

        if self.terminal.id.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "terminal id must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides from a variable lookup (the process environment
    /// in [`ClientConfig::load`]).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STOCKDESK_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(token) = lookup("STOCKDESK_API_TOKEN") {
            self.api.token = Some(token).filter(|t| !t.is_empty());
        }

        if let Some(secs) = lookup("STOCKDESK_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.api.request_timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring non-numeric STOCKDESK_TIMEOUT_SECS"),
            }
        }

        if let Some(id) = lookup("STOCKDESK_TERMINAL_ID") {
            debug!(terminal_id = %id, "Overriding terminal ID from environment");
            self.terminal.id = id;
        }

        if let Some(operator) = lookup("STOCKDESK_OPERATOR") {
            self.terminal.operator = Some(operator);
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockdesk", "stockdesk")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The parsed base URL, always ending in `/` so routes join beneath it.
    pub fn base_url(&self) -> ClientResult<Url> {
        let mut url = Url::parse(&self.api.base_url)?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.api.connect_timeout_secs)
    }

    /// Who a settlement is recorded as received by: the operator when set,
    /// otherwise the terminal.
    pub fn received_by(&self) -> String {
        self.terminal
            .operator
            .clone()
            .unwrap_or_else(|| self.terminal.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(!config.terminal.id.is_empty()); // Auto-generated
        assert_eq!(config.api.request_timeout_secs, 15);
        assert_eq!(config.retry.max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.api.base_url = "ftp://shop.example.com".to_string();
        assert!(matches!(config.validate(), Err(ClientError::InvalidUrl(_))));

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "https://shop.example.com/api".to_string();
        assert!(config.validate().is_ok());

        config.api.connect_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.api.connect_timeout_secs = 5;

        config.terminal.id = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let mut config = ClientConfig::default();
        config.api.base_url = "https://shop.example.com/api".to_string();

        let url = config.base_url().unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/api/");
        assert_eq!(
            url.join("sales/checkout").unwrap().as_str(),
            "https://shop.example.com/api/sales/checkout"
        );
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STOCKDESK_API_URL", "https://backend.local/v1/"),
            ("STOCKDESK_API_TOKEN", "secret"),
            ("STOCKDESK_TIMEOUT_SECS", "30"),
            ("STOCKDESK_TERMINAL_ID", "counter-2"),
            ("STOCKDESK_OPERATOR", "Meera"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "https://backend.local/v1/");
        assert_eq!(config.api.token.as_deref(), Some("secret"));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.terminal.id, "counter-2");
        assert_eq!(config.received_by(), "Meera");
    }

    #[test]
    fn test_bad_timeout_override_is_ignored() {
        let mut config = ClientConfig::default();
        config.apply_overrides(|key| (key == "STOCKDESK_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert_eq!(config.api.request_timeout_secs, 15);
    }

    #[test]
    fn test_received_by_falls_back_to_terminal() {
        let mut config = ClientConfig::default();
        config.terminal.id = "counter-1".to_string();
        assert_eq!(config.received_by(), "counter-1");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("stockdesk-test-{}", Uuid::new_v4()))
            .join("client.toml");

        let mut config = ClientConfig::default();
        config.terminal.id = "counter-9".to_string();
        config.retry.max_retries = 1;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[api]"));
        assert!(contents.contains("[terminal]"));

        let loaded: ClientConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://shop.example.com/api/"

            [terminal]
            id = "counter-3"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.request_timeout_secs, 15);
        assert_eq!(config.retry.initial_backoff_ms, 200);
        assert!(config.api.token.is_none());
    }
}
