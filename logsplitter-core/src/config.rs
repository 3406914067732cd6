//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/logsplitter/config.toml` and then
//! overridden by `LOGSPLITTER_*` environment variables.
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/logsplitter/` (~/.config/logsplitter/)
//! - State/Logs: `$XDG_STATE_HOME/logsplitter/` (~/.local/state/logsplitter/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding `api.base_url`
pub const ENV_API_URL: &str = "LOGSPLITTER_API_URL";
/// Environment variable overriding `identity.publishable_key`
pub const ENV_PUBLISHABLE_KEY: &str = "LOGSPLITTER_PUBLISHABLE_KEY";
/// Environment variable overriding `identity.jwt_template`
pub const ENV_JWT_TEMPLATE: &str = "LOGSPLITTER_JWT_TEMPLATE";
/// Environment variable overriding `identity.token`
pub const ENV_TOKEN: &str = "LOGSPLITTER_TOKEN";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// REST API endpoint configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Identity provider configuration
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// LogSplitter REST API configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL that relative endpoints are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Optional HTTP request timeout in seconds. Unset means no client timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

impl ApiConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("api.base_url is not a valid URL: {}", e)))?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::Config(format!(
                    "api.base_url must use http or https, got {}",
                    other
                )))
            }
        }
        if self.timeout_secs == Some(0) {
            return Err(Error::Config(
                "api.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

/// Identity provider configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct IdentityConfig {
    /// Identity provider public (publishable) key
    pub publishable_key: Option<String>,

    /// Named token template to request when minting bearer tokens
    pub jwt_template: Option<String>,

    /// Pre-issued session token
    pub token: Option<String>,

    /// User id reported for the session
    pub user_id: Option<String>,

    /// Email reported for the session
    pub email: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path, then apply env overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.api.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Apply `LOGSPLITTER_*` overrides using `lookup` to read variables.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(key) = get(ENV_PUBLISHABLE_KEY) {
            self.identity.publishable_key = Some(key);
        }
        if let Some(template) = get(ENV_JWT_TEMPLATE) {
            self.identity.jwt_template = Some(template);
        }
        if let Some(token) = get(ENV_TOKEN) {
            self.identity.token = Some(token);
        }
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/logsplitter/config.toml` (~/.config/logsplitter/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("logsplitter").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/logsplitter/` (~/.local/state/logsplitter/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("logsplitter")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("logsplitter.log")
    }

    /// Set XDG variables that are missing so every path above resolves the
    /// same way for the whole process.
    ///
    /// Call before spawning any threads.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert!(config.api.timeout_secs.is_none());
        assert!(config.identity.token.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(config.api.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[api]
base_url = "https://api.logsplitter.dev"
timeout_secs = 20

[identity]
publishable_key = "pk_test_123"
jwt_template = "logsplitter"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.api.base_url, "https://api.logsplitter.dev");
        assert_eq!(config.api.timeout_secs, Some(20));
        assert_eq!(config.identity.publishable_key.as_deref(), Some("pk_test_123"));
        assert_eq!(config.identity.jwt_template.as_deref(), Some("logsplitter"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::default();
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "https://staging.logsplitter.dev"),
            (ENV_JWT_TEMPLATE, "staging"),
            (ENV_TOKEN, ""),
        ]
        .into_iter()
        .collect();

        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "https://staging.logsplitter.dev");
        assert_eq!(config.identity.jwt_template.as_deref(), Some("staging"));
        // Empty values do not clobber
        assert!(config.identity.token.is_none());
    }

    #[test]
    fn test_api_config_validation() {
        let bad_scheme = ApiConfig {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(bad_scheme.validate().is_err());

        let garbage = ApiConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(garbage.validate().is_err());

        let zero_timeout = ApiConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nbase_url = \"https://x.test\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api.base_url, "https://x.test");
    }
}
