//! Configuration for the TWiT catalog engine
//!
//! Values are supplied by the host and passed explicitly into the client,
//! downloader and channel. `load_config` reads a TOML file and applies
//! `TWIT_`-prefixed environment overrides.

use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TwitError};

/// Default TWiT API base URL
pub const DEFAULT_BASE_URL: &str = "https://twit.tv/api/v1.0";

/// Configuration for the TWiT catalog engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitConfig {
    /// API application id, sent as the `app-id` header
    pub app_id: String,
    /// API application key, sent as the `app-key` header
    pub app_key: String,
    /// Dump every request and response at debug level (default: false)
    pub enable_debug_logging: bool,
    /// API calls allowed per minute, zero disables pacing (default: 5)
    pub limit_requests_per_minute: u32,
    /// Days of history to collect (default: 30)
    pub limit_collection_in_days: u32,
    /// API base URL
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for TwitConfig {
    fn default() -> Self {
        Self {
            app_id: "app-id-goes-here".to_string(),
            app_key: "app-key-goes-here".to_string(),
            enable_debug_logging: false,
            limit_requests_per_minute: 5,
            limit_collection_in_days: 30,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Load configuration from a TOML file with environment variable overrides
///
/// # Errors
/// Returns `TwitError::ConfigError` if the file is missing or malformed.
pub fn load_config(path: &Path) -> Result<TwitConfig> {
    if !path.exists() {
        return Err(TwitError::ConfigError(format!(
            "file not found: {}",
            path.display()
        )));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("TWIT_"))
        .extract()
        .map_err(|e| TwitError::ConfigError(e.to_string()))
}

/// Load configuration from a TOML string
pub fn load_config_from_str(toml_str: &str) -> Result<TwitConfig> {
    toml::from_str(toml_str).map_err(|e| TwitError::ConfigError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = TwitConfig::default();
        assert_eq!(config.limit_requests_per_minute, 5);
        assert_eq!(config.limit_collection_in_days, 30);
        assert!(!config.enable_debug_logging);
        assert_eq!(config.base_url, "https://twit.tv/api/v1.0");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_load_config_from_str_partial() {
        let config = load_config_from_str(
            r#"
app_id = "my-app"
app_key = "secret"
limit_requests_per_minute = 10
"#,
        )
        .unwrap();

        assert_eq!(config.app_id, "my-app");
        assert_eq!(config.app_key, "secret");
        assert_eq!(config.limit_requests_per_minute, 10);
        assert_eq!(config.limit_collection_in_days, 30);
    }

    #[test]
    fn test_load_config_from_str_invalid() {
        let result = load_config_from_str("limit_requests_per_minute = \"lots\"");
        assert!(matches!(result, Err(TwitError::ConfigError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/twit.toml"));
        match result {
            Err(TwitError::ConfigError(msg)) => assert!(msg.contains("not found")),
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
app_id = "file-app"
enable_debug_logging = true
limit_collection_in_days = 90
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.app_id, "file-app");
        assert!(config.enable_debug_logging);
        assert_eq!(config.limit_collection_in_days, 90);
        assert_eq!(config.limit_requests_per_minute, 5);
    }
}
