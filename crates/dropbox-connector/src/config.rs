//! Connector configuration.
//!
//! Settings that are not part of the per-invocation connection properties:
//! Dropbox endpoint base URLs, the request timeout, and the verbose
//! payload-logging switch. Loaded from an optional TOML file merged with
//! `DROPBOX_CONNECTOR_`-prefixed environment variables.

use connector_sdk::{ConnectorError, ConnectorResult};
use serde::{Deserialize, Serialize};

/// Dropbox connector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Base URL for RPC-style API endpoints.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Base URL for content upload/download endpoints.
    #[serde(default = "default_content_base_url")]
    pub content_base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Whether to log request/response payloads at DEBUG.
    #[serde(default)]
    pub verbose_logging: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            content_base_url: default_content_base_url(),
            request_timeout_seconds: default_request_timeout(),
            verbose_logging: false,
        }
    }
}

impl ConnectorConfig {
    /// Load configuration from `connector.toml` (optional) merged with
    /// `DROPBOX_CONNECTOR_`-prefixed environment variables.
    pub fn load() -> ConnectorResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("connector").required(false))
            .add_source(
                config::Environment::with_prefix("DROPBOX_CONNECTOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                ConnectorError::configuration(format!("Failed to build config: {e}"))
            })?;

        config.try_deserialize().map_err(|e| {
            ConnectorError::configuration(format!("Failed to deserialize config: {e}"))
        })
    }
}

fn default_api_base_url() -> String {
    "https://api.dropboxapi.com".to_string()
}

fn default_content_base_url() -> String {
    "https://content.dropboxapi.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_dropbox() {
        let config = ConnectorConfig::default();
        assert_eq!(config.api_base_url, "https://api.dropboxapi.com");
        assert_eq!(config.content_base_url, "https://content.dropboxapi.com");
        assert_eq!(config.request_timeout_seconds, 30);
        assert!(!config.verbose_logging);
    }
}
