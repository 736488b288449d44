//! Verbose diagnostics for request/response payloads and wire calls.
//!
//! The [`Verbose`] switch comes from `ConnectorConfig::verbose_logging`
//! and is carried by the components that dump payloads. Dumps are
//! emitted at DEBUG under the `dropbox_connector::verbose` target so
//! operators can also narrow them with an env-filter directive.
//! Credentials are never logged.

use tracing::{debug, enabled, Level};

const TARGET: &str = "dropbox_connector::verbose";

/// Placeholder written instead of the Authorization header value.
pub const REDACTED: &str = "********";

/// Payload-logging switch, disabled unless configured on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbose {
    enabled: bool,
}

impl Verbose {
    /// Create a switch from the configured flag.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Whether payload dumps are on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Dump a structured payload (request or response) for one activity call.
    pub fn payload(&self, activity: &str, method: &str, label: &str, value: &serde_json::Value) {
        if self.enabled && enabled!(target: TARGET, Level::DEBUG) {
            debug!(target: TARGET, activity, method, "{label}: {value}");
        }
    }

    /// Record an outbound wire call with the Authorization header redacted.
    pub fn request(&self, http_method: &str, url: &str) {
        if self.enabled && enabled!(target: TARGET, Level::DEBUG) {
            debug!(
                target: TARGET,
                http_method,
                url,
                authorization = REDACTED,
                "request sent"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_reflects_the_configured_flag() {
        assert!(!Verbose::default().is_enabled());
        assert!(!Verbose::new(false).is_enabled());
        assert!(Verbose::new(true).is_enabled());
    }
}
