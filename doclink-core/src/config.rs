//! Session configuration.

use serde::Deserialize;
use std::time::Duration;

/// Configuration for a [`Session`](crate::session::Session).
///
/// Can be built in code with the setter methods or deserialized from any serde format:
///
/// ```ignore
/// let config: SessionConfig = serde_json::from_str(r#"{
///     "uri": "mongodb://localhost:27017",
///     "database": "app",
///     "operation_timeout_ms": 5000
/// }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Connection string, in the format of the store backend.
    pub uri: String,
    /// Database bound by a successful health check.
    pub database: String,
    /// Default timeout applied to contexts created by `Session::context`.
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,
}

impl SessionConfig {
    /// Creates a configuration with no default operation timeout.
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            operation_timeout_ms: None,
        }
    }

    /// Sets the default operation timeout.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn operation_timeout_duration(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = SessionConfig::new("memory://", "app")
            .operation_timeout(Duration::from_secs(2));

        assert_eq!(config.uri, "memory://");
        assert_eq!(config.database, "app");
        assert_eq!(config.operation_timeout_duration(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_deserialize_without_timeout() {
        let config: SessionConfig = serde_json::from_str(
            r#"{ "uri": "mongodb://localhost:27017", "database": "app" }"#,
        )
        .unwrap();

        assert_eq!(config, SessionConfig::new("mongodb://localhost:27017", "app"));
        assert_eq!(config.operation_timeout_duration(), None);
    }
}
