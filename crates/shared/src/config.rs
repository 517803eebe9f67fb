use const_format::concatcp;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::error::WorkerError;

pub const CACHE_PREFIX: &str = "OSSM-possum-offline";
/// Bump to invalidate the fallback document cached by older deployments
pub const CACHE_VERSION: &str = "v1";
pub const CACHE_NAME: &str = concatcp!(CACHE_PREFIX, "-", CACHE_VERSION);

/// Served verbatim when a navigation can't reach the network
pub const OFFLINE_FALLBACK_PAGE: &str = "index.html";

/// Path the host page registers the worker script under
pub const SERVICE_WORKER_SCRIPT: &str = "sw.js";

pub const DEFAULT_LOG_LEVEL: &str = "debug";

/// Configuration handed to the worker once at startup. Lives as long as the
/// worker instance and is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkerConfig {
    pub cache_name: String,
    pub offline_page: String,
    pub log_level: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: CACHE_NAME.to_string(),
            offline_page: OFFLINE_FALLBACK_PAGE.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl WorkerConfig {
    /// Parses a config value coming from the worker's bootstrap script.
    /// `null` means "use the defaults".
    pub fn from_value(value: serde_json::Value) -> Result<Self, WorkerError> {
        let config: Self = if value.is_null() {
            Self::default()
        } else {
            serde_json::from_value(value).map_err(|e| WorkerError::Config(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WorkerError> {
        if self.cache_name.trim().is_empty() {
            return Err(WorkerError::Config("cacheName must not be empty".to_string()));
        }
        if self.offline_page.trim().is_empty() {
            return Err(WorkerError::Config("offlinePage must not be empty".to_string()));
        }
        self.max_log_level()?;
        Ok(())
    }

    pub fn max_log_level(&self) -> Result<LevelFilter, WorkerError> {
        self.log_level
            .parse()
            .map_err(|_| WorkerError::Config(format!("invalid logLevel: {}", self.log_level)))
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_cache_name_is_versioned() {
        assert_eq!(CACHE_NAME, "OSSM-possum-offline-v1");
        assert!(CACHE_NAME.ends_with("-v1"));
    }

    #[test]
    fn test_null_config_uses_defaults() {
        let config = WorkerConfig::from_value(serde_json::Value::Null).unwrap();
        assert_eq!(config, WorkerConfig::default());
        assert_eq!(config.offline_page, "index.html");
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = WorkerConfig::from_value(json!({ "cacheName": "shell-v2" })).unwrap();
        assert_eq!(config.cache_name, "shell-v2");
        assert_eq!(config.offline_page, OFFLINE_FALLBACK_PAGE);
    }

    #[test]
    fn test_empty_offline_page_rejected() {
        let err = WorkerConfig::from_value(json!({ "offlinePage": " " })).unwrap_err();
        assert!(matches!(err, WorkerError::Config(_)));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let err = WorkerConfig::from_value(json!({ "logLevel": "loud" })).unwrap_err();
        assert!(matches!(err, WorkerError::Config(_)));
    }

    #[test]
    fn test_isolation_key_ignored() {
        let config = WorkerConfig::from_value(json!({ "crossOriginIsolation": false })).unwrap();
        assert_eq!(config, WorkerConfig::default());
    }

    #[test]
    fn test_wrong_shape_rejected() {
        assert!(WorkerConfig::from_value(json!({ "cacheName": 1 })).is_err());
    }
}
