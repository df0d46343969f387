//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, StorageBackend};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

/// Redirect chains longer than this are refused.
const MAX_REDIRECTS_LIMIT: usize = 20;

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `max_entries` is `Some(0)`
    /// - `max_redirects` exceeds 20
    ///
    /// Returns `ConfigError::Missing` if the sqlite backend has no `db_path`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.max_entries == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_entries".into(),
                reason: "must be greater than 0; omit it for unbounded storage".into(),
            });
        }

        if self.max_redirects > MAX_REDIRECTS_LIMIT {
            return Err(ConfigError::Invalid {
                field: "max_redirects".into(),
                reason: format!("must not exceed {MAX_REDIRECTS_LIMIT}"),
            });
        }

        if self.storage == StorageBackend::Sqlite && self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing {
                field: "db_path".into(),
                hint: "Set HTTPCACHE_DB_PATH or use HTTPCACHE_STORAGE=memory".into(),
            });
        }

        if self.storage == StorageBackend::Memory && self.max_entries.is_none() {
            tracing::warn!("memory storage without max_entries grows without bound");
        }

        if self.max_redirects > 0 {
            tracing::warn!(
                max_redirects = self.max_redirects,
                "redirects are followed by the exchanger; only final responses are cached"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_max_bytes_exceeds_limit() {
        let config = AppConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() }; // 51MB
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_zero_max_entries() {
        let config = AppConfig { max_entries: Some(0), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_entries"));

        let unbounded = AppConfig { max_entries: None, storage: StorageBackend::Memory, ..Default::default() };
        assert!(unbounded.validate().is_ok());
    }

    #[test]
    fn test_validate_max_redirects() {
        let config = AppConfig { max_redirects: 21, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_redirects"));

        let config = AppConfig { max_redirects: 5, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_sqlite_requires_path() {
        let config = AppConfig { db_path: PathBuf::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { field, .. }) if field == "db_path"));

        let config = AppConfig { db_path: PathBuf::new(), storage: StorageBackend::Memory, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { max_bytes: 1, timeout_ms: 100, max_entries: Some(1), ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
