//! Application configuration with layered loading.
//!
//! Uses figment to merge, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. TOML config file (if HTTPCACHE_CONFIG_FILE set)
//! 3. Environment variables (HTTPCACHE_*)

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Which [`crate::cache::CacheStorage`] backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Storage backend.
    ///
    /// Set via HTTPCACHE_STORAGE (`sqlite` or `memory`).
    #[serde(default)]
    pub storage: StorageBackend,

    /// Path to the SQLite database, used by the `sqlite` backend.
    ///
    /// Set via HTTPCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Upper bound on stored variants; `None` leaves storage unbounded.
    ///
    /// Set via HTTPCACHE_MAX_ENTRIES environment variable.
    #[serde(default = "default_max_entries")]
    pub max_entries: Option<usize>,

    /// User-Agent string for origin requests.
    ///
    /// Set via HTTPCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body size in bytes.
    ///
    /// Set via HTTPCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Origin request timeout in milliseconds.
    ///
    /// Set via HTTPCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Redirects the exchanger follows. With 0, 3xx responses reach the
    /// cache and are stored like any other response.
    ///
    /// Set via HTTPCACHE_MAX_REDIRECTS environment variable.
    #[serde(default)]
    pub max_redirects: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./httpcache.sqlite")
}

fn default_max_entries() -> Option<usize> {
    Some(1000)
}

fn default_user_agent() -> String {
    "httpcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            db_path: default_db_path(),
            max_entries: default_max_entries(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: 0,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("HTTPCACHE_CONFIG_FILE").ok().map(PathBuf::from);
        let config: Self = Self::figment(file)
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment(file: Option<PathBuf>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(
            Env::prefixed("HTTPCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }
}
