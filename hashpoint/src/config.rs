//! Engine configuration.
//!
//! Groups the externally supplied knobs: the mirror endpoint list, the
//! per-request timeout, and the persistent cache's per-table row cap.

use thiserror::Error;

use crate::fetch::{DEFAULT_MIRRORS, DEFAULT_TIMEOUT_SECS};

/// Default per-table row cap for the persistent cache.
pub const DEFAULT_MAX_CACHE_ROWS: i64 = 15;

/// Errors from validating an engine configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The mirror list is empty; at least one endpoint is required.
    #[error("at least one mirror endpoint is required")]
    NoMirrors,

    /// The row cap must allow at least one cached row.
    #[error("max cache rows must be positive, got {0}")]
    InvalidMaxCacheRows(i64),
}

/// Configuration for the resolution engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Ordered mirror endpoint templates with `%Y`/`%m`/`%d` placeholders.
    pub mirrors: Vec<String>,

    /// Per-request timeout in seconds for mirror fetches.
    pub timeout_secs: u64,

    /// Maximum rows kept per persistent cache table.
    pub max_cache_rows: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mirrors: DEFAULT_MIRRORS.iter().map(|s| s.to_string()).collect(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_cache_rows: DEFAULT_MAX_CACHE_ROWS,
        }
    }
}

impl EngineConfig {
    /// Replaces the mirror list.
    pub fn with_mirrors(mut self, mirrors: Vec<String>) -> Self {
        self.mirrors = mirrors;
        self
    }

    /// Sets the per-request fetch timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the per-table row cap.
    pub fn with_max_cache_rows(mut self, max_cache_rows: i64) -> Self {
        self.max_cache_rows = max_cache_rows;
        self
    }

    /// Checks the configuration for use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mirrors.is_empty() {
            return Err(ConfigError::NoMirrors);
        }
        if self.max_cache_rows <= 0 {
            return Err(ConfigError::InvalidMaxCacheRows(self.max_cache_rows));
        }
        Ok(())
    }
}
