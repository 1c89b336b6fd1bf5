//! Shared argument groups and helpers for CLI commands.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Args;
use hashpoint::{Engine, EngineConfig, Graticule, Store};
use tracing::debug;

use crate::error::CliError;

/// Options shared by every command that opens the engine.
#[derive(Debug, Args)]
pub struct EngineOptions {
    /// Path to the cache database
    #[arg(long, default_value = "hashpoint.db")]
    pub db: PathBuf,

    /// Mirror endpoint template with %Y/%m/%d placeholders; repeat for
    /// fallbacks (defaults to the public index mirrors)
    #[arg(long = "mirror")]
    pub mirrors: Vec<String>,

    /// Per-request fetch timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum rows kept per cache table
    #[arg(long)]
    pub max_cache_rows: Option<i64>,
}

impl EngineOptions {
    /// Opens the store and builds an engine from these options.
    pub fn build_engine(&self) -> Result<Engine, CliError> {
        let mut config = EngineConfig::default();
        if !self.mirrors.is_empty() {
            config = config.with_mirrors(self.mirrors.clone());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout_secs(timeout);
        }
        if let Some(max_rows) = self.max_cache_rows {
            config = config.with_max_cache_rows(max_rows);
        }

        debug!(db = %self.db.display(), "opening cache database");
        let store = Store::open(&self.db)?;
        Ok(Engine::new(config, store)?)
    }

    /// Opens just the store, for cache maintenance commands.
    pub fn open_store(&self) -> Result<Store, CliError> {
        Ok(Store::open(&self.db)?)
    }
}

/// Parses a `YYYY-MM-DD` date argument, defaulting to today.
pub fn parse_date(arg: Option<&str>) -> Result<NaiveDate, CliError> {
    match arg {
        None => Ok(Local::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| CliError::InvalidArgument(format!("not a YYYY-MM-DD date: {s}"))),
    }
}

/// Builds a graticule from the two degree-string arguments.
///
/// The strings keep the negative-zero distinction: `--lat -0 --lon -30`
/// names the cell just south of the equator.
pub fn parse_graticule(lat: &str, lon: &str) -> Result<Graticule, CliError> {
    Graticule::from_strings(lat, lon)
        .map_err(|e| CliError::InvalidArgument(format!("bad graticule: {e}")))
}
