//! Cache management CLI commands.

use clap::Subcommand;

use crate::commands::common::EngineOptions;
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Empty the derivation cache, removing all stored values
    Clear {
        #[command(flatten)]
        engine: EngineOptions,
    },
    /// Show derivation cache statistics
    Stats {
        #[command(flatten)]
        engine: EngineOptions,
    },
}

/// Run a cache subcommand.
pub fn run(action: CacheAction) -> Result<(), CliError> {
    match action {
        CacheAction::Clear { engine } => {
            let store = engine.open_store()?;
            if store.wipe() {
                println!("derivation cache cleared");
                Ok(())
            } else {
                Err(CliError::Cache("could not empty the cache".to_string()))
            }
        }
        CacheAction::Stats { engine } => {
            let store = engine.open_store()?;
            let (index_values, fractions) = store.row_counts()?;
            println!("derivation cache: {}", engine.db.display());
            println!("  index values: {index_values}");
            println!("  fractions:    {fractions}");
            Ok(())
        }
    }
}
