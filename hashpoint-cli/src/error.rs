//! CLI error types.

use std::fmt;

use hashpoint::store::StoreError;
use hashpoint::{EngineError, ResolveError};

/// Errors surfaced to the terminal with a nonzero exit code.
#[derive(Debug)]
pub enum CliError {
    /// The engine could not be constructed.
    Engine(EngineError),

    /// The cache database could not be opened.
    Store(StoreError),

    /// A command-line argument did not parse.
    InvalidArgument(String),

    /// The resolution itself failed (not posted, offline, network).
    Resolve(ResolveError),

    /// A cache maintenance action failed.
    Cache(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Engine(e) => write!(f, "failed to start the engine: {e}"),
            CliError::Store(e) => write!(f, "failed to open the cache database: {e}"),
            CliError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            CliError::Resolve(e) => write!(f, "{e}"),
            CliError::Cache(msg) => write!(f, "cache action failed: {msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Engine(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Resolve(e) => Some(e),
            CliError::InvalidArgument(_) | CliError::Cache(_) => None,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        CliError::Engine(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<ResolveError> for CliError {
    fn from(e: ResolveError) -> Self {
        CliError::Resolve(e)
    }
}
