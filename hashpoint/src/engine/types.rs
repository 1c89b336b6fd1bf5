//! Engine request/response types and the failure taxonomy.

use thiserror::Error;

use crate::config::ConfigError;
use crate::destination::{Destination, RetargetError};
use crate::fetch::HttpError;

/// Errors from constructing an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The supplied configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be created.
    #[error("failed to create the HTTP client: {0}")]
    HttpClient(#[from] HttpError),
}

/// Typed failure outcomes of a resolution.
///
/// The engine never retries internally; every failure is returned to the
/// caller, which owns retry and notification policy. The first three
/// variants carry an invalid [`Destination`] preserving the date and cell
/// of the failed request for diagnostic display.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The effective date's index value has not been published yet. An
    /// expected outcome when asking for today before the source posts.
    #[error("index value not yet posted for the {} request", .0.date())]
    NotPosted(Destination),

    /// No network is reachable; the fetch was not even attempted.
    #[error("no network connectivity for the {} request", .0.date())]
    NoConnection(Destination),

    /// Every mirror was tried and failed for reasons other than "not
    /// posted".
    #[error("could not fetch the index value for the {} request", .0.date())]
    Network(Destination),

    /// The caller violated an input invariant.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<RetargetError> for ResolveError {
    fn from(e: RetargetError) -> Self {
        ResolveError::InvalidInput(e.to_string())
    }
}

/// Caller-supplied request flags (the upstream dispatch contract).
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFlags {
    /// Also resolve the up-to-eight neighboring cells.
    pub include_neighbors: bool,

    /// The request came from a direct user action rather than a background
    /// refresh. Only affects logging.
    pub user_initiated: bool,
}

/// Response to a dispatched request: the primary outcome plus any
/// neighbors that resolved.
#[derive(Debug)]
pub struct ResolveResponse {
    /// The primary resolution outcome.
    pub primary: Result<Destination, ResolveError>,

    /// Successfully resolved neighbor destinations, empty unless
    /// requested. Individual neighbor failures are absorbed silently.
    pub neighbors: Vec<Destination>,
}

/// Host-supplied connectivity signal, consulted before every fetch
/// attempt.
pub trait Connectivity: Send + Sync {
    /// Whether the network is currently reachable.
    fn is_connected(&self) -> bool;
}

/// Connectivity signal for hosts without one: always online.
pub struct AlwaysConnected;

impl Connectivity for AlwaysConnected {
    fn is_connected(&self) -> bool {
        true
    }
}
