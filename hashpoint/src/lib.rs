//! Hashpoint - deterministic daily meetup point derivation
//!
//! This library derives a geographic point for any calendar date and 1°×1°
//! grid cell ("graticule") from that date's publicly posted index value,
//! using a fixed hashing rule. Results are served from a two-tier cache
//! (a two-slot in-memory quick cache in front of a durable SQLite store)
//! before the network is ever touched, and the network fetch itself walks
//! an ordered list of mirror endpoints with a hard per-attempt timeout.
//!
//! The entry point is [`Engine`]: construct it with a [`Store`] and an
//! [`EngineConfig`], then call [`Engine::resolve`] for single points,
//! [`Engine::neighbors`] for the surrounding cells, or [`Engine::request`]
//! for the combined dispatch surface a host application uses.
//!
//! The engine blocks on I/O (network and store) and is meant to be driven
//! from background worker contexts, never from a latency-sensitive thread.

pub mod config;
pub mod date;
pub mod destination;
pub mod engine;
pub mod fetch;
pub mod graticule;
pub mod hash;
pub mod store;
pub mod wire;

pub use config::{ConfigError, EngineConfig};
pub use destination::{Destination, RetargetError};
pub use engine::{
    closest, AlwaysConnected, Connectivity, Engine, EngineError, RequestFlags, ResolveError,
    ResolveResponse,
};
pub use graticule::Graticule;
pub use store::Store;
