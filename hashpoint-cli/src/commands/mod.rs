//! CLI subcommand implementations.

pub mod cache;
pub mod common;
pub mod neighbors;
pub mod resolve;
