//! Hashpoint CLI - Command-line interface
//!
//! This binary is a thin request-dispatch layer over the hashpoint
//! library: it parses a date, an optional graticule and flags, hands them
//! to the engine, and prints the resulting point or typed failure.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{cache, neighbors, resolve};

#[derive(Debug, Parser)]
#[command(name = "hashpoint", version, about = "Daily meetup point derivation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve the point for a date and graticule (or the global point)
    Resolve(resolve::ResolveArgs),
    /// Resolve the eight cells neighboring a graticule
    Neighbors(neighbors::NeighborsArgs),
    /// Manage the persistent derivation cache
    Cache {
        #[command(subcommand)]
        action: cache::CacheAction,
    },
}

fn main() {
    // Log to stderr so piped output stays clean; RUST_LOG overrides.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Resolve(args) => resolve::run(args),
        Command::Neighbors(args) => neighbors::run(args),
        Command::Cache { action } => cache::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
