//! The `neighbors` command: resolve the cells around a graticule.

use clap::Args;

use crate::commands::common::{parse_date, parse_graticule, EngineOptions};
use crate::error::CliError;

/// Arguments for the neighbors command.
#[derive(Debug, Args)]
pub struct NeighborsArgs {
    /// Date to resolve (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub date: Option<String>,

    /// Center graticule latitude degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: String,

    /// Center graticule longitude degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: String,

    #[command(flatten)]
    pub engine: EngineOptions,
}

/// Run the neighbors command.
pub fn run(args: NeighborsArgs) -> Result<(), CliError> {
    let date = parse_date(args.date.as_deref())?;
    let center = parse_graticule(&args.lat, &args.lon)?;

    let engine = args.engine.build_engine()?;
    let neighbors = engine.neighbors(date, &center);

    if neighbors.is_empty() {
        println!("no neighbors resolved for {} on {}", center, date);
        return Ok(());
    }

    println!("{} neighbors of {} on {}:", neighbors.len(), center, date);
    for destination in &neighbors {
        println!(
            "  {}: {:.6}, {:.6}",
            destination
                .graticule()
                .map(|g| g.to_string())
                .unwrap_or_default(),
            destination.latitude(),
            destination.longitude()
        );
    }

    Ok(())
}
