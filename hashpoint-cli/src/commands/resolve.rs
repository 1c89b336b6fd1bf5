//! The `resolve` command: derive the point for one date and cell.

use clap::Args;
use hashpoint::{Destination, RequestFlags};

use crate::commands::common::{parse_date, parse_graticule, EngineOptions};
use crate::error::CliError;

/// Arguments for the resolve command.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Date to resolve (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub date: Option<String>,

    /// Graticule latitude degrees, e.g. 40 or -0
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<String>,

    /// Graticule longitude degrees, e.g. -105
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<String>,

    /// Resolve the global point instead of a graticule
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub global: bool,

    /// Also resolve the eight neighboring cells
    #[arg(long)]
    pub nearby: bool,

    #[command(flatten)]
    pub engine: EngineOptions,
}

/// Run the resolve command.
pub fn run(args: ResolveArgs) -> Result<(), CliError> {
    let date = parse_date(args.date.as_deref())?;

    let graticule = match (&args.lat, &args.lon) {
        (Some(lat), Some(lon)) => Some(parse_graticule(lat, lon)?),
        _ if args.global => None,
        _ => {
            return Err(CliError::InvalidArgument(
                "give --lat and --lon, or --global".to_string(),
            ));
        }
    };

    let engine = args.engine.build_engine()?;
    let response = engine.request(
        date,
        graticule,
        RequestFlags {
            include_neighbors: args.nearby,
            user_initiated: true,
        },
    );

    let destination = response.primary?;
    print_destination(&destination);

    for neighbor in &response.neighbors {
        println!(
            "  neighbor {}: {:.6}, {:.6}",
            neighbor
                .graticule()
                .map(|g| g.to_string())
                .unwrap_or_default(),
            neighbor.latitude(),
            neighbor.longitude()
        );
    }

    Ok(())
}

fn print_destination(destination: &Destination) {
    match destination.graticule() {
        Some(g) => println!("graticule {} on {}", g, destination.date()),
        None => println!("global point on {}", destination.date()),
    }
    println!("{:.6}, {:.6}", destination.latitude(), destination.longitude());
    if destination.is_retro() {
        println!("(retro: the requested date is in the past)");
    }
}
