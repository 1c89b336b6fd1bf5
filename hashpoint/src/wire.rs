//! Versioned wire encoding for destinations and graticules.
//!
//! Hosts move these records across process boundaries (saved state,
//! notifications, widgets). The encoding is a plain versioned JSON schema:
//! every payload carries a `version` field, and decoding rejects versions
//! it does not understand instead of guessing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::destination::Destination;
use crate::graticule::Graticule;

/// Current wire schema version.
pub const WIRE_VERSION: u32 = 1;

/// Errors from encoding or decoding wire payloads.
#[derive(Debug, Error)]
pub enum WireError {
    /// The payload declares a schema version this build does not speak.
    #[error("unsupported wire version {0} (expected {WIRE_VERSION})")]
    UnsupportedVersion(u32),

    /// The payload is not valid JSON for the schema.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload's date field does not parse.
    #[error("malformed date: {0}")]
    MalformedDate(#[from] chrono::ParseError),
}

#[derive(Debug, Serialize, Deserialize)]
struct GraticuleWire {
    latitude: i32,
    south: bool,
    longitude: i32,
    west: bool,
}

impl From<&Graticule> for GraticuleWire {
    fn from(g: &Graticule) -> Self {
        Self {
            latitude: g.latitude(),
            south: g.is_south(),
            longitude: g.longitude(),
            west: g.is_west(),
        }
    }
}

impl From<&GraticuleWire> for Graticule {
    fn from(w: &GraticuleWire) -> Self {
        Graticule::new(w.latitude, w.south, w.longitude, w.west)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DestinationWire {
    version: u32,
    lat_fraction: f64,
    lon_fraction: f64,
    graticule: Option<GraticuleWire>,
    date: String,
    retro: bool,
    valid: bool,
}

/// Encodes a destination into its wire form.
pub fn encode_destination(destination: &Destination) -> Result<String, WireError> {
    let wire = DestinationWire {
        version: WIRE_VERSION,
        lat_fraction: destination.lat_fraction(),
        lon_fraction: destination.lon_fraction(),
        graticule: destination.graticule().map(GraticuleWire::from),
        date: destination.date().format("%Y-%m-%d").to_string(),
        retro: destination.is_retro(),
        valid: destination.is_valid(),
    };
    Ok(serde_json::to_string(&wire)?)
}

/// Decodes a destination from its wire form.
pub fn decode_destination(payload: &str) -> Result<Destination, WireError> {
    let wire: DestinationWire = serde_json::from_str(payload)?;
    if wire.version != WIRE_VERSION {
        return Err(WireError::UnsupportedVersion(wire.version));
    }

    let date = NaiveDate::parse_from_str(&wire.date, "%Y-%m-%d")?;
    Ok(Destination::from_parts(
        wire.lat_fraction,
        wire.lon_fraction,
        wire.graticule.as_ref().map(Graticule::from),
        date,
        wire.retro,
        wire.valid,
    ))
}
