//! Grid-cell coordinate module
//!
//! Provides the [`Graticule`] value type: a 1°×1° square degree of the
//! earth's surface, identified by integer degree magnitudes plus explicit
//! hemisphere/meridian-side flags. The flags are kept separate from the
//! magnitudes because the cells at latitude 0 and longitude 0 on either
//! side of the equator or prime meridian are distinct ("negative zero"
//! cells), and a signed integer cannot express `-0`.

use std::fmt;

use thiserror::Error;

/// Maximum latitude magnitude a cell can carry.
pub const MAX_LAT: i32 = 89;
/// Maximum longitude magnitude a cell can carry.
pub const MAX_LON: i32 = 179;

/// Errors from parsing a graticule out of its string form.
#[derive(Debug, Error)]
pub enum GraticuleParseError {
    /// One of the inputs was empty.
    #[error("empty coordinate string")]
    Empty,

    /// One of the inputs was not an integer.
    #[error("not an integer degree value: {0}")]
    NotAnInteger(String),
}

/// A 1°×1° grid cell.
///
/// Graticules are immutable: every operation that "moves" a cell returns a
/// new value. Magnitudes are clamped into range on construction (latitude
/// 0–89, longitude 0–179), so a constructed graticule is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Graticule {
    latitude: i32,
    longitude: i32,
    south: bool,
    west: bool,
}

impl Graticule {
    /// Creates a graticule from integer degree magnitudes and explicit sign
    /// flags.
    ///
    /// The sign flags must be given explicitly to allow the "negative zero"
    /// cells along the equator and prime meridian. Negative magnitudes are
    /// taken by absolute value, and out-of-range magnitudes are clamped.
    pub fn new(latitude: i32, south: bool, longitude: i32, west: bool) -> Self {
        Self {
            latitude: latitude.abs().min(MAX_LAT),
            longitude: longitude.abs().min(MAX_LON),
            south,
            west,
        }
    }

    /// Creates a graticule from signed decimal degrees, e.g. straight from a
    /// position fix.
    ///
    /// Negative values are interpreted as south and west. This cannot
    /// distinguish the negative-zero cells, so avoid it for positions lying
    /// exactly on the equator or prime meridian.
    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Self::new(
            latitude.trunc().abs() as i32,
            latitude < 0.0,
            longitude.trunc().abs() as i32,
            longitude < 0.0,
        )
    }

    /// Creates a graticule from the string forms of the two degree values.
    ///
    /// A leading `-` supplies the sign flag, which makes `"-0"` parse as a
    /// negative-zero cell.
    pub fn from_strings(latitude: &str, longitude: &str) -> Result<Self, GraticuleParseError> {
        let south = latitude.starts_with('-');
        let west = longitude.starts_with('-');

        let parse = |s: &str| -> Result<i32, GraticuleParseError> {
            if s.is_empty() {
                return Err(GraticuleParseError::Empty);
            }
            s.parse::<i32>()
                .map(i32::abs)
                .map_err(|_| GraticuleParseError::NotAnInteger(s.to_string()))
        };

        Ok(Self::new(parse(latitude)?, south, parse(longitude)?, west))
    }

    /// Returns a new graticule shifted by whole degrees.
    ///
    /// Shifting across the equator accounts for the missing "latitude zero
    /// twice": the shift magnitude is decremented by one and the hemisphere
    /// flag flips, so one degree south of `0N` is `-0N`, not `1S`.
    ///
    /// Longitude is handled on a continuous 0–359 ring (179W=0 … 0W=179,
    /// 0E=180 … 179E=359) so that offsets wrap correctly across the ±180°
    /// line: one degree west of `179W` is `179E`.
    ///
    /// Latitude is not range-checked here; shifting past a pole clamps at
    /// magnitude 89. Callers that must reject such shifts (neighbor
    /// enumeration) check the signed latitude before calling.
    pub fn offset(&self, lat_off: i32, lon_off: i32) -> Graticule {
        if lat_off == 0 && lon_off == 0 {
            return *self;
        }

        let going_south = lat_off < 0;
        let mut lat_off = lat_off.abs();

        let mut final_lat = self.latitude;
        let mut final_south = self.south;

        if lat_off != 0 {
            if self.south == going_south {
                // Same direction as the current hemisphere, plain shift.
                final_lat = self.latitude + lat_off;
            } else {
                // Heading toward (and maybe across) the equator.
                if self.latitude < lat_off {
                    lat_off -= 1;
                    final_south = !final_south;
                }
                final_lat = (self.latitude - lat_off).abs();
            }
        }

        // Re-express longitude on the 0–359 ring, shift, and reduce.
        let mut final_lon = if self.west {
            -self.longitude + 179
        } else {
            self.longitude + 180
        };

        final_lon += lon_off;
        final_lon %= 360;
        if final_lon < 0 {
            final_lon += 360;
        }

        let final_west;
        if final_lon >= 180 {
            final_west = false;
            final_lon -= 180;
        } else {
            final_west = true;
            final_lon -= 179;
        }

        Graticule::new(final_lat, final_south, final_lon.abs(), final_west)
    }

    /// Whether this cell's effective index date is pulled back a day
    /// relative to the requested date (the 30W rule): everything east of
    /// 30° west longitude uses the previous day's index value.
    pub fn uses_30w_rule(&self) -> bool {
        self.longitude < 30 || !self.west
    }

    /// The latitude magnitude (0–89). Combine with [`is_south`] for the sign.
    ///
    /// [`is_south`]: Graticule::is_south
    pub fn latitude(&self) -> i32 {
        self.latitude
    }

    /// The longitude magnitude (0–179). Combine with [`is_west`] for the sign.
    ///
    /// [`is_west`]: Graticule::is_west
    pub fn longitude(&self) -> i32 {
        self.longitude
    }

    /// True for southern-hemisphere cells (negative latitude).
    pub fn is_south(&self) -> bool {
        self.south
    }

    /// True for western cells (negative longitude).
    pub fn is_west(&self) -> bool {
        self.west
    }

    /// Signed latitude in whole degrees. Note `-0` collapses to `0` here.
    pub fn signed_latitude(&self) -> i32 {
        if self.south {
            -self.latitude
        } else {
            self.latitude
        }
    }

    /// Signed longitude in whole degrees. Note `-0` collapses to `0` here.
    pub fn signed_longitude(&self) -> i32 {
        if self.west {
            -self.longitude
        } else {
            self.longitude
        }
    }

    /// The center of the cell in signed decimal degrees.
    pub fn center(&self) -> (f64, f64) {
        let lat = if self.south {
            -(self.latitude as f64) - 0.5
        } else {
            self.latitude as f64 + 0.5
        };
        let lon = if self.west {
            -(self.longitude as f64) - 0.5
        } else {
            self.longitude as f64 + 0.5
        };
        (lat, lon)
    }

    /// Anchors a fraction pair inside this cell, producing absolute signed
    /// coordinates.
    ///
    /// The fractions are the positional part of a derived point; the cell
    /// supplies the whole degrees and the signs.
    pub fn point_from_fractions(&self, lat_fraction: f64, lon_fraction: f64) -> (f64, f64) {
        let mut lat = self.latitude as f64 + lat_fraction;
        let mut lon = self.longitude as f64 + lon_fraction;
        if self.south {
            lat = -lat;
        }
        if self.west {
            lon = -lon;
        }
        (lat, lon)
    }

    /// The latitude as a string, preserving the negative-zero distinction.
    ///
    /// With `negative_values` the southern form is `"-30"`; without, it is
    /// `"30S"`.
    pub fn latitude_string(&self, negative_values: bool) -> String {
        match (self.south, negative_values) {
            (true, true) => format!("-{}", self.latitude),
            (true, false) => format!("{}S", self.latitude),
            (false, true) => format!("{}", self.latitude),
            (false, false) => format!("{}N", self.latitude),
        }
    }

    /// The longitude as a string, preserving the negative-zero distinction.
    pub fn longitude_string(&self, negative_values: bool) -> String {
        match (self.west, negative_values) {
            (true, true) => format!("-{}", self.longitude),
            (true, false) => format!("{}W", self.longitude),
            (false, true) => format!("{}", self.longitude),
            (false, false) => format!("{}E", self.longitude),
        }
    }
}

impl fmt::Display for Graticule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.latitude_string(false),
            self.longitude_string(false)
        )
    }
}
