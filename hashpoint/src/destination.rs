//! The destination record: a fully derived daily point.
//!
//! A [`Destination`] ties the derived fraction pair to the request that
//! produced it: the graticule (or none, for a whole-globe request), the
//! requested date, and a pair of presentation flags. Destinations are
//! immutable; the engine creates them once and hands them out.

use chrono::{Local, NaiveDate};
use thiserror::Error;

use crate::graticule::Graticule;

/// Mean earth radius in meters, for great-circle distances.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Errors from re-anchoring a destination onto another graticule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetargetError {
    /// A whole-globe destination has no per-cell fraction anchoring to move.
    #[error("a global destination cannot be retargeted onto a graticule")]
    GlobalDestination,

    /// The two cells disagree on the 30W rule, so they may not even share
    /// an index value; a correct answer could need another fetch.
    #[error("graticules lie on opposite sides of the 30W line")]
    RuleMismatch,
}

/// A derived daily point.
///
/// For a graticule request the fraction pair is anchored inside the cell;
/// for a global request (no graticule) the fractions scale across the whole
/// globe. An *invalid* destination carries no usable coordinates, only the
/// date and cell it was asked for, so failures can still be reported
/// meaningfully.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    lat_fraction: f64,
    lon_fraction: f64,
    graticule: Option<Graticule>,
    date: NaiveDate,
    retro: bool,
    valid: bool,
}

impl Destination {
    /// Creates a valid destination from a derived fraction pair.
    pub fn new(
        lat_fraction: f64,
        lon_fraction: f64,
        graticule: Option<Graticule>,
        date: NaiveDate,
    ) -> Self {
        Self {
            lat_fraction,
            lon_fraction,
            graticule,
            date,
            retro: is_retro(date),
            valid: true,
        }
    }

    /// Creates an invalid destination for error reporting: no coordinates,
    /// but the date and cell of the failed request are preserved.
    pub fn invalid(graticule: Option<Graticule>, date: NaiveDate) -> Self {
        Self {
            lat_fraction: 0.0,
            lon_fraction: 0.0,
            graticule,
            date,
            retro: is_retro(date),
            valid: false,
        }
    }

    /// Rebuilds a destination from previously encoded parts.
    pub(crate) fn from_parts(
        lat_fraction: f64,
        lon_fraction: f64,
        graticule: Option<Graticule>,
        date: NaiveDate,
        retro: bool,
        valid: bool,
    ) -> Self {
        Self {
            lat_fraction,
            lon_fraction,
            graticule,
            date,
            retro,
            valid,
        }
    }

    /// Absolute latitude of the point.
    ///
    /// Graticule destinations anchor the fraction inside the cell; global
    /// destinations scale it over the full −90°..90° range.
    pub fn latitude(&self) -> f64 {
        match &self.graticule {
            Some(g) => g.point_from_fractions(self.lat_fraction, self.lon_fraction).0,
            None => self.lat_fraction * 180.0 - 90.0,
        }
    }

    /// Absolute longitude of the point (global case scales over
    /// −180°..180°).
    pub fn longitude(&self) -> f64 {
        match &self.graticule {
            Some(g) => g.point_from_fractions(self.lat_fraction, self.lon_fraction).1,
            None => self.lon_fraction * 360.0 - 180.0,
        }
    }

    /// The latitude fraction the point was derived from.
    pub fn lat_fraction(&self) -> f64 {
        self.lat_fraction
    }

    /// The longitude fraction the point was derived from.
    pub fn lon_fraction(&self) -> f64 {
        self.lon_fraction
    }

    /// The graticule this destination was derived for, `None` for a global
    /// request.
    pub fn graticule(&self) -> Option<&Graticule> {
        self.graticule.as_ref()
    }

    /// The requested date (not the effective index date).
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Whether this is a whole-globe destination.
    pub fn is_global(&self) -> bool {
        self.graticule.is_none()
    }

    /// Whether the requested date lies strictly in the past. A weekend
    /// request made on Friday is not retro even though its index value
    /// already exists.
    pub fn is_retro(&self) -> bool {
        self.retro
    }

    /// Whether the destination carries usable coordinates.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether this destination's request was under the 30W rule.
    pub fn uses_30w_rule(&self) -> bool {
        crate::date::uses_30w_rule(self.graticule.as_ref())
    }

    /// Re-anchors the same fraction pair onto another graticule, as if the
    /// same day's derivation had been requested there.
    ///
    /// Only cells on the same side of the 30W line share a derivation, and
    /// a global destination has nothing to re-anchor, so both cases are
    /// rejected rather than silently producing a wrong point.
    pub fn retarget(&self, graticule: Graticule) -> Result<Destination, RetargetError> {
        let source = self.graticule.ok_or(RetargetError::GlobalDestination)?;

        if source.uses_30w_rule() != graticule.uses_30w_rule() {
            return Err(RetargetError::RuleMismatch);
        }

        Ok(Destination {
            lat_fraction: self.lat_fraction,
            lon_fraction: self.lon_fraction,
            graticule: Some(graticule),
            date: self.date,
            retro: self.retro,
            valid: self.valid,
        })
    }

    /// Great-circle distance in meters from an arbitrary point to this
    /// destination (haversine formula).
    pub fn distance_m(&self, latitude: f64, longitude: f64) -> f64 {
        let lat1 = latitude.to_radians();
        let lat2 = self.latitude().to_radians();
        let d_lat = (self.latitude() - latitude).to_radians();
        let d_lon = (self.longitude() - longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_global() {
            "global point"
        } else {
            "point"
        };
        if self.valid {
            write!(
                f,
                "{} for {}: {:.6}, {:.6}",
                kind,
                self.date,
                self.latitude(),
                self.longitude()
            )
        } else {
            write!(f, "unresolved {} for {}", kind, self.date)
        }
    }
}

fn is_retro(date: NaiveDate) -> bool {
    date < Local::now().date_naive()
}
