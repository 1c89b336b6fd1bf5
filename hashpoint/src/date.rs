//! Effective index date adjustment.
//!
//! The index value a point derives from is not always published on the
//! requested day. Cells under the 30W rule use the previous day's value,
//! and no value is published on weekends, so weekend dates clamp back to
//! the preceding Friday. The adjusted date is used both as the fetch date
//! and as the cache key, so this function must be the single source of
//! truth for it.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::graticule::Graticule;

/// The first date after which the 30W rule applies. Requests on or before
/// this date never pull the index date back, regardless of longitude.
fn rule_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2008, 5, 26).expect("valid cutoff date")
}

/// Whether a request is under the 30W rule.
///
/// A request with no graticule spans the whole globe and always counts as
/// under the rule; otherwise the cell decides by longitude.
pub fn uses_30w_rule(graticule: Option<&Graticule>) -> bool {
    graticule.map_or(true, Graticule::uses_30w_rule)
}

/// Computes the effective index date for a request.
///
/// Pure function of the requested date and the cell's rule membership:
/// first the 30W pullback (one day, only after the historical cutoff),
/// then the weekend clamp (Saturday backs up one day, Sunday two) so the
/// weekend shares Friday's published value.
pub fn effective_date(requested: NaiveDate, graticule: Option<&Graticule>) -> NaiveDate {
    let mut date = requested;

    if uses_30w_rule(graticule) && requested > rule_cutoff() {
        date = date - Duration::days(1);
    }

    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date - Duration::days(2),
        _ => date,
    }
}
