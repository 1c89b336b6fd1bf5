//! The resolution engine: cache orchestration and neighbor search.
//!
//! [`Engine`] ties the three tiers together: a two-slot quick cache of the
//! most recent destinations, the persistent store, and the network
//! fetcher. A resolution walks the tiers in order and only touches the
//! network when both caches miss. The miss path (fetch, derive, store) is
//! serialized behind one global lock across all callers, a deliberately
//! coarse single-flight policy that guarantees at most one network fetch
//! per key without per-key bookkeeping.
//!
//! The engine blocks on I/O and must be driven from worker contexts that
//! may block, never from a latency-sensitive thread.

mod quick;
mod types;

pub use types::{
    AlwaysConnected, Connectivity, EngineError, RequestFlags, ResolveError, ResolveResponse,
};

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::date::{effective_date, uses_30w_rule};
use crate::destination::Destination;
use crate::fetch::{FetchError, HttpClient, IndexFetcher, ReqwestClient};
use crate::graticule::Graticule;
use crate::hash::derive_fractions;
use crate::store::Store;

use quick::QuickCache;

/// The resolution engine.
///
/// Create one per host session and share it; all methods take `&self`.
pub struct Engine {
    quick: Mutex<QuickCache>,
    store: Store,
    fetcher: IndexFetcher,
    fetch_lock: Mutex<()>,
    connectivity: Arc<dyn Connectivity>,
    max_cache_rows: i64,
}

impl Engine {
    /// Creates an engine with the default HTTP client and an always-online
    /// connectivity signal.
    pub fn new(config: EngineConfig, store: Store) -> Result<Self, EngineError> {
        let client = Arc::new(ReqwestClient::with_timeout(config.timeout_secs)?);
        Self::with_client(config, store, client, Arc::new(AlwaysConnected))
    }

    /// Creates an engine with an injected HTTP client and connectivity
    /// signal.
    pub fn with_client(
        config: EngineConfig,
        store: Store,
        client: Arc<dyn HttpClient>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            quick: Mutex::new(QuickCache::new()),
            store,
            fetcher: IndexFetcher::new(config.mirrors.clone(), client),
            fetch_lock: Mutex::new(()),
            connectivity,
            max_cache_rows: config.max_cache_rows,
        })
    }

    /// Resolves the destination for a date and graticule (or the global
    /// point when no graticule is given).
    ///
    /// Checks the quick cache, then the persistent store, and only then
    /// fetches the day's index value from the mirrors. Every failure is a
    /// typed outcome; the engine never retries.
    pub fn resolve(
        &self,
        date: NaiveDate,
        graticule: Option<Graticule>,
    ) -> Result<Destination, ResolveError> {
        let under_rule = uses_30w_rule(graticule.as_ref());
        let effective = effective_date(date, graticule.as_ref());
        debug!(date = %date, effective = %effective, under_rule, "resolving");

        // Quick cache first. Its reads deliberately run outside the fetch
        // lock and may interleave with a concurrent writer; the worst case
        // is a redundant store lookup.
        let cached = self
            .quick
            .lock()
            .lookup(date, graticule.is_some(), under_rule)
            .cloned();
        if let Some(hit) = cached {
            debug!(date = %date, "quick cache hit");
            return match graticule {
                None => Ok(hit),
                Some(g) => Ok(hit.retarget(g)?),
            };
        }

        if let Some((lat, lon)) = self.stored_fractions(effective, under_rule) {
            debug!(date = %date, "persistent cache hit");
            return Ok(self.finish(date, graticule, lat, lon));
        }

        if !self.connectivity.is_connected() {
            debug!(date = %date, "offline, not attempting a fetch");
            return Err(ResolveError::NoConnection(Destination::invalid(
                graticule, date,
            )));
        }

        // Miss on both tiers: fetch, derive and store under the global
        // lock. Serializes all concurrent resolutions, not just same-key
        // ones.
        let _fetch_guard = self.fetch_lock.lock();

        let value = match self.stored_index_value(effective) {
            Some(value) => value,
            None => match self.fetcher.fetch(effective) {
                Ok(value) => {
                    if let Err(e) = self.store.put_index_value(effective, &value) {
                        warn!(error = %e, "failed to store index value");
                    }
                    self.prune();
                    value
                }
                Err(FetchError::NotPosted) => {
                    return Err(ResolveError::NotPosted(Destination::invalid(
                        graticule, date,
                    )));
                }
                Err(FetchError::Server) => {
                    return Err(ResolveError::Network(Destination::invalid(graticule, date)));
                }
            },
        };

        let (lat, lon) = derive_fractions(effective, &value);
        if let Err(e) = self.store.put_fractions(effective, under_rule, lat, lon) {
            warn!(error = %e, "failed to store fraction pair");
        }
        self.prune();

        Ok(self.finish(date, graticule, lat, lon))
    }

    /// Resolves the up-to-eight neighboring cells of a graticule.
    ///
    /// Offsets that would land past a pole are skipped, and neighbors that
    /// fail to resolve are dropped silently: the caller gets whatever
    /// subset succeeded, in offset-grid order.
    pub fn neighbors(&self, date: NaiveDate, center: &Graticule) -> Vec<Destination> {
        let mut found = Vec::new();

        for lat_off in -1..=1 {
            for lon_off in -1..=1 {
                if lat_off == 0 && lon_off == 0 {
                    continue;
                }
                // No valid cell past a pole.
                if (center.signed_latitude() + lat_off).abs() >= 90 {
                    continue;
                }

                let cell = center.offset(lat_off, lon_off);
                match self.resolve(date, Some(cell)) {
                    Ok(destination) => found.push(destination),
                    Err(e) => {
                        debug!(cell = %cell, error = %e, "dropping unresolved neighbor");
                    }
                }
            }
        }

        found
    }

    /// Dispatch surface for host request layers: resolves the primary
    /// destination and, when asked, its neighbors.
    pub fn request(
        &self,
        date: NaiveDate,
        graticule: Option<Graticule>,
        flags: RequestFlags,
    ) -> ResolveResponse {
        if flags.user_initiated {
            debug!(date = %date, "user-initiated request");
        }

        let primary = self.resolve(date, graticule);
        let neighbors = match (&primary, graticule, flags.include_neighbors) {
            (Ok(_), Some(center), true) => self.neighbors(date, &center),
            _ => Vec::new(),
        };

        ResolveResponse { primary, neighbors }
    }

    /// Empties the persistent cache and the quick cache. Returns whether
    /// the persistent wipe succeeded.
    pub fn wipe_cache(&self) -> bool {
        self.quick.lock().clear();
        self.store.wipe()
    }

    /// Row counts of the persistent cache (index values, fractions).
    pub fn cache_row_counts(&self) -> (i64, i64) {
        self.store.row_counts().unwrap_or_else(|e| {
            warn!(error = %e, "failed to count cache rows");
            (0, 0)
        })
    }

    fn stored_fractions(&self, effective: NaiveDate, under_rule: bool) -> Option<(f64, f64)> {
        match self.store.fractions(effective, under_rule) {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "fraction lookup failed, treating as a miss");
                None
            }
        }
    }

    fn stored_index_value(&self, effective: NaiveDate) -> Option<String> {
        match self.store.index_value(effective) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "index value lookup failed, treating as a miss");
                None
            }
        }
    }

    fn prune(&self) {
        if let Err(e) = self.store.prune(self.max_cache_rows) {
            warn!(error = %e, "cache pruning failed");
        }
    }

    /// Builds the destination and records it in the quick cache.
    fn finish(
        &self,
        date: NaiveDate,
        graticule: Option<Graticule>,
        lat_fraction: f64,
        lon_fraction: f64,
    ) -> Destination {
        let destination = Destination::new(lat_fraction, lon_fraction, graticule, date);
        self.quick.lock().push(destination.clone());
        destination
    }
}

/// Picks the destination closest to a reference point.
///
/// Scans `candidates` (plus `primary`, when given) by great-circle
/// distance. Fails with [`ResolveError::InvalidInput`] when there is
/// nothing to scan at all.
pub fn closest(
    latitude: f64,
    longitude: f64,
    primary: Option<&Destination>,
    candidates: &[Destination],
) -> Result<Destination, ResolveError> {
    let mut best: Option<(&Destination, f64)> =
        primary.map(|d| (d, d.distance_m(latitude, longitude)));

    for candidate in candidates {
        let distance = candidate.distance_m(latitude, longitude);
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((candidate, distance));
        }
    }

    best.map(|(destination, _)| destination.clone())
        .ok_or_else(|| {
            ResolveError::InvalidInput("at least one destination is required".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{HttpError, HttpResponse, MockHttpClient};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn engine_with(
        responses: Vec<Result<HttpResponse, HttpError>>,
        connectivity: Arc<dyn Connectivity>,
    ) -> (Engine, Arc<MockHttpClient>) {
        let client = Arc::new(MockHttpClient::new(responses));
        let engine = Engine::with_client(
            EngineConfig::default(),
            Store::open_in_memory().unwrap(),
            client.clone(),
            connectivity,
        )
        .unwrap();
        (engine, client)
    }

    fn engine(responses: Vec<Result<HttpResponse, HttpError>>) -> (Engine, Arc<MockHttpClient>) {
        engine_with(responses, Arc::new(AlwaysConnected))
    }

    fn not_found() -> Result<HttpResponse, HttpError> {
        Ok(HttpResponse {
            status: 404,
            body: Vec::new(),
        })
    }

    struct Offline;

    impl Connectivity for Offline {
        fn is_connected(&self) -> bool {
            false
        }
    }

    // 105W, not under the 30W rule: the effective date is the requested
    // date (2023-06-01 is a Thursday).
    fn western_cell() -> Graticule {
        Graticule::new(40, false, 105, true)
    }

    #[test]
    fn test_resolve_fetches_derives_and_anchors() {
        let (engine, client) = engine(vec![Ok(HttpResponse::ok("34000.00\n"))]);

        let d = engine
            .resolve(date(2023, 6, 1), Some(western_cell()))
            .unwrap();

        assert!(d.is_valid());
        assert!(d.is_retro());
        assert!((40.0..41.0).contains(&d.latitude()), "lat {}", d.latitude());
        assert!(
            (-106.0..=-105.0).contains(&d.longitude()),
            "lon {}",
            d.longitude()
        );
        assert_eq!(client.requests().len(), 1);
        assert_eq!(
            client.requests()[0],
            "http://irc.peeron.com/xkcd/map/data/2023/06/01"
        );
    }

    #[test]
    fn test_second_resolve_hits_cache() {
        let (engine, client) = engine(vec![Ok(HttpResponse::ok("34000.00"))]);

        let first = engine
            .resolve(date(2023, 6, 1), Some(western_cell()))
            .unwrap();
        let second = engine
            .resolve(date(2023, 6, 1), Some(western_cell()))
            .unwrap();

        assert_eq!(first.latitude(), second.latitude());
        assert_eq!(first.longitude(), second.longitude());
        assert_eq!(client.requests().len(), 1, "second resolve must not fetch");
    }

    #[test]
    fn test_quick_cache_retargets_to_requested_cell() {
        let (engine, client) = engine(vec![Ok(HttpResponse::ok("34000.00"))]);

        engine
            .resolve(date(2023, 6, 1), Some(western_cell()))
            .unwrap();
        // A different cell on the same rule side, same day: served from the
        // quick cache by re-anchoring the fractions.
        let moved = engine
            .resolve(date(2023, 6, 1), Some(Graticule::new(41, false, 106, true)))
            .unwrap();

        assert!((41.0..42.0).contains(&moved.latitude()));
        assert!((-107.0..=-106.0).contains(&moved.longitude()));
        assert_eq!(client.requests().len(), 1);
    }

    #[test]
    fn test_global_resolution_scales_to_globe() {
        let (engine, _) = engine(vec![Ok(HttpResponse::ok("34000.00"))]);

        let d = engine.resolve(date(2023, 6, 1), None).unwrap();

        assert!(d.is_global());
        assert!((-90.0..90.0).contains(&d.latitude()));
        assert!((-180.0..180.0).contains(&d.longitude()));
    }

    #[test]
    fn test_not_posted_reports_request_context() {
        let (engine, _) = engine(vec![not_found(), not_found()]);

        match engine.resolve(date(2023, 6, 1), Some(western_cell())) {
            Err(ResolveError::NotPosted(stub)) => {
                assert!(!stub.is_valid());
                assert_eq!(stub.date(), date(2023, 6, 1));
                assert_eq!(stub.graticule(), Some(&western_cell()));
            }
            other => panic!("expected NotPosted, got {:?}", other),
        }
    }

    #[test]
    fn test_all_mirrors_down_is_network_error() {
        let (engine, _) = engine(vec![
            Err(HttpError::Transport("timed out".into())),
            Err(HttpError::Transport("refused".into())),
        ]);

        assert!(matches!(
            engine.resolve(date(2023, 6, 1), Some(western_cell())),
            Err(ResolveError::Network(_))
        ));
    }

    #[test]
    fn test_offline_short_circuits_before_fetch() {
        let (engine, client) = engine_with(Vec::new(), Arc::new(Offline));

        assert!(matches!(
            engine.resolve(date(2023, 6, 1), Some(western_cell())),
            Err(ResolveError::NoConnection(_))
        ));
        assert!(client.requests().is_empty(), "no fetch may be attempted");
    }

    #[test]
    fn test_failure_does_not_poison_later_resolves() {
        let (engine, _) = engine(vec![not_found(), not_found(), Ok(HttpResponse::ok("34000.00"))]);

        assert!(engine
            .resolve(date(2023, 6, 1), Some(western_cell()))
            .is_err());
        assert!(engine
            .resolve(date(2023, 6, 1), Some(western_cell()))
            .is_ok());
    }

    #[test]
    fn test_neighbors_interior_cell_resolves_all_eight() {
        // All nine cells around 105W share rule membership, so one fetch
        // feeds every neighbor through the caches.
        let (engine, client) = engine(vec![Ok(HttpResponse::ok("34000.00"))]);

        let neighbors = engine.neighbors(date(2023, 6, 1), &western_cell());

        assert_eq!(neighbors.len(), 8);
        assert_eq!(client.requests().len(), 1);
    }

    #[test]
    fn test_neighbors_at_the_pole_skips_polar_row() {
        let (engine, _) = engine(vec![Ok(HttpResponse::ok("34000.00"))]);

        let center = Graticule::new(89, false, 105, true);
        let neighbors = engine.neighbors(date(2023, 6, 1), &center);

        assert_eq!(neighbors.len(), 5, "no cells exist past the north pole");
        for n in &neighbors {
            assert!(n.graticule().unwrap().latitude() <= 89);
        }
    }

    #[test]
    fn test_neighbors_at_the_south_pole() {
        let (engine, _) = engine(vec![Ok(HttpResponse::ok("34000.00"))]);

        let center = Graticule::new(89, true, 105, true);
        assert_eq!(engine.neighbors(date(2023, 6, 1), &center).len(), 5);
    }

    #[test]
    fn test_neighbor_failures_are_dropped_silently() {
        // A 179W center straddles the dateline: the three neighbors at
        // 179E are under the 30W rule and use a different effective date
        // than the five western cells. The first fetch (the 179E column)
        // succeeds; the western column's fetch finds nothing posted, so
        // those five neighbors are absorbed silently.
        let (engine, _) = engine(vec![Ok(HttpResponse::ok("34000.00")), not_found(), not_found()]);

        let center = Graticule::new(40, false, 179, true);
        let neighbors = engine.neighbors(date(2023, 6, 1), &center);

        assert_eq!(neighbors.len(), 3);
        for n in &neighbors {
            let cell = n.graticule().unwrap();
            assert!(!cell.is_west(), "only the eastern column resolved");
            assert_eq!(cell.longitude(), 179);
        }
    }

    #[test]
    fn test_request_with_neighbors() {
        let (engine, _) = engine(vec![Ok(HttpResponse::ok("34000.00"))]);

        let response = engine.request(
            date(2023, 6, 1),
            Some(western_cell()),
            RequestFlags {
                include_neighbors: true,
                user_initiated: true,
            },
        );

        assert!(response.primary.is_ok());
        assert_eq!(response.neighbors.len(), 8);
    }

    #[test]
    fn test_request_without_neighbors() {
        let (engine, _) = engine(vec![Ok(HttpResponse::ok("34000.00"))]);

        let response = engine.request(date(2023, 6, 1), Some(western_cell()), RequestFlags::default());

        assert!(response.primary.is_ok());
        assert!(response.neighbors.is_empty());
    }

    #[test]
    fn test_wipe_cache_forces_a_refetch() {
        let (engine, client) = engine(vec![
            Ok(HttpResponse::ok("34000.00")),
            Ok(HttpResponse::ok("34000.00")),
        ]);

        engine
            .resolve(date(2023, 6, 1), Some(western_cell()))
            .unwrap();
        assert!(engine.wipe_cache());
        engine
            .resolve(date(2023, 6, 1), Some(western_cell()))
            .unwrap();

        assert_eq!(client.requests().len(), 2);
    }

    #[test]
    fn test_closest_picks_nearest() {
        let make = |g: Graticule| Destination::new(0.5, 0.5, Some(g), date(2023, 6, 1));
        let near = make(Graticule::new(40, false, 105, true));
        let far = make(Graticule::new(10, false, 50, true));

        let picked = closest(40.4, -105.4, Some(&far), &[near.clone()]).unwrap();
        assert_eq!(picked, near);
    }

    #[test]
    fn test_closest_with_primary_only() {
        let primary = Destination::new(0.5, 0.5, None, date(2023, 6, 1));
        let picked = closest(0.0, 0.0, Some(&primary), &[]).unwrap();
        assert_eq!(picked, primary);
    }

    #[test]
    fn test_closest_with_nothing_is_invalid_input() {
        assert!(matches!(
            closest(0.0, 0.0, None, &[]),
            Err(ResolveError::InvalidInput(_))
        ));
    }
}
