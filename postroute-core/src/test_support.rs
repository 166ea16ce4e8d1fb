//! Test doubles shared by unit and behaviour tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use geo::{Coord, LineString};

use crate::{
    CacheEntry, CacheError, CacheKey, LocationPoint, PathRequest, PathSolveError, PathSolver,
    PointsDataset, RouteStore, SolvedPath, haversine_distance_m,
};

/// Ratio between the stub's road length and the great-circle distance.
pub const STUB_DETOUR_FACTOR: f64 = 1.25;

/// Deterministic [`PathSolver`] that counts its invocations.
///
/// Paths run through the midpoint of the two endpoints and are
/// [`STUB_DETOUR_FACTOR`] times longer than the great-circle distance, so a
/// solved segment is always distinguishable from an estimate.
#[derive(Debug, Default)]
pub struct StubPathSolver {
    calls: AtomicUsize,
    delay: Duration,
    failures: HashMap<String, PathSolveError>,
}

impl StubPathSolver {
    /// Sleep for `delay` inside every call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail every request whose destination label is `label`.
    #[must_use]
    pub fn failing_to(mut self, label: impl Into<String>, error: PathSolveError) -> Self {
        self.failures.insert(label.into(), error);
        self
    }

    /// Report no connecting path for requests ending at `label`.
    #[must_use]
    pub fn without_path_to(self, label: impl Into<String>) -> Self {
        self.failing_to(label, PathSolveError::EmptyResult)
    }

    /// Number of `solve` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PathSolver for StubPathSolver {
    fn solve(&self, request: &PathRequest) -> Result<SolvedPath, PathSolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if let Some(error) = self.failures.get(&request.end.label()) {
            return Err(error.clone());
        }
        let start = request.start.location();
        let end = request.end.location();
        let midpoint = Coord {
            x: (start.x + end.x) / 2.0,
            y: (start.y + end.y) / 2.0,
        };
        Ok(SolvedPath {
            geometry: LineString::new(vec![start, midpoint, end]),
            length_m: haversine_distance_m(start, end) * STUB_DETOUR_FACTOR,
        })
    }
}

/// [`RouteStore`] whose every operation fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingRouteStore;

impl RouteStore for FailingRouteStore {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        Err(CacheError::Read {
            key: key.to_string(),
            source: "store offline".into(),
        })
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        Err(CacheError::Write {
            key: entry.key.to_string(),
            source: "store offline".into(),
        })
    }
}

/// Small dataset around Cluj-Napoca.
///
/// Postcode `400001` holds two points so that hints select between them;
/// `400002` and `400003` hold one each; `400004` has no address.
pub fn sample_dataset() -> PointsDataset {
    PointsDataset::new(vec![
        LocationPoint::new("400001", Coord { x: 23.5899, y: 46.7712 })
            .with_address("Strada Memorandumului 28")
            .with_city("Cluj-Napoca"),
        LocationPoint::new("400001", Coord { x: 23.5921, y: 46.7695 })
            .with_address("Piata Unirii 1")
            .with_city("Cluj-Napoca"),
        LocationPoint::new("400002", Coord { x: 23.6236, y: 46.7784 })
            .with_address("Strada Traian Vuia 149")
            .with_city("Cluj-Napoca"),
        LocationPoint::new("400003", Coord { x: 23.5546, y: 46.7538 })
            .with_address("Strada Fabricii 1")
            .with_city("Floresti"),
        LocationPoint::new("400004", Coord { x: 23.6012, y: 46.7901 }).with_city("Cluj-Napoca"),
    ])
}
