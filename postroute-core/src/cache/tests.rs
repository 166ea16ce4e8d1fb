use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use geo::{Coord, LineString};
use rstest::{fixture, rstest};

use super::*;
use crate::test_support::FailingRouteStore;
use crate::{Endpoint, MemoryRouteStore};

#[fixture]
fn key() -> CacheKey {
    let a = Endpoint::Coordinate(Coord { x: 23.59, y: 46.77 });
    let b = Endpoint::Coordinate(Coord { x: 23.60, y: 46.78 });
    CacheKey::new("net", &a, &b)
}

fn entry_for(key: &CacheKey, length_m: f64) -> CacheEntry {
    CacheEntry::new(
        key.clone(),
        LineString::new(vec![
            Coord { x: 23.59, y: 46.77 },
            Coord { x: 23.60, y: 46.78 },
        ]),
        length_m,
        RouteMetadata::default(),
    )
}

#[rstest]
fn concurrent_callers_share_one_computation(key: CacheKey) {
    const CALLERS: usize = 8;
    let cache = Arc::new(RouteCache::new(MemoryRouteStore::default()));
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            let barrier = Arc::clone(&barrier);
            let key = key.clone();
            thread::spawn(move || {
                barrier.wait();
                cache.get_or_compute(&key, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(50));
                    Ok(entry_for(&key, 1_000.0))
                })
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("caller thread panicked"))
        .map(|result| result.expect("route computed"))
        .collect();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.store().count(&key), 1);
    assert_eq!(
        results
            .iter()
            .filter(|route| route.source == SegmentSource::Solved)
            .count(),
        1
    );
    assert!(results.iter().all(|route| route.entry == results[0].entry));
}

#[rstest]
fn empty_result_is_remembered(key: CacheKey) {
    let cache = RouteCache::new(MemoryRouteStore::default());
    let calls = AtomicUsize::new(0);
    let compute = || {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(PathSolveError::EmptyResult)
    };

    assert_eq!(cache.get_or_compute(&key, compute), Err(PathSolveError::EmptyResult));
    assert_eq!(cache.get_or_compute(&key, compute), Err(PathSolveError::EmptyResult));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(cache.store().is_empty());
}

#[rstest]
fn solver_failures_are_retried(key: CacheKey) {
    let cache = RouteCache::new(MemoryRouteStore::default());
    let failure = PathSolveError::Timeout { seconds: 1 };

    let first = cache.get_or_compute(&key, || Err(failure.clone()));
    assert_eq!(first, Err(failure));

    let second = cache
        .get_or_compute(&key, || Ok(entry_for(&key, 42.0)))
        .expect("second attempt computes");
    assert_eq!(second.source, SegmentSource::Solved);
    assert_eq!(cache.store().count(&key), 1);
}

#[rstest]
fn broken_store_falls_through_to_computation(key: CacheKey) {
    let cache = RouteCache::new(FailingRouteStore);
    let calls = AtomicUsize::new(0);
    let compute = || {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(entry_for(&key, 7.5))
    };

    let first = cache.get_or_compute(&key, compute).expect("served uncached");
    let second = cache.get_or_compute(&key, compute).expect("served uncached");

    assert_eq!(first.entry.length_m, 7.5);
    assert_eq!(second.source, SegmentSource::Solved);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.get(&key), None);
}

#[rstest]
fn existing_records_are_not_recomputed(key: CacheKey) {
    let store = MemoryRouteStore::default();
    store.put(&entry_for(&key, 3.0)).expect("seed store");
    let cache = RouteCache::new(store);

    let route = cache
        .get_or_compute(&key, || unreachable!("stored routes are never recomputed"))
        .expect("cache hit");
    assert_eq!(route.source, SegmentSource::Cached);
    assert_eq!(route.entry.length_m, 3.0);
}

/// Store whose reads stall on the thread named `late`.
struct StallingStore {
    inner: MemoryRouteStore,
    stall: Duration,
}

impl RouteStore for StallingStore {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        if thread::current().name() == Some("late") {
            thread::sleep(self.stall);
        }
        self.inner.get(key)
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        self.inner.put(entry)
    }
}

#[rstest]
fn late_caller_sees_remembered_empty_result(key: CacheKey) {
    let cache = Arc::new(RouteCache::new(StallingStore {
        inner: MemoryRouteStore::default(),
        stall: Duration::from_millis(150),
    }));
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["early", "late"]
        .into_iter()
        .map(|name| {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            let barrier = Arc::clone(&barrier);
            let key = key.clone();
            thread::Builder::new()
                .name(name.to_owned())
                .spawn(move || {
                    barrier.wait();
                    cache.get_or_compute(&key, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        Err(PathSolveError::EmptyResult)
                    })
                })
                .expect("spawn caller thread")
        })
        .collect();

    for handle in handles {
        let result = handle.join().expect("caller thread panicked");
        assert_eq!(result, Err(PathSolveError::EmptyResult));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
