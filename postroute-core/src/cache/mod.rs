//! Single-flight get-or-compute over a [`RouteStore`].
//!
//! [`RouteCache`] guarantees at most one computation per [`CacheKey`] in
//! flight at a time. Concurrent callers for the same key block on the
//! in-flight computation and share its outcome. Store failures are logged
//! and never surface to callers: a broken store degrades to direct
//! computation.

mod entry;
mod error;

pub use entry::{CacheEntry, CacheKey, RouteMetadata};
pub use error::{BoxError, CacheError};

use std::sync::{Arc, OnceLock};

use dashmap::{DashMap, DashSet};
use log::{debug, warn};

use crate::{PathSolveError, RouteStore, SegmentSource};

type Flight = Arc<OnceLock<Result<CacheEntry, PathSolveError>>>;

/// Record returned by [`RouteCache::get_or_compute`].
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRoute {
    /// The route record.
    pub entry: CacheEntry,
    /// [`SegmentSource::Solved`] when this call ran the computation,
    /// otherwise [`SegmentSource::Cached`].
    pub source: SegmentSource,
}

/// Get-or-compute cache with per-key single-flight.
///
/// Keys whose computation reported [`PathSolveError::EmptyResult`] are
/// remembered for the lifetime of the cache so the solver is not asked again
/// for a pair it already found unconnected. Other solver failures are not
/// remembered.
///
/// # Examples
/// ```
/// use geo::{Coord, LineString};
/// use postroute_core::{
///     CacheEntry, CacheKey, Endpoint, MemoryRouteStore, RouteCache, RouteMetadata,
///     SegmentSource,
/// };
///
/// let a = Endpoint::Coordinate(Coord { x: 0.0, y: 0.0 });
/// let b = Endpoint::Coordinate(Coord { x: 0.0, y: 1.0 });
/// let key = CacheKey::new("net", &a, &b);
/// let cache = RouteCache::new(MemoryRouteStore::default());
///
/// let compute = || {
///     Ok(CacheEntry::new(
///         key.clone(),
///         LineString::new(vec![a.location(), b.location()]),
///         111_195.0,
///         RouteMetadata::between(&a, &b),
///     ))
/// };
/// let first = cache.get_or_compute(&key, compute)?;
/// let second = cache.get_or_compute(&key, compute)?;
///
/// assert_eq!(first.source, SegmentSource::Solved);
/// assert_eq!(second.source, SegmentSource::Cached);
/// assert_eq!(first.entry, second.entry);
/// # Ok::<(), postroute_core::PathSolveError>(())
/// ```
#[derive(Debug)]
pub struct RouteCache<S> {
    store: S,
    in_flight: DashMap<CacheKey, Flight>,
    unconnected: DashSet<CacheKey>,
}

impl<S: RouteStore> RouteCache<S> {
    /// Wrap a store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            in_flight: DashMap::new(),
            unconnected: DashSet::new(),
        }
    }

    /// The wrapped store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Read the earliest record for `key`; store failures read as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.store.get(key) {
            Ok(Some(entry)) => {
                debug!("route cache hit for {key}");
                Some(entry)
            }
            Ok(None) => None,
            Err(err) => {
                warn!("route store read failed, treating as miss: {err}");
                None
            }
        }
    }

    /// Return the record for `key`, running `compute` at most once across
    /// all concurrent callers when it is missing.
    ///
    /// A computed record is appended to the store before waiters are
    /// released. When the append fails the record is still returned.
    pub fn get_or_compute<F>(&self, key: &CacheKey, compute: F) -> Result<CachedRoute, PathSolveError>
    where
        F: FnOnce() -> Result<CacheEntry, PathSolveError>,
    {
        if self.unconnected.contains(key) {
            debug!("route cache remembers no path for {key}");
            return Err(PathSolveError::EmptyResult);
        }
        if let Some(entry) = self.get(key) {
            return Ok(CachedRoute {
                entry,
                source: SegmentSource::Cached,
            });
        }

        let flight: Flight = self.in_flight.entry(key.clone()).or_default().clone();
        let mut source = SegmentSource::Cached;
        let outcome = flight
            .get_or_init(|| {
                if self.unconnected.contains(key) {
                    return Err(PathSolveError::EmptyResult);
                }
                if let Some(entry) = self.get(key) {
                    return Ok(entry);
                }
                source = SegmentSource::Solved;
                let computed = compute();
                match &computed {
                    Ok(entry) => self.persist(entry),
                    Err(PathSolveError::EmptyResult) => {
                        self.unconnected.insert(key.clone());
                    }
                    Err(_) => {}
                }
                computed
            })
            .clone();
        self.in_flight
            .remove_if(key, |_, current| Arc::ptr_eq(current, &flight));

        outcome.map(|entry| CachedRoute { entry, source })
    }

    fn persist(&self, entry: &CacheEntry) {
        if let Err(err) = self.store.put(entry) {
            warn!("route store write failed, serving uncached route: {err}");
        }
    }
}

#[cfg(test)]
mod tests;
