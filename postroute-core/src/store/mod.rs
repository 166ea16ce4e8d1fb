//! Persistence for solved routes.
//!
//! A [`RouteStore`] is an append-only ledger keyed by [`CacheKey`]. Records
//! are never overwritten; duplicate writes for one key are tolerated and
//! readers take the earliest record.

use std::sync::{Arc, RwLock};

use crate::{CacheEntry, CacheError, CacheKey};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteRouteStore;

/// Keyed access to persisted route records.
///
/// Implementations are shared across worker threads and must be
/// `Send + Sync`. Concurrent writers for different keys must not conflict.
///
/// # Examples
///
/// ```rust
/// use geo::{Coord, LineString};
/// use postroute_core::{
///     CacheEntry, CacheKey, Endpoint, MemoryRouteStore, RouteMetadata, RouteStore,
/// };
///
/// let a = Endpoint::Coordinate(Coord { x: 0.0, y: 0.0 });
/// let b = Endpoint::Coordinate(Coord { x: 0.0, y: 1.0 });
/// let key = CacheKey::new("net", &a, &b);
///
/// let store = MemoryRouteStore::default();
/// assert!(store.get(&key)?.is_none());
///
/// let entry = CacheEntry::new(
///     key.clone(),
///     LineString::new(vec![a.location(), b.location()]),
///     111_195.0,
///     RouteMetadata::between(&a, &b),
/// );
/// store.put(&entry)?;
/// assert_eq!(store.get(&key)?, Some(entry));
/// # Ok::<(), postroute_core::CacheError>(())
/// ```
pub trait RouteStore: Send + Sync {
    /// Return the earliest record stored under `key`.
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    /// Append a record. Existing records are left untouched.
    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError>;
}

impl<S: RouteStore + ?Sized> RouteStore for Box<S> {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        (**self).get(key)
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        (**self).put(entry)
    }
}

impl<S: RouteStore + ?Sized> RouteStore for Arc<S> {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        (**self).get(key)
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        (**self).put(entry)
    }
}

/// In-process append-only store.
///
/// The ledger lives for as long as the store; nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryRouteStore {
    records: RwLock<Vec<CacheEntry>>,
}

impl MemoryRouteStore {
    /// Number of records appended so far, duplicates included.
    pub fn len(&self) -> usize {
        self.records.read().map_or(0, |records| records.len())
    }

    /// Whether no record has been appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records appended under `key`.
    pub fn count(&self, key: &CacheKey) -> usize {
        self.records.read().map_or(0, |records| {
            records.iter().filter(|entry| &entry.key == key).count()
        })
    }
}

impl RouteStore for MemoryRouteStore {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let records = self.records.read().map_err(|_| CacheError::Poisoned)?;
        Ok(records.iter().find(|entry| &entry.key == key).cloned())
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let mut records = self.records.write().map_err(|_| CacheError::Poisoned)?;
        records.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Endpoint, RouteMetadata};
    use geo::{Coord, LineString};
    use rstest::rstest;

    fn entry(length_m: f64) -> CacheEntry {
        let a = Endpoint::Coordinate(Coord { x: 0.0, y: 0.0 });
        let b = Endpoint::Coordinate(Coord { x: 1.0, y: 1.0 });
        CacheEntry::new(
            CacheKey::new("net", &a, &b),
            LineString::new(vec![a.location(), b.location()]),
            length_m,
            RouteMetadata::between(&a, &b),
        )
    }

    #[rstest]
    fn readers_take_the_earliest_record() {
        let store = MemoryRouteStore::default();
        let first = entry(10.0);
        let second = entry(20.0);
        store.put(&first).expect("put first");
        store.put(&second).expect("put second");

        assert_eq!(store.count(&first.key), 2);
        let found = store.get(&first.key).expect("get").expect("present");
        assert_eq!(found.length_m, 10.0);
    }

    #[rstest]
    fn shared_store_delegates() {
        let store: Arc<dyn RouteStore> = Arc::new(MemoryRouteStore::default());
        let record = entry(5.0);
        store.put(&record).expect("put");
        assert_eq!(store.get(&record.key).expect("get"), Some(record));
    }
}
