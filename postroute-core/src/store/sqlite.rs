//! SQLite-backed append-only route store.

use std::{fmt, path::Path, sync::Mutex};

use log::debug;
use rusqlite::{Connection, OptionalExtension};

use crate::cache::BoxError;
use crate::wkt::{decode_linestring, encode_linestring};
use crate::{CacheEntry, CacheError, CacheKey, RouteMetadata};

use super::RouteStore;

const CREATE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS routes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        cache_key TEXT NOT NULL,
        geometry TEXT NOT NULL,
        length_m REAL NOT NULL,
        metadata TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS routes_cache_key ON routes (cache_key);
";

/// Route store persisted in a SQLite database.
///
/// Each `put` inserts a new row; no uniqueness constraint exists on the key.
/// Reads return the row with the lowest id for a key, so the first record
/// ever written for a key stays authoritative. Geometry is stored as WKT and
/// metadata as JSON text.
pub struct SqliteRouteStore {
    connection: Mutex<Connection>,
    location: String,
}

impl fmt::Debug for SqliteRouteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteRouteStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl SqliteRouteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let location = path.display().to_string();
        let connection = Connection::open(path).map_err(|source| CacheError::Open {
            location: location.clone(),
            source: Box::new(source),
        })?;
        Self::with_connection(connection, location)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let connection = Connection::open_in_memory().map_err(|source| CacheError::Open {
            location: ":memory:".to_owned(),
            source: Box::new(source),
        })?;
        Self::with_connection(connection, ":memory:".to_owned())
    }

    fn with_connection(connection: Connection, location: String) -> Result<Self, CacheError> {
        connection
            .execute_batch(CREATE_SCHEMA)
            .map_err(|source| CacheError::Schema {
                source: Box::new(source),
            })?;
        debug!("route store ready at {location}");
        Ok(Self {
            connection: Mutex::new(connection),
            location,
        })
    }

    /// Number of rows stored under `key`, duplicates included.
    pub fn count(&self, key: &CacheKey) -> Result<usize, CacheError> {
        let connection = self.connection.lock().map_err(|_| CacheError::Poisoned)?;
        let count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM routes WHERE cache_key = ?1",
                [key.encode()],
                |row| row.get(0),
            )
            .map_err(|source| CacheError::Read {
                key: key.to_string(),
                source: Box::new(source),
            })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl RouteStore for SqliteRouteStore {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let row: Option<(String, f64, String)> = {
            let connection = self.connection.lock().map_err(|_| CacheError::Poisoned)?;
            connection
                .query_row(
                    "SELECT geometry, length_m, metadata FROM routes
                     WHERE cache_key = ?1 ORDER BY id LIMIT 1",
                    [key.encode()],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()
                .map_err(|source| CacheError::Read {
                    key: key.to_string(),
                    source: Box::new(source),
                })?
        };

        let Some((geometry, length_m, metadata)) = row else {
            return Ok(None);
        };
        let decode_error = |source: BoxError| CacheError::Decode {
            key: key.to_string(),
            source,
        };
        let geometry = decode_linestring(&geometry).map_err(|err| decode_error(Box::new(err)))?;
        let metadata: RouteMetadata =
            serde_json::from_str(&metadata).map_err(|err| decode_error(Box::new(err)))?;
        Ok(Some(CacheEntry::new(key.clone(), geometry, length_m, metadata)))
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let metadata = serde_json::to_string(&entry.metadata).map_err(|source| CacheError::Encode {
            key: entry.key.to_string(),
            source: Box::new(source),
        })?;
        let geometry = encode_linestring(&entry.geometry);

        let connection = self.connection.lock().map_err(|_| CacheError::Poisoned)?;
        connection
            .execute(
                "INSERT INTO routes (cache_key, geometry, length_m, metadata)
                 VALUES (?1, ?2, ?3, ?4)",
                (entry.key.encode(), geometry, entry.length_m, metadata),
            )
            .map(|_| ())
            .map_err(|source| CacheError::Write {
                key: entry.key.to_string(),
                source: Box::new(source),
            })
    }
}
