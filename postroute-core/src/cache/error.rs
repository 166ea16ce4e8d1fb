use thiserror::Error;

/// Boxed backend error carried as a [`CacheError`] source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from a [`RouteStore`](crate::RouteStore).
///
/// Store failures are never fatal to a route request: the cache logs them
/// and falls through to direct computation.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store could not be opened.
    #[error("failed to open route store at {location}: {source}")]
    Open {
        /// Path or connection string of the store.
        location: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },
    /// Creating or validating the store schema failed.
    #[error("failed to prepare route store schema: {source}")]
    Schema {
        /// Backend error.
        #[source]
        source: BoxError,
    },
    /// Reading a record failed.
    #[error("failed to read route for {key}: {source}")]
    Read {
        /// Displayed cache key.
        key: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },
    /// Writing a record failed.
    #[error("failed to write route for {key}: {source}")]
    Write {
        /// Displayed cache key.
        key: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },
    /// A stored record could not be decoded.
    #[error("stored route for {key} is corrupt: {source}")]
    Decode {
        /// Displayed cache key.
        key: String,
        /// Decoding error.
        #[source]
        source: BoxError,
    },
    /// A record could not be encoded for storage.
    #[error("failed to encode route for {key}: {source}")]
    Encode {
        /// Displayed cache key.
        key: String,
        /// Encoding error.
        #[source]
        source: BoxError,
    },
    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("route store lock poisoned")]
    Poisoned,
}
