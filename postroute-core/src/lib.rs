//! Core routing domain for the postroute engine.
//!
//! Location queries are resolved against an immutable points dataset,
//! routes are looked up in an append-only store keyed by resolved endpoint
//! identity, and misses are computed by a pluggable [`PathSolver`] under a
//! single-flight guarantee. When no path can be solved a great-circle
//! estimate takes its place so that one failing leg never sinks a
//! multi-destination request.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cache;
mod dataset;
mod estimate;
pub mod orchestrator;
mod point;
mod query;
mod resolver;
mod segment;
mod solver;
pub mod store;
pub mod table;
pub mod wkt;

#[doc(hidden)]
pub mod test_support;

pub use cache::{CacheEntry, CacheError, CacheKey, CachedRoute, RouteCache, RouteMetadata};
pub use dataset::PointsDataset;
pub use estimate::{
    EARTH_RADIUS_M, FallbackDistanceEstimator, haversine_distance_m, line_length_m,
};
pub use orchestrator::{OrchestratorBuildError, OrchestratorConfig, RouteError, RouteOrchestrator};
pub use point::{Endpoint, EndpointIdentity, LocationPoint};
pub use query::{
    LocationQuery, PostcodeQuery, QueryParseError, RouteQuery, parse_endpoints, split_hints,
    split_identifiers,
};
pub use resolver::{LocationResolver, MatchRule, ResolveError};
pub use segment::{LegOutcome, RouteLeg, RouteResult, RouteSegment, SegmentSource};
pub use solver::{PathRequest, PathSolveError, PathSolver, SolvedPath};
pub use store::{MemoryRouteStore, RouteStore};
#[cfg(feature = "store-sqlite")]
pub use store::SqliteRouteStore;
pub use table::{RouteTable, TableLayout, TableRow};
