//! Facade crate for the postroute engine.
//!
//! This crate re-exports the core routing domain and exposes the boundary
//! adapters (points loader, subprocess and OSRM path solvers) behind the
//! `data` feature. The SQLite route store is available with `store-sqlite`.

#![forbid(unsafe_code)]

pub use postroute_core::{
    CacheEntry, CacheError, CacheKey, CachedRoute, Endpoint, EndpointIdentity,
    FallbackDistanceEstimator, LegOutcome, LocationPoint, LocationQuery, LocationResolver,
    MatchRule, MemoryRouteStore, OrchestratorBuildError, OrchestratorConfig, PathRequest,
    PathSolveError, PathSolver, PointsDataset, PostcodeQuery, QueryParseError, ResolveError,
    RouteCache, RouteError, RouteLeg, RouteMetadata, RouteOrchestrator, RouteQuery, RouteResult,
    RouteSegment, RouteStore, RouteTable, SegmentSource, SolvedPath, TableLayout, TableRow,
    haversine_distance_m, line_length_m, parse_endpoints, split_hints, split_identifiers, table,
    wkt,
};

#[cfg(feature = "store-sqlite")]
pub use postroute_core::SqliteRouteStore;

#[cfg(feature = "data")]
pub use postroute_data::{PointsLoadError, load_points, parse_points};

#[cfg(feature = "data")]
pub use postroute_data::routing::{
    OsrmPathSolver, OsrmPathSolverConfig, PathStrategy, ProcessPathSolver,
    ProcessPathSolverConfig, SolverBuildError,
};
