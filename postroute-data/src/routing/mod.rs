//! `PathSolver` implementations backed by external routers.
//!
//! Two interchangeable solvers are provided:
//!
//! - [`ProcessPathSolver`] runs a GIS routing program per request, exchanging
//!   GeoJSON files through a temporary directory under a bounded timeout.
//! - [`OsrmPathSolver`] asks an OSRM `route/v1` service over HTTP.
//!
//! Both implement the synchronous [`postroute_core::PathSolver`] trait by
//! blocking on async work internally, keeping the orchestrator free of any
//! async runtime.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use postroute_data::routing::{PathStrategy, ProcessPathSolver, ProcessPathSolverConfig};
//!
//! let config = ProcessPathSolverConfig::new("python", "data/roads.gpkg")
//!     .with_args(["processing/run_routing.py"])
//!     .with_strategy(PathStrategy::Shortest)
//!     .with_timeout(Duration::from_secs(120));
//! let solver = ProcessPathSolver::new(config)?;
//! # Ok::<(), postroute_data::routing::SolverBuildError>(())
//! ```

mod geometry;
mod http;
mod osrm;
mod process;
mod runtime;

#[doc(hidden)]
pub mod test_support;

pub use http::{DEFAULT_PROFILE, DEFAULT_USER_AGENT, OsrmPathSolver, OsrmPathSolverConfig};
pub use process::{
    DEFAULT_SOLVER_TIMEOUT, DEFAULT_SPEED_KMH, DEFAULT_TOLERANCE_M, ParsePathStrategyError,
    PathStrategy, ProcessPathSolver, ProcessPathSolverConfig, SPEED_RANGE_KMH, TOLERANCE_RANGE_M,
};
pub use runtime::SolverBuildError;
