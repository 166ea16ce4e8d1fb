//! Boundary adapters for the postroute engine.
//!
//! Responsibilities:
//! - Load the points dataset from GeoJSON.
//! - Provide [`postroute_core::PathSolver`] implementations that talk to
//!   external routers (subprocess and HTTP).
//!
//! Boundaries:
//! - Do not encode domain rules (live in `postroute-core`).
//! - Keep async I/O behind the synchronous solver trait.
//!
//! Invariants:
//! - Solvers are `Send + Sync` and hold no per-request state.
//! - No global mutable state.

pub mod points;
pub mod routing;

pub use points::{PointsLoadError, load_points, parse_points};
