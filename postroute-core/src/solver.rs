//! Boundary to the external road-network path computation.

use std::sync::Arc;

use geo::LineString;
use thiserror::Error;

use crate::Endpoint;

/// Endpoints of one path computation.
#[derive(Debug, Clone, PartialEq)]
pub struct PathRequest {
    /// Resolved origin.
    pub start: Endpoint,
    /// Resolved destination.
    pub end: Endpoint,
}

impl PathRequest {
    /// Pair two resolved endpoints.
    pub const fn new(start: Endpoint, end: Endpoint) -> Self {
        Self { start, end }
    }
}

/// A path produced by a solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedPath {
    /// Path geometry in WGS84.
    pub geometry: LineString<f64>,
    /// Path length in metres.
    pub length_m: f64,
}

/// Errors from [`PathSolver::solve`].
///
/// [`PathSolveError::EmptyResult`] is the legitimate "no connecting path"
/// answer. Every other variant means the solver itself failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathSolveError {
    /// The computation succeeded but found no connecting path.
    #[error("no path connects the requested endpoints")]
    EmptyResult,
    /// The external process exited unsuccessfully.
    #[error("path solver exited with {status}: {stderr}")]
    ExitStatus {
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },
    /// The computation did not finish in time.
    #[error("path solver timed out after {seconds}s")]
    Timeout {
        /// Timeout that elapsed, in seconds.
        seconds: u64,
    },
    /// Spawning the solver or exchanging files failed.
    #[error("path solver I/O failed: {message}")]
    Io {
        /// I/O error description.
        message: String,
    },
    /// The solver produced output that could not be interpreted.
    #[error("path solver produced invalid output: {message}")]
    InvalidOutput {
        /// Decoding error description.
        message: String,
    },
    /// A remote routing service returned an error code.
    #[error("routing service error {code}: {message}")]
    Service {
        /// Service error code.
        code: String,
        /// Service error message.
        message: String,
    },
    /// A remote routing service could not be reached.
    #[error("routing service request failed: {message}")]
    Network {
        /// Transport error description.
        message: String,
    },
}

impl PathSolveError {
    /// Whether this is the "no connecting path" outcome rather than a failure.
    pub const fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult)
    }
}

/// Compute a road path between two resolved endpoints.
///
/// Calls may block for a long time and consume scarce resources (processes,
/// temporary files, remote capacity). Solvers must be `Send + Sync` so one
/// instance can serve every worker thread.
///
/// # Examples
/// ```
/// use geo::{Coord, LineString};
/// use postroute_core::{Endpoint, PathRequest, PathSolveError, PathSolver, SolvedPath};
///
/// struct Straight;
///
/// impl PathSolver for Straight {
///     fn solve(&self, request: &PathRequest) -> Result<SolvedPath, PathSolveError> {
///         if request.start == request.end {
///             return Err(PathSolveError::EmptyResult);
///         }
///         Ok(SolvedPath {
///             geometry: LineString::new(vec![request.start.location(), request.end.location()]),
///             length_m: 1.0,
///         })
///     }
/// }
///
/// let a = Endpoint::Coordinate(Coord { x: 0.0, y: 0.0 });
/// let b = Endpoint::Coordinate(Coord { x: 0.0, y: 1.0 });
/// assert!(Straight.solve(&PathRequest::new(a.clone(), b)).is_ok());
/// assert!(Straight.solve(&PathRequest::new(a.clone(), a)).unwrap_err().is_empty_result());
/// ```
pub trait PathSolver: Send + Sync {
    /// Solve one request.
    fn solve(&self, request: &PathRequest) -> Result<SolvedPath, PathSolveError>;
}

impl<P: PathSolver + ?Sized> PathSolver for Box<P> {
    fn solve(&self, request: &PathRequest) -> Result<SolvedPath, PathSolveError> {
        (**self).solve(request)
    }
}

impl<P: PathSolver + ?Sized> PathSolver for Arc<P> {
    fn solve(&self, request: &PathRequest) -> Result<SolvedPath, PathSolveError> {
        (**self).solve(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PathSolveError::EmptyResult, true)]
    #[case(PathSolveError::Timeout { seconds: 300 }, false)]
    #[case(PathSolveError::ExitStatus { status: "exit status: 1".into(), stderr: String::new() }, false)]
    #[case(PathSolveError::Service { code: "NoRoute".into(), message: String::new() }, false)]
    fn only_empty_result_is_no_path(#[case] error: PathSolveError, #[case] expected: bool) {
        assert_eq!(error.is_empty_result(), expected);
    }

    #[rstest]
    fn boxed_solvers_delegate() {
        struct Fails;
        impl PathSolver for Fails {
            fn solve(&self, _: &PathRequest) -> Result<SolvedPath, PathSolveError> {
                Err(PathSolveError::EmptyResult)
            }
        }
        let boxed: Box<dyn PathSolver> = Box::new(Fails);
        let shared = Arc::new(boxed);
        let point = Endpoint::Coordinate(geo::Coord { x: 0.0, y: 0.0 });
        let request = PathRequest::new(point.clone(), point);
        assert_eq!(shared.solve(&request), Err(PathSolveError::EmptyResult));
    }
}
