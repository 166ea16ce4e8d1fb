//! Error types emitted by the postroute CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use postroute_core::{OrchestratorBuildError, QueryParseError, RouteError};
use postroute_data::PointsLoadError;
use postroute_data::routing::SolverBuildError;
use thiserror::Error;

/// Errors emitted by the postroute CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// Two mutually exclusive solver back ends were both configured.
    #[error("configure either --{ARG_PROGRAM} or --{ARG_OSRM}, not both", ARG_PROGRAM = crate::ARG_SOLVER_PROGRAM, ARG_OSRM = crate::ARG_OSRM_BASE_URL)]
    ConflictingSolvers,
    /// An endpoint identifier could not be parsed.
    #[error("invalid {field} endpoint: {source}")]
    InvalidEndpoint {
        field: &'static str,
        #[source]
        source: QueryParseError,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The points dataset could not be loaded.
    #[error(transparent)]
    LoadPoints(#[from] PointsLoadError),
    /// Constructing the path solver failed.
    #[error("failed to build path solver: {0}")]
    BuildSolver(#[source] SolverBuildError),
    /// Constructing the route orchestrator failed.
    #[error("failed to build route orchestrator: {0}")]
    BuildOrchestrator(#[from] OrchestratorBuildError),
    /// The route request was rejected.
    #[error("route request failed: {0}")]
    Route(#[from] RouteError),
    /// Serialising the response failed.
    #[error("failed to serialise route response: {0}")]
    SerialiseResponse(#[source] serde_json::Error),
    /// Writing the response failed.
    #[error("failed to write route response: {0}")]
    WriteOutput(#[source] std::io::Error),
}
