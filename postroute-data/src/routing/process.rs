//! Subprocess `PathSolver` exchanging GeoJSON files with an external router.
//!
//! Each call writes the two endpoints as single-feature point layers into a
//! fresh temporary directory, runs
//!
//! ```text
//! program [args…] --network <file> --strategy <fastest|shortest>
//!     --default-speed <kmh> --tolerance <m> <start.geojson> <end.geojson> <output.geojson>
//! ```
//!
//! and reads the first line feature back from the output file. The directory
//! is removed when the call returns.

use std::fmt;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use log::debug;
use postroute_core::{Endpoint, PathRequest, PathSolveError, PathSolver, SolvedPath};
use tokio::process::Command;

use super::geometry::{first_line, length_or_measured};
use super::runtime::{BlockingRuntime, SolverBuildError, check_range};

/// Default travel speed for roads without one, in km/h.
pub const DEFAULT_SPEED_KMH: f64 = 50.0;
/// Accepted default-speed range, in km/h.
pub const SPEED_RANGE_KMH: (f64, f64) = (5.0, 150.0);
/// Default topology tolerance, in metres.
pub const DEFAULT_TOLERANCE_M: f64 = 0.0;
/// Accepted topology tolerance range, in metres.
pub const TOLERANCE_RANGE_M: (f64, f64) = (0.0, 15.0);
/// Default bound on a single solver run.
pub const DEFAULT_SOLVER_TIMEOUT: Duration = Duration::from_secs(300);

const START_FILE: &str = "start.geojson";
const END_FILE: &str = "end.geojson";
const OUTPUT_FILE: &str = "output.geojson";

/// Cost the external router minimises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStrategy {
    /// Minimise travel time.
    #[default]
    Fastest,
    /// Minimise distance.
    Shortest,
}

impl PathStrategy {
    /// Command-line spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fastest => "fastest",
            Self::Shortest => "shortest",
        }
    }
}

impl fmt::Display for PathStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`PathStrategy`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown path strategy {0:?}; expected `fastest` or `shortest`")]
pub struct ParsePathStrategyError(String);

impl FromStr for PathStrategy {
    type Err = ParsePathStrategyError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "fastest" => Ok(Self::Fastest),
            "shortest" => Ok(Self::Shortest),
            _ => Err(ParsePathStrategyError(input.to_owned())),
        }
    }
}

/// Configuration for [`ProcessPathSolver`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessPathSolverConfig {
    /// Executable to run.
    pub program: Utf8PathBuf,
    /// Arguments placed before the generated ones.
    pub args: Vec<String>,
    /// Road network dataset handed to every run.
    pub network: Utf8PathBuf,
    /// Cost to minimise.
    pub strategy: PathStrategy,
    /// Speed assumed for roads without one, in km/h.
    pub default_speed_kmh: f64,
    /// Snapping tolerance when building the network topology, in metres.
    pub tolerance_m: f64,
    /// Upper bound on one run; the process is killed when it elapses.
    pub timeout: Duration,
}

impl ProcessPathSolverConfig {
    /// Configure `program` against the `network` dataset with defaults.
    pub fn new(program: impl Into<Utf8PathBuf>, network: impl Into<Utf8PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            network: network.into(),
            strategy: PathStrategy::default(),
            default_speed_kmh: DEFAULT_SPEED_KMH,
            tolerance_m: DEFAULT_TOLERANCE_M,
            timeout: DEFAULT_SOLVER_TIMEOUT,
        }
    }

    /// Set leading arguments, such as a script path for an interpreter.
    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the path strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: PathStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the default road speed.
    #[must_use]
    pub const fn with_default_speed_kmh(mut self, speed: f64) -> Self {
        self.default_speed_kmh = speed;
        self
    }

    /// Set the topology tolerance.
    #[must_use]
    pub const fn with_tolerance_m(mut self, tolerance: f64) -> Self {
        self.tolerance_m = tolerance;
        self
    }

    /// Set the per-run timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the numeric parameters against their accepted ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SolverBuildError::OutOfRange`] for the first offending value.
    pub fn validate(&self) -> Result<(), SolverBuildError> {
        check_range(
            "default speed (km/h)",
            self.default_speed_kmh,
            SPEED_RANGE_KMH.0,
            SPEED_RANGE_KMH.1,
        )?;
        check_range(
            "tolerance (m)",
            self.tolerance_m,
            TOLERANCE_RANGE_M.0,
            TOLERANCE_RANGE_M.1,
        )
    }

    fn command_args(&self, start: &Utf8Path, end: &Utf8Path, output: &Utf8Path) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend([
            "--network".to_owned(),
            self.network.to_string(),
            "--strategy".to_owned(),
            self.strategy.to_string(),
            "--default-speed".to_owned(),
            self.default_speed_kmh.to_string(),
            "--tolerance".to_owned(),
            self.tolerance_m.to_string(),
            start.to_string(),
            end.to_string(),
            output.to_string(),
        ]);
        args
    }
}

/// Path solver that shells out to an external router per request.
#[derive(Debug)]
pub struct ProcessPathSolver {
    config: ProcessPathSolverConfig,
    runtime: BlockingRuntime,
}

impl ProcessPathSolver {
    /// Validate `config` and prepare the runtime used to supervise runs.
    ///
    /// # Errors
    ///
    /// Returns an error for out-of-range parameters or when the Tokio runtime
    /// fails to build.
    pub fn new(config: ProcessPathSolverConfig) -> Result<Self, SolverBuildError> {
        config.validate()?;
        let runtime = BlockingRuntime::new()?;
        Ok(Self { config, runtime })
    }

    /// Active configuration.
    pub const fn config(&self) -> &ProcessPathSolverConfig {
        &self.config
    }

    async fn run(&self, args: Vec<String>) -> Result<(), PathSolveError> {
        let mut command = Command::new(self.config.program.as_std_path());
        command
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        let output = tokio::time::timeout(self.config.timeout, command.output())
            .await
            .map_err(|_| PathSolveError::Timeout {
                seconds: self.config.timeout.as_secs(),
            })?
            .map_err(|err| PathSolveError::Io {
                message: format!("failed to run {}: {err}", self.config.program),
            })?;
        if output.status.success() {
            return Ok(());
        }
        Err(PathSolveError::ExitStatus {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}

impl PathSolver for ProcessPathSolver {
    fn solve(&self, request: &PathRequest) -> Result<SolvedPath, PathSolveError> {
        let workdir = tempfile::Builder::new()
            .prefix("postroute-")
            .tempdir()
            .map_err(io_error)?;
        let root = Utf8Path::from_path(workdir.path()).ok_or_else(|| PathSolveError::Io {
            message: format!("temporary directory {} is not UTF-8", workdir.path().display()),
        })?;
        let start = root.join(START_FILE);
        let end = root.join(END_FILE);
        let output = root.join(OUTPUT_FILE);

        postroute_fs::write_file(&start, point_layer(&request.start)).map_err(io_error)?;
        postroute_fs::write_file(&end, point_layer(&request.end)).map_err(io_error)?;

        debug!(
            "running {} for {} -> {}",
            self.config.program,
            request.start.label(),
            request.end.label()
        );
        self.runtime
            .block_on(self.run(self.config.command_args(&start, &end, &output)))?;

        if !postroute_fs::is_file(&output).map_err(io_error)? {
            return Err(PathSolveError::EmptyResult);
        }
        let text = postroute_fs::read_to_string(&output).map_err(io_error)?;
        parse_solver_output(&text)
    }
}

fn io_error(err: std::io::Error) -> PathSolveError {
    PathSolveError::Io {
        message: err.to_string(),
    }
}

/// Single-feature WGS84 point layer carrying the endpoint's attributes.
fn point_layer(endpoint: &Endpoint) -> String {
    let location = endpoint.location();
    let mut properties = JsonObject::new();
    properties.insert("postcode".to_owned(), optional(endpoint.postcode()));
    properties.insert("address".to_owned(), optional(endpoint.address()));
    properties.insert("city".to_owned(), optional(endpoint.city()));

    let mut crs = JsonObject::new();
    crs.insert(
        "crs".to_owned(),
        serde_json::json!({"type": "name", "properties": {"name": "EPSG:4326"}}),
    );

    let feature = Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![location.x, location.y]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    };
    GeoJson::from(FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: Some(crs),
    })
    .to_string()
}

fn optional(value: Option<&str>) -> JsonValue {
    value.map_or(JsonValue::Null, |text| JsonValue::String(text.to_owned()))
}

/// Interpret the router's output document.
///
/// A document without line features means no path exists. A missing or
/// unusable `length` property is replaced by the measured geometry length.
fn parse_solver_output(text: &str) -> Result<SolvedPath, PathSolveError> {
    if text.trim().is_empty() {
        return Err(PathSolveError::EmptyResult);
    }
    let document = text
        .parse::<GeoJson>()
        .map_err(|err| PathSolveError::InvalidOutput {
            message: err.to_string(),
        })?;
    let (geometry, reported) = first_line(&document).ok_or(PathSolveError::EmptyResult)?;
    if geometry.0.is_empty() {
        return Err(PathSolveError::EmptyResult);
    }
    let length_m = length_or_measured(reported, &geometry);
    Ok(SolvedPath { geometry, length_m })
}
