//! Route command implementation for the postroute CLI.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::{info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use postroute_core::{
    LocationQuery, MemoryRouteStore, OrchestratorConfig, PathSolver, RouteOrchestrator,
    RouteQuery, RouteStore, SqliteRouteStore, parse_endpoints,
};
use postroute_data::load_points;
use postroute_data::routing::{
    OsrmPathSolver, OsrmPathSolverConfig, PathStrategy, ProcessPathSolver,
    ProcessPathSolverConfig,
};
use serde::{Deserialize, Serialize};

use crate::report::RouteDocument;
use crate::{
    ARG_ARTEFACTS_DIR, ARG_CACHE_DB, ARG_DEFAULT_SPEED, ARG_NETWORK, ARG_NETWORK_REVISION,
    ARG_OSRM_BASE_URL, ARG_OSRM_PROFILE, ARG_OUTPUT, ARG_POINTS, ARG_ROUND_TRIP, ARG_ROUTE_START,
    ARG_ROUTE_STOPS, ARG_SOLVER_PROGRAM, ARG_SOLVER_SCRIPT, ARG_START_ADDRESS, ARG_START_CITY,
    ARG_STOP_ADDRESSES, ARG_STOP_CITIES, ARG_STRATEGY, ARG_TIMEOUT_SECS, ARG_TOLERANCE,
    ARG_WORKERS, CliError, ENV_NETWORK, ENV_POINTS, ENV_ROUTE_START, ENV_ROUTE_STOPS,
};

/// Worker threads used when no count is configured.
pub(crate) const DEFAULT_WORKERS: usize = 4;

const CACHE_DB_FILE: &str = "routes.db";

/// CLI arguments for the `route` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Route from a start endpoint to a comma-separated list of \
                 destinations, or visit the list as a round trip returning to \
                 the start. Endpoints are postcodes from the points dataset, \
                 `LatLng(lat, lon)` or `lat,lon`. Routes are served from the \
                 cache database when present, otherwise solved and stored; \
                 unsolvable legs fall back to great-circle estimates.",
    about = "Route between postcodes"
)]
#[ortho_config(prefix = "POSTROUTE")]
pub(crate) struct RouteArgs {
    /// Start endpoint.
    #[arg(value_name = "start")]
    #[serde(default)]
    pub(crate) start: Option<String>,
    /// Comma-separated destinations, or waypoints with `--round-trip`.
    #[arg(value_name = "stops")]
    #[serde(default)]
    pub(crate) stops: Option<String>,
    /// Address hint for the start endpoint.
    #[arg(long = ARG_START_ADDRESS, value_name = "address")]
    #[serde(default)]
    pub(crate) start_address: Option<String>,
    /// City hint for the start endpoint.
    #[arg(long = ARG_START_CITY, value_name = "city")]
    #[serde(default)]
    pub(crate) start_city: Option<String>,
    /// `|`-separated address hints aligned with the stops.
    #[arg(long = ARG_STOP_ADDRESSES, value_name = "addresses")]
    #[serde(default)]
    pub(crate) stop_addresses: Option<String>,
    /// `|`-separated city hints aligned with the stops.
    #[arg(long = ARG_STOP_CITIES, value_name = "cities")]
    #[serde(default)]
    pub(crate) stop_cities: Option<String>,
    /// Visit the stops in order and return to the start.
    #[arg(
        long = ARG_ROUND_TRIP,
        value_name = "bool",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) round_trip: Option<bool>,
    /// GeoJSON points dataset.
    #[arg(long = ARG_POINTS, value_name = "path")]
    #[serde(default)]
    pub(crate) points: Option<Utf8PathBuf>,
    /// Directory holding the default cache database.
    #[arg(long = ARG_ARTEFACTS_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) artefacts_dir: Option<Utf8PathBuf>,
    /// Override the route cache database path (`routes.db`).
    #[arg(long = ARG_CACHE_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) cache_db: Option<Utf8PathBuf>,
    /// External routing program speaking the file-exchange contract.
    #[arg(long = ARG_SOLVER_PROGRAM, value_name = "program")]
    #[serde(default)]
    pub(crate) solver_program: Option<Utf8PathBuf>,
    /// Script passed as the first argument to the routing program.
    #[arg(long = ARG_SOLVER_SCRIPT, value_name = "path")]
    #[serde(default)]
    pub(crate) solver_script: Option<Utf8PathBuf>,
    /// Road network file handed to the routing program.
    #[arg(long = ARG_NETWORK, value_name = "path")]
    #[serde(default)]
    pub(crate) network: Option<Utf8PathBuf>,
    /// Base URL of an OSRM service (e.g. "http://localhost:5000").
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// OSRM profile segment.
    #[arg(long = ARG_OSRM_PROFILE, value_name = "profile")]
    #[serde(default)]
    pub(crate) osrm_profile: Option<String>,
    /// Upper bound on one solver invocation, in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Worker threads for multi-leg requests.
    #[arg(long = ARG_WORKERS, value_name = "count")]
    #[serde(default)]
    pub(crate) workers: Option<usize>,
    /// Label of the road network revision the cache is keyed on.
    #[arg(long = ARG_NETWORK_REVISION, value_name = "label")]
    #[serde(default)]
    pub(crate) network_revision: Option<String>,
    /// Path strategy: `fastest` or `shortest`.
    #[arg(long = ARG_STRATEGY, value_name = "strategy")]
    #[serde(default)]
    pub(crate) strategy: Option<PathStrategy>,
    /// Speed assumed for roads without one, in km/h.
    #[arg(long = ARG_DEFAULT_SPEED, value_name = "kmh")]
    #[serde(default)]
    pub(crate) default_speed: Option<f64>,
    /// Snapping tolerance for the network topology, in metres.
    #[arg(long = ARG_TOLERANCE, value_name = "metres")]
    #[serde(default)]
    pub(crate) tolerance: Option<f64>,
    /// Write the response here instead of standard output.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

impl RouteArgs {
    pub(crate) fn into_config(self) -> Result<RouteConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RouteConfig::try_from(merged)
    }
}

/// Which path solver backs the request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SolverChoice {
    /// Serve stored routes and estimate every miss.
    Disabled,
    /// Run an external program per leg.
    Process(ProcessPathSolverConfig),
    /// Query an OSRM route service.
    Osrm(OsrmPathSolverConfig),
}

/// Resolved `route` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RouteConfig {
    /// Parsed request.
    pub(crate) query: RouteQuery,
    /// Points dataset.
    pub(crate) points: Utf8PathBuf,
    /// Route cache database.
    pub(crate) cache_db: Utf8PathBuf,
    /// Path solver selection.
    pub(crate) solver: SolverChoice,
    /// Worker threads.
    pub(crate) workers: usize,
    /// Network revision override.
    pub(crate) network_revision: Option<String>,
    /// Response destination; standard output when `None`.
    pub(crate) output: Option<Utf8PathBuf>,
}

impl RouteConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.points, ARG_POINTS)?;
        if let SolverChoice::Process(process) = &self.solver {
            Self::require_existing(&process.network, ARG_NETWORK)?;
            if let Some(script) = process.args.first() {
                Self::require_existing(Utf8Path::new(script), ARG_SOLVER_SCRIPT)?;
            }
        }
        Ok(())
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match postroute_fs::is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl TryFrom<RouteArgs> for RouteConfig {
    type Error = CliError;

    fn try_from(args: RouteArgs) -> Result<Self, Self::Error> {
        let start = args.start.as_deref().ok_or(CliError::MissingArgument {
            field: ARG_ROUTE_START,
            env: ENV_ROUTE_START,
        })?;
        let stops = args.stops.as_deref().ok_or(CliError::MissingArgument {
            field: ARG_ROUTE_STOPS,
            env: ENV_ROUTE_STOPS,
        })?;
        let points = args.points.clone().ok_or(CliError::MissingArgument {
            field: ARG_POINTS,
            env: ENV_POINTS,
        })?;

        let start = start
            .parse::<LocationQuery>()
            .map_err(|source| CliError::InvalidEndpoint {
                field: ARG_ROUTE_START,
                source,
            })?
            .with_hints(args.start_address.as_deref(), args.start_city.as_deref());
        let stops = parse_endpoints(
            stops,
            args.stop_addresses.as_deref().unwrap_or_default(),
            args.stop_cities.as_deref().unwrap_or_default(),
        )
        .map_err(|source| CliError::InvalidEndpoint {
            field: ARG_ROUTE_STOPS,
            source,
        })?;
        let query = if args.round_trip.unwrap_or(false) {
            RouteQuery::RoundTrip {
                start,
                waypoints: stops,
            }
        } else {
            RouteQuery::to_destinations(start, stops)
        };

        let artefacts_dir = args
            .artefacts_dir
            .clone()
            .unwrap_or_else(|| Utf8PathBuf::from("."));
        let cache_db = args
            .cache_db
            .clone()
            .unwrap_or_else(|| artefacts_dir.join(CACHE_DB_FILE));
        let solver = solver_choice(&args)?;

        Ok(Self {
            query,
            points,
            cache_db,
            solver,
            workers: args.workers.unwrap_or(DEFAULT_WORKERS),
            network_revision: args.network_revision,
            output: args.output,
        })
    }
}

fn solver_choice(args: &RouteArgs) -> Result<SolverChoice, CliError> {
    let timeout = args.timeout_secs.map(Duration::from_secs);
    match (&args.solver_program, &args.osrm_base_url) {
        (Some(_), Some(_)) => Err(CliError::ConflictingSolvers),
        (Some(program), None) => {
            let network = args.network.clone().ok_or(CliError::MissingArgument {
                field: ARG_NETWORK,
                env: ENV_NETWORK,
            })?;
            let mut config = ProcessPathSolverConfig::new(program.clone(), network)
                .with_args(args.solver_script.iter().map(Utf8PathBuf::to_string))
                .with_strategy(args.strategy.unwrap_or_default());
            if let Some(speed) = args.default_speed {
                config = config.with_default_speed_kmh(speed);
            }
            if let Some(tolerance) = args.tolerance {
                config = config.with_tolerance_m(tolerance);
            }
            if let Some(timeout) = timeout {
                config = config.with_timeout(timeout);
            }
            Ok(SolverChoice::Process(config))
        }
        (None, Some(base_url)) => {
            let mut config = OsrmPathSolverConfig::new(base_url.clone());
            if let Some(profile) = &args.osrm_profile {
                config = config.with_profile(profile.clone());
            }
            if let Some(timeout) = timeout {
                config = config.with_timeout(timeout);
            }
            Ok(SolverChoice::Osrm(config))
        }
        (None, None) => Ok(SolverChoice::Disabled),
    }
}

/// Builds the path solver for the current route invocation.
pub(crate) trait SolverBuilder {
    fn build(&self, config: &RouteConfig) -> Result<Option<Box<dyn PathSolver>>, CliError>;
}

pub(crate) struct DefaultSolverBuilder;

impl SolverBuilder for DefaultSolverBuilder {
    fn build(&self, config: &RouteConfig) -> Result<Option<Box<dyn PathSolver>>, CliError> {
        let solver: Box<dyn PathSolver> = match &config.solver {
            SolverChoice::Disabled => return Ok(None),
            SolverChoice::Process(process) => Box::new(
                ProcessPathSolver::new(process.clone()).map_err(CliError::BuildSolver)?,
            ),
            SolverChoice::Osrm(osrm) => Box::new(
                OsrmPathSolver::with_config(osrm.clone()).map_err(CliError::BuildSolver)?,
            ),
        };
        Ok(Some(solver))
    }
}

pub(crate) fn run_route(args: RouteArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_route_with(args, &DefaultSolverBuilder, &mut stdout)
}

pub(crate) fn run_route_with(
    args: RouteArgs,
    builder: &dyn SolverBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_route_config(args)?;
    let document = execute_route(&config, builder)?;
    let payload = render_document(&document)?;
    match &config.output {
        Some(path) => postroute_fs::write_file(path, payload).map_err(CliError::WriteOutput),
        None => writer
            .write_all(payload.as_bytes())
            .map_err(CliError::WriteOutput),
    }
}

fn resolve_route_config(args: RouteArgs) -> Result<RouteConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

fn execute_route(
    config: &RouteConfig,
    builder: &dyn SolverBuilder,
) -> Result<RouteDocument, CliError> {
    let dataset = load_points(&config.points)?;
    let store = open_store(&config.cache_db);
    let solver = builder.build(config)?;
    let mut engine_config = OrchestratorConfig::default().with_workers(config.workers);
    if let Some(revision) = &config.network_revision {
        engine_config = engine_config.with_network_revision(revision.clone());
    }
    let orchestrator = RouteOrchestrator::new(Arc::new(dataset), store, solver, engine_config)?;
    let result = orchestrator.route(&config.query)?;
    info!(
        "routed {} leg(s) from {}",
        result.legs.len(),
        result.start.label()
    );
    Ok(RouteDocument::from_result(&result))
}

/// Open the persistent store, degrading to an in-memory one.
///
/// A route cache that cannot be opened must not fail the request; routes
/// are then solved but not persisted.
fn open_store(path: &Utf8Path) -> Box<dyn RouteStore> {
    let opened = postroute_fs::ensure_parent_dir(path)
        .map_err(|err| err.to_string())
        .and_then(|()| SqliteRouteStore::open(path).map_err(|err| err.to_string()));
    match opened {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!("route cache {path} unavailable, routes will not persist: {err}");
            Box::new(MemoryRouteStore::default())
        }
    }
}

fn render_document(document: &RouteDocument) -> Result<String, CliError> {
    let mut payload =
        serde_json::to_string_pretty(document).map_err(CliError::SerialiseResponse)?;
    payload.push('\n');
    Ok(payload)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RouteConfig, CliError> {
    let merged = RouteArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RouteConfig::try_from(merged)
}
