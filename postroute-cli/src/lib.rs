//! Command-line interface for the postroute engine.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod report;
mod route;

pub use error::CliError;
use route::{RouteArgs, run_route};

pub(crate) const ARG_ROUTE_START: &str = "start";
pub(crate) const ARG_ROUTE_STOPS: &str = "stops";
pub(crate) const ARG_START_ADDRESS: &str = "start-address";
pub(crate) const ARG_START_CITY: &str = "start-city";
pub(crate) const ARG_STOP_ADDRESSES: &str = "stop-addresses";
pub(crate) const ARG_STOP_CITIES: &str = "stop-cities";
pub(crate) const ARG_ROUND_TRIP: &str = "round-trip";
pub(crate) const ARG_POINTS: &str = "points";
pub(crate) const ARG_ARTEFACTS_DIR: &str = "artefacts-dir";
pub(crate) const ARG_CACHE_DB: &str = "cache-db";
pub(crate) const ARG_SOLVER_PROGRAM: &str = "solver-program";
pub(crate) const ARG_SOLVER_SCRIPT: &str = "solver-script";
pub(crate) const ARG_NETWORK: &str = "network";
pub(crate) const ARG_OSRM_BASE_URL: &str = "osrm-base-url";
pub(crate) const ARG_OSRM_PROFILE: &str = "osrm-profile";
pub(crate) const ARG_TIMEOUT_SECS: &str = "timeout-secs";
pub(crate) const ARG_WORKERS: &str = "workers";
pub(crate) const ARG_NETWORK_REVISION: &str = "network-revision";
pub(crate) const ARG_STRATEGY: &str = "strategy";
pub(crate) const ARG_DEFAULT_SPEED: &str = "default-speed";
pub(crate) const ARG_TOLERANCE: &str = "tolerance";
pub(crate) const ARG_OUTPUT: &str = "output";

pub(crate) const ENV_ROUTE_START: &str = "POSTROUTE_CMDS_ROUTE_START";
pub(crate) const ENV_ROUTE_STOPS: &str = "POSTROUTE_CMDS_ROUTE_STOPS";
pub(crate) const ENV_POINTS: &str = "POSTROUTE_CMDS_ROUTE_POINTS";
pub(crate) const ENV_NETWORK: &str = "POSTROUTE_CMDS_ROUTE_NETWORK";

/// Run the postroute CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Route(args) => run_route(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "postroute",
    about = "Route between postcodes using a points dataset and a persistent route cache",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Route from a start to one or more destinations, or around a round trip.
    Route(RouteArgs),
}

#[cfg(test)]
mod tests;
