//! HTTP-based `PathSolver` using OSRM's Route API.
//!
//! The [`PathSolver`] trait is synchronous so the orchestrator can drive it
//! from its worker pool. This solver bridges the async HTTP call to that
//! interface by blocking on a Tokio runtime it owns.
//!
//! # Example
//!
//! ```no_run
//! use geo::Coord;
//! use postroute_core::{Endpoint, PathRequest, PathSolver};
//! use postroute_data::routing::OsrmPathSolver;
//!
//! let solver = OsrmPathSolver::new("http://localhost:5000")?;
//! let request = PathRequest::new(
//!     Endpoint::Coordinate(Coord { x: 23.59, y: 46.77 }),
//!     Endpoint::Coordinate(Coord { x: 23.61, y: 46.75 }),
//! );
//! let path = solver.solve(&request)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use postroute_core::{PathRequest, PathSolveError, PathSolver, SolvedPath};
use reqwest::Client;

use super::geometry::{length_or_measured, line_from_value};
use super::osrm::RouteResponse;
use super::runtime::{BlockingRuntime, SolverBuildError};

/// Default user agent for OSRM requests.
pub const DEFAULT_USER_AGENT: &str = "postroute/0.1";

/// Default routing profile.
pub const DEFAULT_PROFILE: &str = "driving";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`OsrmPathSolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsrmPathSolverConfig {
    /// Base URL for the OSRM service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// OSRM profile segment of the URL.
    pub profile: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for OsrmPathSolverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_owned(),
            profile: DEFAULT_PROFILE.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl OsrmPathSolverConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the routing profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Path solver backed by an OSRM `route/v1` service.
///
/// `NoRoute` answers and responses without routes are reported as
/// [`PathSolveError::EmptyResult`]; transport failures and other service
/// codes are solver failures.
pub struct OsrmPathSolver {
    client: Client,
    config: OsrmPathSolverConfig,
    runtime: BlockingRuntime,
}

impl std::fmt::Debug for OsrmPathSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsrmPathSolver")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &self.runtime)
            .finish()
    }
}

impl OsrmPathSolver {
    /// Create a solver with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SolverBuildError> {
        Self::with_config(OsrmPathSolverConfig::new(base_url))
    }

    /// Create a solver with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: OsrmPathSolverConfig) -> Result<Self, SolverBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(SolverBuildError::HttpClient)?;
        let runtime = BlockingRuntime::new()?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// Active configuration.
    pub const fn config(&self) -> &OsrmPathSolverConfig {
        &self.config
    }

    /// `{base_url}/route/v1/{profile}/{lon},{lat};{lon},{lat}?overview=full&geometries=geojson`
    fn build_route_url(&self, request: &PathRequest) -> String {
        let start = request.start.location();
        let end = request.end.location();
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            start.x,
            start.y,
            end.x,
            end.y
        )
    }

    async fn fetch_route(&self, url: &str) -> Result<SolvedPath, PathSolveError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?;

        // OSRM reports NoRoute and friends with a JSON body on 4xx statuses.
        match serde_json::from_str::<RouteResponse>(&body) {
            Ok(parsed) => convert_response(parsed),
            Err(_) if !status.is_success() => Err(PathSolveError::Service {
                code: status.as_u16().to_string(),
                message: body.trim().to_owned(),
            }),
            Err(err) => Err(PathSolveError::InvalidOutput {
                message: err.to_string(),
            }),
        }
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> PathSolveError {
        if error.is_timeout() {
            return PathSolveError::Timeout {
                seconds: self.config.timeout.as_secs(),
            };
        }
        PathSolveError::Network {
            message: format!("{url}: {error}"),
        }
    }
}

/// Convert an OSRM response into a solved path.
fn convert_response(response: RouteResponse) -> Result<SolvedPath, PathSolveError> {
    if response.is_no_route() {
        return Err(PathSolveError::EmptyResult);
    }
    if !response.is_ok() {
        return Err(PathSolveError::Service {
            code: response.code,
            message: response.message.unwrap_or_default(),
        });
    }
    let Some(route) = response.routes.into_iter().next() else {
        return Err(PathSolveError::EmptyResult);
    };
    let geometry =
        line_from_value(&route.geometry.value).ok_or_else(|| PathSolveError::InvalidOutput {
            message: "OSRM route geometry is not a line".to_owned(),
        })?;
    if geometry.0.is_empty() {
        return Err(PathSolveError::EmptyResult);
    }
    let length_m = length_or_measured(Some(route.distance), &geometry);
    Ok(SolvedPath { geometry, length_m })
}

impl PathSolver for OsrmPathSolver {
    fn solve(&self, request: &PathRequest) -> Result<SolvedPath, PathSolveError> {
        let url = self.build_route_url(request);
        self.runtime.block_on(self.fetch_route(&url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use postroute_core::Endpoint;
    use rstest::{fixture, rstest};

    #[fixture]
    fn request() -> PathRequest {
        PathRequest::new(
            Endpoint::Coordinate(Coord { x: 23.59, y: 46.77 }),
            Endpoint::Coordinate(Coord { x: 23.6, y: 46.78 }),
        )
    }

    fn parse(json: &str) -> RouteResponse {
        serde_json::from_str(json).expect("fixture should deserialise")
    }

    #[rstest]
    fn build_route_url_formats_lon_lat_pairs(request: PathRequest) {
        let solver = OsrmPathSolver::new("http://osrm.example.com/").expect("solver should build");

        let url = solver.build_route_url(&request);

        assert_eq!(
            url,
            "http://osrm.example.com/route/v1/driving/23.59,46.77;23.6,46.78?overview=full&geometries=geojson"
        );
    }

    #[rstest]
    fn convert_response_takes_first_route() {
        let response = parse(
            r#"{"code": "Ok", "routes": [
                {"distance": 900.0, "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.0, 0.01]]}},
                {"distance": 1200.0, "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.01, 0.01]]}}
            ]}"#,
        );

        let path = convert_response(response).expect("route converts");

        assert!((path.length_m - 900.0).abs() < 1e-9);
        assert_eq!(path.geometry.0.len(), 2);
    }

    #[rstest]
    #[case(r#"{"code": "NoRoute", "message": "Impossible route"}"#)]
    #[case(r#"{"code": "Ok", "routes": []}"#)]
    #[case(r#"{"code": "Ok", "routes": [{"distance": 0.0, "geometry": {"type": "LineString", "coordinates": []}}]}"#)]
    fn missing_routes_are_empty_results(#[case] json: &str) {
        assert_eq!(convert_response(parse(json)), Err(PathSolveError::EmptyResult));
    }

    #[rstest]
    fn service_codes_are_failures() {
        let err = convert_response(parse(
            r#"{"code": "NoSegment", "message": "Could not find a matching segment"}"#,
        ))
        .expect_err("should fail");

        assert_eq!(
            err,
            PathSolveError::Service {
                code: "NoSegment".into(),
                message: "Could not find a matching segment".into(),
            }
        );
    }

    #[rstest]
    fn point_geometry_is_invalid_output() {
        let err = convert_response(parse(
            r#"{"code": "Ok", "routes": [{"distance": 1.0, "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}}]}"#,
        ))
        .expect_err("should fail");

        assert!(matches!(err, PathSolveError::InvalidOutput { .. }));
    }

    #[rstest]
    fn config_builder_pattern() {
        let config = OsrmPathSolverConfig::new("http://example.com")
            .with_profile("foot")
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent/1.0");

        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.profile, "foot");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "test-agent/1.0");
    }
}
