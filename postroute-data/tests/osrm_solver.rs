//! [`OsrmPathSolver`] against a canned loopback HTTP server.

use std::time::Duration;

use geo::Coord;
use postroute_core::{Endpoint, PathRequest, PathSolveError, PathSolver};
use postroute_data::routing::test_support::CannedRouteServer;
use postroute_data::routing::{OsrmPathSolver, OsrmPathSolverConfig};
use rstest::{fixture, rstest};

#[fixture]
fn request() -> PathRequest {
    PathRequest::new(
        Endpoint::Coordinate(Coord { x: 23.59, y: 46.77 }),
        Endpoint::Coordinate(Coord { x: 23.6, y: 46.78 }),
    )
}

fn solver_for(server: &CannedRouteServer) -> OsrmPathSolver {
    OsrmPathSolver::with_config(
        OsrmPathSolverConfig::new(server.base_url()).with_timeout(Duration::from_secs(5)),
    )
    .expect("solver should build")
}

#[rstest]
fn routes_are_read_from_the_service(request: PathRequest) {
    let server = CannedRouteServer::start(
        200,
        r#"{"code": "Ok", "routes": [{"distance": 1480.0,
            "geometry": {"type": "LineString", "coordinates": [[23.59, 46.77], [23.595, 46.776], [23.6, 46.78]]}}]}"#,
    )
    .expect("server should start");

    let path = solver_for(&server).solve(&request).expect("route should solve");

    assert!((path.length_m - 1480.0).abs() < 1e-9);
    assert_eq!(path.geometry.0.len(), 3);
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0].starts_with(
            "GET /route/v1/driving/23.59,46.77;23.6,46.78?overview=full&geometries=geojson"
        ),
        "request line {}",
        requests[0]
    );
}

#[rstest]
fn no_route_answers_are_empty_results(request: PathRequest) {
    let server = CannedRouteServer::start(400, r#"{"code": "NoRoute", "message": "Impossible route"}"#)
        .expect("server should start");

    let err = solver_for(&server).solve(&request).expect_err("should fail");

    assert_eq!(err, PathSolveError::EmptyResult);
}

#[rstest]
fn non_json_errors_keep_the_status(request: PathRequest) {
    let server = CannedRouteServer::start(502, "bad gateway").expect("server should start");

    let err = solver_for(&server).solve(&request).expect_err("should fail");

    assert_eq!(
        err,
        PathSolveError::Service {
            code: "502".into(),
            message: "bad gateway".into(),
        }
    );
}

#[rstest]
fn unreachable_services_are_network_errors(request: PathRequest) {
    // Port 9 (discard) is closed on loopback in test environments.
    let solver = OsrmPathSolver::with_config(
        OsrmPathSolverConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2)),
    )
    .expect("solver should build");

    let err = solver.solve(&request).expect_err("should fail");

    assert!(
        matches!(
            err,
            PathSolveError::Network { .. } | PathSolveError::Timeout { .. }
        ),
        "got {err:?}"
    );
}

#[rstest]
fn solves_from_inside_a_multi_threaded_runtime(request: PathRequest) {
    let server = CannedRouteServer::start(
        200,
        r#"{"code": "Ok", "routes": [{"distance": 10.0,
            "geometry": {"type": "LineString", "coordinates": [[23.59, 46.77], [23.6, 46.78]]}}]}"#,
    )
    .expect("server should start");
    let solver = std::sync::Arc::new(solver_for(&server));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("runtime should build");

    let task = {
        let solver = std::sync::Arc::clone(&solver);
        runtime.spawn(async move { solver.solve(&request) })
    };
    let path = runtime
        .block_on(task)
        .expect("task should join")
        .expect("route should solve");

    assert!((path.length_m - 10.0).abs() < 1e-9);
}
