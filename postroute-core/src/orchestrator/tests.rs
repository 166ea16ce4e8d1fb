use std::sync::Arc;
use std::time::Duration;

use geo::Coord;
use rstest::{fixture, rstest};

use super::*;
use crate::test_support::{FailingRouteStore, STUB_DETOUR_FACTOR, StubPathSolver, sample_dataset};
use crate::{MemoryRouteStore, PathSolveError, PostcodeQuery, haversine_distance_m};

type StubOrchestrator = RouteOrchestrator<MemoryRouteStore, Arc<StubPathSolver>>;

fn postcode(code: &str) -> LocationQuery {
    LocationQuery::Postcode(PostcodeQuery::new(code))
}

fn build(solver: StubPathSolver) -> (StubOrchestrator, Arc<StubPathSolver>) {
    let solver = Arc::new(solver);
    let orchestrator = RouteOrchestrator::new(
        Arc::new(sample_dataset()),
        MemoryRouteStore::default(),
        Some(Arc::clone(&solver)),
        OrchestratorConfig::default(),
    )
    .expect("orchestrator builds");
    (orchestrator, solver)
}

#[fixture]
fn stubbed() -> (StubOrchestrator, Arc<StubPathSolver>) {
    build(StubPathSolver::default())
}

#[rstest]
fn single_query_solves_then_serves_from_cache(stubbed: (StubOrchestrator, Arc<StubPathSolver>)) {
    let (orchestrator, solver) = stubbed;
    let query = RouteQuery::Single {
        start: postcode("400001"),
        end: postcode("400002"),
    };

    let first = orchestrator.route(&query).expect("routes");
    let second = orchestrator.route(&query).expect("routes");

    assert!(!first.is_multiple);
    let first_segment = first.legs[0].segment().expect("routed");
    let second_segment = second.legs[0].segment().expect("routed");
    assert_eq!(first_segment.source, SegmentSource::Solved);
    assert_eq!(second_segment.source, SegmentSource::Cached);
    assert_eq!(first_segment.geometry, second_segment.geometry);
    assert_eq!(solver.calls(), 1);
}

#[rstest]
fn single_query_fails_on_unknown_postcode(stubbed: (StubOrchestrator, Arc<StubPathSolver>)) {
    let (orchestrator, solver) = stubbed;
    let err = orchestrator
        .route_single(&postcode("400001"), &postcode("999999"))
        .expect_err("unknown destination");
    assert_eq!(
        err,
        RouteError::Resolve(ResolveError::PostcodeNotFound {
            postcode: "999999".into()
        })
    );
    assert_eq!(solver.calls(), 0);
}

#[rstest]
fn fan_out_preserves_order_and_isolates_failures(
    stubbed: (StubOrchestrator, Arc<StubPathSolver>),
) {
    let (orchestrator, _) = stubbed;
    let ends = vec![postcode("400003"), postcode("999999"), postcode("400002")];
    let result = orchestrator
        .route_fan_out(&postcode("400001"), &ends)
        .expect("routes");

    assert!(result.is_multiple);
    let labels: Vec<_> = result.legs.iter().map(|leg| leg.to_label.as_str()).collect();
    assert_eq!(labels, vec!["400003", "999999", "400002"]);
    assert!(matches!(result.legs[1].outcome, LegOutcome::Unresolved(_)));
    assert!(result.legs[0].segment().is_some());
    assert!(result.legs[2].segment().is_some());
    let total = result.total_distance_m.expect("fan-out total");
    assert!((total - result.sum_length_m()).abs() < 1e-9);
}

#[rstest]
fn fan_out_rejects_missing_start(stubbed: (StubOrchestrator, Arc<StubPathSolver>)) {
    let (orchestrator, _) = stubbed;
    let err = orchestrator
        .route_fan_out(&postcode("000000"), &[postcode("400002")])
        .expect_err("start must resolve");
    assert!(matches!(err, RouteError::Resolve(_)));
}

#[rstest]
fn fan_out_requires_destinations(stubbed: (StubOrchestrator, Arc<StubPathSolver>)) {
    let (orchestrator, _) = stubbed;
    assert_eq!(
        orchestrator.route_fan_out(&postcode("400001"), &[]),
        Err(RouteError::NoDestinations)
    );
}

#[rstest]
fn round_trip_closes_the_loop(stubbed: (StubOrchestrator, Arc<StubPathSolver>)) {
    let (orchestrator, solver) = stubbed;
    let start = LocationQuery::Postcode(
        PostcodeQuery::new("400001").with_address("Piata Unirii 1"),
    );
    let result = orchestrator
        .route_round_trip(&start, &[postcode("400002"), postcode("400003")])
        .expect("routes");

    assert!(result.is_roundtrip);
    assert_eq!(result.legs.len(), 3);
    assert_eq!(
        result.waypoint_sequence.as_deref(),
        Some("400001 → 400002 → 400003 → 400001")
    );
    for pair in result.legs.windows(2) {
        let previous = pair[0].segment().expect("routed");
        let next = pair[1].segment().expect("routed");
        assert_eq!(previous.to, next.from);
    }
    let closing = result.legs[2].segment().expect("routed");
    assert_eq!(closing.to, result.start);
    assert_eq!(closing.to.address(), Some("Piata Unirii 1"));

    let total = result.total_distance_m.expect("round-trip total");
    assert!((total - result.sum_length_m()).abs() < 1e-9);
    assert_eq!(solver.calls(), 3);
}

#[rstest]
fn round_trip_placeholders_surround_unresolved_waypoint(
    stubbed: (StubOrchestrator, Arc<StubPathSolver>),
) {
    let (orchestrator, _) = stubbed;
    let result = orchestrator
        .route_round_trip(
            &postcode("400001"),
            &[postcode("400002"), postcode("999999"), postcode("400003")],
        )
        .expect("routes");

    let routed: Vec<bool> = result
        .legs
        .iter()
        .map(|leg| leg.segment().is_some())
        .collect();
    assert_eq!(routed, vec![true, false, false, true]);
}

#[rstest]
fn round_trip_requires_waypoints(stubbed: (StubOrchestrator, Arc<StubPathSolver>)) {
    let (orchestrator, _) = stubbed;
    assert_eq!(
        orchestrator.route_round_trip(&postcode("400001"), &[]),
        Err(RouteError::NoWaypoints)
    );
}

#[rstest]
fn empty_result_falls_back_to_estimate_once() {
    let (orchestrator, solver) = build(StubPathSolver::default().without_path_to("400003"));
    let query = RouteQuery::Single {
        start: postcode("400001"),
        end: postcode("400003"),
    };

    let result = orchestrator.route(&query).expect("routes");
    orchestrator.route(&query).expect("routes again");

    let segment = result.legs[0].segment().expect("estimated");
    assert_eq!(segment.source, SegmentSource::Estimated);
    let expected = haversine_distance_m(segment.from.location(), segment.to.location());
    assert!((segment.length_m - expected).abs() <= expected * 0.01);
    assert_eq!(solver.calls(), 1);
}

#[rstest]
fn solver_failure_degrades_only_that_leg() {
    let (orchestrator, _) = build(
        StubPathSolver::default()
            .failing_to("400002", PathSolveError::Timeout { seconds: 300 }),
    );
    let result = orchestrator
        .route_fan_out(&postcode("400001"), &[postcode("400002"), postcode("400003")])
        .expect("routes");

    let sources: Vec<_> = result
        .segments()
        .map(|segment| segment.source)
        .collect();
    assert_eq!(sources, vec![SegmentSource::Estimated, SegmentSource::Solved]);
    assert_eq!(orchestrator.cache().store().len(), 1);
}

#[rstest]
fn concurrent_fan_out_of_one_pair_solves_once() {
    let (orchestrator, solver) =
        build(StubPathSolver::default().with_delay(Duration::from_millis(30)));
    let ends = vec![postcode("400002"); 6];
    let result = orchestrator
        .route_fan_out(&postcode("400001"), &ends)
        .expect("routes");

    assert_eq!(solver.calls(), 1);
    let geometries: Vec<_> = result.segments().map(|segment| &segment.geometry).collect();
    assert!(geometries.iter().all(|geometry| *geometry == geometries[0]));
}

#[rstest]
fn coordinates_route_without_the_dataset(stubbed: (StubOrchestrator, Arc<StubPathSolver>)) {
    let (orchestrator, _) = stubbed;
    let start = LocationQuery::Coordinate(Coord { x: 23.59, y: 46.77 });
    let result = orchestrator
        .route_single(&start, &postcode("400002"))
        .expect("routes");
    let segment = result.legs[0].segment().expect("routed");
    let direct = haversine_distance_m(segment.from.location(), segment.to.location());
    assert!((segment.length_m - direct * STUB_DETOUR_FACTOR).abs() < 1e-6);
    assert_eq!(result.legs[0].from_label, "46.770000,23.590000");
}

#[rstest]
fn without_solver_misses_are_estimated() {
    let orchestrator = RouteOrchestrator::new(
        Arc::new(sample_dataset()),
        FailingRouteStore,
        None::<Box<dyn PathSolver>>,
        OrchestratorConfig::default(),
    )
    .expect("orchestrator builds");
    let result = orchestrator
        .route_single(&postcode("400001"), &postcode("400004"))
        .expect("routes");
    let segment = result.legs[0].segment().expect("estimated");
    assert_eq!(segment.source, SegmentSource::Estimated);
    assert_eq!(segment.geometry.0.len(), 2);
}

#[rstest]
fn network_revision_partitions_the_cache() {
    let solver = Arc::new(StubPathSolver::default());
    let store = Arc::new(MemoryRouteStore::default());
    let query = RouteQuery::Single {
        start: postcode("400001"),
        end: postcode("400002"),
    };
    for revision in ["2024-01", "2024-01", "2024-06"] {
        let orchestrator = RouteOrchestrator::new(
            Arc::new(sample_dataset()),
            Arc::clone(&store),
            Some(Arc::clone(&solver)),
            OrchestratorConfig::default().with_network_revision(revision),
        )
        .expect("orchestrator builds");
        orchestrator.route(&query).expect("routes");
    }
    assert_eq!(solver.calls(), 2);
    assert_eq!(store.len(), 2);
}

#[rstest]
fn zero_workers_is_rejected() {
    let result = RouteOrchestrator::new(
        Arc::new(sample_dataset()),
        MemoryRouteStore::default(),
        None::<Box<dyn PathSolver>>,
        OrchestratorConfig::default().with_workers(0),
    );
    assert!(matches!(result, Err(OrchestratorBuildError::NoWorkers)));
}
