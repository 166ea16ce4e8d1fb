//! Sequence single, fan-out and round-trip route queries.
//!
//! The orchestrator resolves endpoints, consults the [`RouteCache`] per
//! directed endpoint pair, invokes the [`PathSolver`] on a miss and
//! substitutes a [`FallbackDistanceEstimator`] segment when no solved path
//! is available. Independent legs run on a bounded worker pool so the
//! external solver is never invoked by more than `workers` threads at once.

use std::sync::Arc;

use log::{error, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;

use crate::{
    CacheEntry, CacheKey, Endpoint, FallbackDistanceEstimator, LegOutcome, LocationQuery,
    LocationResolver, PathRequest, PathSolver, PointsDataset, ResolveError, RouteCache,
    RouteLeg, RouteMetadata, RouteQuery, RouteResult, RouteSegment, RouteStore, SegmentSource,
};

/// Default number of legs computed concurrently.
pub const DEFAULT_WORKERS: usize = 4;

/// Default network revision label.
pub const DEFAULT_NETWORK_REVISION: &str = "default";

/// Tuning for [`RouteOrchestrator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Maximum number of legs computed concurrently.
    pub workers: usize,
    /// Revision of the road network the solver routes over.
    pub network_revision: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            network_revision: DEFAULT_NETWORK_REVISION.to_owned(),
        }
    }
}

impl OrchestratorConfig {
    /// Set the worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the network revision.
    #[must_use]
    pub fn with_network_revision(mut self, revision: impl Into<String>) -> Self {
        self.network_revision = revision.into();
        self
    }
}

/// Errors from [`RouteOrchestrator::new`].
#[derive(Debug, Error)]
pub enum OrchestratorBuildError {
    /// A worker pool needs at least one thread.
    #[error("worker count must be at least one")]
    NoWorkers,
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {source}")]
    ThreadPool {
        /// Pool construction failure.
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

/// Request-level failures; per-leg problems never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The start (or, for single queries, either endpoint) did not resolve.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// A round trip had no intermediate stops.
    #[error("round trip requires at least one waypoint")]
    NoWaypoints,
    /// A fan-out query had no destinations.
    #[error("at least one destination is required")]
    NoDestinations,
}

/// Routes queries against a shared dataset, store and optional solver.
///
/// Without a solver, stored routes are still served and every miss falls
/// back to an estimate. Pass `None::<Box<dyn PathSolver>>` to build one.
pub struct RouteOrchestrator<S, P> {
    resolver: LocationResolver,
    cache: RouteCache<S>,
    solver: Option<P>,
    estimator: FallbackDistanceEstimator,
    config: OrchestratorConfig,
    pool: ThreadPool,
}

impl<S, P> std::fmt::Debug for RouteOrchestrator<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteOrchestrator")
            .field("config", &self.config)
            .field("has_solver", &self.solver.is_some())
            .finish_non_exhaustive()
    }
}

impl<S, P> RouteOrchestrator<S, P>
where
    S: RouteStore,
    P: PathSolver,
{
    /// Build an orchestrator and its worker pool.
    pub fn new(
        dataset: Arc<PointsDataset>,
        store: S,
        solver: Option<P>,
        config: OrchestratorConfig,
    ) -> Result<Self, OrchestratorBuildError> {
        if config.workers == 0 {
            return Err(OrchestratorBuildError::NoWorkers);
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|idx| format!("postroute-worker-{idx}"))
            .build()
            .map_err(|source| OrchestratorBuildError::ThreadPool { source })?;
        Ok(Self {
            resolver: LocationResolver::new(dataset),
            cache: RouteCache::new(store),
            solver,
            estimator: FallbackDistanceEstimator,
            config,
            pool,
        })
    }

    /// Configuration in effect.
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// The route cache, for inspecting the underlying store.
    pub const fn cache(&self) -> &RouteCache<S> {
        &self.cache
    }

    /// The configured solver, if any.
    pub const fn solver(&self) -> Option<&P> {
        self.solver.as_ref()
    }

    /// Route any query shape.
    pub fn route(&self, query: &RouteQuery) -> Result<RouteResult, RouteError> {
        match query {
            RouteQuery::Single { start, end } => self.route_single(start, end),
            RouteQuery::FanOut { start, ends } => self.route_fan_out(start, ends),
            RouteQuery::RoundTrip { start, waypoints } => self.route_round_trip(start, waypoints),
        }
    }

    /// Route one start to one destination. Either endpoint failing to
    /// resolve fails the request.
    pub fn route_single(
        &self,
        start: &LocationQuery,
        end: &LocationQuery,
    ) -> Result<RouteResult, RouteError> {
        let from = self.resolver.resolve_endpoint(start)?;
        let to = self.resolver.resolve_endpoint(end)?;
        let segment = self.route_pair(&from, &to);
        Ok(RouteResult {
            start: from,
            legs: vec![RouteLeg {
                from_label: start.label(),
                to_label: end.label(),
                outcome: LegOutcome::Routed(segment),
            }],
            total_distance_m: None,
            is_multiple: false,
            is_roundtrip: false,
            waypoint_sequence: None,
        })
    }

    /// Route one start to many destinations, preserving their order.
    ///
    /// A destination that fails to resolve becomes a placeholder leg; the
    /// others are unaffected.
    pub fn route_fan_out(
        &self,
        start: &LocationQuery,
        ends: &[LocationQuery],
    ) -> Result<RouteResult, RouteError> {
        if ends.is_empty() {
            return Err(RouteError::NoDestinations);
        }
        let from = self.resolver.resolve_endpoint(start)?;
        let start_label = start.label();

        let legs: Vec<RouteLeg> = self.pool.install(|| {
            ends.par_iter()
                .map(|end| {
                    let outcome = match self.resolver.resolve_endpoint(end) {
                        Ok(to) => LegOutcome::Routed(self.route_pair(&from, &to)),
                        Err(err) => {
                            info!("destination {} unresolved: {err}", end.label());
                            LegOutcome::Unresolved(err)
                        }
                    };
                    RouteLeg {
                        from_label: start_label.clone(),
                        to_label: end.label(),
                        outcome,
                    }
                })
                .collect()
        });

        let total = legs.iter().map(RouteLeg::length_m).sum();
        Ok(RouteResult {
            start: from,
            legs,
            total_distance_m: Some(total),
            is_multiple: ends.len() > 1,
            is_roundtrip: false,
            waypoint_sequence: None,
        })
    }

    /// Route the closed itinerary `start → w1 → … → wk → start`.
    ///
    /// Every stop is resolved exactly once and the same resolved point is
    /// used as the destination of one leg and the origin of the next. A stop
    /// that fails to resolve turns both legs touching it into placeholders.
    pub fn route_round_trip(
        &self,
        start: &LocationQuery,
        waypoints: &[LocationQuery],
    ) -> Result<RouteResult, RouteError> {
        if waypoints.is_empty() {
            return Err(RouteError::NoWaypoints);
        }
        let origin = self.resolver.resolve_endpoint(start)?;

        let resolved: Vec<Result<Endpoint, ResolveError>> = self.pool.install(|| {
            waypoints
                .par_iter()
                .map(|waypoint| self.resolver.resolve_endpoint(waypoint))
                .collect()
        });

        let mut stops: Vec<(String, Result<&Endpoint, &ResolveError>)> =
            Vec::with_capacity(waypoints.len() + 2);
        stops.push((start.label(), Ok(&origin)));
        stops.extend(
            waypoints
                .iter()
                .zip(&resolved)
                .map(|(query, endpoint)| (query.label(), endpoint.as_ref())),
        );
        stops.push((start.label(), Ok(&origin)));

        let legs: Vec<RouteLeg> = self.pool.install(|| {
            stops
                .par_windows(2)
                .map(|pair| {
                    let (from_label, from) = &pair[0];
                    let (to_label, to) = &pair[1];
                    let outcome = match (from, to) {
                        (Ok(from), Ok(to)) => LegOutcome::Routed(self.route_pair(from, to)),
                        (Err(err), _) | (_, Err(err)) => LegOutcome::Unresolved((*err).clone()),
                    };
                    RouteLeg {
                        from_label: from_label.clone(),
                        to_label: to_label.clone(),
                        outcome,
                    }
                })
                .collect()
        });

        let sequence = stops
            .iter()
            .map(|(label, _)| label.as_str())
            .collect::<Vec<_>>()
            .join(" → ");
        let total = legs.iter().map(RouteLeg::length_m).sum();
        Ok(RouteResult {
            start: origin.clone(),
            legs,
            total_distance_m: Some(total),
            is_multiple: true,
            is_roundtrip: true,
            waypoint_sequence: Some(sequence),
        })
    }

    /// Produce a segment for two resolved endpoints: stored, solved or
    /// estimated, in that order of preference.
    pub fn route_pair(&self, from: &Endpoint, to: &Endpoint) -> RouteSegment {
        let key = CacheKey::new(self.config.network_revision.as_str(), from, to);
        let Some(solver) = &self.solver else {
            return match self.cache.get(&key) {
                Some(entry) => entry.to_segment(from, to, SegmentSource::Cached),
                None => self.estimator.estimate(from, to),
            };
        };

        let outcome = self.cache.get_or_compute(&key, || {
            info!("solving path {} -> {}", from.label(), to.label());
            let path = solver.solve(&PathRequest::new(from.clone(), to.clone()))?;
            Ok(CacheEntry::new(
                key.clone(),
                path.geometry,
                path.length_m,
                RouteMetadata::between(from, to),
            ))
        });
        match outcome {
            Ok(route) => route.entry.to_segment(from, to, route.source),
            Err(err) if err.is_empty_result() => {
                info!(
                    "no path between {} and {}, estimating distance",
                    from.label(),
                    to.label()
                );
                self.estimator.estimate(from, to)
            }
            Err(err) => {
                error!(
                    "path solver failed for {key} ({:?} -> {:?}): {err}; estimating distance",
                    from.location(),
                    to.location()
                );
                self.estimator.estimate(from, to)
            }
        }
    }
}

#[cfg(test)]
mod tests;
