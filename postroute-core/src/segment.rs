//! Route segments and the aggregated result of a query.

use geo::LineString;

use crate::{Endpoint, ResolveError};

/// Where a segment's geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SegmentSource {
    /// Read from the route store.
    Cached,
    /// Computed by the path solver during this request.
    Solved,
    /// Great-circle estimate; no solved path was available.
    Estimated,
}

impl SegmentSource {
    /// Lowercase label used in responses and persisted records.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Solved => "solved",
            Self::Estimated => "estimated",
        }
    }
}

/// A routed path between two resolved endpoints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteSegment {
    /// Origin endpoint.
    pub from: Endpoint,
    /// Destination endpoint.
    pub to: Endpoint,
    /// Path geometry in WGS84.
    pub geometry: LineString<f64>,
    /// Path length in metres, never negative.
    pub length_m: f64,
    /// Provenance of the geometry.
    pub source: SegmentSource,
}

/// Outcome of one leg of a multi-leg request.
#[derive(Debug, Clone, PartialEq)]
pub enum LegOutcome {
    /// Both endpoints resolved and a segment was produced.
    Routed(RouteSegment),
    /// An endpoint could not be resolved; the leg is a placeholder.
    Unresolved(ResolveError),
}

/// One row of a route result.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    /// Identifier of the origin as supplied by the caller.
    pub from_label: String,
    /// Identifier of the destination as supplied by the caller.
    pub to_label: String,
    /// Segment or placeholder.
    pub outcome: LegOutcome,
}

impl RouteLeg {
    /// The routed segment, if the leg resolved.
    pub const fn segment(&self) -> Option<&RouteSegment> {
        match &self.outcome {
            LegOutcome::Routed(segment) => Some(segment),
            LegOutcome::Unresolved(_) => None,
        }
    }

    /// Segment length, or zero for a placeholder.
    pub fn length_m(&self) -> f64 {
        self.segment().map_or(0.0, |segment| segment.length_m)
    }
}

/// Aggregated, ordered legs of a route query.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    /// Resolved start endpoint.
    pub start: Endpoint,
    /// Legs in request order.
    pub legs: Vec<RouteLeg>,
    /// Sum of leg lengths; always set for round trips.
    pub total_distance_m: Option<f64>,
    /// More than one destination (or a round trip).
    pub is_multiple: bool,
    /// Closed itinerary returning to the start.
    pub is_roundtrip: bool,
    /// Visiting order such as `A → B → A`, for round trips.
    pub waypoint_sequence: Option<String>,
}

impl RouteResult {
    /// Iterate over the routed segments, skipping placeholders.
    pub fn segments(&self) -> impl Iterator<Item = &RouteSegment> {
        self.legs.iter().filter_map(RouteLeg::segment)
    }

    /// Sum of all leg lengths in metres.
    pub fn sum_length_m(&self) -> f64 {
        self.legs.iter().map(RouteLeg::length_m).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use rstest::rstest;

    fn leg(length_m: f64) -> RouteLeg {
        let from = Endpoint::Coordinate(Coord { x: 0.0, y: 0.0 });
        let to = Endpoint::Coordinate(Coord { x: 1.0, y: 0.0 });
        RouteLeg {
            from_label: "a".into(),
            to_label: "b".into(),
            outcome: LegOutcome::Routed(RouteSegment {
                geometry: LineString::new(vec![from.location(), to.location()]),
                from,
                to,
                length_m,
                source: SegmentSource::Solved,
            }),
        }
    }

    #[rstest]
    fn placeholders_contribute_zero_length() {
        let placeholder = RouteLeg {
            from_label: "a".into(),
            to_label: "missing".into(),
            outcome: LegOutcome::Unresolved(ResolveError::PostcodeNotFound {
                postcode: "missing".into(),
            }),
        };
        let result = RouteResult {
            start: Endpoint::Coordinate(Coord { x: 0.0, y: 0.0 }),
            legs: vec![leg(10.5), placeholder, leg(4.5)],
            total_distance_m: None,
            is_multiple: true,
            is_roundtrip: false,
            waypoint_sequence: None,
        };
        assert_eq!(result.segments().count(), 2);
        assert!((result.sum_length_m() - 15.0).abs() < f64::EPSILON);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    #[case(SegmentSource::Cached)]
    #[case(SegmentSource::Solved)]
    #[case(SegmentSource::Estimated)]
    fn source_label_matches_serialised_name(#[case] source: SegmentSource) {
        let serialised = serde_json::to_value(source).expect("source serialises");
        assert_eq!(serialised, serde_json::Value::from(source.as_str()));
    }
}
