//! JSON response document for the `route` command.
//!
//! Endpoints and routes are embedded as GeoJSON feature collections so map
//! front ends can draw them directly; `routes_html` carries the tabular
//! summary.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use postroute_core::table::round2;
use postroute_core::{Endpoint, RouteResult, RouteSegment, RouteTable, SegmentSource};
use serde::Serialize;

/// Top-level response written by `postroute route`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RouteDocument {
    pub(crate) start: FeatureCollection,
    pub(crate) routes: Vec<RouteEntry>,
    pub(crate) routes_html: String,
    pub(crate) is_multiple: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub(crate) is_roundtrip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) total_distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) waypoint_sequence: Option<String>,
}

/// One leg of the response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RouteEntry {
    pub(crate) end: FeatureCollection,
    pub(crate) route: FeatureCollection,
    /// `from → to`, for round trips.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) segment: Option<String>,
}

impl RouteDocument {
    pub(crate) fn from_result(result: &RouteResult) -> Self {
        let routes = result
            .legs
            .iter()
            .map(|leg| RouteEntry {
                end: leg
                    .segment()
                    .map_or_else(empty_collection, |segment| endpoint_collection(&segment.to)),
                route: leg.segment().map_or_else(empty_collection, route_collection),
                segment: result
                    .is_roundtrip
                    .then(|| format!("{} → {}", leg.from_label, leg.to_label)),
            })
            .collect();
        Self {
            start: endpoint_collection(&result.start),
            routes,
            routes_html: RouteTable::from_result(result).to_html(),
            is_multiple: result.is_multiple,
            is_roundtrip: result.is_roundtrip,
            total_distance: result.total_distance_m.map(round2),
            waypoint_sequence: result.waypoint_sequence.clone(),
        }
    }
}

fn empty_collection() -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members: None,
    }
}

fn single_feature(value: Value, properties: JsonObject) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: vec![Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }],
        foreign_members: None,
    }
}

fn endpoint_collection(endpoint: &Endpoint) -> FeatureCollection {
    let location = endpoint.location();
    let mut properties = JsonObject::new();
    properties.insert("postcode".into(), endpoint.postcode().into());
    properties.insert("address".into(), endpoint.address().into());
    properties.insert("city".into(), endpoint.city().into());
    single_feature(Value::Point(vec![location.x, location.y]), properties)
}

fn route_collection(segment: &RouteSegment) -> FeatureCollection {
    let mut properties = JsonObject::new();
    let from = JsonValue::from(segment.from.label());
    let to = JsonValue::from(segment.to.label());
    if segment.source == SegmentSource::Estimated {
        properties.insert("from".into(), from);
        properties.insert("to".into(), to);
    } else {
        properties.insert("start".into(), from);
        properties.insert("end".into(), to);
        properties.insert("postcode".into(), segment.to.postcode().into());
        properties.insert("city".into(), segment.to.city().into());
        properties.insert("address".into(), segment.to.address().into());
    }
    properties.insert("length".into(), segment.length_m.into());
    properties.insert("source".into(), segment.source.as_str().into());
    single_feature(Value::from(&segment.geometry), properties)
}
