//! GeoJSON conversions shared by the path solvers.

use geo::{Coord, LineString};
use geojson::{GeoJson, JsonValue, Value};
use postroute_core::line_length_m;

/// Convert a GeoJSON line (or multi-line, concatenated) into a `LineString`.
///
/// Returns `None` for other geometry types. Positions with fewer than two
/// ordinates are skipped.
pub(crate) fn line_from_value(value: &Value) -> Option<LineString<f64>> {
    let coords: Vec<Coord<f64>> = match value {
        Value::LineString(positions) => positions.iter().filter_map(|p| coord(p)).collect(),
        Value::MultiLineString(lines) => lines
            .iter()
            .flatten()
            .filter_map(|p| coord(p))
            .collect(),
        _ => return None,
    };
    Some(LineString::new(coords))
}

fn coord(position: &[f64]) -> Option<Coord<f64>> {
    match position {
        [x, y, ..] if x.is_finite() && y.is_finite() => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

/// First line geometry in a document, with its `length` property if any.
pub(crate) fn first_line(document: &GeoJson) -> Option<(LineString<f64>, Option<f64>)> {
    match document {
        GeoJson::FeatureCollection(collection) => collection.features.iter().find_map(|feature| {
            let line = line_from_value(&feature.geometry.as_ref()?.value)?;
            Some((line, feature.property("length").and_then(JsonValue::as_f64)))
        }),
        GeoJson::Feature(feature) => {
            let line = line_from_value(&feature.geometry.as_ref()?.value)?;
            Some((line, feature.property("length").and_then(JsonValue::as_f64)))
        }
        GeoJson::Geometry(geometry) => line_from_value(&geometry.value).map(|line| (line, None)),
    }
}

/// Use a reported length when it is usable, otherwise measure the line.
pub(crate) fn length_or_measured(reported: Option<f64>, line: &LineString<f64>) -> f64 {
    reported
        .filter(|length| length.is_finite() && *length >= 0.0)
        .unwrap_or_else(|| line_length_m(line))
}
