//! Loading the points dataset from a GeoJSON feature collection.
//!
//! Each feature is one known address: a `Point` geometry in WGS84 with a
//! `postcode` property (string or integer) and optional `address` and `city`
//! strings. Features lacking a point geometry or a postcode are skipped.

use camino::{Utf8Path, Utf8PathBuf};
use geo::Coord;
use geojson::{Feature, GeoJson, JsonValue, Value};
use log::{info, warn};
use postroute_core::{LocationPoint, PointsDataset};
use thiserror::Error;

/// Errors raised while loading a points dataset.
#[derive(Debug, Error)]
pub enum PointsLoadError {
    /// The file could not be read.
    #[error("failed to read points dataset {path}")]
    Read {
        /// Path that failed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The text was not valid GeoJSON.
    #[error("points dataset is not valid GeoJSON")]
    Parse {
        /// Underlying parser error.
        #[source]
        source: Box<geojson::Error>,
    },
    /// The document was GeoJSON but not a feature collection.
    #[error("points dataset must be a FeatureCollection")]
    NotACollection,
    /// No feature yielded a usable point.
    #[error("points dataset contains no usable points")]
    NoPoints,
}

/// Read and parse the dataset at `path`.
///
/// # Errors
///
/// See [`PointsLoadError`].
pub fn load_points(path: &Utf8Path) -> Result<PointsDataset, PointsLoadError> {
    let text = postroute_fs::read_to_string(path).map_err(|source| PointsLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = parse_points(&text)?;
    info!("loaded {} points from {path}", dataset.len());
    Ok(dataset)
}

/// Parse a dataset from GeoJSON text.
///
/// # Errors
///
/// See [`PointsLoadError`].
///
/// # Examples
/// ```
/// use postroute_data::parse_points;
///
/// let dataset = parse_points(r#"{
///     "type": "FeatureCollection",
///     "features": [{
///         "type": "Feature",
///         "geometry": {"type": "Point", "coordinates": [23.59, 46.77]},
///         "properties": {"postcode": 400001, "address": "Memorandumului 28", "city": "Cluj-Napoca"}
///     }]
/// }"#)?;
/// assert_eq!(dataset.candidates("400001").count(), 1);
/// # Ok::<(), postroute_data::PointsLoadError>(())
/// ```
pub fn parse_points(text: &str) -> Result<PointsDataset, PointsLoadError> {
    let document = text
        .parse::<GeoJson>()
        .map_err(|source| PointsLoadError::Parse {
            source: Box::new(source),
        })?;
    let GeoJson::FeatureCollection(collection) = document else {
        return Err(PointsLoadError::NotACollection);
    };
    let total = collection.features.len();
    let points: Vec<LocationPoint> = collection.features.iter().filter_map(point_from).collect();
    if points.is_empty() {
        return Err(PointsLoadError::NoPoints);
    }
    if points.len() < total {
        warn!(
            "skipped {} of {total} features without a point geometry or postcode",
            total - points.len()
        );
    }
    Ok(PointsDataset::new(points))
}

fn point_from(feature: &Feature) -> Option<LocationPoint> {
    let Value::Point(position) = &feature.geometry.as_ref()?.value else {
        return None;
    };
    let [x, y, ..] = position.as_slice() else {
        return None;
    };
    let postcode = feature.property("postcode").and_then(postcode_text)?;
    let mut point = LocationPoint::new(postcode, Coord { x: *x, y: *y });
    if let Some(address) = text_property(feature, "address") {
        point = point.with_address(address);
    }
    if let Some(city) = text_property(feature, "city") {
        point = point.with_city(city);
    }
    Some(point)
}

fn postcode_text(value: &JsonValue) -> Option<String> {
    let text = match value {
        JsonValue::String(text) => text.trim().to_owned(),
        JsonValue::Number(number) => number
            .as_u64()
            .map_or_else(|| number.to_string(), |whole| whole.to_string()),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn text_property<'a>(feature: &'a Feature, key: &str) -> Option<&'a str> {
    feature
        .property(key)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}
