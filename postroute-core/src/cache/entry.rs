//! Cache keys and the records persisted per key.

use std::fmt;

use geo::LineString;

use crate::{Endpoint, EndpointIdentity, RouteSegment, SegmentSource};

/// Canonical identity of a directed route between two resolved endpoints.
///
/// The key is built from resolved [`EndpointIdentity`] values only, so a
/// point reached through an exact address match and the same point reached
/// through the postcode fallback share one key. The network revision is part
/// of the key: a new road network never reuses paths solved on an old one.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use postroute_core::{CacheKey, Endpoint, LocationPoint};
///
/// let a: Endpoint = LocationPoint::new("400001", Coord { x: 23.59, y: 46.77 }).into();
/// let b: Endpoint = LocationPoint::new("400002", Coord { x: 23.60, y: 46.78 }).into();
///
/// let forward = CacheKey::new("osm-2024", &a, &b);
/// assert_eq!(forward, CacheKey::new("osm-2024", &a, &b));
/// assert_ne!(forward, CacheKey::new("osm-2024", &b, &a));
/// assert_ne!(forward, CacheKey::new("osm-2025", &a, &b));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheKey {
    /// Road network revision the path was solved on.
    pub network: String,
    /// Identity of the origin.
    pub from: EndpointIdentity,
    /// Identity of the destination.
    pub to: EndpointIdentity,
}

impl CacheKey {
    /// Derive the key for a directed pair of resolved endpoints.
    pub fn new(network: impl Into<String>, from: &Endpoint, to: &Endpoint) -> Self {
        Self {
            network: network.into(),
            from: from.identity(),
            to: to.identity(),
        }
    }

    /// Stable text form used as the persisted lookup column.
    ///
    /// The encoding is the JSON array `[network, from, to]`.
    #[cfg(feature = "serde")]
    pub fn encode(&self) -> String {
        serde_json::Value::from(vec![
            self.network.as_str(),
            self.from.as_str(),
            self.to.as_str(),
        ])
        .to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} -> {}", self.network, self.from, self.to)
    }
}

/// Endpoint attributes stored alongside a route geometry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteMetadata {
    /// Label of the origin.
    pub start: String,
    /// Label of the destination.
    pub end: String,
    /// Destination postcode.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub postcode: Option<String>,
    /// Destination city.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub city: Option<String>,
    /// Destination address.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub address: Option<String>,
}

impl RouteMetadata {
    /// Describe a route from `from` to `to`.
    pub fn between(from: &Endpoint, to: &Endpoint) -> Self {
        Self {
            start: from.label(),
            end: to.label(),
            postcode: to.postcode().map(str::to_owned),
            city: to.city().map(str::to_owned),
            address: to.address().map(str::to_owned),
        }
    }
}

/// One persisted route record.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Key the record was stored under.
    pub key: CacheKey,
    /// Route geometry in WGS84.
    pub geometry: LineString<f64>,
    /// Route length in metres.
    pub length_m: f64,
    /// Endpoint attributes.
    pub metadata: RouteMetadata,
}

impl CacheEntry {
    /// Build an entry, clamping negative lengths to zero.
    pub fn new(
        key: CacheKey,
        geometry: LineString<f64>,
        length_m: f64,
        metadata: RouteMetadata,
    ) -> Self {
        Self {
            key,
            geometry,
            length_m: length_m.max(0.0),
            metadata,
        }
    }

    /// Turn the record into a segment between the given resolved endpoints.
    pub fn to_segment(&self, from: &Endpoint, to: &Endpoint, source: SegmentSource) -> RouteSegment {
        RouteSegment {
            from: from.clone(),
            to: to.clone(),
            geometry: self.geometry.clone(),
            length_m: self.length_m.max(0.0),
            source,
        }
    }
}
