//! OSRM API response types for the Route service.
//!
//! Requests ask for `geometries=geojson` so each route's geometry arrives as
//! a GeoJSON `LineString`.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use serde::Deserialize;

/// OSRM Route API response.
#[derive(Debug, Deserialize)]
pub struct RouteResponse {
    /// Status code from OSRM.
    ///
    /// Common values:
    /// - `"Ok"` - Request was successful
    /// - `"NoRoute"` - No route connects the coordinates
    /// - `"NoSegment"` - A coordinate could not be snapped to the network
    /// - `"InvalidQuery"` - Invalid query parameters
    pub code: String,

    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,

    /// Candidate routes, best first.
    #[serde(default)]
    pub routes: Vec<Route>,
}

/// One route from a [`RouteResponse`].
#[derive(Debug, Deserialize)]
pub struct Route {
    /// Route length in metres.
    pub distance: f64,
    /// Route geometry.
    pub geometry: geojson::Geometry,
}

impl RouteResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }

    /// Whether the service answered that no route exists.
    #[must_use]
    pub fn is_no_route(&self) -> bool {
        self.code == "NoRoute"
    }
}
