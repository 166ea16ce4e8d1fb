//! Resolved locations and the identities used to key cached routes.

use std::fmt;

use geo::Coord;

/// A known address point from the points dataset.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use postroute_core::LocationPoint;
///
/// let point = LocationPoint::new("400001", Coord { x: 23.59, y: 46.77 })
///     .with_address("Strada Memorandumului 28")
///     .with_city("Cluj-Napoca");
///
/// assert_eq!(point.postcode, "400001");
/// assert_eq!(point.city.as_deref(), Some("Cluj-Napoca"));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationPoint {
    /// Postcode the point belongs to.
    pub postcode: String,
    /// Street address, when the dataset records one.
    pub address: Option<String>,
    /// City or locality name.
    pub city: Option<String>,
    /// Geospatial position.
    pub location: Coord<f64>,
}

impl LocationPoint {
    /// Construct a point carrying only a postcode and a position.
    pub fn new(postcode: impl Into<String>, location: Coord<f64>) -> Self {
        Self {
            postcode: postcode.into(),
            address: None,
            city: None,
            location,
        }
    }

    /// Attach a street address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Attach a city name.
    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }
}

/// One end of a route segment after resolution.
///
/// Postcode queries resolve to a [`LocationPoint`]; coordinate-pair
/// identifiers are taken literally and never touch the dataset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endpoint {
    /// A point selected from the points dataset.
    Place(LocationPoint),
    /// A literal WGS84 coordinate.
    Coordinate(Coord<f64>),
}

impl Endpoint {
    /// Position of the endpoint.
    pub const fn location(&self) -> Coord<f64> {
        match self {
            Self::Place(point) => point.location,
            Self::Coordinate(coord) => *coord,
        }
    }

    /// Postcode of the endpoint, if it came from the dataset.
    pub fn postcode(&self) -> Option<&str> {
        match self {
            Self::Place(point) => Some(point.postcode.as_str()),
            Self::Coordinate(_) => None,
        }
    }

    /// Street address of the endpoint, if known.
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Place(point) => point.address.as_deref(),
            Self::Coordinate(_) => None,
        }
    }

    /// City of the endpoint, if known.
    pub fn city(&self) -> Option<&str> {
        match self {
            Self::Place(point) => point.city.as_deref(),
            Self::Coordinate(_) => None,
        }
    }

    /// Canonical identity used for cache keys.
    pub fn identity(&self) -> EndpointIdentity {
        EndpointIdentity::of(self)
    }

    /// Short human-readable label: the postcode, or `lat,lon`.
    pub fn label(&self) -> String {
        match self {
            Self::Place(point) => point.postcode.clone(),
            Self::Coordinate(coord) => format!("{:.6},{:.6}", coord.y, coord.x),
        }
    }
}

impl From<LocationPoint> for Endpoint {
    fn from(point: LocationPoint) -> Self {
        Self::Place(point)
    }
}

/// Canonical, normalised identity of a resolved endpoint.
///
/// Dataset points are identified by `place:<postcode>|<address>|<city>` with
/// each part trimmed and lowercased; coordinates by `coord:<lat>,<lon>` at six
/// decimal places. The identity depends only on the resolved point, never on
/// the hints or rule that selected it.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use postroute_core::{Endpoint, LocationPoint};
///
/// let point = LocationPoint::new("400001", Coord { x: 23.59, y: 46.77 })
///     .with_address("  Str. Avram Iancu 1 ")
///     .with_city("Cluj");
/// let identity = Endpoint::from(point).identity();
/// assert_eq!(identity.as_str(), "place:400001|str. avram iancu 1|cluj");
///
/// let coord = Endpoint::Coordinate(Coord { x: 23.5, y: 46.7 });
/// assert_eq!(coord.identity().as_str(), "coord:46.700000,23.500000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndpointIdentity(String);

impl EndpointIdentity {
    fn of(endpoint: &Endpoint) -> Self {
        match endpoint {
            Endpoint::Place(point) => Self(format!(
                "place:{}|{}|{}",
                normalise(&point.postcode),
                point.address.as_deref().map(normalise).unwrap_or_default(),
                point.city.as_deref().map(normalise).unwrap_or_default(),
            )),
            Endpoint::Coordinate(coord) => Self(format!("coord:{:.6},{:.6}", coord.y, coord.x)),
        }
    }

    /// Borrow the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase and trim free text for comparison.
pub(crate) fn normalise(text: &str) -> String {
    text.trim().to_lowercase()
}
