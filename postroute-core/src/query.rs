//! Route queries as received from the request boundary.
//!
//! Endpoint identifiers are opaque postcode strings or coordinate pairs.
//! Postcode endpoints may carry address and city hints that the
//! [`LocationResolver`](crate::LocationResolver) uses to pick one point.

use std::str::FromStr;

use geo::Coord;
use thiserror::Error;

/// A postcode optionally narrowed by address and city hints.
///
/// Blank hints are dropped on construction so that `Some("")` never reaches
/// the resolver.
///
/// # Examples
/// ```
/// use postroute_core::PostcodeQuery;
///
/// let query = PostcodeQuery::new("400001")
///     .with_address("Strada Lunga 3")
///     .with_city("   ");
/// assert_eq!(query.address.as_deref(), Some("Strada Lunga 3"));
/// assert_eq!(query.city, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostcodeQuery {
    /// Postcode to resolve.
    pub postcode: String,
    /// Optional street address hint.
    pub address: Option<String>,
    /// Optional city hint.
    pub city: Option<String>,
}

impl PostcodeQuery {
    /// Query a postcode without hints.
    pub fn new(postcode: impl Into<String>) -> Self {
        Self {
            postcode: postcode.into().trim().to_owned(),
            address: None,
            city: None,
        }
    }

    /// Add an address hint; blank text is ignored.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = non_blank(address.into());
        self
    }

    /// Add a city hint; blank text is ignored.
    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = non_blank(city.into());
        self
    }

    /// Add optional hints in one call.
    #[must_use]
    pub fn with_hints(self, address: Option<&str>, city: Option<&str>) -> Self {
        let with_address = match address {
            Some(text) => self.with_address(text),
            None => self,
        };
        match city {
            Some(text) => with_address.with_city(text),
            None => with_address,
        }
    }
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// One endpoint of a route request.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    /// Resolve through the points dataset.
    Postcode(PostcodeQuery),
    /// Use a literal WGS84 coordinate.
    Coordinate(Coord<f64>),
}

impl LocationQuery {
    /// Attach address and city hints to a postcode query.
    ///
    /// Coordinates are already exact, so hints are ignored for them.
    #[must_use]
    pub fn with_hints(self, address: Option<&str>, city: Option<&str>) -> Self {
        match self {
            Self::Postcode(query) => Self::Postcode(query.with_hints(address, city)),
            coordinate @ Self::Coordinate(_) => coordinate,
        }
    }

    /// Raw label echoed back in tables and placeholders.
    pub fn label(&self) -> String {
        match self {
            Self::Postcode(query) => query.postcode.clone(),
            Self::Coordinate(coord) => format!("{:.6},{:.6}", coord.y, coord.x),
        }
    }
}

impl From<PostcodeQuery> for LocationQuery {
    fn from(query: PostcodeQuery) -> Self {
        Self::Postcode(query)
    }
}

/// Errors raised while parsing endpoint identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryParseError {
    /// The identifier was empty.
    #[error("endpoint identifier must not be empty")]
    Empty,
    /// A coordinate pair was outside the WGS84 range.
    #[error("coordinate {input:?} is outside the valid latitude/longitude range")]
    CoordinateOutOfRange {
        /// Text that failed validation.
        input: String,
    },
}

impl FromStr for LocationQuery {
    type Err = QueryParseError;

    /// Parse `LatLng(lat, lon)`, `lat,lon` or a postcode.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use postroute_core::LocationQuery;
    ///
    /// let parsed: LocationQuery = "LatLng(46.77, 23.59)".parse()?;
    /// assert_eq!(parsed, LocationQuery::Coordinate(Coord { x: 23.59, y: 46.77 }));
    ///
    /// let postcode: LocationQuery = " 400001 ".parse()?;
    /// assert_eq!(postcode.label(), "400001");
    /// # Ok::<(), postroute_core::QueryParseError>(())
    /// ```
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(QueryParseError::Empty);
        }
        let inner = trimmed
            .strip_prefix("LatLng(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed);
        match parse_lat_lon(inner) {
            Some((lat, lon)) if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) => {
                Ok(Self::Coordinate(Coord { x: lon, y: lat }))
            }
            Some(_) => Err(QueryParseError::CoordinateOutOfRange {
                input: trimmed.to_owned(),
            }),
            None => Ok(Self::Postcode(PostcodeQuery::new(trimmed))),
        }
    }
}

fn parse_lat_lon(text: &str) -> Option<(f64, f64)> {
    let (lat, lon) = text.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lon = lon.trim().parse::<f64>().ok()?;
    (lat.is_finite() && lon.is_finite()).then_some((lat, lon))
}

/// A route request in one of the three supported shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteQuery {
    /// One start, one destination.
    Single {
        /// Start endpoint.
        start: LocationQuery,
        /// Destination endpoint.
        end: LocationQuery,
    },
    /// One start, many independent destinations, order preserved.
    FanOut {
        /// Shared start endpoint.
        start: LocationQuery,
        /// Destinations in output order.
        ends: Vec<LocationQuery>,
    },
    /// Closed itinerary `start → w1 → … → wk → start`.
    RoundTrip {
        /// Start and final endpoint.
        start: LocationQuery,
        /// Intermediate stops in visiting order.
        waypoints: Vec<LocationQuery>,
    },
}

impl RouteQuery {
    /// Build a single or fan-out query depending on how many ends are given.
    pub fn to_destinations(start: LocationQuery, mut ends: Vec<LocationQuery>) -> Self {
        if ends.len() == 1
            && let Some(end) = ends.pop()
        {
            return Self::Single { start, end };
        }
        Self::FanOut { start, ends }
    }
}

/// Split a comma-separated identifier list, trimming and dropping blanks.
///
/// Commas inside parentheses belong to the identifier, so `LatLng(lat, lon)`
/// entries survive the split.
///
/// # Examples
/// ```
/// use postroute_core::split_identifiers;
///
/// assert_eq!(split_identifiers(" 400002, ,400003,"), vec!["400002", "400003"]);
/// assert_eq!(
///     split_identifiers("LatLng(46.77, 23.59),400002"),
///     vec!["LatLng(46.77, 23.59)", "400002"]
/// );
/// ```
pub fn split_identifiers(list: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut depth = 0_usize;
    let mut begin = 0;
    for (idx, ch) in list.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&list[begin..idx]);
                begin = idx + 1;
            }
            _ => {}
        }
    }
    items.push(&list[begin..]);
    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Split a `|`-separated hint list, keeping positions (blank entries become `None`).
///
/// # Examples
/// ```
/// use postroute_core::split_hints;
///
/// assert_eq!(
///     split_hints("Strada A 1||Strada C 3"),
///     vec![Some("Strada A 1".to_owned()), None, Some("Strada C 3".to_owned())]
/// );
/// assert!(split_hints("").is_empty());
/// ```
pub fn split_hints(list: &str) -> Vec<Option<String>> {
    if list.is_empty() {
        return Vec::new();
    }
    list.split('|')
        .map(|hint| non_blank(hint.trim().to_owned()))
        .collect()
}

/// Parse identifiers and attach positional hints.
///
/// Hint `i` applies to identifier `i`; missing hints leave the endpoint
/// unqualified.
pub fn parse_endpoints(
    identifiers: &str,
    addresses: &str,
    cities: &str,
) -> Result<Vec<LocationQuery>, QueryParseError> {
    let addresses = split_hints(addresses);
    let cities = split_hints(cities);
    split_identifiers(identifiers)
        .iter()
        .enumerate()
        .map(|(idx, id)| {
            let query: LocationQuery = id.parse()?;
            let address = addresses.get(idx).and_then(Option::as_deref);
            let city = cities.get(idx).and_then(Option::as_deref);
            Ok(query.with_hints(address, city))
        })
        .collect()
}
