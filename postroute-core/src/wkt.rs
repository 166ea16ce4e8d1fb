//! Minimal WKT codec for the `LINESTRING` geometries held in the route store.
//!
//! Only two-dimensional linestrings are supported; that is the sole geometry
//! type a route record ever carries.

use geo::{Coord, LineString};
use thiserror::Error;

/// Errors raised while decoding WKT text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WktError {
    /// Text did not start with the `LINESTRING` tag.
    #[error("expected a LINESTRING, found {found:?}")]
    UnsupportedGeometry {
        /// Leading text that was found instead.
        found: String,
    },
    /// Parentheses were missing or unbalanced.
    #[error("malformed LINESTRING body")]
    MalformedBody,
    /// A coordinate could not be parsed as two finite numbers.
    #[error("invalid coordinate {coordinate:?}")]
    InvalidCoordinate {
        /// Offending coordinate text.
        coordinate: String,
    },
}

/// Encode a linestring as `LINESTRING (x y, x y, …)`.
///
/// Empty lines encode as `LINESTRING EMPTY`.
///
/// # Examples
/// ```
/// use geo::{Coord, LineString};
/// use postroute_core::wkt::{decode_linestring, encode_linestring};
///
/// let line = LineString::new(vec![Coord { x: 23.5, y: 46.7 }, Coord { x: 23.6, y: 46.8 }]);
/// let text = encode_linestring(&line);
/// assert_eq!(text, "LINESTRING (23.5 46.7, 23.6 46.8)");
/// assert_eq!(decode_linestring(&text)?, line);
/// # Ok::<(), postroute_core::wkt::WktError>(())
/// ```
pub fn encode_linestring(line: &LineString<f64>) -> String {
    if line.0.is_empty() {
        return "LINESTRING EMPTY".to_owned();
    }
    let coords: Vec<String> = line
        .coords()
        .map(|coord| format!("{} {}", coord.x, coord.y))
        .collect();
    format!("LINESTRING ({})", coords.join(", "))
}

/// Decode `LINESTRING (…)` text, case-insensitively.
pub fn decode_linestring(text: &str) -> Result<LineString<f64>, WktError> {
    let trimmed = text.trim();
    let tag_len = "LINESTRING".len();
    let tag = trimmed.get(..tag_len).unwrap_or(trimmed);
    if !tag.eq_ignore_ascii_case("LINESTRING") {
        return Err(WktError::UnsupportedGeometry {
            found: tag.to_owned(),
        });
    }
    let body = trimmed.get(tag_len..).unwrap_or_default().trim();
    if body.eq_ignore_ascii_case("EMPTY") {
        return Ok(LineString::new(Vec::new()));
    }
    let inner = body
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or(WktError::MalformedBody)?;
    if inner.contains(['(', ')']) {
        return Err(WktError::MalformedBody);
    }

    inner
        .split(',')
        .map(parse_coord)
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn parse_coord(text: &str) -> Result<Coord<f64>, WktError> {
    let invalid = || WktError::InvalidCoordinate {
        coordinate: text.trim().to_owned(),
    };
    let mut parts = text.split_whitespace();
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    let x: f64 = x.parse().map_err(|_| invalid())?;
    let y: f64 = y.parse().map_err(|_| invalid())?;
    if !(x.is_finite() && y.is_finite()) {
        return Err(invalid());
    }
    Ok(Coord { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn preserves_full_precision() {
        let line = LineString::new(vec![
            Coord {
                x: 23.589_912_345_678_9,
                y: 46.771_234_567_890_1,
            },
            Coord { x: -0.1, y: 51.5 },
        ]);
        let decoded = decode_linestring(&encode_linestring(&line)).expect("round trip");
        assert_eq!(decoded, line);
    }

    #[rstest]
    fn decodes_lowercase_and_extra_whitespace() {
        let line = decode_linestring("  linestring(1 2 ,3   4)").expect("valid wkt");
        assert_eq!(
            line,
            LineString::new(vec![Coord { x: 1.0, y: 2.0 }, Coord { x: 3.0, y: 4.0 }])
        );
    }

    #[rstest]
    fn empty_linestring_round_trips() {
        let empty = LineString::new(Vec::new());
        assert_eq!(encode_linestring(&empty), "LINESTRING EMPTY");
        assert_eq!(decode_linestring("LINESTRING EMPTY"), Ok(empty));
    }

    #[rstest]
    #[case("POINT (1 2)")]
    #[case("LINESTRING 1 2, 3 4")]
    #[case("LINESTRING (1 2, 3)")]
    #[case("LINESTRING (1 2 3, 4 5)")]
    #[case("LINESTRING (1 x, 3 4)")]
    #[case("LINESTRING ((1 2, 3 4))")]
    fn rejects_malformed_text(#[case] text: &str) {
        assert!(decode_linestring(text).is_err());
    }
}
