//! Great-circle fallback when no solved path exists.

use geo::{Coord, LineString};

use crate::{Endpoint, RouteSegment, SegmentSource};

/// Mean Earth radius in metres used by the estimator.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in metres between two WGS84 coordinates.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use postroute_core::haversine_distance_m;
///
/// let cluj = Coord { x: 23.5899, y: 46.7712 };
/// let turda = Coord { x: 23.7857, y: 46.5667 };
/// let metres = haversine_distance_m(cluj, turda);
/// assert!((27_000.0..28_000.0).contains(&metres));
/// assert_eq!(haversine_distance_m(cluj, cluj), 0.0);
/// ```
pub fn haversine_distance_m(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let lat1 = from.y.to_radians();
    let lat2 = to.y.to_radians();
    let d_lat = (to.y - from.y).to_radians();
    let d_lon = (to.x - from.x).to_radians();
    let a = ((d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Sum of haversine distances along a line.
pub fn line_length_m(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|segment| haversine_distance_m(segment.start, segment.end))
        .sum()
}

/// Synthesises straight-line segments tagged [`SegmentSource::Estimated`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackDistanceEstimator;

impl FallbackDistanceEstimator {
    /// Build a two-point segment whose length is the great-circle distance.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use postroute_core::{Endpoint, FallbackDistanceEstimator, SegmentSource};
    ///
    /// let from = Endpoint::Coordinate(Coord { x: 0.0, y: 0.0 });
    /// let to = Endpoint::Coordinate(Coord { x: 0.0, y: 1.0 });
    /// let segment = FallbackDistanceEstimator.estimate(&from, &to);
    ///
    /// assert_eq!(segment.source, SegmentSource::Estimated);
    /// assert_eq!(segment.geometry.0.len(), 2);
    /// assert!((segment.length_m - 111_194.9).abs() < 1.0);
    /// ```
    pub fn estimate(&self, from: &Endpoint, to: &Endpoint) -> RouteSegment {
        let start = from.location();
        let end = to.location();
        RouteSegment {
            from: from.clone(),
            to: to.clone(),
            geometry: LineString::new(vec![start, end]),
            length_m: haversine_distance_m(start, end),
            source: SegmentSource::Estimated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    fn distance_is_symmetric() {
        let a = Coord { x: 23.59, y: 46.77 };
        let b = Coord { x: 21.22, y: 45.75 };
        let forward = haversine_distance_m(a, b);
        let backward = haversine_distance_m(b, a);
        assert!((forward - backward).abs() < 1e-6);
    }

    #[rstest]
    fn line_length_sums_legs() {
        let line = LineString::new(vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 0.0, y: 1.0 },
            Coord { x: 0.0, y: 2.0 },
        ]);
        let direct = haversine_distance_m(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 2.0 });
        assert!((line_length_m(&line) - direct).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn distance_is_finite_and_non_negative(
            lat1 in -90.0f64..=90.0,
            lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0,
            lon2 in -180.0f64..=180.0,
        ) {
            let metres = haversine_distance_m(Coord { x: lon1, y: lat1 }, Coord { x: lon2, y: lat2 });
            prop_assert!(metres.is_finite());
            prop_assert!(metres >= 0.0);
            prop_assert!(metres <= std::f64::consts::PI * EARTH_RADIUS_M + 1.0);
        }
    }
}
