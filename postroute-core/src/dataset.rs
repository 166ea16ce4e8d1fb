//! Immutable, shared collection of known address points.

use std::collections::HashMap;

use crate::LocationPoint;

/// Read-only points dataset indexed by postcode.
///
/// The dataset is built once and then shared (typically behind an
/// [`Arc`](std::sync::Arc)) with the resolver and orchestrator. Candidates for
/// a postcode are always yielded in dataset order.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use postroute_core::{LocationPoint, PointsDataset};
///
/// let dataset = PointsDataset::new(vec![
///     LocationPoint::new("400001", Coord { x: 23.59, y: 46.77 }),
///     LocationPoint::new("400002", Coord { x: 23.60, y: 46.78 }),
///     LocationPoint::new("400001", Coord { x: 23.58, y: 46.76 }),
/// ]);
///
/// assert_eq!(dataset.len(), 3);
/// assert_eq!(dataset.candidates("400001").count(), 2);
/// assert!(dataset.candidates("999999").next().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PointsDataset {
    points: Vec<LocationPoint>,
    by_postcode: HashMap<String, Vec<usize>>,
}

impl PointsDataset {
    /// Build a dataset, preserving the supplied order.
    pub fn new(points: Vec<LocationPoint>) -> Self {
        let mut by_postcode: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, point) in points.iter().enumerate() {
            by_postcode
                .entry(point.postcode.trim().to_owned())
                .or_default()
                .push(idx);
        }
        Self {
            points,
            by_postcode,
        }
    }

    /// Points sharing `postcode`, in dataset order.
    pub fn candidates<'a>(
        &'a self,
        postcode: &str,
    ) -> impl Iterator<Item = &'a LocationPoint> + use<'a> {
        self.by_postcode
            .get(postcode.trim())
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|idx| self.points.get(*idx))
    }

    /// Whether any point carries `postcode`.
    pub fn contains_postcode(&self, postcode: &str) -> bool {
        self.by_postcode.contains_key(postcode.trim())
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the dataset holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over every point in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = &LocationPoint> {
        self.points.iter()
    }
}

impl FromIterator<LocationPoint> for PointsDataset {
    fn from_iter<I: IntoIterator<Item = LocationPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
