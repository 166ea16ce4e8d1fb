//! Disambiguate a postcode query down to a single dataset point.
//!
//! Rules are tried in order and the first non-empty match wins; within a
//! rule the first candidate in dataset order is taken:
//!
//! 1. exact address (trimmed, lowercased);
//! 2. address substring;
//! 3. address key parts (non-alphabetic characters stripped) as a substring;
//! 4. city substring;
//! 5. first point with the postcode.
//!
//! Only an unknown postcode produces an error.

use std::sync::Arc;

use log::debug;
use thiserror::Error;

use crate::point::normalise;
use crate::{Endpoint, LocationPoint, LocationQuery, PointsDataset, PostcodeQuery};

/// Errors from [`LocationResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No dataset point carries the postcode.
    #[error("postcode {postcode} not found")]
    PostcodeNotFound {
        /// Postcode that had no candidates.
        postcode: String,
    },
}

/// Rule that selected a resolved point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// Address matched exactly after normalisation.
    ExactAddress,
    /// Query address occurred inside the candidate address.
    AddressSubstring,
    /// Alphabetic key parts of the query occurred inside the candidate address.
    AddressKeyParts,
    /// City hint occurred inside the candidate city.
    CitySubstring,
    /// No hint matched; the first postcode point was used.
    FirstInPostcode,
}

/// Resolves queries against a shared, immutable [`PointsDataset`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use geo::Coord;
/// use postroute_core::{LocationPoint, LocationResolver, PointsDataset, PostcodeQuery};
///
/// let dataset = Arc::new(PointsDataset::new(vec![
///     LocationPoint::new("400001", Coord { x: 23.59, y: 46.77 }).with_address("Strada A 1"),
///     LocationPoint::new("400001", Coord { x: 23.60, y: 46.78 }).with_address("Strada B 2"),
/// ]));
/// let resolver = LocationResolver::new(dataset);
///
/// let point = resolver.resolve(&PostcodeQuery::new("400001").with_address("strada b 2"))?;
/// assert_eq!(point.address.as_deref(), Some("Strada B 2"));
/// # Ok::<(), postroute_core::ResolveError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LocationResolver {
    dataset: Arc<PointsDataset>,
}

impl LocationResolver {
    /// Create a resolver over `dataset`.
    pub const fn new(dataset: Arc<PointsDataset>) -> Self {
        Self { dataset }
    }

    /// The dataset this resolver reads.
    pub fn dataset(&self) -> &PointsDataset {
        &self.dataset
    }

    /// Resolve a postcode query to exactly one point.
    pub fn resolve(&self, query: &PostcodeQuery) -> Result<LocationPoint, ResolveError> {
        self.resolve_with_rule(query).map(|(point, _)| point)
    }

    /// Resolve a postcode query and report which rule selected the point.
    pub fn resolve_with_rule(
        &self,
        query: &PostcodeQuery,
    ) -> Result<(LocationPoint, MatchRule), ResolveError> {
        let candidates: Vec<&LocationPoint> = self.dataset.candidates(&query.postcode).collect();
        let Some(&first) = candidates.first() else {
            return Err(ResolveError::PostcodeNotFound {
                postcode: query.postcode.clone(),
            });
        };

        let (point, rule) =
            select(&candidates, query).unwrap_or((first, MatchRule::FirstInPostcode));
        debug!(
            "resolved postcode {} via {rule:?} to ({}, {})",
            query.postcode, point.location.y, point.location.x
        );
        Ok((point.clone(), rule))
    }

    /// Resolve any endpoint query; coordinates pass through untouched.
    pub fn resolve_endpoint(&self, query: &LocationQuery) -> Result<Endpoint, ResolveError> {
        match query {
            LocationQuery::Postcode(postcode) => self.resolve(postcode).map(Endpoint::Place),
            LocationQuery::Coordinate(coord) => Ok(Endpoint::Coordinate(*coord)),
        }
    }
}

fn select<'a>(
    candidates: &[&'a LocationPoint],
    query: &PostcodeQuery,
) -> Option<(&'a LocationPoint, MatchRule)> {
    if let Some(address) = query.address.as_deref() {
        let wanted = normalise(address);
        if !wanted.is_empty() {
            let found = first_with_address(candidates, |candidate| candidate == wanted)
                .map(|point| (point, MatchRule::ExactAddress))
                .or_else(|| {
                    first_with_address(candidates, |candidate| candidate.contains(&wanted))
                        .map(|point| (point, MatchRule::AddressSubstring))
                })
                .or_else(|| {
                    let key_parts = key_parts(&wanted);
                    if key_parts.is_empty() {
                        return None;
                    }
                    first_with_address(candidates, |candidate| candidate.contains(&key_parts))
                        .map(|point| (point, MatchRule::AddressKeyParts))
                });
            if found.is_some() {
                return found;
            }
        }
    }

    let city = normalise(query.city.as_deref()?);
    if city.is_empty() {
        return None;
    }
    candidates
        .iter()
        .find(|point| {
            point
                .city
                .as_deref()
                .is_some_and(|candidate| normalise(candidate).contains(&city))
        })
        .map(|point| (*point, MatchRule::CitySubstring))
}

fn first_with_address<'a>(
    candidates: &[&'a LocationPoint],
    predicate: impl Fn(&str) -> bool,
) -> Option<&'a LocationPoint> {
    candidates
        .iter()
        .find(|point| {
            point
                .address
                .as_deref()
                .is_some_and(|candidate| predicate(&normalise(candidate)))
        })
        .copied()
}

/// Keep only alphabetic characters and whitespace, trimmed.
fn key_parts(address: &str) -> String {
    address
        .chars()
        .filter(|ch| ch.is_alphabetic() || ch.is_whitespace())
        .collect::<String>()
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use rstest::{fixture, rstest};

    fn point(address: &str, city: &str, x: f64) -> LocationPoint {
        LocationPoint::new("400001", Coord { x, y: 46.0 })
            .with_address(address)
            .with_city(city)
    }

    #[fixture]
    fn resolver() -> LocationResolver {
        LocationResolver::new(Arc::new(PointsDataset::new(vec![
            point("Strada Avram Iancu 10", "Cluj-Napoca", 1.0),
            point("Strada Avram Iancu 1", "Cluj-Napoca", 2.0),
            point("Bulevardul Eroilor 5", "Floresti", 3.0),
            LocationPoint::new("400002", Coord { x: 9.0, y: 9.0 }),
        ])))
    }

    #[rstest]
    fn exact_match_beats_earlier_substring_match(resolver: LocationResolver) {
        let query = PostcodeQuery::new("400001").with_address("  strada avram iancu 1 ");
        let (found, rule) = resolver.resolve_with_rule(&query).expect("resolves");
        assert_eq!(found.location.x, 2.0);
        assert_eq!(rule, MatchRule::ExactAddress);
    }

    #[rstest]
    fn substring_match_takes_first_in_dataset_order(resolver: LocationResolver) {
        let query = PostcodeQuery::new("400001").with_address("AVRAM IANCU");
        let (found, rule) = resolver.resolve_with_rule(&query).expect("resolves");
        assert_eq!(found.location.x, 1.0);
        assert_eq!(rule, MatchRule::AddressSubstring);
    }

    #[rstest]
    fn key_parts_ignore_numbers_and_punctuation(resolver: LocationResolver) {
        let query = PostcodeQuery::new("400001").with_address("Eroilor, 99!");
        let (found, rule) = resolver.resolve_with_rule(&query).expect("resolves");
        assert_eq!(found.location.x, 3.0);
        assert_eq!(rule, MatchRule::AddressKeyParts);
    }

    #[rstest]
    fn city_substring_applies_when_address_misses(resolver: LocationResolver) {
        let query = PostcodeQuery::new("400001")
            .with_address("Piata Unirii")
            .with_city("flore");
        let (found, rule) = resolver.resolve_with_rule(&query).expect("resolves");
        assert_eq!(found.location.x, 3.0);
        assert_eq!(rule, MatchRule::CitySubstring);
    }

    #[rstest]
    fn falls_back_to_first_point(resolver: LocationResolver) {
        let query = PostcodeQuery::new("400001").with_city("Turda");
        let (found, rule) = resolver.resolve_with_rule(&query).expect("resolves");
        assert_eq!(found.location.x, 1.0);
        assert_eq!(rule, MatchRule::FirstInPostcode);
    }

    #[rstest]
    fn unknown_postcode_is_not_found(resolver: LocationResolver) {
        let err = resolver
            .resolve(&PostcodeQuery::new("999999"))
            .expect_err("unknown postcode");
        assert_eq!(
            err,
            ResolveError::PostcodeNotFound {
                postcode: "999999".into()
            }
        );
    }

    #[rstest]
    fn coordinates_bypass_dataset(resolver: LocationResolver) {
        let coord = Coord { x: 23.0, y: 46.0 };
        let endpoint = resolver
            .resolve_endpoint(&LocationQuery::Coordinate(coord))
            .expect("coordinates always resolve");
        assert_eq!(endpoint, Endpoint::Coordinate(coord));
    }

    #[rstest]
    #[case("Str. 1 Mai", "str  mai")]
    #[case("123", "")]
    #[case("Ștefan cel Mare", "ștefan cel mare")]
    fn key_parts_strip_non_alphabetic(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(key_parts(&normalise(input)), expected);
    }
}
