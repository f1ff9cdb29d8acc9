//! Decides whether one of the POI candidates is the queried store.
//!
//! Matching is pure: the same query, candidates, and policy always produce
//! the same result. Candidates without a valid position are ignored; the
//! rest are filtered by category and distance, then ranked by name strength,
//! distance, and input order.

use geo::{HaversineDistance, Point};
use storegeo_core::{
    brand_token, normalize_name, BrandProfile, Coordinates, PoiCandidate, StoreQuery,
};

/// Radius around the declared coordinates inside which a POI may match.
pub const DEFAULT_MAX_DISTANCE_M: f64 = 2000.0;

/// Name agreement between a candidate and the brand. `Exact` ranks above
/// `Fuzzy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NameStrength {
    Fuzzy,
    Exact,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchPolicy {
    /// Brand names compared against candidate names, already normalized.
    pub brand_names: Vec<String>,
    /// Accepted `shop` tag values. Empty disables the category filter.
    pub shop_types: Vec<String>,
    pub max_distance_m: f64,
}

impl MatchPolicy {
    /// Policy for one store: its brand token plus the profile's name and
    /// aliases, and the profile's shop types (or the defaults).
    #[must_use]
    pub fn for_query(
        query: &StoreQuery,
        profile: Option<&BrandProfile>,
        max_distance_m: f64,
    ) -> Self {
        let mut brand_names = Vec::new();
        let token = brand_token(&query.name, &query.city);
        let profile_names = profile.into_iter().flat_map(BrandProfile::names);
        for name in std::iter::once(token.as_str()).chain(profile_names) {
            let normalized = normalize_name(name);
            if !normalized.is_empty() && !brand_names.contains(&normalized) {
                brand_names.push(normalized);
            }
        }

        let shop_types = profile.map_or_else(
            || {
                storegeo_core::DEFAULT_SHOP_TYPES
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect()
            },
            BrandProfile::effective_shop_types,
        );

        Self {
            brand_names,
            shop_types,
            max_distance_m,
        }
    }

    /// Strongest agreement between `candidate_name` and any brand name.
    #[must_use]
    pub fn name_strength(&self, candidate_name: &str) -> Option<NameStrength> {
        let candidate = normalize_name(candidate_name);
        if candidate.is_empty() {
            return None;
        }
        self.brand_names
            .iter()
            .filter_map(|brand| {
                if *brand == candidate {
                    Some(NameStrength::Exact)
                } else if candidate.contains(brand.as_str())
                    || brand.contains(candidate.as_str())
                {
                    Some(NameStrength::Fuzzy)
                } else {
                    None
                }
            })
            .max()
    }

    fn accepts_category(&self, candidate: &PoiCandidate) -> bool {
        self.shop_types.is_empty()
            || candidate
                .tag("shop")
                .is_some_and(|shop| self.shop_types.iter().any(|s| s == shop))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    NoMatch,
    FuzzyMatch {
        candidate: PoiCandidate,
        distance_m: Option<f64>,
    },
    ExactMatch {
        candidate: PoiCandidate,
        distance_m: Option<f64>,
    },
}

impl MatchResult {
    #[must_use]
    pub fn candidate(&self) -> Option<&PoiCandidate> {
        match self {
            MatchResult::NoMatch => None,
            MatchResult::FuzzyMatch { candidate, .. }
            | MatchResult::ExactMatch { candidate, .. } => Some(candidate),
        }
    }

    #[must_use]
    pub fn distance_m(&self) -> Option<f64> {
        match self {
            MatchResult::NoMatch => None,
            MatchResult::FuzzyMatch { distance_m, .. }
            | MatchResult::ExactMatch { distance_m, .. } => *distance_m,
        }
    }

    #[must_use]
    pub fn strength(&self) -> Option<NameStrength> {
        match self {
            MatchResult::NoMatch => None,
            MatchResult::FuzzyMatch { .. } => Some(NameStrength::Fuzzy),
            MatchResult::ExactMatch { .. } => Some(NameStrength::Exact),
        }
    }
}

/// Great-circle distance in meters.
#[must_use]
pub fn distance_m(a: Coordinates, b: Coordinates) -> f64 {
    Point::new(a.lon, a.lat).haversine_distance(&Point::new(b.lon, b.lat))
}

struct Scored<'a> {
    candidate: &'a PoiCandidate,
    strength: NameStrength,
    distance_m: Option<f64>,
}

impl Scored<'_> {
    /// Strictly better; equal scores keep the earlier candidate.
    fn beats(&self, other: &Scored<'_>) -> bool {
        if self.strength != other.strength {
            return self.strength > other.strength;
        }
        match (self.distance_m, other.distance_m) {
            (Some(a), Some(b)) => a.total_cmp(&b).is_lt(),
            _ => false,
        }
    }
}

/// Picks the candidate that is the queried store, if any.
#[must_use]
pub fn match_candidates(
    query: &StoreQuery,
    candidates: &[PoiCandidate],
    policy: &MatchPolicy,
) -> MatchResult {
    let declared = query.declared_coordinates();
    let mut best: Option<Scored<'_>> = None;

    for candidate in candidates {
        if !candidate.coordinates.is_valid() {
            tracing::debug!(poi = %candidate.source_id, "candidate has no usable position");
            continue;
        }
        if !policy.accepts_category(candidate) {
            continue;
        }
        let Some(strength) = policy.name_strength(&candidate.name) else {
            continue;
        };
        let distance = declared.map(|d| distance_m(d, candidate.coordinates));
        if distance.is_some_and(|d| d > policy.max_distance_m) {
            tracing::debug!(
                poi = %candidate.source_id,
                distance_m = ?distance,
                "candidate outside match radius"
            );
            continue;
        }

        let scored = Scored {
            candidate,
            strength,
            distance_m: distance,
        };
        if best.as_ref().is_none_or(|b| scored.beats(b)) {
            best = Some(scored);
        }
    }

    match best {
        None => MatchResult::NoMatch,
        Some(Scored {
            candidate,
            strength: NameStrength::Exact,
            distance_m,
        }) => MatchResult::ExactMatch {
            candidate: candidate.clone(),
            distance_m,
        },
        Some(Scored {
            candidate,
            strength: NameStrength::Fuzzy,
            distance_m,
        }) => MatchResult::FuzzyMatch {
            candidate: candidate.clone(),
            distance_m,
        },
    }
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod tests;
