//! Tier selection: POI match → scraper coordinates → address geocoding.

use storegeo_core::{
    brand_token, AppConfig, BrandProfile, BrandsFile, PoiCandidate, Resolution, ResolvedLocation,
    SourceTier, StoreQuery, UnresolvedReason,
};
use storegeo_nominatim::PostalAddress;
use storegeo_overpass::{PoiSearchSpec, SearchArea};

use crate::matcher::{
    match_candidates, MatchPolicy, MatchResult, NameStrength, DEFAULT_MAX_DISTANCE_M,
};
use crate::source::{AddressGeocoder, PoiSource};

#[derive(Debug, Clone, PartialEq)]
pub struct ResolverSettings {
    pub max_distance_m: f64,
    /// Radius of the POI search around declared coordinates.
    pub search_radius_m: u32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_distance_m: DEFAULT_MAX_DISTANCE_M,
            search_radius_m: 2000,
        }
    }
}

impl From<&AppConfig> for ResolverSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_distance_m: config.match_max_distance_m,
            search_radius_m: config.poi_search_radius_m,
        }
    }
}

/// What happened in the POI tier for one store.
#[derive(Debug, Clone, PartialEq)]
pub enum PoiTierStatus {
    Matched(NameStrength),
    NoMatch,
    /// Neither valid coordinates nor a city to search around.
    Skipped,
    /// The POI source failed. `transient` errors may succeed on a later run.
    Unavailable { error: String, transient: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionReport {
    pub resolution: Resolution,
    pub poi_status: PoiTierStatus,
}

enum TierState {
    PoiLookup,
    ScraperCheck,
    AddressGeocode,
    Done(ResolvedLocation),
    Unresolved(UnresolvedReason),
}

/// Resolves store records to one location each.
///
/// Holds no per-store state, so one resolver can serve many concurrent
/// resolutions. Rate limiting lives in the sources.
pub struct TieredResolver<P, G> {
    poi: P,
    geocoder: G,
    brands: BrandsFile,
    settings: ResolverSettings,
}

impl<P: PoiSource, G: AddressGeocoder> TieredResolver<P, G> {
    #[must_use]
    pub fn new(poi: P, geocoder: G, brands: BrandsFile, settings: ResolverSettings) -> Self {
        Self {
            poi,
            geocoder,
            brands,
            settings,
        }
    }

    #[must_use]
    pub fn poi_source(&self) -> &P {
        &self.poi
    }

    #[must_use]
    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Resolves one store. Never fails: every store ends `Resolved` or
    /// `Unresolved`.
    pub async fn resolve(&self, query: &StoreQuery) -> Resolution {
        self.resolve_with_report(query).await.resolution
    }

    /// Like [`resolve`](Self::resolve), also reporting the POI tier outcome.
    pub async fn resolve_with_report(&self, query: &StoreQuery) -> ResolutionReport {
        let mut state = TierState::PoiLookup;
        let mut poi_status = PoiTierStatus::NoMatch;

        loop {
            state = match state {
                TierState::PoiLookup => {
                    let (next, status) = self.poi_lookup(query).await;
                    poi_status = status;
                    next
                }
                TierState::ScraperCheck => match query.declared_coordinates() {
                    Some(declared) => TierState::Done(ResolvedLocation::from_source(
                        declared,
                        SourceTier::Scraper,
                    )),
                    None => TierState::AddressGeocode,
                },
                TierState::AddressGeocode => self.address_geocode(query).await,
                TierState::Done(location) => {
                    tracing::info!(
                        store = %query.name,
                        source = %location.source,
                        confidence = %location.confidence,
                        "store resolved"
                    );
                    return ResolutionReport {
                        resolution: Resolution::Resolved(location),
                        poi_status,
                    };
                }
                TierState::Unresolved(reason) => {
                    tracing::warn!(store = %query.name, reason = %reason, "store unresolved");
                    return ResolutionReport {
                        resolution: Resolution::Unresolved { reason },
                        poi_status,
                    };
                }
            };
        }
    }

    fn search_spec(
        &self,
        query: &StoreQuery,
        profile: Option<&BrandProfile>,
        policy: &MatchPolicy,
    ) -> Option<PoiSearchSpec> {
        let area = match query.declared_coordinates() {
            Some(center) => SearchArea::Around {
                center,
                radius_m: self.settings.search_radius_m,
            },
            None if !query.city.trim().is_empty() => {
                SearchArea::Locality(query.city.trim().to_string())
            }
            None => return None,
        };

        let aliases = profile
            .map(|p| p.names().map(str::to_owned).collect())
            .unwrap_or_default();

        Some(
            PoiSearchSpec::new(brand_token(&query.name, &query.city))
                .with_aliases(aliases)
                .with_shop_types(policy.shop_types.clone())
                .with_area(area),
        )
    }

    async fn poi_lookup(&self, query: &StoreQuery) -> (TierState, PoiTierStatus) {
        let profile = self.brands.find(&query.name);
        let policy = MatchPolicy::for_query(query, profile, self.settings.max_distance_m);

        let Some(spec) = self.search_spec(query, profile, &policy) else {
            tracing::debug!(store = %query.name, "no locality for POI search");
            return (TierState::ScraperCheck, PoiTierStatus::Skipped);
        };

        let candidates = match self.poi.search(&spec).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(
                    store = %query.name,
                    error = %err,
                    "POI lookup failed, falling back"
                );
                let status = PoiTierStatus::Unavailable {
                    error: err.to_string(),
                    transient: err.is_transient(),
                };
                return (TierState::ScraperCheck, status);
            }
        };

        match match_candidates(query, &candidates, &policy) {
            MatchResult::NoMatch => {
                tracing::debug!(
                    store = %query.name,
                    candidates = candidates.len(),
                    "no matching POI"
                );
                (TierState::ScraperCheck, PoiTierStatus::NoMatch)
            }
            MatchResult::ExactMatch {
                candidate,
                distance_m,
            } => (
                poi_location(&candidate, distance_m),
                PoiTierStatus::Matched(NameStrength::Exact),
            ),
            MatchResult::FuzzyMatch {
                candidate,
                distance_m,
            } => (
                poi_location(&candidate, distance_m),
                PoiTierStatus::Matched(NameStrength::Fuzzy),
            ),
        }
    }

    async fn address_geocode(&self, query: &StoreQuery) -> TierState {
        let address = PostalAddress::from_query(query);
        let Some(address_line) = address.to_query_string() else {
            return TierState::Unresolved(UnresolvedReason::NoAddress);
        };

        match self.geocoder.geocode(&address).await {
            Ok(Some(point)) if !point.coordinates.is_valid() => {
                tracing::warn!(
                    store = %query.name,
                    lat = point.coordinates.lat,
                    lon = point.coordinates.lon,
                    "geocoder returned an unusable position"
                );
                TierState::Unresolved(UnresolvedReason::AddressNotFound {
                    address: address_line,
                })
            }
            Ok(Some(point)) => {
                let mut location =
                    ResolvedLocation::from_source(point.coordinates, SourceTier::Geocoded);
                location.geocoded_display_name = point.display_name;
                TierState::Done(location)
            }
            Ok(None) => TierState::Unresolved(UnresolvedReason::AddressNotFound {
                address: address_line,
            }),
            Err(err) => {
                tracing::warn!(store = %query.name, error = %err, "geocoding failed");
                TierState::Unresolved(UnresolvedReason::GeocoderFailed {
                    error: err.to_string(),
                })
            }
        }
    }
}

fn poi_location(candidate: &PoiCandidate, distance_m: Option<f64>) -> TierState {
    let mut location = ResolvedLocation::from_source(candidate.coordinates, SourceTier::Poi);
    location.matched_poi_name = Some(candidate.name.clone());
    location.matched_poi_id = Some(candidate.source_id.clone());
    location.poi_distance_m = distance_m;
    location.poi_address = candidate.address();
    TierState::Done(location)
}
