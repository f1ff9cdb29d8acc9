//! Domain types shared by the query clients and the resolver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lon: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `true` for the `(0, 0)` placeholder the retailer emits when it has no
    /// position for a store.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_sentinel(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }

    /// Finite, inside the global lat/lon bounds, and not the sentinel.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
            && !self.is_sentinel()
    }
}

/// A store record as handed over by the scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreQuery {
    pub name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub city: String,
    /// ISO 3166-1 alpha-2 code, e.g. `"DE"`.
    #[serde(default)]
    pub country_code: Option<String>,
    /// Coordinates as declared by the retailer. May be the `(0, 0)` sentinel.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl StoreQuery {
    /// Declared coordinates, or `None` when missing or invalid.
    #[must_use]
    pub fn declared_coordinates(&self) -> Option<Coordinates> {
        self.coordinates.filter(Coordinates::is_valid)
    }
}

/// `addr:*` tags of an OSM feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoiAddress {
    pub street: Option<String>,
    pub housenumber: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl PoiAddress {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.housenumber.is_none()
            && self.postcode.is_none()
            && self.city.is_none()
            && self.country.is_none()
    }
}

/// A point-of-interest returned by the POI search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiCandidate {
    /// Value of the `name` tag; empty when the feature has none.
    pub name: String,
    pub coordinates: Coordinates,
    /// Opaque external id, e.g. `"node/123456"`.
    pub source_id: String,
    pub tags: BTreeMap<String, String>,
}

impl PoiCandidate {
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Address tags of the feature, `None` when it carries none.
    #[must_use]
    pub fn address(&self) -> Option<PoiAddress> {
        let get = |key: &str| self.tag(key).map(str::to_owned);
        let address = PoiAddress {
            street: get("addr:street"),
            housenumber: get("addr:housenumber"),
            postcode: get("addr:postcode"),
            city: get("addr:city"),
            country: get("addr:country"),
        };
        (!address.is_empty()).then_some(address)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceTier::High => write!(f, "high"),
            ConfidenceTier::Medium => write!(f, "medium"),
            ConfidenceTier::Low => write!(f, "low"),
        }
    }
}

/// Which source produced the final coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTier {
    Poi,
    Scraper,
    Geocoded,
}

impl SourceTier {
    /// The confidence that goes with each source.
    #[must_use]
    pub const fn confidence(self) -> ConfidenceTier {
        match self {
            SourceTier::Poi => ConfidenceTier::High,
            SourceTier::Scraper => ConfidenceTier::Medium,
            SourceTier::Geocoded => ConfidenceTier::Low,
        }
    }
}

impl std::fmt::Display for SourceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceTier::Poi => write!(f, "poi"),
            SourceTier::Scraper => write!(f, "scraper"),
            SourceTier::Geocoded => write!(f, "geocoded"),
        }
    }
}

/// The best-known position of a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub confidence: ConfidenceTier,
    pub source: SourceTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_poi_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_poi_id: Option<String>,
    /// Distance between the matched POI and the declared coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poi_distance_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poi_address: Option<PoiAddress>,
    /// The geocoder's label for the place it found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoded_display_name: Option<String>,
}

impl ResolvedLocation {
    /// A location taken from one of the coordinate-only tiers.
    #[must_use]
    pub fn from_source(coordinates: Coordinates, source: SourceTier) -> Self {
        Self {
            latitude: coordinates.lat,
            longitude: coordinates.lon,
            confidence: source.confidence(),
            source,
            matched_poi_name: None,
            matched_poi_id: None,
            poi_distance_m: None,
            poi_address: None,
            geocoded_display_name: None,
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Why a store could not be placed on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// The store record has no usable address components.
    NoAddress,
    /// The geocoder answered but found nothing for the address.
    AddressNotFound { address: String },
    /// The geocoder could not be reached or returned garbage.
    GeocoderFailed { error: String },
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnresolvedReason::NoAddress => write!(f, "store has no address to geocode"),
            UnresolvedReason::AddressNotFound { address } => {
                write!(f, "address not found: {address}")
            }
            UnresolvedReason::GeocoderFailed { error } => write!(f, "geocoder failed: {error}"),
        }
    }
}

/// Terminal outcome for one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(ResolvedLocation),
    Unresolved { reason: UnresolvedReason },
}

impl Resolution {
    #[must_use]
    pub fn location(&self) -> Option<&ResolvedLocation> {
        match self {
            Resolution::Resolved(location) => Some(location),
            Resolution::Unresolved { .. } => None,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}
