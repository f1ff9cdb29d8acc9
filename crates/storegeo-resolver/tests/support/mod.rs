//! In-memory POI source and geocoder used by the resolver tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use storegeo_core::{Coordinates, PoiCandidate, StoreQuery};
use storegeo_nominatim::{GeocodeError, GeocodedPoint, PostalAddress};
use storegeo_overpass::{PoiSearchSpec, QueryError};
use storegeo_resolver::{AddressGeocoder, PoiSource};

pub const BAMBERG_STORE: Coordinates = Coordinates::new(49.896_87, 10.893_95);
pub const BAMBERG_POI: Coordinates = Coordinates::new(49.896_829_9, 10.893_864_6);
pub const FAKE_DISPLAY_NAME: &str = "Königstraße 1, 90402 Nürnberg, Deutschland";

#[derive(Debug, Clone)]
pub enum PoiResponse {
    Candidates(Vec<PoiCandidate>),
    RateLimited,
    GatewayTimeout,
    BudgetExhausted,
}

impl PoiResponse {
    fn into_result(self) -> Result<Vec<PoiCandidate>, QueryError> {
        match self {
            PoiResponse::Candidates(c) => Ok(c),
            PoiResponse::RateLimited => Err(QueryError::RateLimited {
                retry_after_secs: Some(60),
            }),
            PoiResponse::GatewayTimeout => Err(QueryError::ServerUnavailable {
                status: Some(504),
                reason: "gateway timeout (HTTP 504)".to_string(),
            }),
            PoiResponse::BudgetExhausted => Err(QueryError::DailyLimitReached { limit: 10_000 }),
        }
    }
}

/// Replays responses in order; the last one repeats forever.
pub struct FakePoiSource {
    responses: Mutex<VecDeque<PoiResponse>>,
    last: Mutex<Option<PoiResponse>>,
    calls: AtomicUsize,
    specs: Mutex<Vec<PoiSearchSpec>>,
}

impl FakePoiSource {
    pub fn sequence(responses: Vec<PoiResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            specs: Mutex::new(Vec::new()),
        }
    }

    pub fn always(response: PoiResponse) -> Self {
        Self::sequence(vec![response])
    }

    pub fn empty() -> Self {
        Self::always(PoiResponse::Candidates(Vec::new()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn specs(&self) -> Vec<PoiSearchSpec> {
        self.specs.lock().unwrap().clone()
    }
}

impl PoiSource for FakePoiSource {
    fn search(
        &self,
        spec: &PoiSearchSpec,
    ) -> impl Future<Output = Result<Vec<PoiCandidate>, QueryError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.specs.lock().unwrap().push(spec.clone());

        let mut last = self.last.lock().unwrap();
        let response = match self.responses.lock().unwrap().pop_front() {
            Some(next) => {
                *last = Some(next.clone());
                next
            }
            None => last
                .clone()
                .unwrap_or(PoiResponse::Candidates(Vec::new())),
        };
        std::future::ready(response.into_result())
    }
}

#[derive(Debug, Clone)]
pub enum GeocodeResponse {
    Found(Coordinates),
    NotFound,
    Fails,
}

pub struct FakeGeocoder {
    response: GeocodeResponse,
    calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn new(response: GeocodeResponse) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AddressGeocoder for FakeGeocoder {
    fn geocode(
        &self,
        _address: &PostalAddress,
    ) -> impl Future<Output = Result<Option<GeocodedPoint>, GeocodeError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match &self.response {
            GeocodeResponse::Found(coordinates) => Ok(Some(GeocodedPoint {
                coordinates: *coordinates,
                display_name: Some(FAKE_DISPLAY_NAME.to_string()),
            })),
            GeocodeResponse::NotFound => Ok(None),
            GeocodeResponse::Fails => Err(GeocodeError::UnexpectedStatus { status: 503 }),
        };
        std::future::ready(result)
    }
}

pub fn store(
    name: &str,
    street: &str,
    zip: &str,
    city: &str,
    coordinates: Option<Coordinates>,
) -> StoreQuery {
    StoreQuery {
        name: name.to_string(),
        street: street.to_string(),
        zip: zip.to_string(),
        city: city.to_string(),
        country_code: Some("DE".to_string()),
        coordinates,
    }
}

pub fn poi(
    id: &str,
    name: &str,
    coordinates: Coordinates,
    extra: &[(&str, &str)],
) -> PoiCandidate {
    let mut tags = BTreeMap::new();
    tags.insert("name".to_string(), name.to_string());
    tags.insert("shop".to_string(), "supermarket".to_string());
    for (k, v) in extra {
        tags.insert((*k).to_string(), (*v).to_string());
    }
    PoiCandidate {
        name: name.to_string(),
        coordinates,
        source_id: id.to_string(),
        tags,
    }
}

pub fn bamberg_store() -> StoreQuery {
    store(
        "Denns BioMarkt Bamberg",
        "Obere Königstraße 20",
        "96052",
        "Bamberg",
        Some(BAMBERG_STORE),
    )
}

pub fn bamberg_poi() -> PoiCandidate {
    poi(
        "node/4242424242",
        "Denns BioMarkt",
        BAMBERG_POI,
        &[
            ("addr:street", "Obere Königstraße"),
            ("addr:housenumber", "20"),
            ("addr:postcode", "96052"),
            ("addr:city", "Bamberg"),
        ],
    )
}
