//! Tier selection tests for `TieredResolver` using in-memory sources.

mod support;

use storegeo_core::{
    BrandProfile, BrandsFile, ConfidenceTier, Coordinates, Resolution, SourceTier,
    UnresolvedReason,
};
use storegeo_overpass::SearchArea;
use storegeo_resolver::{NameStrength, PoiTierStatus, ResolverSettings, TieredResolver};

use support::{
    bamberg_poi, bamberg_store, poi, store, FakeGeocoder, FakePoiSource, GeocodeResponse,
    PoiResponse, BAMBERG_POI, FAKE_DISPLAY_NAME,
};

const KRONACH: Coordinates = Coordinates::new(50.241_2, 11.327_7);

fn resolver(
    poi: FakePoiSource,
    geocoder: FakeGeocoder,
) -> TieredResolver<FakePoiSource, FakeGeocoder> {
    TieredResolver::new(poi, geocoder, BrandsFile::default(), ResolverSettings::default())
}

fn expect_resolved(resolution: &Resolution) -> &storegeo_core::ResolvedLocation {
    resolution
        .location()
        .unwrap_or_else(|| panic!("expected resolved, got {resolution:?}"))
}

// ---------------------------------------------------------------------------
// Tier outcomes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn exact_poi_match_near_declared_coordinates_is_high() {
    let r = resolver(
        FakePoiSource::always(PoiResponse::Candidates(vec![bamberg_poi()])),
        FakeGeocoder::new(GeocodeResponse::NotFound),
    );

    let report = r.resolve_with_report(&bamberg_store()).await;
    let location = expect_resolved(&report.resolution);

    assert_eq!(location.confidence, ConfidenceTier::High);
    assert_eq!(location.source, SourceTier::Poi);
    assert_eq!(location.coordinates(), BAMBERG_POI);
    assert_eq!(location.matched_poi_name.as_deref(), Some("Denns BioMarkt"));
    assert_eq!(location.matched_poi_id.as_deref(), Some("node/4242424242"));
    assert!(location.poi_distance_m.is_some_and(|d| d < 20.0));
    let address = location.poi_address.as_ref().expect("POI address");
    assert_eq!(address.street.as_deref(), Some("Obere Königstraße"));
    assert_eq!(address.housenumber.as_deref(), Some("20"));
    assert!(location.geocoded_display_name.is_none());
    assert_eq!(report.poi_status, PoiTierStatus::Matched(NameStrength::Exact));
    assert_eq!(r.geocoder().calls(), 0);
}

#[tokio::test]
async fn no_poi_with_valid_declared_coordinates_uses_them_exactly() {
    let r = resolver(
        FakePoiSource::empty(),
        FakeGeocoder::new(GeocodeResponse::Found(Coordinates::new(50.0, 11.0))),
    );
    let query = store(
        "Denns BioMarkt Kronach",
        "Kaulanger 9",
        "96317",
        "Kronach",
        Some(KRONACH),
    );

    let resolution = r.resolve(&query).await;
    let location = expect_resolved(&resolution);

    assert_eq!(location.source, SourceTier::Scraper);
    assert_eq!(location.confidence, ConfidenceTier::Medium);
    assert_eq!(location.latitude.to_bits(), KRONACH.lat.to_bits());
    assert_eq!(location.longitude.to_bits(), KRONACH.lon.to_bits());
    assert!(location.matched_poi_name.is_none());
    assert_eq!(r.geocoder().calls(), 0);
}

#[tokio::test]
async fn sentinel_coordinates_fall_through_to_geocoder() {
    let geocoded = Coordinates::new(49.452_1, 11.076_7);
    let r = resolver(
        FakePoiSource::empty(),
        FakeGeocoder::new(GeocodeResponse::Found(geocoded)),
    );
    let query = store(
        "Denns BioMarkt Nürnberg",
        "Königstraße 1",
        "90402",
        "Nürnberg",
        Some(Coordinates::new(0.0, 0.0)),
    );

    let resolution = r.resolve(&query).await;
    let location = expect_resolved(&resolution);

    assert_eq!(location.source, SourceTier::Geocoded);
    assert_eq!(location.confidence, ConfidenceTier::Low);
    assert_eq!(location.coordinates(), geocoded);
    assert_eq!(
        location.geocoded_display_name.as_deref(),
        Some(FAKE_DISPLAY_NAME)
    );
    assert!(location.matched_poi_name.is_none());
    assert_eq!(r.geocoder().calls(), 1);
}

#[tokio::test]
async fn plain_brand_name_in_kronach_keeps_declared_coordinates() {
    let declared = Coordinates::new(51.327, 11.326);
    let r = resolver(
        FakePoiSource::empty(),
        FakeGeocoder::new(GeocodeResponse::NotFound),
    );
    let query = store("Denns BioMarkt", "", "", "Kronach", Some(declared));

    let resolution = r.resolve(&query).await;
    let location = expect_resolved(&resolution);

    assert_eq!(location.source, SourceTier::Scraper);
    assert_eq!(location.confidence, ConfidenceTier::Medium);
    assert_eq!(location.latitude.to_bits(), 51.327_f64.to_bits());
    assert_eq!(location.longitude.to_bits(), 11.326_f64.to_bits());
    assert_eq!(r.poi_source().specs()[0].name, "Denns BioMarkt");
    assert_eq!(r.geocoder().calls(), 0);
}

#[tokio::test]
async fn poi_at_sentinel_position_falls_through_to_geocoder() {
    let geocoded = Coordinates::new(50.241_2, 11.327_7);
    let r = resolver(
        FakePoiSource::always(PoiResponse::Candidates(vec![poi(
            "node/1",
            "Denns BioMarkt",
            Coordinates::new(0.0, 0.0),
            &[],
        )])),
        FakeGeocoder::new(GeocodeResponse::Found(geocoded)),
    );
    let query = store("Denns BioMarkt", "Kaulanger 9", "96317", "Kronach", None);

    let report = r.resolve_with_report(&query).await;
    let location = expect_resolved(&report.resolution);

    assert_eq!(report.poi_status, PoiTierStatus::NoMatch);
    assert_eq!(location.source, SourceTier::Geocoded);
    assert_eq!(location.coordinates(), geocoded);
    assert!(!location.coordinates().is_sentinel());
    assert_eq!(r.geocoder().calls(), 1);
}

#[tokio::test]
async fn geocoder_sentinel_position_is_unresolved() {
    let r = resolver(
        FakePoiSource::empty(),
        FakeGeocoder::new(GeocodeResponse::Found(Coordinates::new(0.0, 0.0))),
    );
    let query = store("Denns BioMarkt", "Kaulanger 9", "96317", "Kronach", None);

    let resolution = r.resolve(&query).await;
    assert!(
        matches!(
            resolution,
            Resolution::Unresolved {
                reason: UnresolvedReason::AddressNotFound { .. }
            }
        ),
        "got {resolution:?}"
    );
}

#[tokio::test]
async fn sentinel_and_unknown_address_is_unresolved() {
    let r = resolver(
        FakePoiSource::empty(),
        FakeGeocoder::new(GeocodeResponse::NotFound),
    );
    let query = store(
        "Denns BioMarkt Nirgendwo",
        "Unbekannte Straße 99",
        "00000",
        "Nirgendwo",
        Some(Coordinates::new(0.0, 0.0)),
    );

    let resolution = r.resolve(&query).await;
    match resolution {
        Resolution::Unresolved {
            reason: UnresolvedReason::AddressNotFound { ref address },
        } => assert!(address.contains("Nirgendwo")),
        other => panic!("expected unresolved, got {other:?}"),
    }
}

#[tokio::test]
async fn geocoder_failure_is_unresolved_not_low() {
    let r = resolver(FakePoiSource::empty(), FakeGeocoder::new(GeocodeResponse::Fails));
    let query = store("Denns BioMarkt", "Hauptstraße 1", "96450", "Coburg", None);

    let resolution = r.resolve(&query).await;
    assert!(
        matches!(
            resolution,
            Resolution::Unresolved {
                reason: UnresolvedReason::GeocoderFailed { .. }
            }
        ),
        "got {resolution:?}"
    );
}

#[tokio::test]
async fn store_without_any_address_is_unresolved_without_calls() {
    let r = resolver(
        FakePoiSource::empty(),
        FakeGeocoder::new(GeocodeResponse::Found(KRONACH)),
    );
    let query = store("Denns BioMarkt", "", "", "", None);

    let report = r.resolve_with_report(&query).await;
    assert_eq!(
        report.resolution,
        Resolution::Unresolved {
            reason: UnresolvedReason::NoAddress
        }
    );
    assert_eq!(report.poi_status, PoiTierStatus::Skipped);
    assert_eq!(r.poi_source().calls(), 0);
    assert_eq!(r.geocoder().calls(), 0);
}

#[tokio::test]
async fn exact_poi_beyond_radius_falls_back_to_scraper() {
    let declared = Coordinates::new(49.6004, 11.0071);
    let r = resolver(
        FakePoiSource::always(PoiResponse::Candidates(vec![poi(
            "node/77",
            "Denns BioMarkt",
            Coordinates::new(49.578_89, 11.002_71),
            &[],
        )])),
        FakeGeocoder::new(GeocodeResponse::NotFound),
    );
    let query = store(
        "Denns BioMarkt Erlangen",
        "Nürnberger Straße 7",
        "91052",
        "Erlangen",
        Some(declared),
    );

    let report = r.resolve_with_report(&query).await;
    let location = expect_resolved(&report.resolution);
    assert_eq!(location.source, SourceTier::Scraper);
    assert_eq!(location.coordinates(), declared);
    assert_eq!(report.poi_status, PoiTierStatus::NoMatch);
}

// ---------------------------------------------------------------------------
// POI source failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rate_limited_poi_source_falls_through() {
    let r = resolver(
        FakePoiSource::always(PoiResponse::RateLimited),
        FakeGeocoder::new(GeocodeResponse::NotFound),
    );

    let report = r.resolve_with_report(&bamberg_store()).await;
    let location = expect_resolved(&report.resolution);
    assert_eq!(location.source, SourceTier::Scraper);
    assert!(matches!(
        report.poi_status,
        PoiTierStatus::Unavailable {
            transient: true,
            ..
        }
    ));
}

#[tokio::test]
async fn gateway_timeout_then_geocoder() {
    let r = resolver(
        FakePoiSource::always(PoiResponse::GatewayTimeout),
        FakeGeocoder::new(GeocodeResponse::Found(KRONACH)),
    );
    let query = store("Denns BioMarkt", "Kaulanger 9", "96317", "Kronach", None);

    let report = r.resolve_with_report(&query).await;
    assert_eq!(
        expect_resolved(&report.resolution).source,
        SourceTier::Geocoded
    );
    assert!(matches!(
        report.poi_status,
        PoiTierStatus::Unavailable { ref error, .. } if error.contains("504")
    ));
}

#[tokio::test]
async fn exhausted_budget_is_not_transient() {
    let r = resolver(
        FakePoiSource::always(PoiResponse::BudgetExhausted),
        FakeGeocoder::new(GeocodeResponse::NotFound),
    );
    let report = r.resolve_with_report(&bamberg_store()).await;
    assert!(matches!(
        report.poi_status,
        PoiTierStatus::Unavailable {
            transient: false,
            ..
        }
    ));
}

// ---------------------------------------------------------------------------
// Search construction and determinism
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_uses_brand_token_and_radius_around_declared_point() {
    let r = resolver(FakePoiSource::empty(), FakeGeocoder::new(GeocodeResponse::NotFound));
    r.resolve(&bamberg_store()).await;

    let specs = r.poi_source().specs();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].name, "Denns BioMarkt");
    assert_eq!(
        specs[0].area,
        Some(SearchArea::Around {
            center: bamberg_store().coordinates.unwrap(),
            radius_m: 2000,
        })
    );
    assert_eq!(
        specs[0].shop_types,
        vec!["supermarket", "organic", "health_food"]
    );
}

#[tokio::test]
async fn search_without_coordinates_uses_city() {
    let r = resolver(FakePoiSource::empty(), FakeGeocoder::new(GeocodeResponse::NotFound));
    let query = store("Denns BioMarkt Kronach", "", "", "Kronach", None);
    r.resolve(&query).await;

    let specs = r.poi_source().specs();
    assert_eq!(
        specs[0].area,
        Some(SearchArea::Locality("Kronach".to_string()))
    );
    assert_eq!(specs[0].name, "Denns BioMarkt");
}

#[tokio::test]
async fn brand_profile_feeds_aliases_and_shop_types() {
    let brands = BrandsFile {
        brands: vec![BrandProfile {
            name: "Denns BioMarkt".to_string(),
            aliases: vec!["denn's Biomarkt".to_string()],
            shop_types: vec!["organic".to_string()],
        }],
    };
    let r = TieredResolver::new(
        FakePoiSource::always(PoiResponse::Candidates(vec![{
            let mut p = poi("node/5", "denn's Biomarkt", BAMBERG_POI, &[]);
            p.tags.insert("shop".to_string(), "organic".to_string());
            p
        }])),
        FakeGeocoder::new(GeocodeResponse::NotFound),
        brands,
        ResolverSettings::default(),
    );

    let report = r.resolve_with_report(&bamberg_store()).await;
    assert_eq!(
        expect_resolved(&report.resolution).source,
        SourceTier::Poi
    );
    let spec = &r.poi_source().specs()[0];
    assert!(spec.aliases.iter().any(|a| a == "denn's Biomarkt"));
    assert_eq!(spec.shop_types, vec!["organic"]);
}

#[tokio::test]
async fn resolving_twice_gives_identical_results() {
    let r = resolver(
        FakePoiSource::always(PoiResponse::Candidates(vec![bamberg_poi()])),
        FakeGeocoder::new(GeocodeResponse::NotFound),
    );
    let first = r.resolve(&bamberg_store()).await;
    let second = r.resolve(&bamberg_store()).await;
    assert_eq!(first, second);

    let r = resolver(
        FakePoiSource::empty(),
        FakeGeocoder::new(GeocodeResponse::Found(KRONACH)),
    );
    let query = store("Denns BioMarkt", "Kaulanger 9", "96317", "Kronach", None);
    assert_eq!(r.resolve(&query).await, r.resolve(&query).await);
}

#[tokio::test]
async fn resolved_coordinates_are_never_zero_zero() {
    let r = resolver(
        FakePoiSource::empty(),
        FakeGeocoder::new(GeocodeResponse::NotFound),
    );
    let query = store(
        "Denns BioMarkt",
        "Hauptstraße 1",
        "96317",
        "Kronach",
        Some(Coordinates::new(0.0, 0.0)),
    );
    let resolution = r.resolve(&query).await;
    if let Some(location) = resolution.location() {
        assert!(!location.coordinates().is_sentinel());
    }
    assert!(!resolution.is_resolved());
}
