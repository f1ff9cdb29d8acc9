//! Seams between the resolver and its external data sources.

use std::future::Future;

use storegeo_core::PoiCandidate;
use storegeo_nominatim::{GeocodeError, GeocodedPoint, NominatimClient, PostalAddress};
use storegeo_overpass::{OverpassClient, PoiSearchSpec, QueryError};

/// Anything that can answer a POI search.
pub trait PoiSource: Send + Sync {
    fn search(
        &self,
        spec: &PoiSearchSpec,
    ) -> impl Future<Output = Result<Vec<PoiCandidate>, QueryError>> + Send;
}

/// Anything that can turn a postal address into a point.
///
/// `Ok(None)` means the address was understood but not found.
pub trait AddressGeocoder: Send + Sync {
    fn geocode(
        &self,
        address: &PostalAddress,
    ) -> impl Future<Output = Result<Option<GeocodedPoint>, GeocodeError>> + Send;
}

impl PoiSource for OverpassClient {
    fn search(
        &self,
        spec: &PoiSearchSpec,
    ) -> impl Future<Output = Result<Vec<PoiCandidate>, QueryError>> + Send {
        OverpassClient::search(self, spec)
    }
}

impl AddressGeocoder for NominatimClient {
    fn geocode(
        &self,
        address: &PostalAddress,
    ) -> impl Future<Output = Result<Option<GeocodedPoint>, GeocodeError>> + Send {
        NominatimClient::geocode(self, address)
    }
}
