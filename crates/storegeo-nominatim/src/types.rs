use serde::Deserialize;
use storegeo_core::Coordinates;

use crate::error::GeocodeError;

/// One entry of a Nominatim `/search` response. Coordinates arrive as
/// decimal strings.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A successfully geocoded address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPoint {
    pub coordinates: Coordinates,
    pub display_name: Option<String>,
}

impl TryFrom<NominatimPlace> for GeocodedPoint {
    type Error = GeocodeError;

    fn try_from(place: NominatimPlace) -> Result<Self, Self::Error> {
        let invalid = || GeocodeError::InvalidCoordinates {
            lat: place.lat.clone(),
            lon: place.lon.clone(),
        };
        let lat = place.lat.trim().parse::<f64>().map_err(|_| invalid())?;
        let lon = place.lon.trim().parse::<f64>().map_err(|_| invalid())?;
        let coordinates = Coordinates::new(lat, lon);
        if !coordinates.is_valid() {
            return Err(invalid());
        }
        Ok(Self {
            coordinates,
            display_name: place.display_name.filter(|n| !n.is_empty()),
        })
    }
}
