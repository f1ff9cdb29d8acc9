pub mod address;
pub mod client;
pub mod error;
pub mod types;

pub use address::{country_name, PostalAddress};
pub use client::NominatimClient;
pub use error::GeocodeError;
pub use types::{GeocodedPoint, NominatimPlace};
