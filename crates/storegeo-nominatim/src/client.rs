//! HTTP client for the Nominatim `/search` endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use storegeo_core::{AppConfig, Clock, RateLimiter};

use crate::address::PostalAddress;
use crate::error::GeocodeError;
use crate::types::{GeocodedPoint, NominatimPlace};

/// Address geocoder with its own rate limiter (the public instance allows
/// one request per second).
pub struct NominatimClient {
    client: Client,
    endpoint: String,
    limiter: RateLimiter,
}

impl NominatimClient {
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        endpoint: &str,
        timeout_secs: u64,
        user_agent: &str,
        min_interval: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
            limiter: RateLimiter::new(min_interval),
        })
    }

    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, GeocodeError> {
        Self::new(
            &config.nominatim_url,
            config.nominatim_timeout_secs,
            &config.user_agent,
            config.nominatim_min_interval(),
        )
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.limiter = RateLimiter::with_clock(self.limiter.min_interval(), clock);
        self
    }

    /// Geocodes an address to a single best point.
    ///
    /// Returns `Ok(None)` when the address is empty (no request is made) or
    /// the geocoder finds nothing.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::Http`]: network, TLS, or timeout failure.
    /// - [`GeocodeError::UnexpectedStatus`]: any non-2xx status.
    /// - [`GeocodeError::Deserialize`]: body is not a JSON array of places.
    /// - [`GeocodeError::InvalidCoordinates`]: first place has unusable coordinates.
    pub async fn geocode(
        &self,
        address: &PostalAddress,
    ) -> Result<Option<GeocodedPoint>, GeocodeError> {
        let Some(query) = address.to_query_string() else {
            tracing::warn!("no address components provided for geocoding");
            return Ok(None);
        };

        self.limiter.acquire().await;
        tracing::debug!(%query, "nominatim search");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query.as_str()),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "0"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), %query, "nominatim error status");
            return Err(GeocodeError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let places = serde_json::from_str::<Vec<NominatimPlace>>(&body).map_err(|e| {
            GeocodeError::Deserialize {
                context: format!("nominatim search for \"{query}\""),
                source: e,
            }
        })?;

        let Some(first) = places.into_iter().next() else {
            tracing::info!(%query, "no geocoding result");
            return Ok(None);
        };

        GeocodedPoint::try_from(first).map(Some)
    }
}

impl std::fmt::Debug for NominatimClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NominatimClient")
            .field("endpoint", &self.endpoint)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}
