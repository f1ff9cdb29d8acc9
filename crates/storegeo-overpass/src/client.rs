//! Rate-limited HTTP client for the Overpass API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use storegeo_core::{AppConfig, Clock, PoiCandidate, RateLimiter};

use crate::error::QueryError;
use crate::query::{build_query, PoiSearchSpec};
use crate::types::OverpassResponse;

/// POI search client for one Overpass endpoint.
///
/// Every outbound request passes through the client's own [`RateLimiter`],
/// so all callers sharing one client share one minimum interval. Failures
/// are classified into [`QueryError`] variants and never retried here;
/// the caller decides whether to fall back or try again later.
pub struct OverpassClient {
    client: Client,
    endpoint: String,
    timeout_secs: u64,
    limiter: RateLimiter,
    daily_limit: u32,
    queries_issued: AtomicU32,
}

impl OverpassClient {
    /// Creates an `OverpassClient` posting to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        endpoint: &str,
        timeout_secs: u64,
        user_agent: &str,
        min_interval: Duration,
        daily_limit: u32,
    ) -> Result<Self, QueryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
            timeout_secs,
            limiter: RateLimiter::new(min_interval),
            daily_limit,
            queries_issued: AtomicU32::new(0),
        })
    }

    /// # Errors
    ///
    /// Returns [`QueryError::Http`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, QueryError> {
        Self::new(
            &config.overpass_url,
            config.overpass_timeout_secs,
            &config.user_agent,
            config.overpass_min_interval(),
            config.overpass_daily_limit,
        )
    }

    /// Replaces the limiter's clock. Used by tests to measure spacing without
    /// real sleeps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.limiter = RateLimiter::with_clock(self.limiter.min_interval(), clock);
        self
    }

    /// Requests attempted since construction or the last budget reset.
    #[must_use]
    pub fn queries_issued(&self) -> u32 {
        self.queries_issued.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn remaining_budget(&self) -> u32 {
        self.daily_limit.saturating_sub(self.queries_issued())
    }

    pub fn reset_daily_budget(&self) {
        self.queries_issued.store(0, Ordering::SeqCst);
    }

    /// Claims one unit of the daily budget, or fails without side effects.
    fn reserve_budget(&self) -> Result<(), QueryError> {
        let limit = self.daily_limit;
        self.queries_issued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |issued| {
                (issued < limit).then_some(issued + 1)
            })
            .map(|_| ())
            .map_err(|_| QueryError::DailyLimitReached { limit })
    }

    /// Searches for POIs matching `spec`.
    ///
    /// # Errors
    ///
    /// - [`QueryError::InvalidQuery`]: blank name or malformed area; no request is made.
    /// - [`QueryError::DailyLimitReached`]: budget exhausted; no request is made.
    /// - [`QueryError::RateLimited`]: HTTP 429.
    /// - [`QueryError::ServerUnavailable`]: HTTP 504, other non-2xx, or transport failure.
    /// - [`QueryError::Deserialize`]: 200 with a body that is not an Overpass response.
    pub async fn search(&self, spec: &PoiSearchSpec) -> Result<Vec<PoiCandidate>, QueryError> {
        let query = build_query(spec, self.timeout_secs)?;
        self.reserve_budget()?;

        self.limiter.acquire().await;
        tracing::debug!(name = %spec.name, %query, "overpass query");

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            tracing::warn!(?retry_after_secs, "overpass rate limit hit");
            return Err(QueryError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let reason = if status == reqwest::StatusCode::GATEWAY_TIMEOUT {
                "gateway timeout (HTTP 504)".to_string()
            } else {
                format!("unexpected HTTP status {}", status.as_u16())
            };
            return Err(QueryError::ServerUnavailable {
                status: Some(status.as_u16()),
                reason,
            });
        }

        let body = response.text().await.map_err(transport_error)?;
        let parsed = serde_json::from_str::<OverpassResponse>(&body).map_err(|e| {
            QueryError::Deserialize {
                context: format!("overpass response for \"{}\"", spec.name),
                source: e,
            }
        })?;

        if let Some(remark) = &parsed.remark {
            tracing::warn!(%remark, "overpass returned a remark");
        }

        let candidates = parsed.into_candidates();
        tracing::debug!(name = %spec.name, count = candidates.len(), "overpass candidates");
        Ok(candidates)
    }
}

fn transport_error(err: reqwest::Error) -> QueryError {
    let reason = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    QueryError::ServerUnavailable {
        status: err.status().map(|s| s.as_u16()),
        reason,
    }
}

impl std::fmt::Debug for OverpassClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverpassClient")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("limiter", &self.limiter)
            .field("daily_limit", &self.daily_limit)
            .field("queries_issued", &self.queries_issued())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
