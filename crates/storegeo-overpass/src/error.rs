use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid POI query: {0}")]
    InvalidQuery(String),

    /// HTTP 429. Never retried inside the client.
    #[error("rate limited by Overpass API (HTTP 429)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// HTTP 504, any other non-2xx status, or a transport failure
    /// (`status` is `None` for connection errors and timeouts).
    #[error("Overpass API unavailable: {reason}")]
    ServerUnavailable { status: Option<u16>, reason: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("daily Overpass query budget of {limit} exhausted")]
    DailyLimitReached { limit: u32 },
}

impl QueryError {
    /// `true` for failures that may succeed on a later attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QueryError::RateLimited { .. } | QueryError::ServerUnavailable { .. }
        )
    }
}
