pub mod app_config;
pub mod brands;
pub mod config;
pub mod normalize;
pub mod throttle;
pub mod types;

pub use app_config::AppConfig;
pub use brands::{load_brands, BrandProfile, BrandsFile, DEFAULT_SHOP_TYPES};
pub use config::{load_app_config, load_app_config_from_env};
pub use normalize::{brand_token, is_apostrophe, normalize_name, store_key};
pub use throttle::{Clock, ManualClock, RateLimiter, TokioClock};
pub use types::{
    ConfidenceTier, Coordinates, PoiAddress, PoiCandidate, Resolution, ResolvedLocation,
    SourceTier, StoreQuery, UnresolvedReason,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brands file {path}: {source}")]
    BrandsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brands file: {0}")]
    BrandsFileParse(#[from] serde_yaml::Error),

    #[error("brands validation failed: {0}")]
    Validation(String),
}
