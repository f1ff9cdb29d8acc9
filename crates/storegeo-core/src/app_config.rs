use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub log_level: String,
    pub user_agent: String,
    pub brands_path: PathBuf,
    pub overpass_url: String,
    pub overpass_timeout_secs: u64,
    pub overpass_min_interval_ms: u64,
    pub overpass_daily_limit: u32,
    pub nominatim_url: String,
    pub nominatim_timeout_secs: u64,
    pub nominatim_min_interval_ms: u64,
    pub match_max_distance_m: f64,
    pub poi_search_radius_m: u32,
    pub max_concurrent_stores: usize,
    pub poi_retry_rounds: u32,
    pub poi_retry_backoff_base_secs: u64,
}

impl AppConfig {
    #[must_use]
    pub fn overpass_min_interval(&self) -> Duration {
        Duration::from_millis(self.overpass_min_interval_ms)
    }

    #[must_use]
    pub fn nominatim_min_interval(&self) -> Duration {
        Duration::from_millis(self.nominatim_min_interval_ms)
    }
}
