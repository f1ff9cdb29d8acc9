use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can use a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(invalid(var, format!("must be a positive number, got {value}")))
        }
    };

    let log_level = or_default("STOREGEO_LOG_LEVEL", "info");
    let user_agent = or_default("STOREGEO_USER_AGENT", "storegeo/0.1 (store-geocoding)");
    let brands_path = PathBuf::from(or_default("STOREGEO_BRANDS_PATH", "./config/brands.yaml"));

    let overpass_url = or_default(
        "STOREGEO_OVERPASS_URL",
        "https://overpass-api.de/api/interpreter",
    );
    let overpass_timeout_secs = parse_u64("STOREGEO_OVERPASS_TIMEOUT_SECS", "30")?;
    let overpass_min_interval_ms = parse_u64("STOREGEO_OVERPASS_MIN_INTERVAL_MS", "1500")?;
    let overpass_daily_limit = parse_u32("STOREGEO_OVERPASS_DAILY_LIMIT", "10000")?;

    let nominatim_url = or_default(
        "STOREGEO_NOMINATIM_URL",
        "https://nominatim.openstreetmap.org/search",
    );
    let nominatim_timeout_secs = parse_u64("STOREGEO_NOMINATIM_TIMEOUT_SECS", "10")?;
    let nominatim_min_interval_ms = parse_u64("STOREGEO_NOMINATIM_MIN_INTERVAL_MS", "1000")?;

    let match_max_distance_m = parse_positive_f64("STOREGEO_MATCH_MAX_DISTANCE_M", "2000")?;
    let poi_search_radius_m = parse_u32("STOREGEO_POI_SEARCH_RADIUS_M", "2000")?;

    let max_concurrent_stores = parse_usize("STOREGEO_MAX_CONCURRENT_STORES", "1")?;
    if max_concurrent_stores == 0 {
        return Err(invalid(
            "STOREGEO_MAX_CONCURRENT_STORES",
            "must be at least 1".to_string(),
        ));
    }
    let poi_retry_rounds = parse_u32("STOREGEO_POI_RETRY_ROUNDS", "0")?;
    let poi_retry_backoff_base_secs = parse_u64("STOREGEO_POI_RETRY_BACKOFF_BASE_SECS", "30")?;

    Ok(AppConfig {
        log_level,
        user_agent,
        brands_path,
        overpass_url,
        overpass_timeout_secs,
        overpass_min_interval_ms,
        overpass_daily_limit,
        nominatim_url,
        nominatim_timeout_secs,
        nominatim_min_interval_ms,
        match_max_distance_m,
        poi_search_radius_m,
        max_concurrent_stores,
        poi_retry_rounds,
        poi_retry_backoff_base_secs,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
