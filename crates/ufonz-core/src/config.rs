use std::path::PathBuf;

use chrono::NaiveDate;

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
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
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

    let log_level = or_default("UFONZ_LOG_LEVEL", "info");
    let tables_path = lookup("UFONZ_TABLES_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let geocoder_url = or_default("UFONZ_GEOCODER_URL", "https://nominatim.openstreetmap.org");
    if !geocoder_url.starts_with("http://") && !geocoder_url.starts_with("https://") {
        return Err(invalid(
            "UFONZ_GEOCODER_URL",
            format!("\"{geocoder_url}\" is not an http(s) URL"),
        ));
    }
    let geocoder_user_agent =
        or_default("UFONZ_GEOCODER_USER_AGENT", "ufonz/0.1 (sighting-geocoder)");

    let geocoder_timeout_secs = parse_u64("UFONZ_GEOCODER_TIMEOUT_SECS", "4")?;
    if geocoder_timeout_secs == 0 {
        return Err(invalid(
            "UFONZ_GEOCODER_TIMEOUT_SECS",
            "timeout must be at least one second".to_string(),
        ));
    }
    let geocoder_min_interval_ms = parse_u64("UFONZ_GEOCODER_MIN_INTERVAL_MS", "1000")?;
    let geocoder_max_retries = parse_u32("UFONZ_GEOCODER_MAX_RETRIES", "2")?;
    let geocoder_backoff_base_ms = parse_u64("UFONZ_GEOCODER_BACKOFF_BASE_MS", "500")?;

    let country_bias = or_default("UFONZ_COUNTRY_BIAS", "nz");
    let default_country = Some(or_default("UFONZ_DEFAULT_COUNTRY", "New Zealand"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let min_token_len = parse_usize("UFONZ_MIN_TOKEN_LEN", "2")?;
    let worker_reserve = parse_usize("UFONZ_WORKER_RESERVE", "1")?;

    let unknown_date_placeholder = match lookup("UFONZ_UNKNOWN_DATE_PLACEHOLDER") {
        Ok(raw) if !raw.trim().is_empty() => Some(
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|e| invalid("UFONZ_UNKNOWN_DATE_PLACEHOLDER", e.to_string()))?,
        ),
        _ => None,
    };

    Ok(AppConfig {
        log_level,
        tables_path,
        geocoder_url,
        geocoder_user_agent,
        geocoder_timeout_secs,
        geocoder_min_interval_ms,
        geocoder_max_retries,
        geocoder_backoff_base_ms,
        country_bias,
        default_country,
        min_token_len,
        worker_reserve,
        unknown_date_placeholder,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
