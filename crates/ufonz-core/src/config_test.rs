use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.tables_path.is_none());
    assert_eq!(cfg.geocoder_url, "https://nominatim.openstreetmap.org");
    assert_eq!(cfg.geocoder_user_agent, "ufonz/0.1 (sighting-geocoder)");
    assert_eq!(cfg.geocoder_timeout_secs, 4);
    assert_eq!(cfg.geocoder_min_interval_ms, 1000);
    assert_eq!(cfg.geocoder_max_retries, 2);
    assert_eq!(cfg.geocoder_backoff_base_ms, 500);
    assert_eq!(cfg.country_bias, "nz");
    assert_eq!(cfg.default_country.as_deref(), Some("New Zealand"));
    assert_eq!(cfg.min_token_len, 2);
    assert_eq!(cfg.worker_reserve, 1);
    assert!(cfg.unknown_date_placeholder.is_none());
}

#[test]
fn tables_path_override() {
    let mut map = HashMap::new();
    map.insert("UFONZ_TABLES_PATH", "./config/tables.yaml");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.tables_path.as_deref(),
        Some(std::path::Path::new("./config/tables.yaml"))
    );
}

#[test]
fn blank_tables_path_means_builtin() {
    let mut map = HashMap::new();
    map.insert("UFONZ_TABLES_PATH", "  ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.tables_path.is_none());
}

#[test]
fn geocoder_url_must_be_http() {
    let mut map = HashMap::new();
    map.insert("UFONZ_GEOCODER_URL", "nominatim.openstreetmap.org");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "UFONZ_GEOCODER_URL"),
        "expected InvalidEnvVar(UFONZ_GEOCODER_URL), got: {result:?}"
    );
}

#[test]
fn geocoder_timeout_invalid() {
    let mut map = HashMap::new();
    map.insert("UFONZ_GEOCODER_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "UFONZ_GEOCODER_TIMEOUT_SECS"),
        "expected InvalidEnvVar(UFONZ_GEOCODER_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn geocoder_timeout_zero_rejected() {
    let mut map = HashMap::new();
    map.insert("UFONZ_GEOCODER_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "UFONZ_GEOCODER_TIMEOUT_SECS"
    ));
}

#[test]
fn geocoder_max_retries_override() {
    let mut map = HashMap::new();
    map.insert("UFONZ_GEOCODER_MAX_RETRIES", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.geocoder_max_retries, 5);
}

#[test]
fn geocoder_min_interval_invalid() {
    let mut map = HashMap::new();
    map.insert("UFONZ_GEOCODER_MIN_INTERVAL_MS", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "UFONZ_GEOCODER_MIN_INTERVAL_MS"
    ));
}

#[test]
fn empty_default_country_disables_suffix() {
    let mut map = HashMap::new();
    map.insert("UFONZ_DEFAULT_COUNTRY", "");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.default_country.is_none());
}

#[test]
fn unknown_date_placeholder_parses_iso_date() {
    let mut map = HashMap::new();
    map.insert("UFONZ_UNKNOWN_DATE_PLACEHOLDER", "1900-01-01");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.unknown_date_placeholder, NaiveDate::from_ymd_opt(1900, 1, 1));
}

#[test]
fn unknown_date_placeholder_invalid() {
    let mut map = HashMap::new();
    map.insert("UFONZ_UNKNOWN_DATE_PLACEHOLDER", "first of never");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "UFONZ_UNKNOWN_DATE_PLACEHOLDER"
    ));
}

#[test]
fn worker_count_keeps_reserve_and_floor() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.worker_count(8), 7);
    assert_eq!(cfg.worker_count(1), 1);
    assert_eq!(cfg.worker_count(0), 1);
}
