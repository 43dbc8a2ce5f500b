use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub log_level: String,
    /// Curated tables file; `None` means the built-in tables are used.
    pub tables_path: Option<PathBuf>,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocoder_timeout_secs: u64,
    /// Minimum gap between any two geocoder requests across all workers.
    pub geocoder_min_interval_ms: u64,
    /// Retries for non-timeout transient failures (5xx, 429, connect errors).
    pub geocoder_max_retries: u32,
    pub geocoder_backoff_base_ms: u64,
    /// ISO 3166-1 alpha-2 codes passed to the geocoder as a region bias.
    pub country_bias: String,
    /// Country name appended to every domestic query; `None` disables it.
    pub default_country: Option<String>,
    pub min_token_len: usize,
    /// Processing units held back from the resolution worker pool.
    pub worker_reserve: usize,
    pub unknown_date_placeholder: Option<NaiveDate>,
}

impl AppConfig {
    #[must_use]
    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder_timeout_secs)
    }

    #[must_use]
    pub fn geocoder_min_interval(&self) -> Duration {
        Duration::from_millis(self.geocoder_min_interval_ms)
    }

    /// Worker pool size: available processing units minus the reserve,
    /// never below one.
    #[must_use]
    pub fn worker_count(&self, available: usize) -> usize {
        available.saturating_sub(self.worker_reserve).max(1)
    }
}
