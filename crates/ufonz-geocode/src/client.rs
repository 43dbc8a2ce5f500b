//! HTTP adapter for the Nominatim `/search` endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::GeocodeError;
use crate::gate::RequestGate;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::{Coordinates, Geocoder, NominatimPlace};

/// Connection settings for [`NominatimClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocoderSettings {
    pub base_url: String,
    pub user_agent: String,
    /// Per-request timeout; a request that exceeds it is retried once.
    pub timeout: Duration,
    /// Comma-separated ISO country codes sent as `countrycodes`; empty for none.
    pub country_bias: String,
    pub min_interval: Duration,
    pub retry: RetryPolicy,
}

impl GeocoderSettings {
    #[must_use]
    pub fn from_app_config(config: &ufonz_core::AppConfig) -> Self {
        Self {
            base_url: config.geocoder_url.clone(),
            user_agent: config.geocoder_user_agent.clone(),
            timeout: config.geocoder_timeout(),
            country_bias: config.country_bias.clone(),
            min_interval: config.geocoder_min_interval(),
            retry: RetryPolicy {
                max_retries: config.geocoder_max_retries,
                backoff_base_ms: config.geocoder_backoff_base_ms,
            },
        }
    }
}

/// Geocoder backed by a Nominatim instance.
///
/// Asks for the single best match. Clones share the HTTP connection pool and
/// the request gate, so a whole worker pool stays under one rate limit.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    search_url: Url,
    country_bias: String,
    retry: RetryPolicy,
    gate: Arc<RequestGate>,
}

impl NominatimClient {
    /// Builds a client with its own request gate.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::InvalidBaseUrl`] if `settings.base_url` is not a URL.
    /// - [`GeocodeError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(settings: &GeocoderSettings) -> Result<Self, GeocodeError> {
        let gate = Arc::new(RequestGate::new(settings.min_interval));
        Self::with_gate(settings, gate)
    }

    /// Builds a client that throttles through an existing gate.
    ///
    /// # Errors
    ///
    /// Same as [`NominatimClient::new`].
    pub fn with_gate(
        settings: &GeocoderSettings,
        gate: Arc<RequestGate>,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            search_url: Self::search_url(&settings.base_url)?,
            country_bias: settings.country_bias.trim().to_owned(),
            retry: settings.retry,
            gate,
        })
    }

    /// `{base}/search`, keeping any path prefix on the base URL.
    fn search_url(base_url: &str) -> Result<Url, GeocodeError> {
        let normalised = format!("{}/search", base_url.trim_end_matches('/'));
        let url = Url::parse(&normalised).map_err(|e| GeocodeError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(GeocodeError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: "expected an http(s) URL".to_owned(),
            });
        }
        Ok(url)
    }

    fn request_url(&self, query: &str) -> Url {
        let mut url = self.search_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("format", "jsonv2");
            pairs.append_pair("limit", "1");
            if !self.country_bias.is_empty() {
                pairs.append_pair("countrycodes", &self.country_bias);
            }
        }
        url
    }

    /// One throttled request with no retry.
    async fn search_once(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let url = self.request_url(query);
        self.gate.wait_turn().await;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| GeocodeError::from_transport(e, query))?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(GeocodeError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(GeocodeError::UnexpectedStatus {
                status: status.as_u16(),
                query: query.to_owned(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodeError::from_transport(e, query))?;
        let places = serde_json::from_str::<Vec<NominatimPlace>>(&body).map_err(|e| {
            GeocodeError::Deserialize {
                context: format!("search results for \"{query}\""),
                source: e,
            }
        })?;

        places
            .into_iter()
            .next()
            .map(|place| parse_place(query, &place))
            .transpose()
    }
}

fn parse_place(query: &str, place: &NominatimPlace) -> Result<Coordinates, GeocodeError> {
    let invalid = || GeocodeError::InvalidCoordinate {
        query: query.to_owned(),
        value: format!("{},{}", place.lat, place.lon),
    };
    let latitude = place.lat.trim().parse::<f64>().map_err(|_| invalid())?;
    let longitude = place.lon.trim().parse::<f64>().map_err(|_| invalid())?;
    let coordinates = Coordinates::new(latitude, longitude).ok_or_else(invalid)?;
    tracing::trace!(
        query,
        display_name = place.display_name.as_deref().unwrap_or(""),
        "geocoder match"
    );
    Ok(coordinates)
}

impl Geocoder for NominatimClient {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        match retry_with_backoff(self.retry, || self.search_once(query)).await {
            Err(GeocodeError::Timeout { .. }) => {
                tracing::warn!(query, "geocoder timed out after retry; treating as no match");
                Ok(None)
            }
            other => other,
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
