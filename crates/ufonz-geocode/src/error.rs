use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder timed out for \"{query}\"")]
    Timeout { query: String },

    #[error("rate limited by geocoder (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from geocoder for \"{query}\"")]
    UnexpectedStatus { status: u16, query: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("geocoder returned an invalid coordinate for \"{query}\": {value}")]
    InvalidCoordinate { query: String, value: String },

    #[error("invalid geocoder base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl GeocodeError {
    /// Wraps a transport error, keeping timeouts distinct so the retry loop
    /// can give them their own single retry.
    pub(crate) fn from_transport(err: reqwest::Error, query: &str) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                query: query.to_owned(),
            }
        } else {
            Self::Http(err)
        }
    }
}
