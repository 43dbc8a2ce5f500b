use thiserror::Error;
use ufonz_core::DateError;
use ufonz_geocode::GeocodeError;

/// Per-Sighting failures. An unresolvable location is not an error; see
/// [`crate::ResolutionEngine::resolve`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The geocoder could not be asked (unreachable, persistent 5xx, bad
    /// response). Distinct from "no match".
    #[error("geocoder failed while resolving sighting from {origin}: {error}")]
    Geocoder {
        origin: String,
        #[source]
        error: GeocodeError,
    },

    #[error("sighting from {origin} has an unusable date: {error}")]
    Date {
        origin: String,
        #[source]
        error: DateError,
    },
}

impl ResolveError {
    /// Source identifier of the Sighting that failed.
    #[must_use]
    pub fn origin(&self) -> &str {
        match self {
            Self::Geocoder { origin, .. } | Self::Date { origin, .. } => origin,
        }
    }
}
