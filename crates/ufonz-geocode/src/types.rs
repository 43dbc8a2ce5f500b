//! Boundary types shared by the geocoder adapter and its callers.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::GeocodeError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Returns `None` unless both values are finite and inside the WGS84
    /// ranges.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// A free-text geocoding service.
///
/// `Ok(None)` means the service answered and had no match. A timeout that
/// persists through the adapter's retry is also reported as `Ok(None)`.
/// Every other `Err` means the service could not be asked, which callers
/// must not confuse with "no match".
pub trait Geocoder {
    fn geocode(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Option<Coordinates>, GeocodeError>> + Send;
}

/// One result row from the Nominatim `/search` endpoint (`format=jsonv2`).
///
/// Coordinates arrive as decimal strings.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}
