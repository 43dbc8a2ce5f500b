//! The Sighting record and the raw field tuple it is built from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ufonz_core::DateNormalizer;
use ufonz_geocode::Coordinates;

use crate::error::ResolveError;

/// Text fragments extracted from one report, exactly as found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SightingFields {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub features: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One field tuple handed over by the document source, tagged with the
/// page it came from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceRow {
    pub source: String,
    #[serde(flatten)]
    pub fields: SightingFields,
}

/// A geocoder answer together with the exact query that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoMatch {
    pub coordinates: Coordinates,
    pub query: String,
}

/// One reported event.
///
/// Raw fields never change after construction. Coordinates and the
/// resolved query are set together or not at all, and only by
/// [`crate::ResolutionEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sighting {
    source: String,
    raw: SightingFields,
    date: Option<NaiveDate>,
    geo: Option<GeoMatch>,
    resolution_attempts: u32,
}

impl Sighting {
    /// Builds a Sighting and normalizes its date.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Date`] if the raw date neither parses nor
    /// appears in the exception table.
    pub fn new(
        source: impl Into<String>,
        raw: SightingFields,
        dates: &DateNormalizer,
    ) -> Result<Self, ResolveError> {
        let source = source.into();
        let date = dates
            .normalize(raw.date.as_deref())
            .map_err(|error| ResolveError::Date {
                origin: source.clone(),
                error,
            })?;
        Ok(Self::from_parts(source, raw, date))
    }

    /// Builds a Sighting whose date has already been decided, e.g. when
    /// reading back an export.
    #[must_use]
    pub fn from_parts(
        source: impl Into<String>,
        raw: SightingFields,
        date: Option<NaiveDate>,
    ) -> Self {
        Self {
            source: source.into(),
            raw,
            date,
            geo: None,
            resolution_attempts: 1,
        }
    }

    /// Restores a previous resolution outcome.
    #[must_use]
    pub fn with_resolution(mut self, geo: Option<GeoMatch>, resolution_attempts: u32) -> Self {
        self.geo = geo;
        self.resolution_attempts = resolution_attempts.max(1);
        self
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn raw(&self) -> &SightingFields {
        &self.raw
    }

    #[must_use]
    pub fn raw_date(&self) -> Option<&str> {
        self.raw.date.as_deref()
    }

    #[must_use]
    pub fn raw_time(&self) -> Option<&str> {
        self.raw.time.as_deref()
    }

    /// Location text used as resolution input; empty when none was found.
    #[must_use]
    pub fn location(&self) -> &str {
        self.raw.location.as_deref().unwrap_or("")
    }

    #[must_use]
    pub fn features(&self) -> Option<&str> {
        self.raw.features.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.raw.description.as_deref()
    }

    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    #[must_use]
    pub fn geo_match(&self) -> Option<&GeoMatch> {
        self.geo.as_ref()
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.geo.as_ref().map(|g| g.coordinates)
    }

    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.coordinates().map(|c| c.latitude)
    }

    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.coordinates().map(|c| c.longitude)
    }

    /// The query the geocoder matched, or `""` when unresolved.
    #[must_use]
    pub fn resolved_location(&self) -> &str {
        self.geo.as_ref().map_or("", |g| g.query.as_str())
    }

    #[must_use]
    pub fn resolution_attempts(&self) -> u32 {
        self.resolution_attempts
    }

    /// `false` when every extracted field is absent or blank. Such rows are
    /// page furniture, not reports.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [
            &self.raw.date,
            &self.raw.time,
            &self.raw.location,
            &self.raw.features,
            &self.raw.description,
        ]
        .into_iter()
        .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    pub(crate) fn begin_resolution(&mut self) {
        self.geo = None;
        self.resolution_attempts = 1;
    }

    pub(crate) fn finish_resolution(&mut self, geo: Option<GeoMatch>, resolution_attempts: u32) {
        self.geo = geo;
        self.resolution_attempts = resolution_attempts;
    }
}
