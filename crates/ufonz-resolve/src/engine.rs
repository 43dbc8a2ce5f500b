//! Location resolution: rewrite a free-text location until the geocoder
//! accepts one of the rewrites, coarsening the text between rounds.
//!
//! A round runs the strategy chain against a fixed base string:
//!
//! 1. leading-conjunction variants of the base;
//! 2. slash-split, 3. ampersand-split, 4. bracket-removed,
//!    5. known-correction, 6. title-case-filtered variants of every query
//!    submitted so far in this call.
//!
//! Candidates are tidied and submitted in order; empty and already-submitted
//! candidates are skipped. When a round fails the first word of the base is
//! dropped, so a base of `n` words gets at most `n` rounds.

use ufonz_core::{AppConfig, Correction, ResolutionTables};
use ufonz_geocode::{GeocodeError, Geocoder};

use crate::attempts::AttemptSet;
use crate::error::ResolveError;
use crate::normalize::{
    ampersand_variants, collapse_whitespace, conjunction_variants, correction_variants,
    decode_entities, drop_first_word, remove_bracket_clause, slash_variants,
    strip_island_qualifier, strip_trailing_non_alpha, tidy, title_case_filter,
    with_default_country,
};
use crate::sighting::{GeoMatch, Sighting};

/// Text the source pages put in the location cell when the time was
/// pasted there instead.
const MISPLACED_TIME: &str = "12:00 am";

/// Injectable tables and policy for a [`ResolutionEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Appended as `", {country}"` to domestic locations; `None` disables.
    pub default_country: Option<String>,
    /// Single words that already name the default country.
    pub country_aliases: Vec<String>,
    /// Names whose presence suppresses the default country.
    pub foreign_places: Vec<String>,
    pub corrections: Vec<Correction>,
    /// Minimum letters for a token to survive the title-case filter.
    pub min_token_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_country: None,
            country_aliases: Vec::new(),
            foreign_places: Vec::new(),
            corrections: Vec::new(),
            min_token_len: 2,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn from_parts(config: &AppConfig, tables: &ResolutionTables) -> Self {
        Self {
            default_country: config.default_country.clone(),
            country_aliases: tables.country_aliases.clone(),
            foreign_places: tables.foreign_places.clone(),
            corrections: tables.corrections.clone(),
            min_token_len: config.min_token_len,
        }
    }
}

/// Outcome of one resolution call.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub matched: Option<GeoMatch>,
    /// Starts at 1 and grows by one per failed round.
    pub attempts: u32,
    /// Every query sent to the geocoder, in order.
    pub submitted: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Strategy {
    Slash,
    Ampersand,
    Bracket,
    Correction,
    TitleCase,
}

/// Strategies applied to every query submitted so far, after the
/// conjunction variants of the base.
const ATTEMPT_STRATEGIES: [Strategy; 5] = [
    Strategy::Slash,
    Strategy::Ampersand,
    Strategy::Bracket,
    Strategy::Correction,
    Strategy::TitleCase,
];

impl Strategy {
    fn variants(self, text: &str, config: &EngineConfig) -> Vec<String> {
        match self {
            Self::Slash => slash_variants(text),
            Self::Ampersand => ampersand_variants(text),
            Self::Bracket => remove_bracket_clause(text).into_iter().collect(),
            Self::Correction => correction_variants(text, &config.corrections),
            Self::TitleCase => vec![title_case_filter(text, config.min_token_len)],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolutionEngine<G> {
    geocoder: G,
    config: EngineConfig,
}

impl<G: Geocoder> ResolutionEngine<G> {
    #[must_use]
    pub fn new(geocoder: G, config: EngineConfig) -> Self {
        Self { geocoder, config }
    }

    #[must_use]
    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolves `sighting`'s location and records the outcome on it.
    ///
    /// Returns `Ok(true)` on a match and `Ok(false)` when the location is
    /// empty, unusable, or exhausted. Previous coordinates are cleared first
    /// and the attempt counter restarts at 1.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Geocoder`] when the geocoder could not be
    /// asked. The Sighting is left without coordinates.
    pub async fn resolve(&self, sighting: &mut Sighting) -> Result<bool, ResolveError> {
        sighting.begin_resolution();
        let resolution = self
            .resolve_location(sighting.source(), sighting.location())
            .await
            .map_err(|error| ResolveError::Geocoder {
                origin: sighting.source().to_owned(),
                error,
            })?;
        let matched = resolution.matched.is_some();
        sighting.finish_resolution(resolution.matched, resolution.attempts);
        Ok(matched)
    }

    /// Runs the strategy chain for a bare location string. `source` only
    /// labels log events.
    ///
    /// # Errors
    ///
    /// Propagates any [`GeocodeError`] from the geocoder; a timeout has
    /// already been turned into "no match" by the adapter.
    pub async fn resolve_location(
        &self,
        source: &str,
        location: &str,
    ) -> Result<Resolution, GeocodeError> {
        let mut attempts = AttemptSet::new();
        let Some(mut base) = self.prepare(location) else {
            tracing::debug!(source, location, "location unusable; skipping geocoder");
            return Ok(Resolution {
                matched: None,
                attempts: 1,
                submitted: Vec::new(),
            });
        };

        let mut rounds: u32 = 1;
        loop {
            if let Some(matched) = self.run_round(source, &base, &mut attempts).await? {
                tracing::info!(
                    source,
                    query = %matched.query,
                    round = rounds,
                    latitude = matched.coordinates.latitude,
                    longitude = matched.coordinates.longitude,
                    "location resolved"
                );
                return Ok(Resolution {
                    matched: Some(matched),
                    attempts: rounds,
                    submitted: attempts.into_queries(),
                });
            }

            rounds = rounds.saturating_add(1);
            base = drop_first_word(&base);
            if base.is_empty() {
                tracing::warn!(
                    source,
                    location,
                    queries = attempts.len(),
                    "location could not be resolved"
                );
                return Ok(Resolution {
                    matched: None,
                    attempts: rounds,
                    submitted: attempts.into_queries(),
                });
            }
            tracing::debug!(source, base = %base, round = rounds, "coarsening location");
        }
    }

    /// Cleans raw location text into the first round's base string.
    ///
    /// `None` for text that must never reach the geocoder.
    fn prepare(&self, location: &str) -> Option<String> {
        let trimmed = location.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(MISPLACED_TIME) {
            return None;
        }

        let decoded = collapse_whitespace(&decode_entities(trimmed));
        let stripped = strip_trailing_non_alpha(&decoded);
        let unqualified = strip_island_qualifier(stripped);
        let base = tidy(&with_default_country(
            &tidy(&unqualified),
            self.config.default_country.as_deref(),
            &self.config.country_aliases,
            &self.config.foreign_places,
        ));
        (!base.is_empty()).then_some(base)
    }

    async fn run_round(
        &self,
        source: &str,
        base: &str,
        attempts: &mut AttemptSet,
    ) -> Result<Option<GeoMatch>, GeocodeError> {
        for candidate in conjunction_variants(base) {
            if let Some(matched) = self.submit(source, &candidate, attempts).await? {
                return Ok(Some(matched));
            }
        }

        for strategy in ATTEMPT_STRATEGIES {
            for attempted in attempts.snapshot() {
                for candidate in strategy.variants(&attempted, &self.config) {
                    if let Some(matched) = self.submit(source, &candidate, attempts).await? {
                        return Ok(Some(matched));
                    }
                }
            }
        }

        Ok(None)
    }

    /// Submits `candidate` unless it tidies to nothing or was already tried.
    async fn submit(
        &self,
        source: &str,
        candidate: &str,
        attempts: &mut AttemptSet,
    ) -> Result<Option<GeoMatch>, GeocodeError> {
        let query = tidy(candidate);
        if query.is_empty() || !attempts.insert(&query) {
            return Ok(None);
        }

        tracing::debug!(source, candidate = %query, "submitting geocoder query");
        let coordinates = self.geocoder.geocode(&query).await.inspect_err(|e| {
            tracing::error!(source, candidate = %query, error = %e, "geocoder request failed");
        })?;
        Ok(coordinates.map(|coordinates| GeoMatch { coordinates, query }))
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
