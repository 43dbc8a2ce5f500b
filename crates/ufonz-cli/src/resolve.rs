//! The `resolve` command: rows in, Sightings resolved, tables out.

use std::path::{Path, PathBuf};
use std::thread;

use anyhow::Context;
use futures::stream::{self, StreamExt};
use ufonz_core::{load_tables, AppConfig, DateNormalizer};
use ufonz_geocode::{Geocoder, GeocoderSettings, NominatimClient};
use ufonz_resolve::{EngineConfig, ResolutionEngine, Sighting, SourceRow};

use crate::export;

#[derive(Debug)]
pub(crate) struct ResolveOptions {
    pub input: PathBuf,
    pub csv: Option<PathBuf>,
    pub geojson: Option<PathBuf>,
    pub no_geocode: bool,
    pub keep_unresolved: bool,
}

/// Sightings built from input rows, plus how many rows were rejected for an
/// unrecognised date.
#[derive(Debug)]
pub(crate) struct BuiltSightings {
    pub sightings: Vec<Sighting>,
    pub discarded: usize,
    pub date_failures: usize,
}

/// Result of running the worker pool, with Sightings back in input order.
#[derive(Debug)]
pub(crate) struct PoolOutcome {
    pub sightings: Vec<Sighting>,
    pub matched: usize,
    pub geocoder_failures: usize,
}

pub(crate) async fn run_resolve(
    config: &AppConfig,
    options: &ResolveOptions,
) -> anyhow::Result<()> {
    let tables = load_tables(config.tables_path.as_deref())?;
    let dates = DateNormalizer::from_tables(&tables)
        .with_unknown_placeholder(config.unknown_date_placeholder);

    let rows = load_rows(&options.input)?;
    let row_count = rows.len();
    let built = build_sightings(rows, &dates);

    let (sightings, matched, geocoder_failures) = if options.no_geocode {
        (built.sightings, 0, 0)
    } else {
        let client = NominatimClient::new(&GeocoderSettings::from_app_config(config))
            .context("failed to build geocoder client")?;
        let engine = ResolutionEngine::new(client, EngineConfig::from_parts(config, &tables));
        let available = thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        let workers = config.worker_count(available);
        tracing::info!(
            sightings = built.sightings.len(),
            workers,
            "resolving sighting locations"
        );
        let outcome = resolve_all(&engine, built.sightings, workers).await;
        (outcome.sightings, outcome.matched, outcome.geocoder_failures)
    };

    if let Some(path) = &options.csv {
        let keep_unresolved = options.keep_unresolved || options.no_geocode;
        let rows = sightings
            .iter()
            .filter(|s| keep_unresolved || s.coordinates().is_some());
        let written = export::write_csv_file(path, rows)?;
        tracing::info!(path = %path.display(), rows = written, "wrote CSV");
    }
    if let Some(path) = &options.geojson {
        let written = export::write_geojson_file(path, &sightings)?;
        tracing::info!(path = %path.display(), features = written, "wrote GeoJSON");
    }

    println!(
        "rows: {row_count}  sightings: {}  discarded: {}  matched: {matched}  \
         date failures: {}  geocoder failures: {geocoder_failures}",
        sightings.len(),
        built.discarded,
        built.date_failures,
    );

    if geocoder_failures > 0 || built.date_failures > 0 {
        anyhow::bail!(
            "{geocoder_failures} sighting(s) hit an unavailable geocoder and {} row(s) had \
             unrecognised dates; see the log for details",
            built.date_failures
        );
    }
    Ok(())
}

pub(crate) fn load_rows(path: &Path) -> anyhow::Result<Vec<SourceRow>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input rows from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse input rows in {}", path.display()))
}

/// Builds a Sighting per row, dropping rows with no content and logging
/// rows whose date is not recognised.
pub(crate) fn build_sightings(rows: Vec<SourceRow>, dates: &DateNormalizer) -> BuiltSightings {
    let mut built = BuiltSightings {
        sightings: Vec::with_capacity(rows.len()),
        discarded: 0,
        date_failures: 0,
    };
    for row in rows {
        match Sighting::new(row.source, row.fields, dates) {
            Ok(sighting) if sighting.is_valid() => built.sightings.push(sighting),
            Ok(sighting) => {
                tracing::debug!(source = sighting.source(), "discarding empty row");
                built.discarded += 1;
            }
            Err(e) => {
                tracing::error!(source = e.origin(), error = %e, "unrecognised sighting date");
                built.date_failures += 1;
            }
        }
    }
    built
}

/// Resolves every Sighting on a pool of `workers` concurrent tasks.
///
/// Each Sighting is resolved sequentially; a geocoder failure on one does
/// not stop the others.
pub(crate) async fn resolve_all<G: Geocoder>(
    engine: &ResolutionEngine<G>,
    sightings: Vec<Sighting>,
    workers: usize,
) -> PoolOutcome {
    let mut results: Vec<(usize, Sighting, Outcome)> =
        stream::iter(sightings.into_iter().enumerate())
            .map(|(index, mut sighting)| async move {
                let outcome = match engine.resolve(&mut sighting).await {
                    Ok(true) => Outcome::Matched,
                    Ok(false) => Outcome::Unmatched,
                    Err(e) => {
                        tracing::error!(
                            source = e.origin(),
                            error = %e,
                            "sighting resolution failed"
                        );
                        Outcome::Failed
                    }
                };
                (index, sighting, outcome)
            })
            .buffer_unordered(workers.max(1))
            .collect()
            .await;
    results.sort_by_key(|(index, ..)| *index);

    let count = |wanted: Outcome| results.iter().filter(|(_, _, o)| *o == wanted).count();
    let matched = count(Outcome::Matched);
    let geocoder_failures = count(Outcome::Failed);
    PoolOutcome {
        sightings: results.into_iter().map(|(_, s, _)| s).collect(),
        matched,
        geocoder_failures,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Matched,
    Unmatched,
    Failed,
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;
