//! CSV and GeoJSON sinks for resolved Sightings.
//!
//! CSV columns are `Date,Time,Location,Features,Description,Latitude,
//! Longitude` followed by `Source,ResolvedLocation,ResolutionAttempts`, so a
//! file can be read back into Sightings without losing the resolution.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use ufonz_geocode::Coordinates;
use ufonz_resolve::{GeoMatch, Sighting, SightingFields};

#[derive(Debug, Serialize, Deserialize)]
struct CsvRecord {
    #[serde(rename = "Date")]
    date: Option<NaiveDate>,
    #[serde(rename = "Time")]
    time: Option<String>,
    #[serde(rename = "Location")]
    location: Option<String>,
    #[serde(rename = "Features")]
    features: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Latitude")]
    latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    longitude: Option<f64>,
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "ResolvedLocation")]
    resolved_location: Option<String>,
    #[serde(rename = "ResolutionAttempts")]
    resolution_attempts: u32,
}

impl CsvRecord {
    fn from_sighting(sighting: &Sighting) -> Self {
        let raw = sighting.raw();
        Self {
            date: sighting.date(),
            time: raw.time.clone(),
            location: raw.location.clone(),
            features: raw.features.clone(),
            description: raw.description.clone(),
            latitude: sighting.latitude(),
            longitude: sighting.longitude(),
            source: sighting.source().to_owned(),
            resolved_location: sighting.geo_match().map(|g| g.query.clone()),
            resolution_attempts: sighting.resolution_attempts(),
        }
    }

    fn into_sighting(self, line: usize) -> anyhow::Result<Sighting> {
        let geo = match (self.latitude, self.longitude, self.resolved_location) {
            (None, None, None) => None,
            (Some(latitude), Some(longitude), Some(query)) if !query.is_empty() => {
                let coordinates = Coordinates::new(latitude, longitude).with_context(|| {
                    format!("line {line}: coordinates {latitude},{longitude} out of range")
                })?;
                Some(GeoMatch { coordinates, query })
            }
            _ => anyhow::bail!(
                "line {line}: Latitude, Longitude and ResolvedLocation must be all set or all empty"
            ),
        };

        // The raw date text is not exported; the normalized date stands in.
        let fields = SightingFields {
            date: self.date.map(|d| d.to_string()),
            time: self.time,
            location: self.location,
            features: self.features,
            description: self.description,
        };
        Ok(Sighting::from_parts(self.source, fields, self.date)
            .with_resolution(geo, self.resolution_attempts))
    }
}

/// Writes one CSV row per Sighting. Returns the number of rows written.
pub(crate) fn write_csv<'a, W, I>(writer: W, sightings: I) -> anyhow::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Sighting>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut written = 0;
    for sighting in sightings {
        csv_writer
            .serialize(CsvRecord::from_sighting(sighting))
            .with_context(|| format!("failed to write CSV row for {}", sighting.source()))?;
        written += 1;
    }
    if written == 0 {
        csv_writer.write_record([
            "Date",
            "Time",
            "Location",
            "Features",
            "Description",
            "Latitude",
            "Longitude",
            "Source",
            "ResolvedLocation",
            "ResolutionAttempts",
        ])?;
    }
    csv_writer.flush()?;
    Ok(written)
}

pub(crate) fn write_csv_file<'a, I>(path: &Path, sightings: I) -> anyhow::Result<usize>
where
    I: IntoIterator<Item = &'a Sighting>,
{
    let file = File::create(path)
        .with_context(|| format!("failed to create CSV file {}", path.display()))?;
    write_csv(BufWriter::new(file), sightings)
}

/// Reads Sightings back from a CSV produced by [`write_csv`].
pub(crate) fn read_csv<R: Read>(reader: R) -> anyhow::Result<Vec<Sighting>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut sightings = Vec::new();
    for (index, record) in csv_reader.deserialize::<CsvRecord>().enumerate() {
        // Line 1 is the header.
        let line = index + 2;
        let record = record.with_context(|| format!("line {line}: malformed CSV row"))?;
        sightings.push(record.into_sighting(line)?);
    }
    Ok(sightings)
}

/// Builds a GeoJSON FeatureCollection of the Sightings that have both a
/// date and coordinates, ordered by date ascending.
pub(crate) fn to_geojson(sightings: &[Sighting]) -> Value {
    let mut eligible: Vec<(NaiveDate, Coordinates, &Sighting)> = sightings
        .iter()
        .filter_map(|s| Some((s.date()?, s.coordinates()?, s)))
        .collect();
    eligible.sort_by_key(|(date, ..)| *date);

    let features: Vec<Value> = eligible
        .into_iter()
        .map(|(date, coordinates, s)| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [coordinates.longitude, coordinates.latitude],
                },
                "properties": {
                    "date": date.to_string(),
                    "time": s.raw_time(),
                    "location": s.location(),
                    "features": s.features(),
                    "description": s.description(),
                    "resolvedLocation": s.resolved_location(),
                    "source": s.source(),
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Writes [`to_geojson`] to `path`. Returns the number of features.
pub(crate) fn write_geojson_file(path: &Path, sightings: &[Sighting]) -> anyhow::Result<usize> {
    let collection = to_geojson(sightings);
    let count = collection["features"].as_array().map_or(0, Vec::len);
    let file = File::create(path)
        .with_context(|| format!("failed to create GeoJSON file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &collection)
        .with_context(|| format!("failed to write GeoJSON to {}", path.display()))?;
    writer.flush()?;
    Ok(count)
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
