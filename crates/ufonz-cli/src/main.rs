mod export;
mod resolve;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use ufonz_core::{load_tables, AppConfig, DateNormalizer};
use ufonz_geocode::{GeocoderSettings, NominatimClient};
use ufonz_resolve::{EngineConfig, ResolutionEngine};

#[derive(Debug, Parser)]
#[command(name = "ufonz-cli")]
#[command(about = "Resolve dates and locations of New Zealand sighting reports")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build Sightings from extracted rows, geocode them and export the result
    Resolve {
        /// JSON array of `{source, date, time, location, features, description}`
        #[arg(long)]
        input: PathBuf,
        /// Write a CSV table here
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write a GeoJSON FeatureCollection here
        #[arg(long)]
        geojson: Option<PathBuf>,
        /// Skip the geocoder entirely
        #[arg(long)]
        no_geocode: bool,
        /// Keep Sightings without coordinates in the CSV
        #[arg(long)]
        keep_unresolved: bool,
    },
    /// Normalize a single free-text date
    Date { text: String },
    /// Run the location strategy chain for a single location
    Geocode { location: String },
    /// Rebuild a GeoJSON FeatureCollection from a previously exported CSV
    Map {
        /// CSV written by `resolve --csv`
        #[arg(long)]
        csv: PathBuf,
        /// Output GeoJSON path
        #[arg(long)]
        geojson: PathBuf,
    },
    /// Validate the resolution tables and print a summary
    Tables {
        /// Tables file; defaults to UFONZ_TABLES_PATH or the built-in set
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ufonz_core::load_app_config().context("failed to load configuration")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Resolve {
            input,
            csv,
            geojson,
            no_geocode,
            keep_unresolved,
        }) => {
            let options = resolve::ResolveOptions {
                input,
                csv,
                geojson,
                no_geocode,
                keep_unresolved,
            };
            resolve::run_resolve(&config, &options).await
        }
        Some(Commands::Date { text }) => run_date(&config, &text),
        Some(Commands::Geocode { location }) => run_geocode(&config, &location).await,
        Some(Commands::Map { csv, geojson }) => run_map(&csv, &geojson),
        Some(Commands::Tables { path }) => run_tables(&config, path),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

fn run_date(config: &AppConfig, text: &str) -> anyhow::Result<()> {
    let tables = load_tables(config.tables_path.as_deref())?;
    let dates = DateNormalizer::from_tables(&tables)
        .with_unknown_placeholder(config.unknown_date_placeholder);
    match dates.normalize(Some(text))? {
        Some(date) => println!("{date}"),
        None => println!("no date"),
    }
    Ok(())
}

async fn run_geocode(config: &AppConfig, location: &str) -> anyhow::Result<()> {
    let tables = load_tables(config.tables_path.as_deref())?;
    let client = NominatimClient::new(&GeocoderSettings::from_app_config(config))
        .context("failed to build geocoder client")?;
    let engine = ResolutionEngine::new(client, EngineConfig::from_parts(config, &tables));

    let resolution = engine
        .resolve_location("cli", location)
        .await
        .with_context(|| format!("geocoder failed for \"{location}\""))?;

    for (index, query) in resolution.submitted.iter().enumerate() {
        println!("  {:>3}. {query}", index + 1);
    }
    match resolution.matched {
        Some(matched) => println!(
            "matched \"{}\" at {}, {} (round {})",
            matched.query,
            matched.coordinates.latitude,
            matched.coordinates.longitude,
            resolution.attempts
        ),
        None => println!(
            "no match after {} queries ({} rounds)",
            resolution.submitted.len(),
            resolution.attempts.saturating_sub(1)
        ),
    }
    Ok(())
}

fn run_map(csv: &Path, geojson: &Path) -> anyhow::Result<()> {
    let file = File::open(csv).with_context(|| format!("failed to open {}", csv.display()))?;
    let sightings = export::read_csv(BufReader::new(file))
        .with_context(|| format!("failed to read {}", csv.display()))?;
    let features = export::write_geojson_file(geojson, &sightings)?;
    tracing::info!(
        rows = sightings.len(),
        features,
        path = %geojson.display(),
        "geojson written"
    );
    println!("{features} of {} sightings mapped", sightings.len());
    Ok(())
}

fn run_tables(config: &AppConfig, path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.or_else(|| config.tables_path.clone());
    let tables = load_tables(path.as_deref())?;
    let origin = path.map_or_else(|| "built-in".to_owned(), |p| p.display().to_string());
    println!("tables: {origin}");
    println!("  corrections:     {}", tables.corrections.len());
    println!("  foreign places:  {}", tables.foreign_places.len());
    println!("  country aliases: {}", tables.country_aliases.len());
    println!("  date exceptions: {}", tables.date_exceptions.len());
    Ok(())
}
