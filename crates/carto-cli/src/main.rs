//! carto-cli — Command-line interface for carto-core
//!
//! Inspects a province GeoJSON source the way the map view sees it, and
//! replays scripted selection sessions against a recording engine so the
//! exact sequence of renderer commands can be checked without a browser.
//!
//! Usage examples
//! --------------
//!
//! - Show overall stats
//!   $ carto -i provinces.geojson stats
//!
//! - List provinces, filtered by name and region
//!   $ carto -i provinces.geojson -r reference.json provinces --filter fes --region "Fès-Meknès"
//!
//! - Print the popup for one province
//!   $ carto -i provinces.geojson -r reference.json show Rabat
//!
//! - Replay a session
//!   $ carto -i provinces.geojson replay click:Rabat width:375 list:Salé empty base:Satellite
//!
//! - Geocode (requires the `http` feature)
//!   $ carto search "Rabat"
//!
//! Logging goes to stderr and follows `RUST_LOG`; `-v` raises the default
//! level to `debug`.
mod args;
mod replay;

use crate::args::{CliArgs, Commands};
use anyhow::Context;
use carto_core::{
    DownloadAction, EventQueue, GeometryLayer, LoadState, MapConfig, RecordingEngine,
    ReferenceData, SelectionCoordinator,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Source used when `--input` is omitted.
const DEFAULT_SOURCE: &str = "provinces.geojson";

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let config = match &args.config {
        Some(path) => MapConfig::load_from_path(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => MapConfig::default(),
    };
    let reference = match &args.reference {
        Some(path) => ReferenceData::load_from_path(path)
            .with_context(|| format!("reading reference data {}", path.display()))?,
        None => ReferenceData::default(),
    };
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE));

    match args.command {
        Commands::Stats => {
            let map = mount(&input, config)?;
            let layer = map.layer();
            println!("Geometry statistics:");
            println!("  Features: {}", layer.len());
            println!("  Named provinces: {}", map.index().len());
            println!(
                "  Unnamed features: {}",
                layer
                    .features()
                    .iter()
                    .filter(|f| carto_core::index::resolve_name(f).is_none())
                    .count()
            );
            println!("  Duplicate names: {:?}", map.index().duplicates());
            if let Some(extent) = layer.extent() {
                println!(
                    "  Extent (EPSG:3857): [{:.0}, {:.0}, {:.0}, {:.0}]",
                    extent.min_x, extent.min_y, extent.max_x, extent.max_y
                );
            }
        }

        Commands::Provinces { filter, region } => {
            let map = mount(&input, config)?;
            let catalog = map.catalog(&reference);
            let hits = catalog.filter(&filter, region.as_deref());
            if hits.is_empty() {
                println!("No provinces found matching: {filter}");
            }
            for entry in hits {
                let region = entry.region.as_deref().unwrap_or("-");
                let download = if entry.download_url.is_some() { "⬇" } else { " " };
                println!("{download} {} ({region})", entry.name);
            }
        }

        Commands::Regions => {
            for region in reference.regions() {
                println!("{region}");
            }
        }

        Commands::Show { name } => {
            let mut map = mount(&input, config)?;
            map.select_from_list(&name);
            match map.popup_view(&reference) {
                Some(view) => {
                    println!("Province: {}", view.name);
                    println!("Region: {}", view.region);
                    match view.download {
                        DownloadAction::Open { url } => println!("Download: {url}"),
                        DownloadAction::Unavailable { notice } => println!("Download: {notice}"),
                    }
                    let target = map.viewport().target();
                    println!(
                        "View: center ({:.0}, {:.0}), zoom {:.2}",
                        target.center.x, target.center.y, target.zoom
                    );
                }
                None => eprintln!("Province {name} not found"),
            }
        }

        #[cfg(feature = "http")]
        Commands::Search { query } => search(&config, &query)?,

        Commands::Replay { steps } => {
            let steps = steps
                .iter()
                .map(|s| s.parse())
                .collect::<anyhow::Result<Vec<replay::Step>>>()?;
            let events = EventQueue::new();
            let mut map = mount(&input, config)?.with_hooks(events.clone());
            map.engine_mut().take();
            replay::run(&mut map, &events, &steps);
        }

        #[cfg(feature = "cache")]
        Commands::Snapshot { out } => {
            let layer = GeometryLayer::load_geojson(&input)?;
            let out = out.unwrap_or_else(|| {
                carto_core::loader::common_io::get_cache_path(&input, carto_core::loader::CACHE_SUFFIX)
            });
            layer.save_snapshot(&out)?;
            println!("Wrote {} features to {}", layer.len(), out.display());
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads `input` into a headless map view.
fn mount(input: &Path, config: MapConfig) -> anyhow::Result<SelectionCoordinator<RecordingEngine>> {
    let mut map = SelectionCoordinator::new(RecordingEngine::new(), config);
    let ticket = map.begin_load();
    map.finish_load(ticket, GeometryLayer::load_from_path(input));
    if let LoadState::Failed(message) = map.load_state() {
        anyhow::bail!("could not load {}: {message}", input.display());
    }
    debug!(features = map.layer().len(), "map view mounted");
    Ok(map)
}

#[cfg(feature = "http")]
fn search(config: &MapConfig, query: &str) -> anyhow::Result<()> {
    use carto_core::geocode::nominatim::NominatimClient;
    use carto_core::geocode::ResponseOutcome;

    let client = NominatimClient::new(&config.search)?;
    let mut map = SelectionCoordinator::new(RecordingEngine::new(), config.clone());
    match map.run_geocoder(&client, query) {
        None => anyhow::bail!(
            "query must be at least {} characters",
            config.search.min_query_chars
        ),
        Some(ResponseOutcome::Failed) => anyhow::bail!("geocode lookup failed for: {query}"),
        Some(_) => {}
    }

    let suggestions = map.search().suggestions();
    if suggestions.is_empty() {
        println!("No places found for: {query}");
    }
    for hit in suggestions {
        println!("{} ({:.4}, {:.4})", hit.display_name, hit.lat, hit.lon);
    }
    Ok(())
}
