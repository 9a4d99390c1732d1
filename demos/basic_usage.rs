//! Basic usage example for carto-rs
//!
//! This example demonstrates how to:
//! - Parse a province GeoJSON source
//! - Mount a headless map view over a recording engine
//! - Select provinces from the map and from the list
//! - Read the popup content and clear the selection

use carto_rs::prelude::*;
use carto_rs::{EngineCommand, RecordingEngine};

const PROVINCES: &str = r#"{"type":"FeatureCollection","features":[
  {"type":"Feature","properties":{"NOM_PROV":"Rabat"},"geometry":{"type":"Polygon","coordinates":[[[-6.95,33.85],[-6.7,33.85],[-6.7,34.07],[-6.95,34.07],[-6.95,33.85]]]}},
  {"type":"Feature","properties":{"NOM_PROV":"Salé"},"geometry":{"type":"Polygon","coordinates":[[[-6.8,34.0],[-6.45,34.0],[-6.45,34.2],[-6.8,34.2],[-6.8,34.0]]]}},
  {"type":"Feature","properties":{"name":"Fès"},"geometry":{"type":"Polygon","coordinates":[[[-5.1,33.9],[-4.8,33.9],[-4.8,34.15],[-5.1,34.15],[-5.1,33.9]]]}}
]}"#;

const REFERENCE: &str = r#"{
  "regions": { "Rabat": "Rabat-Salé-Kénitra", "Salé": "Rabat-Salé-Kénitra", "Fès": "Fès-Meknès" },
  "downloads": { "Rabat": "https://example.org/db/rabat.zip" }
}"#;

fn main() -> carto_rs::Result<()> {
    println!("=== carto-rs Basic Usage Example ===\n");

    // Load the geometry
    println!("Parsing province source...");
    let layer = GeometryLayer::from_geojson_str(PROVINCES)?;
    let reference = ReferenceData::from_json_str(REFERENCE)?;
    println!("✓ {} features parsed\n", layer.len());

    let mut map = SelectionCoordinator::new(RecordingEngine::new(), MapConfig::default());
    map.load_layer(layer);
    map.engine_mut().take();

    // Example 1: The province list
    println!("--- Example 1: Province list ---");
    for entry in map.catalog(&reference).entries() {
        println!("  {} ({})", entry.name, entry.region.as_deref().unwrap_or("-"));
    }
    println!();

    // Example 2: Click on a feature
    println!("--- Example 2: Map click on feature #1 ---");
    map.map_click(Some(FeatureId(1)));
    println!("Selection: {:?}", map.selection());
    for command in map.engine_mut().take() {
        println!("  engine: {command}");
    }
    println!();

    // Example 3: Select from the list and read the popup
    println!("--- Example 3: List click on Rabat ---");
    map.select_from_list("Rabat");
    if let Some(view) = map.popup_view(&reference) {
        println!("  Popup: {} / {}", view.name, view.region);
        match view.download {
            DownloadAction::Open { url } => println!("  Download: {url}"),
            DownloadAction::Unavailable { notice } => println!("  Download: {notice}"),
        }
    }
    let fits = map
        .engine()
        .commands()
        .iter()
        .filter(|c| matches!(c, EngineCommand::FitExtent { .. }))
        .count();
    println!("  Viewport fits issued: {fits}");
    println!();

    // Example 4: Click on empty space
    println!("--- Example 4: Empty click ---");
    map.map_click(None);
    println!("Selection: {:?}", map.selection());
    println!("Popup visible: {}", map.popup().is_visible());

    Ok(())
}
