//! Error handling example for carto-rs
//!
//! This example demonstrates that no failure is fatal to a map view:
//! - Malformed and missing geometry sources
//! - Superseded loads
//! - Selecting names that do not exist
//! - Failed geocode requests

use carto_rs::geocode::{GeocodeError, ResponseOutcome};
use carto_rs::prelude::*;
use carto_rs::RecordingEngine;

fn main() -> carto_rs::Result<()> {
    println!("=== carto-rs Error Handling Example ===\n");

    // Example 1: Parsing errors
    println!("--- Example 1: Malformed GeoJSON ---");
    for source in [r#"{"type":"Topology"}"#, "not json", r#"{"type":"Feature","geometry":{"type":"Polygon","coordinates":[1]}}"#] {
        match GeometryLayer::from_geojson_str(source) {
            Ok(layer) => println!("  ✓ parsed {} features", layer.len()),
            Err(e) => println!("  ✗ {e}"),
        }
    }
    println!();

    // Example 2: A failed load leaves an inert, empty view
    println!("--- Example 2: Missing source ---");
    let mut map = SelectionCoordinator::new(RecordingEngine::new(), MapConfig::default());
    let ticket = map.begin_load();
    map.finish_load(ticket, GeometryLayer::load_from_path("does/not/exist.geojson"));
    println!("  Load state: {:?}", map.load_state());
    map.map_click(Some(FeatureId(0)));
    println!("  Click after failure -> {:?}", map.selection());
    println!();

    // Example 3: Superseded loads are ignored
    println!("--- Example 3: Superseded load ---");
    let stale = map.begin_load();
    let fresh = map.begin_load();
    println!("  fresh applied: {}", map.finish_load(fresh, Ok(GeometryLayer::empty())));
    println!("  stale applied: {}", map.finish_load(stale, Ok(GeometryLayer::empty())));
    println!();

    // Example 4: Unknown names clear the selection instead of failing
    println!("--- Example 4: Unknown province ---");
    map.select_from_list("Atlantis");
    println!("  Selection: {:?}", map.selection());
    println!("  Popup visible: {}", map.popup().is_visible());
    println!();

    // Example 5: Geocoder failures keep what the user already sees
    println!("--- Example 5: Geocoder failure ---");
    if let Some(request) = map.submit_query("Tanger").into_request() {
        let outcome = map.apply_geocode(request.generation, Err(GeocodeError::Status(429)));
        println!("  outcome: {:?}", outcome);
        assert_eq!(outcome, ResponseOutcome::Failed);
    }
    println!("  query kept: {:?}", map.search().query());

    Ok(())
}
