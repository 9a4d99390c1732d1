//! Search session example for carto-rs
//!
//! This example demonstrates how geocode results are matched to the
//! keystroke that requested them:
//! - Every request carries a generation
//! - A late answer to an older query is dropped
//! - Picking a suggestion flies the view without touching the selection

use carto_rs::geocode::{GeocodeHit, QueryOutcome};
use carto_rs::prelude::*;
use carto_rs::RecordingEngine;

fn places(names: &[&str]) -> Vec<GeocodeHit> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| GeocodeHit {
            display_name: format!("{name}, Maroc"),
            lon: -6.84 + i as f64 * 0.05,
            lat: 34.02,
        })
        .collect()
}

fn main() {
    println!("=== carto-rs Search Session Example ===\n");

    let mut map = SelectionCoordinator::new(RecordingEngine::new(), MapConfig::default());
    map.search_mut().expand();

    // Example 1: Too short
    println!("--- Example 1: Queries under three characters ---");
    println!("  \"Ra\" -> {:?}", map.submit_query("Ra"));
    println!();

    // Example 2: Two keystrokes, answers arrive out of order
    println!("--- Example 2: Out-of-order responses ---");
    let rab = map.submit_query("Rab").into_request();
    let raba = map.submit_query("Raba").into_request();
    if let (Some(rab), Some(raba)) = (rab, raba) {
        println!("  sent \"{}\" as generation {}", rab.scoped_query(), rab.generation);
        println!("  sent \"{}\" as generation {}", raba.scoped_query(), raba.generation);
        let newest = map.apply_geocode(raba.generation, Ok(places(&["Rabat", "Rabat-Agdal"])));
        let oldest = map.apply_geocode(rab.generation, Ok(places(&["Rabouni"; 5])));
        println!("  generation {} -> {:?}", raba.generation, newest);
        println!("  generation {} -> {:?}", rab.generation, oldest);
    }
    for hit in map.search().suggestions() {
        println!("  suggestion: {}", hit.display_name);
    }
    println!();

    // Example 3: Debounced typing
    println!("--- Example 3: Debounce driven by host time ---");
    let mut config = MapConfig::default();
    config.search.debounce_ms = 300;
    let mut debounced = SelectionCoordinator::new(RecordingEngine::new(), config);
    for (t, text) in [(0, "Mek"), (120, "Mekn"), (240, "Mekne")] {
        let outcome = debounced.submit_query_at(text, t);
        println!("  t={t:>4} ms  \"{text}\" -> {}", matches!(outcome, QueryOutcome::Deferred));
    }
    for t in [400, 540] {
        match debounced.poll_search(t) {
            Some(request) => println!("  t={t:>4} ms  released \"{}\"", request.query),
            None => println!("  t={t:>4} ms  still waiting"),
        }
    }
    println!();

    // Example 4: Pick a suggestion
    println!("--- Example 4: Fly to a suggestion ---");
    if let Some(target) = map.select_suggestion(0) {
        println!("  flying to zoom {} at ({:.0}, {:.0})", target.zoom, target.center.x, target.center.y);
    }
    println!("  selection untouched: {:?}", map.selection());
    println!("  query cleared: {:?}", map.search().query());
}
