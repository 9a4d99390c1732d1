// crates/carto-core/tests/common/mod.rs
#![allow(dead_code)]

use carto_core::geometry::Geometry;
use carto_core::layer::PropertyValue;
use carto_core::{EventQueue, GeometryLayer, MapConfig, RecordingEngine, SelectionCoordinator};
use std::collections::BTreeMap;

/// Twelve named squares "A".."L", one degree wide, laid out west to east
/// across Morocco.
pub fn twelve_provinces() -> GeometryLayer {
    GeometryLayer::from_parts(
        ('A'..='L')
            .enumerate()
            .map(|(i, c)| named_square(&c.to_string(), -13.0 + i as f64, 30.0)),
    )
}

pub fn named_square(
    name: &str,
    lon: f64,
    lat: f64,
) -> (BTreeMap<String, PropertyValue>, Option<Geometry>) {
    let mut props = BTreeMap::new();
    props.insert("NOM_PROV".to_owned(), PropertyValue::Text(name.to_owned()));
    let ring = vec![
        [lon, lat],
        [lon + 1.0, lat],
        [lon + 1.0, lat + 1.0],
        [lon, lat + 1.0],
        [lon, lat],
    ];
    (props, Some(Geometry::Polygon(vec![ring])))
}

pub fn geojson_collection(names: &[&str]) -> String {
    let features: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let lon = -9.0 + i as f64;
            format!(
                r#"{{"type":"Feature","properties":{{"NOM_PROV":"{name}"}},"geometry":{{"type":"Polygon","coordinates":[[[{lon},31.0],[{e},31.0],[{e},32.0],[{lon},32.0],[{lon},31.0]]]}}}}"#,
                e = lon + 1.0
            )
        })
        .collect();
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
}

/// A coordinator over the twelve-province fixture with queued hooks.
/// Load-time commands and events are already drained.
pub fn mounted() -> (SelectionCoordinator<RecordingEngine>, EventQueue) {
    let events = EventQueue::new();
    let mut map = SelectionCoordinator::new(RecordingEngine::new(), MapConfig::default())
        .with_hooks(events.clone());
    map.load_layer(twelve_provinces());
    map.engine_mut().take();
    events.drain();
    (map, events)
}
