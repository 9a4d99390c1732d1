// crates/carto-core/tests/loader.rs
#![cfg(feature = "json")]

mod common;

use carto_core::index::FeatureIndex;
use carto_core::{CartoError, GeometryLayer};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Write;

#[test]
fn plain_geojson_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("provinces.geojson");
    fs::write(&path, common::geojson_collection(&["Rabat", "Salé", "Kénitra"])).unwrap();

    let layer = GeometryLayer::load_geojson(&path).unwrap();
    assert_eq!(layer.len(), 3);
    let index = FeatureIndex::build(&layer);
    assert_eq!(index.names().collect::<Vec<_>>(), vec!["Kénitra", "Rabat", "Salé"]);
    assert!(layer.features().iter().all(|f| f.extent.is_some()));
}

#[cfg(feature = "compact")]
#[test]
fn gzipped_source_is_transparent() {
    use flate2::{write::GzEncoder, Compression};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("provinces.geojson.gz");
    let mut gz = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
    gz.write_all(common::geojson_collection(&["Tanger", "Tétouan"]).as_bytes())
        .unwrap();
    gz.finish().unwrap();

    let layer = GeometryLayer::load_geojson(&path).unwrap();
    assert_eq!(layer.len(), 2);
}

#[cfg(feature = "cache")]
#[test]
fn snapshot_is_written_and_reused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("provinces.geojson");
    fs::write(&path, common::geojson_collection(&["Fès", "Meknès"])).unwrap();

    let first = GeometryLayer::load_from_path(&path).unwrap();
    let snapshot = dir.path().join("provinces.geojson.layer.bin");
    assert!(snapshot.exists());

    let cached = GeometryLayer::load_snapshot(&snapshot).unwrap();
    assert_eq!(cached, first);
    assert_eq!(GeometryLayer::load_from_path(&path).unwrap(), first);
}

#[test]
fn missing_source_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = GeometryLayer::load_from_path(dir.path().join("absent.geojson")).unwrap_err();
    assert!(matches!(err, CartoError::NotFound(_)));
}

#[test]
fn malformed_source_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.geojson");
    fs::write(&path, r#"{"type":"Topology","objects":{}}"#).unwrap();
    let err = GeometryLayer::load_geojson(&path).unwrap_err();
    assert!(matches!(err, CartoError::InvalidData(_)));
}
