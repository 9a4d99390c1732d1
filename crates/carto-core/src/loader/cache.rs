// crates/carto-core/src/loader/cache.rs
use crate::error::{CartoError, Result};
use crate::layer::GeometryLayer;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// A snapshot is fresh when it exists and is not older than its source.
pub(super) fn is_fresh(source: &Path, cache: &Path) -> bool {
    let cache_time = match fs::metadata(cache).and_then(|m| m.modified()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    match fs::metadata(source).and_then(|m| m.modified()) {
        Ok(source_time) => source_time <= cache_time,
        // Source gone: the snapshot is all we have.
        Err(_) => true,
    }
}

pub(super) fn read_snapshot(path: &Path) -> Result<GeometryLayer> {
    let file = File::open(path).map_err(|e| {
        CartoError::NotFound(format!("Snapshot not found at {}: {}", path.display(), e))
    })?;
    Ok(bincode::deserialize_from(BufReader::new(file))?)
}

pub(super) fn write_snapshot(path: &Path, layer: &GeometryLayer) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, layer)?;
    writer.flush()?;
    Ok(())
}
