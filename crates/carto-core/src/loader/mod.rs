// crates/carto-core/src/loader/mod.rs

//! # Geometry Loader
//!
//! Handles the physical layer (file I/O, decompression, snapshot cache) and
//! delegates payload parsing to [`GeometryLayer::from_geojson_reader`].
//!
//! This is the native path used by the CLI and demos. In the browser the
//! wasm binding fetches the GeoJSON text itself and hands it to
//! [`GeometryLayer::from_geojson_str`].

#![cfg(feature = "json")]

use crate::error::Result;
use crate::layer::GeometryLayer;
use std::path::Path;
use tracing::{debug, info};

pub mod common_io;

#[cfg(feature = "cache")]
mod cache;

/// Suffix of the bincode snapshot written next to a geometry source.
pub const CACHE_SUFFIX: &str = "layer.bin";

impl GeometryLayer {
    /// **Smart Load:** uses a fresh snapshot when one exists, otherwise
    /// parses the GeoJSON source and refreshes the snapshot (best effort).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        #[cfg(feature = "cache")]
        {
            let cache_path = common_io::get_cache_path(path, CACHE_SUFFIX);
            if cache::is_fresh(path, &cache_path) {
                match cache::read_snapshot(&cache_path) {
                    Ok(layer) => {
                        debug!(path = %cache_path.display(), "geometry snapshot hit");
                        return Ok(layer);
                    }
                    Err(e) => debug!(error = %e, "geometry snapshot unreadable; reparsing"),
                }
            }

            let layer = Self::load_geojson(path)?;
            if let Err(e) = cache::write_snapshot(&cache_path, &layer) {
                debug!(error = %e, "could not write geometry snapshot");
            }
            return Ok(layer);
        }

        #[cfg(not(feature = "cache"))]
        Self::load_geojson(path)
    }

    /// Parses the GeoJSON source, bypassing any snapshot.
    pub fn load_geojson(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = common_io::open_stream(path)?;
        let layer = Self::from_geojson_reader(reader)?;
        info!(path = %path.display(), features = layer.len(), "geometry source parsed");
        Ok(layer)
    }

    /// Writes a bincode snapshot of this layer.
    #[cfg(feature = "cache")]
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        cache::write_snapshot(path.as_ref(), self)
    }

    #[cfg(feature = "cache")]
    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Self> {
        cache::read_snapshot(path.as_ref())
    }
}
