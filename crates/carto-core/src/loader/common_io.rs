// crates/carto-core/src/loader/common_io.rs
use crate::error::{CartoError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

#[cfg(feature = "compact")]
use flate2::read::GzDecoder;

/// Opens a geometry source, transparently un-gzipping `*.gz` files.
pub fn open_stream(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| {
        CartoError::NotFound(format!("Geometry source not found at {}: {}", path.display(), e))
    })?;

    let reader = BufReader::new(file);

    if is_gzip(path) {
        #[cfg(feature = "compact")]
        {
            return Ok(Box::new(GzDecoder::new(reader)));
        }
        #[cfg(not(feature = "compact"))]
        {
            return Err(CartoError::InvalidData(format!(
                "{} is gzipped but the 'compact' feature is disabled",
                path.display()
            )));
        }
    }

    Ok(Box::new(reader))
}

pub fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// `provinces.geojson` -> `provinces.geojson.<suffix>`
pub fn get_cache_path(source: &Path, suffix: &str) -> PathBuf {
    let filename = source
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layer".to_owned());
    source.with_file_name(format!("{filename}.{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_path_sits_next_to_source() {
        let p = get_cache_path(Path::new("/data/provinces.geojson.gz"), "layer.bin");
        assert_eq!(p, PathBuf::from("/data/provinces.geojson.gz.layer.bin"));
    }

    #[test]
    fn gzip_detection_is_case_insensitive() {
        assert!(is_gzip(Path::new("a.geojson.GZ")));
        assert!(!is_gzip(Path::new("a.geojson")));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = open_stream(Path::new("/definitely/not/here.geojson"))
            .err()
            .unwrap();
        assert!(matches!(err, CartoError::NotFound(_)));
    }
}
