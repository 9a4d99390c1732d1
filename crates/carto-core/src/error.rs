// crates/carto-core/src/error.rs
use crate::geocode::GeocodeError;
use thiserror::Error;

/// Errors raised while loading geometry, configuration or reference data.
///
/// None of these are fatal to a running map view: the coordinator absorbs
/// them into a safe state and exposes them to the shell as inert feedback.
#[derive(Debug, Error)]
pub enum CartoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "cache")]
    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Geocoding failed: {0}")]
    Geocode(#[from] GeocodeError),
}

pub type Result<T> = std::result::Result<T, CartoError>;
