// crates/carto-core/src/lib.rs

//! Map synchronization engine for a province map.
//!
//! Keeps the selected province, the vector layer styles, the viewport, the
//! anchored info popup and the geocode search box consistent with each
//! other. Rendering is delegated to a [`MapEngine`](engine::MapEngine)
//! implementation supplied by the host.

pub mod catalog; // Reference data + sidebar list
pub mod config;
pub mod coordinator; // The selection state machine
pub mod engine; // Renderer capability + recording engine
pub mod error;
pub mod geocode;
pub mod geometry;
pub mod index;
pub mod layer;
pub mod loader; // Native file loading (gzip, snapshot cache)
pub mod popup;
pub mod style;
pub mod text;
pub mod viewport;

// Re-exports
pub use crate::error::{CartoError, Result};

pub use crate::catalog::{Catalog, DownloadAction, ProvinceEntry, ReferenceData};
pub use crate::config::MapConfig;
pub use crate::coordinator::{
    EventQueue, LoadState, LoadTicket, NoopHooks, Selection, SelectionCoordinator, ShellEvent,
    ShellHooks,
};
pub use crate::engine::{BaseLayer, Cursor, EngineCommand, MapEngine, RecordingEngine};
pub use crate::geocode::{GeocodeError, GeocodeHit, GeocodeRequest, Geocoder, SearchSession};
pub use crate::geometry::{Coordinate, Extent, Geometry, LonLat};
pub use crate::layer::{Feature, FeatureId, GeometryLayer, PropertyValue};
pub use crate::style::Style;

/// Everything a host needs to mount a map view.
pub mod prelude {
    pub use crate::catalog::{DownloadAction, ReferenceData};
    pub use crate::config::MapConfig;
    pub use crate::coordinator::{LoadState, Selection, SelectionCoordinator, ShellHooks};
    pub use crate::engine::{BaseLayer, Cursor, MapEngine};
    pub use crate::geocode::{Geocoder, QueryOutcome, ResponseOutcome};
    pub use crate::geometry::{Coordinate, Extent, LonLat};
    pub use crate::layer::{FeatureId, GeometryLayer};
    pub use crate::style::Style;
    pub use crate::CartoError;
}
