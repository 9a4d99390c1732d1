// crates/carto-core/src/config.rs

//! # Configuration
//!
//! Every tunable of the map view in one serde-friendly tree. All fields have
//! defaults, so a config file only needs to mention what it changes:
//!
//! ```json
//! { "fit": { "max_zoom": 11 }, "search": { "country": "Maroc", "debounce_ms": 250 } }
//! ```

use crate::engine::BaseLayer;
use crate::geometry::LonLat;
use serde::{Deserialize, Serialize};

/// Animation curve for viewport transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    EaseIn,
    #[default]
    EaseOut,
    InAndOut,
}

/// Options of the animated fit-to-bounds used for direct selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Pixel padding `[top, right, bottom, left]`.
    pub padding_px: [f64; 4],
    pub duration_ms: u32,
    pub easing: Easing,
    /// Zoom ceiling so tiny provinces do not over-zoom.
    pub max_zoom: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            padding_px: [80.0; 4],
            duration_ms: 1000,
            easing: Easing::EaseOut,
            max_zoom: 13.0,
        }
    }
}

/// Fly-to used for geocoded points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyConfig {
    pub zoom: f64,
    pub duration_ms: u32,
}

impl Default for FlyConfig {
    fn default() -> Self {
        Self {
            zoom: 12.0,
            duration_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub center: LonLat,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Map size assumed until the host reports the real one.
    pub size_px: [f64; 2],
    /// Below this viewport width the shell is considered compact (mobile).
    pub compact_breakpoint_px: f64,
    pub base_layer: BaseLayer,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center: LonLat::new(-7.9, 31.6),
            zoom: 6.0,
            min_zoom: 5.0,
            max_zoom: 18.0,
            size_px: [1024.0, 768.0],
            compact_breakpoint_px: 768.0,
            base_layer: BaseLayer::Osm,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    /// Pixel offset from the anchor; the popup sits above its point.
    pub offset_px: [f64; 2],
    /// Duration of the nudge that keeps the popup on screen.
    pub auto_pan_ms: u32,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            offset_px: [0.0, -20.0],
            auto_pan_ms: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Queries shorter than this (in characters) never reach the geocoder.
    pub min_query_chars: usize,
    pub result_limit: usize,
    /// Appended to every query to scope it to one country.
    pub country: Option<String>,
    pub endpoint: String,
    /// `0` submits on every keystroke.
    pub debounce_ms: u64,
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_chars: 3,
            result_limit: 5,
            country: Some("Maroc".to_owned()),
            endpoint: crate::geocode::nominatim::NOMINATIM_ENDPOINT.to_owned(),
            debounce_ms: 0,
            user_agent: concat!("carto-rs/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// Root configuration of a map view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub view: ViewConfig,
    pub fit: FitOptions,
    pub fly: FlyConfig,
    pub popup: PopupConfig,
    pub search: SearchConfig,
}

#[cfg(feature = "json")]
impl MapConfig {
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            crate::CartoError::NotFound(format!("Config not found at {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }
}
