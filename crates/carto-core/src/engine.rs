// crates/carto-core/src/engine.rs

//! # Map Engine Capability
//!
//! The small surface the core needs from a map renderer. The renderer owns
//! tiles, the vector layer's on-screen representation, hit-testing and
//! animation; the core only tells it *what* to show.
//!
//! Hit-testing stays in the engine: it reports clicks and pointer moves with
//! the [`FeatureId`](crate::layer::FeatureId) under the pointer, using the
//! same source order as [`GeometryLayer`](crate::layer::GeometryLayer).

use crate::config::FitOptions;
use crate::geometry::{Coordinate, Extent};
use crate::style::Style;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mutually exclusive base tile layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BaseLayer {
    #[default]
    #[serde(rename = "OSM")]
    Osm,
    Satellite,
    Terrain,
}

impl BaseLayer {
    pub const ALL: [BaseLayer; 3] = [BaseLayer::Osm, BaseLayer::Satellite, BaseLayer::Terrain];

    /// Name the engine tags the tile layer with.
    pub fn name(self) -> &'static str {
        match self {
            BaseLayer::Osm => "OSM",
            BaseLayer::Satellite => "Satellite",
            BaseLayer::Terrain => "Terrain",
        }
    }

    /// XYZ tile template; `None` means the engine's built-in OSM source.
    pub fn tile_url(self) -> Option<&'static str> {
        match self {
            BaseLayer::Osm => None,
            BaseLayer::Satellite => Some(
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
            ),
            BaseLayer::Terrain => Some("https://tile.openstreetmap.fr/hot/{z}/{x}/{y}.png"),
        }
    }
}

impl fmt::Display for BaseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BaseLayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BaseLayer::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown base layer `{s}` (expected OSM, Satellite or Terrain)"))
    }
}

/// Cursor affordance over the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

impl Cursor {
    /// CSS cursor value.
    pub fn css(self) -> &'static str {
        match self {
            Cursor::Default => "",
            Cursor::Pointer => "pointer",
        }
    }
}

/// Commands the core issues to a map renderer.
///
/// Implementations must not call back into the coordinator synchronously;
/// redraws and animations complete on later event-loop turns.
pub trait MapEngine {
    /// Redraws the vector layer. `styles[i]` is the style of `FeatureId(i)`.
    fn restyle(&mut self, styles: &[Style]);

    /// Animated fit of the view to `extent`.
    fn fit_extent(&mut self, extent: Extent, options: &FitOptions);

    /// Animated pan/zoom to a point.
    fn animate_to(&mut self, center: Coordinate, zoom: f64, duration_ms: u32);

    /// Moves the anchored overlay; `None` hides it.
    fn set_overlay_position(&mut self, position: Option<Coordinate>);

    /// Shows `layer` and hides every other base layer.
    fn show_base_layer(&mut self, layer: BaseLayer);

    fn set_cursor(&mut self, cursor: Cursor);
}

impl<E: MapEngine + ?Sized> MapEngine for Box<E> {
    fn restyle(&mut self, styles: &[Style]) {
        (**self).restyle(styles)
    }
    fn fit_extent(&mut self, extent: Extent, options: &FitOptions) {
        (**self).fit_extent(extent, options)
    }
    fn animate_to(&mut self, center: Coordinate, zoom: f64, duration_ms: u32) {
        (**self).animate_to(center, zoom, duration_ms)
    }
    fn set_overlay_position(&mut self, position: Option<Coordinate>) {
        (**self).set_overlay_position(position)
    }
    fn show_base_layer(&mut self, layer: BaseLayer) {
        (**self).show_base_layer(layer)
    }
    fn set_cursor(&mut self, cursor: Cursor) {
        (**self).set_cursor(cursor)
    }
}

// -----------------------------------------------------------------------------
// RECORDING ENGINE
// -----------------------------------------------------------------------------

/// One call made against a [`MapEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Restyle(Vec<Style>),
    FitExtent { extent: Extent, options: FitOptions },
    AnimateTo { center: Coordinate, zoom: f64, duration_ms: u32 },
    SetOverlay(Option<Coordinate>),
    ShowBaseLayer(BaseLayer),
    SetCursor(Cursor),
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Restyle(styles) => {
                let highlighted: Vec<&str> = styles
                    .iter()
                    .filter(|s| s.is_highlighted())
                    .map(|s| s.label.text.as_str())
                    .collect();
                write!(f, "restyle {} features (highlighted: {:?})", styles.len(), highlighted)
            }
            EngineCommand::FitExtent { extent, options } => write!(
                f,
                "fit [{:.0}, {:.0}, {:.0}, {:.0}] in {} ms, max zoom {}",
                extent.min_x, extent.min_y, extent.max_x, extent.max_y, options.duration_ms, options.max_zoom
            ),
            EngineCommand::AnimateTo {
                center,
                zoom,
                duration_ms,
            } => write!(
                f,
                "animate to ({:.0}, {:.0}) zoom {} in {} ms",
                center.x, center.y, zoom, duration_ms
            ),
            EngineCommand::SetOverlay(Some(c)) => write!(f, "overlay at ({:.0}, {:.0})", c.x, c.y),
            EngineCommand::SetOverlay(None) => f.write_str("overlay hidden"),
            EngineCommand::ShowBaseLayer(layer) => write!(f, "base layer {layer}"),
            EngineCommand::SetCursor(cursor) => write!(f, "cursor {cursor:?}"),
        }
    }
}

/// Headless engine that records every command.
///
/// Used by the CLI's replay mode and throughout the tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    commands: Vec<EngineCommand>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[EngineCommand] {
        &self.commands
    }

    /// Drains the recorded commands.
    pub fn take(&mut self) -> Vec<EngineCommand> {
        std::mem::take(&mut self.commands)
    }

    /// The most recent style sheet pushed to the layer.
    pub fn last_styles(&self) -> Option<&[Style]> {
        self.commands.iter().rev().find_map(|c| match c {
            EngineCommand::Restyle(s) => Some(s.as_slice()),
            _ => None,
        })
    }

    pub fn fits(&self) -> impl Iterator<Item = &Extent> {
        self.commands.iter().filter_map(|c| match c {
            EngineCommand::FitExtent { extent, .. } => Some(extent),
            _ => None,
        })
    }

    pub fn has_viewport_animation(&self) -> bool {
        self.commands.iter().any(|c| {
            matches!(
                c,
                EngineCommand::FitExtent { .. } | EngineCommand::AnimateTo { .. }
            )
        })
    }
}

impl MapEngine for RecordingEngine {
    fn restyle(&mut self, styles: &[Style]) {
        self.commands.push(EngineCommand::Restyle(styles.to_vec()));
    }

    fn fit_extent(&mut self, extent: Extent, options: &FitOptions) {
        self.commands.push(EngineCommand::FitExtent {
            extent,
            options: options.clone(),
        });
    }

    fn animate_to(&mut self, center: Coordinate, zoom: f64, duration_ms: u32) {
        self.commands.push(EngineCommand::AnimateTo {
            center,
            zoom,
            duration_ms,
        });
    }

    fn set_overlay_position(&mut self, position: Option<Coordinate>) {
        self.commands.push(EngineCommand::SetOverlay(position));
    }

    fn show_base_layer(&mut self, layer: BaseLayer) {
        self.commands.push(EngineCommand::ShowBaseLayer(layer));
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.commands.push(EngineCommand::SetCursor(cursor));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_layer_parses_case_insensitively() {
        assert_eq!("osm".parse::<BaseLayer>(), Ok(BaseLayer::Osm));
        assert_eq!(" SATELLITE ".parse::<BaseLayer>(), Ok(BaseLayer::Satellite));
        assert!("Topo".parse::<BaseLayer>().is_err());
    }

    #[test]
    fn only_osm_uses_the_builtin_source() {
        assert!(BaseLayer::Osm.tile_url().is_none());
        assert!(BaseLayer::Satellite.tile_url().unwrap().contains("World_Imagery"));
        assert!(BaseLayer::Terrain.tile_url().unwrap().contains("{z}"));
    }

    #[test]
    fn recorder_drains_on_take() {
        let mut e = RecordingEngine::new();
        e.set_cursor(Cursor::Pointer);
        e.set_overlay_position(None);
        assert_eq!(e.take().len(), 2);
        assert!(e.commands().is_empty());
        assert!(!e.has_viewport_animation());
    }
}
