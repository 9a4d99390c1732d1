// crates/carto-core/src/popup.rs

//! # Popup Anchor
//!
//! The info popup is positioned in **map** coordinates: the engine
//! re-projects it on every pan/zoom so it tracks the province rather than
//! staying fixed on screen.
//!
//! There is no separate "popup closed" flag. Visibility is derived from the
//! anchor and the anchor from the selection, so the popup closes only when
//! the selection is cleared.

use crate::catalog::{DownloadAction, ReferenceData};
use crate::config::PopupConfig;
use crate::engine::MapEngine;
use crate::geometry::Coordinate;
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct PopupAnchor {
    position: Option<Coordinate>,
    config: PopupConfig,
}

impl PopupAnchor {
    pub fn new(config: PopupConfig) -> Self {
        Self {
            position: None,
            config,
        }
    }

    /// Anchors the popup at `position`, or hides it with `None`.
    pub fn set_anchor<E: MapEngine + ?Sized>(&mut self, engine: &mut E, position: Option<Coordinate>) {
        self.position = position;
        engine.set_overlay_position(position);
    }

    pub fn position(&self) -> Option<Coordinate> {
        self.position
    }

    pub fn is_visible(&self) -> bool {
        self.position.is_some()
    }

    /// A hidden popup must not swallow clicks meant for the map behind it.
    pub fn is_interactive(&self) -> bool {
        self.is_visible()
    }

    pub fn config(&self) -> &PopupConfig {
        &self.config
    }
}

/// What the shell renders inside the popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupView {
    pub name: String,
    pub region: String,
    pub download: DownloadAction,
    pub anchor: Coordinate,
    pub offset_px: [f64; 2],
}

impl PopupView {
    pub fn new(name: &str, anchor: Coordinate, reference: &ReferenceData, config: &PopupConfig) -> Self {
        Self {
            name: name.to_owned(),
            region: reference.region_label(name).to_owned(),
            download: reference.download_action(name),
            anchor,
            offset_px: config.offset_px,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineCommand, RecordingEngine};

    #[test]
    fn visibility_and_interactivity_follow_the_anchor() {
        let mut popup = PopupAnchor::new(PopupConfig::default());
        let mut engine = RecordingEngine::new();
        assert!(!popup.is_visible() && !popup.is_interactive());

        popup.set_anchor(&mut engine, Some(Coordinate::new(1.0, 2.0)));
        assert!(popup.is_visible() && popup.is_interactive());

        popup.set_anchor(&mut engine, None);
        assert!(!popup.is_visible() && !popup.is_interactive());
        assert_eq!(
            engine.take(),
            vec![
                EngineCommand::SetOverlay(Some(Coordinate::new(1.0, 2.0))),
                EngineCommand::SetOverlay(None)
            ]
        );
    }

    #[test]
    fn view_falls_back_to_generic_region() {
        let view = PopupView::new(
            "Nowhere",
            Coordinate::new(0.0, 0.0),
            &ReferenceData::default(),
            &PopupConfig::default(),
        );
        assert_eq!(view.region, crate::catalog::DEFAULT_REGION_LABEL);
        assert!(matches!(view.download, DownloadAction::Unavailable { .. }));
        assert_eq!(view.offset_px, [0.0, -20.0]);
    }
}
