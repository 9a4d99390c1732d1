// crates/carto-core/src/viewport.rs

//! # Viewport Controller
//!
//! Issues every view change as an animation (never a snap) and keeps track
//! of the viewport it last asked for.

use crate::config::{FitOptions, FlyConfig, MapConfig};
use crate::engine::MapEngine;
use crate::geometry::{
    from_lon_lat, resolution_for_zoom, zoom_for_resolution, Coordinate, Extent, LonLat,
};
use serde::Serialize;

/// Center + zoom of the map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: f64,
}

/// Drives viewport animations on the engine.
///
/// Responsibilities:
/// - Fit-to-bounds for direct selections (padding, ease-out, zoom ceiling)
/// - Fly-to-point for geocoded results
/// - Tracking the target viewport of the latest animation
#[derive(Debug, Clone)]
pub struct ViewportController {
    fit: FitOptions,
    fly: FlyConfig,
    min_zoom: f64,
    max_zoom: f64,
    size_px: [f64; 2],
    target: Viewport,
}

impl ViewportController {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            fit: config.fit.clone(),
            fly: config.fly.clone(),
            min_zoom: config.view.min_zoom,
            max_zoom: config.view.max_zoom,
            size_px: config.view.size_px,
            target: Viewport {
                center: from_lon_lat(config.view.center),
                zoom: config.view.zoom,
            },
        }
    }

    /// Viewport requested by the most recent animation (or the initial view).
    pub fn target(&self) -> Viewport {
        self.target
    }

    pub fn fit_options(&self) -> &FitOptions {
        &self.fit
    }

    /// Records the map's pixel size, used to predict fit zoom levels.
    pub fn set_map_size(&mut self, width_px: f64, height_px: f64) {
        self.size_px = [width_px.max(1.0), height_px.max(1.0)];
    }

    /// Animated fit to `extent`; returns the viewport the engine will settle on.
    pub fn focus_entity<E: MapEngine + ?Sized>(&mut self, engine: &mut E, extent: Extent) -> Viewport {
        let target = self.fit_target(extent);
        engine.fit_extent(extent, &self.fit);
        self.target = target;
        target
    }

    /// Animated pan/zoom to a geographic point.
    pub fn fly_to<E: MapEngine + ?Sized>(&mut self, engine: &mut E, point: LonLat, zoom: f64) -> Viewport {
        let target = Viewport {
            center: from_lon_lat(point),
            zoom: self.clamp_zoom(zoom, self.max_zoom),
        };
        engine.animate_to(target.center, target.zoom, self.fly.duration_ms);
        self.target = target;
        target
    }

    /// Fly-to with the configured geocode zoom.
    pub fn fly_to_default<E: MapEngine + ?Sized>(&mut self, engine: &mut E, point: LonLat) -> Viewport {
        self.fly_to(engine, point, self.fly.zoom)
    }

    /// The viewport a fit to `extent` lands on, without animating.
    ///
    /// Mirrors what map engines do: pick the resolution that makes the
    /// extent fit inside the padded map, cap it at the fit zoom ceiling and
    /// shift the center so the extent sits in the middle of the padded box.
    pub fn fit_target(&self, extent: Extent) -> Viewport {
        let [top, right, bottom, left] = self.fit.padding_px;
        let avail_w = (self.size_px[0] - left - right).max(1.0);
        let avail_h = (self.size_px[1] - top - bottom).max(1.0);

        let ceiling = self.fit.max_zoom.min(self.max_zoom);
        let raw = (extent.width() / avail_w).max(extent.height() / avail_h);
        let zoom = if raw > 0.0 {
            self.clamp_zoom(zoom_for_resolution(raw), ceiling)
        } else {
            ceiling
        };

        let res = resolution_for_zoom(zoom);
        let c = extent.center();
        Viewport {
            center: Coordinate {
                x: c.x - (left - right) / 2.0 * res,
                y: c.y + (top - bottom) / 2.0 * res,
            },
            zoom,
        }
    }

    fn clamp_zoom(&self, zoom: f64, ceiling: f64) -> f64 {
        zoom.min(ceiling).max(self.min_zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineCommand, RecordingEngine};

    fn controller() -> ViewportController {
        ViewportController::new(&MapConfig::default())
    }

    #[test]
    fn tiny_extents_hit_the_zoom_ceiling() {
        let c = controller();
        let point = Extent::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(c.fit_target(point).zoom, 13.0);
        let degenerate = Extent::new(5.0, 5.0, 5.0, 5.0);
        assert_eq!(c.fit_target(degenerate).zoom, 13.0);
    }

    #[test]
    fn huge_extents_stop_at_min_zoom() {
        let c = controller();
        let world = Extent::new(-2.0e7, -2.0e7, 2.0e7, 2.0e7);
        assert_eq!(c.fit_target(world).zoom, 5.0);
    }

    #[test]
    fn symmetric_padding_keeps_extent_center() {
        let c = controller();
        let e = Extent::new(-700_000.0, 3_900_000.0, -600_000.0, 4_000_000.0);
        let target = c.fit_target(e);
        assert_eq!(target.center, e.center());
        assert!(target.zoom > 5.0 && target.zoom < 13.0);
    }

    #[test]
    fn fitted_extent_fits_inside_padded_map() {
        let mut c = controller();
        c.set_map_size(800.0, 600.0);
        let e = Extent::new(0.0, 0.0, 200_000.0, 50_000.0);
        let t = c.fit_target(e);
        let res = resolution_for_zoom(t.zoom);
        assert!(e.width() / res <= 800.0 - 160.0 + 1e-6);
        assert!(e.height() / res <= 600.0 - 160.0 + 1e-6);
    }

    #[test]
    fn focus_issues_one_fit_with_configured_options() {
        let mut c = controller();
        let mut engine = RecordingEngine::new();
        let e = Extent::new(0.0, 0.0, 1000.0, 1000.0);
        let target = c.focus_entity(&mut engine, e);

        assert_eq!(c.target(), target);
        assert_eq!(
            engine.take(),
            vec![EngineCommand::FitExtent {
                extent: e,
                options: FitOptions::default()
            }]
        );
    }

    #[test]
    fn fly_to_projects_and_clamps() {
        let mut c = controller();
        let mut engine = RecordingEngine::new();
        let rabat = LonLat::new(-6.85, 34.02);
        let t = c.fly_to(&mut engine, rabat, 40.0);
        assert_eq!(t.zoom, 18.0);
        assert_eq!(t.center, from_lon_lat(rabat));
        assert!(matches!(
            engine.take().as_slice(),
            [EngineCommand::AnimateTo { duration_ms: 1000, .. }]
        ));

        let t = c.fly_to_default(&mut engine, rabat);
        assert_eq!(t.zoom, 12.0);
    }
}
