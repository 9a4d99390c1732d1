// crates/carto-core/src/coordinator.rs

//! # Selection Coordinator
//!
//! The single owner of "what is selected". Map clicks, list clicks, popup
//! dismissal and geometry (re)loads all funnel through here, and every
//! consumer (styles, viewport, popup, shell) is refreshed in one fixed
//! order so none of them can drift from the selection.
//!
//! ```text
//!            click feature / list item
//!   Idle ───────────────────────────────▶ Selected(name)
//!    ▲                                        │
//!    └──── click empty / dismiss / miss ──────┘
//! ```
//!
//! Entering `Selected`: restyle → fit viewport → anchor popup → notify shell
//! (→ collapse the list overlay on compact screens).
//! Entering `Idle`: restyle → hide popup → notify shell.

use crate::catalog::{Catalog, ReferenceData};
use crate::config::MapConfig;
use crate::engine::{BaseLayer, Cursor, MapEngine};
use crate::error::Result;
use crate::geocode::{
    GeocodeRequest, GeocodeResult, Geocoder, QueryOutcome, ResponseOutcome, SearchSession,
};
use crate::geometry::{to_lon_lat, Coordinate, Extent, LonLat};
use crate::index::{resolve_name, FeatureIndex};
use crate::layer::{FeatureId, GeometryLayer};
use crate::popup::{PopupAnchor, PopupView};
use crate::style::{restyle_all, style_for, Style};
use crate::viewport::{Viewport, ViewportController};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, error, info};

// -----------------------------------------------------------------------------
// STATE
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "name")]
pub enum Selection {
    #[default]
    Idle,
    Selected(String),
}

impl Selection {
    pub fn name(&self) -> Option<&str> {
        match self {
            Selection::Idle => None,
            Selection::Selected(name) => Some(name),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Selection::Idle)
    }
}

/// Where a selection request came from; used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrigin {
    Map,
    List,
    Reload,
}

impl fmt::Display for SelectionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SelectionOrigin::Map => "map",
            SelectionOrigin::List => "list",
            SelectionOrigin::Reload => "reload",
        })
    }
}

/// Lifecycle of the geometry source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message")]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Ready,
    Failed(String),
}

/// Token of one geometry load; completions quoting an older ticket are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

// -----------------------------------------------------------------------------
// SHELL HOOKS
// -----------------------------------------------------------------------------

/// Notifications to the surrounding UI.
///
/// Hooks run while the coordinator is mid-update; they must not call back
/// into it.
pub trait ShellHooks {
    fn on_select(&mut self, _name: Option<&str>) {}

    /// The list overlay covers the map on compact screens; hide it.
    fn collapse_list_overlay(&mut self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl ShellHooks for NoopHooks {}

/// A hook call, as queued by [`EventQueue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "name", rename_all = "snake_case")]
pub enum ShellEvent {
    Select(Option<String>),
    CollapseListOverlay,
}

/// Hooks that queue every call so the host can handle them after the
/// coordinator returns.
#[derive(Debug, Clone, Default)]
pub struct EventQueue(Rc<RefCell<Vec<ShellEvent>>>);

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<ShellEvent> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl ShellHooks for EventQueue {
    fn on_select(&mut self, name: Option<&str>) {
        self.0
            .borrow_mut()
            .push(ShellEvent::Select(name.map(str::to_owned)));
    }

    fn collapse_list_overlay(&mut self) {
        self.0.borrow_mut().push(ShellEvent::CollapseListOverlay);
    }
}

// -----------------------------------------------------------------------------
// COORDINATOR
// -----------------------------------------------------------------------------

/// One mounted map view.
///
/// Owns the engine handle for its whole lifetime; dropping the coordinator
/// (or calling [`SelectionCoordinator::into_engine`]) unmounts it.
pub struct SelectionCoordinator<E: MapEngine> {
    engine: E,
    config: MapConfig,
    layer: GeometryLayer,
    index: FeatureIndex,
    selection: Selection,
    viewport: ViewportController,
    popup: PopupAnchor,
    search: SearchSession,
    hooks: Box<dyn ShellHooks>,
    load_state: LoadState,
    load_generation: u64,
    base_layer: BaseLayer,
    pointer: Option<LonLat>,
    cursor: Cursor,
    viewport_width_px: f64,
}

impl<E: MapEngine> fmt::Debug for SelectionCoordinator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionCoordinator")
            .field("selection", &self.selection)
            .field("load_state", &self.load_state)
            .field("features", &self.layer.len())
            .field("base_layer", &self.base_layer)
            .finish_non_exhaustive()
    }
}

impl<E: MapEngine> SelectionCoordinator<E> {
    pub fn new(engine: E, config: MapConfig) -> Self {
        Self {
            engine,
            viewport: ViewportController::new(&config),
            popup: PopupAnchor::new(config.popup.clone()),
            search: SearchSession::new(&config.search),
            base_layer: config.view.base_layer,
            viewport_width_px: config.view.size_px[0],
            layer: GeometryLayer::empty(),
            index: FeatureIndex::default(),
            selection: Selection::Idle,
            hooks: Box::new(NoopHooks),
            load_state: LoadState::NotLoaded,
            load_generation: 0,
            pointer: None,
            cursor: Cursor::Default,
            config,
        }
    }

    pub fn with_hooks(mut self, hooks: impl ShellHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Unmounts the view, handing the engine back.
    pub fn into_engine(self) -> E {
        self.engine
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    // --- Loading -------------------------------------------------------------

    /// Starts a (re)load; the returned ticket must accompany the result.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        self.load_state = LoadState::Loading;
        info!(ticket = self.load_generation, "loading geometry");
        LoadTicket(self.load_generation)
    }

    /// Delivers a load result. Returns `false` when `ticket` was superseded.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<GeometryLayer>) -> bool {
        if ticket.0 != self.load_generation {
            debug!(
                ticket = ticket.0,
                latest = self.load_generation,
                "dropping superseded geometry load"
            );
            return false;
        }

        match result {
            Ok(layer) => self.install_layer(layer),
            Err(e) => {
                error!(error = %e, "geometry load failed");
                self.layer = GeometryLayer::empty();
                self.index = FeatureIndex::default();
                self.load_state = LoadState::Failed(e.to_string());
                self.enter_idle();
            }
        }
        true
    }

    /// Installs an already parsed layer.
    pub fn load_layer(&mut self, layer: GeometryLayer) {
        let ticket = self.begin_load();
        self.finish_load(ticket, Ok(layer));
    }

    fn install_layer(&mut self, layer: GeometryLayer) {
        self.index = FeatureIndex::build(&layer);
        self.layer = layer;
        self.load_state = LoadState::Ready;
        info!(
            features = self.layer.len(),
            names = self.index.len(),
            "geometry ready"
        );

        let Some(name) = self.selection.name().map(str::to_owned) else {
            self.refresh_styles();
            return;
        };
        match self.locate(&name) {
            Some((_, extent)) => {
                debug!(name = %name, origin = %SelectionOrigin::Reload, "selection kept");
                self.refresh_styles();
                self.popup.set_anchor(&mut self.engine, Some(extent.center()));
            }
            None => {
                debug!(name = %name, "selection vanished on reload");
                self.enter_idle();
            }
        }
    }

    // --- Selection -----------------------------------------------------------

    /// A click on the map; `hit` is the feature under the pointer, if any.
    pub fn map_click(&mut self, hit: Option<FeatureId>) {
        let Some(id) = hit else {
            self.enter_idle();
            return;
        };
        let Some(feature) = self.layer.feature(id) else {
            debug!(feature = %id, "click on unknown feature; treating as empty space");
            self.enter_idle();
            return;
        };
        match resolve_name(feature).map(str::to_owned) {
            Some(name) => self.select(&name, SelectionOrigin::Map),
            None => debug!(feature = %id, "clicked feature has no name; ignoring"),
        }
    }

    pub fn select_from_list(&mut self, name: &str) {
        self.select(name, SelectionOrigin::List);
    }

    /// The popup's close affordance.
    pub fn dismiss_popup(&mut self) {
        self.enter_idle();
    }

    pub fn clear_selection(&mut self) {
        self.enter_idle();
    }

    fn select(&mut self, name: &str, origin: SelectionOrigin) {
        match self.locate(name) {
            Some((_, extent)) => self.enter_selected(name, extent, origin),
            None => {
                debug!(name, %origin, "selection target not found");
                self.enter_idle();
            }
        }
    }

    fn locate(&self, name: &str) -> Option<(FeatureId, Extent)> {
        let id = self.index.get(name)?;
        let extent = self.layer.feature(id)?.extent?;
        Some((id, extent))
    }

    fn enter_selected(&mut self, name: &str, extent: Extent, origin: SelectionOrigin) {
        info!(name, %origin, "province selected");
        self.selection = Selection::Selected(name.to_owned());
        self.refresh_styles();
        self.viewport.focus_entity(&mut self.engine, extent);
        self.popup.set_anchor(&mut self.engine, Some(extent.center()));
        self.hooks.on_select(Some(name));
        if self.is_compact() {
            self.hooks.collapse_list_overlay();
        }
    }

    fn enter_idle(&mut self) {
        if !self.selection.is_idle() {
            debug!("selection cleared");
        }
        self.selection = Selection::Idle;
        self.refresh_styles();
        self.popup.set_anchor(&mut self.engine, None);
        self.hooks.on_select(None);
    }

    fn refresh_styles(&mut self) {
        let styles = restyle_all(&self.layer, self.selection.name());
        self.engine.restyle(&styles);
    }

    // --- Pointer, base map, sizing -------------------------------------------

    /// Updates the coordinate readout and the cursor.
    pub fn pointer_moved(&mut self, position: Coordinate, hit: Option<FeatureId>) -> LonLat {
        let lon_lat = to_lon_lat(position);
        self.pointer = Some(lon_lat);

        let over_feature = hit.is_some_and(|id| self.layer.feature(id).is_some());
        let cursor = if over_feature {
            Cursor::Pointer
        } else {
            Cursor::Default
        };
        if cursor != self.cursor {
            self.cursor = cursor;
            self.engine.set_cursor(cursor);
        }
        lon_lat
    }

    pub fn set_base_layer(&mut self, layer: BaseLayer) {
        self.base_layer = layer;
        self.engine.show_base_layer(layer);
    }

    pub fn set_viewport_width(&mut self, width_px: f64) {
        self.viewport_width_px = width_px;
    }

    pub fn set_map_size(&mut self, width_px: f64, height_px: f64) {
        self.viewport.set_map_size(width_px, height_px);
    }

    pub fn is_compact(&self) -> bool {
        self.viewport_width_px < self.config.view.compact_breakpoint_px
    }

    // --- Search --------------------------------------------------------------

    pub fn submit_query(&mut self, text: &str) -> QueryOutcome {
        self.search.submit_query(text)
    }

    pub fn submit_query_at(&mut self, text: &str, now_ms: u64) -> QueryOutcome {
        self.search.submit_query_at(text, now_ms)
    }

    pub fn poll_search(&mut self, now_ms: u64) -> Option<GeocodeRequest> {
        self.search.poll(now_ms)
    }

    pub fn apply_geocode(&mut self, generation: u64, result: GeocodeResult) -> ResponseOutcome {
        self.search.apply_response(generation, result)
    }

    /// Flies to suggestion `index`. The selection is left untouched.
    pub fn select_suggestion(&mut self, index: usize) -> Option<Viewport> {
        let hit = self.search.take_suggestion(index)?;
        info!(place = %hit.display_name, "flying to search result");
        Some(self.viewport.fly_to_default(&mut self.engine, hit.lon_lat()))
    }

    /// Submits `text` and resolves it synchronously through `geocoder`.
    pub fn run_geocoder(&mut self, geocoder: &dyn Geocoder, text: &str) -> Option<ResponseOutcome> {
        let request = self.search.submit_query(text).into_request()?;
        let result = geocoder.lookup(&request);
        Some(self.search.apply_response(request.generation, result))
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut SearchSession {
        &mut self.search
    }

    // --- Views ---------------------------------------------------------------

    /// Current style of every feature, indexed by `FeatureId`.
    pub fn styles(&self) -> Vec<Style> {
        restyle_all(&self.layer, self.selection.name())
    }

    pub fn style_of(&self, id: FeatureId) -> Option<Style> {
        self.layer
            .feature(id)
            .map(|f| style_for(f, self.selection.name()))
    }

    pub fn popup_view(&self, reference: &ReferenceData) -> Option<PopupView> {
        let name = self.selection.name()?;
        let anchor = self.popup.position()?;
        Some(PopupView::new(name, anchor, reference, self.popup.config()))
    }

    pub fn catalog(&self, reference: &ReferenceData) -> Catalog {
        Catalog::from_index(&self.index, reference)
    }

    // --- Accessors -----------------------------------------------------------

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selection.name()
    }

    pub fn layer(&self) -> &GeometryLayer {
        &self.layer
    }

    pub fn index(&self) -> &FeatureIndex {
        &self.index
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn base_layer(&self) -> BaseLayer {
        self.base_layer
    }

    pub fn pointer_readout(&self) -> Option<LonLat> {
        self.pointer
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn popup(&self) -> &PopupAnchor {
        &self.popup
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineCommand, RecordingEngine};
    use crate::geometry::Geometry;
    use crate::layer::PropertyValue;
    use crate::CartoError;
    use std::collections::BTreeMap;

    fn square(name: Option<&str>, lon: f64) -> (BTreeMap<String, PropertyValue>, Option<Geometry>) {
        let mut p = BTreeMap::new();
        if let Some(n) = name {
            p.insert("NOM_PROV".to_owned(), PropertyValue::Text(n.to_owned()));
        }
        let ring = vec![[lon, 30.0], [lon + 1.0, 30.0], [lon + 1.0, 31.0], [lon, 31.0], [lon, 30.0]];
        (p, Some(Geometry::Polygon(vec![ring])))
    }

    fn mounted() -> (SelectionCoordinator<RecordingEngine>, EventQueue) {
        let events = EventQueue::new();
        let mut c = SelectionCoordinator::new(RecordingEngine::new(), MapConfig::default())
            .with_hooks(events.clone());
        c.load_layer(GeometryLayer::from_parts([
            square(Some("Rabat"), -7.0),
            square(Some("Salé"), -6.0),
            square(None, -5.0),
        ]));
        c.engine_mut().take();
        events.drain();
        (c, events)
    }

    #[test]
    fn map_click_runs_refresh_in_order() {
        let (mut c, events) = mounted();
        c.map_click(Some(FeatureId(1)));

        assert_eq!(c.selected_name(), Some("Salé"));
        let cmds = c.engine_mut().take();
        assert!(matches!(cmds[0], EngineCommand::Restyle(_)));
        assert!(matches!(cmds[1], EngineCommand::FitExtent { .. }));
        assert!(matches!(cmds[2], EngineCommand::SetOverlay(Some(_))));
        assert_eq!(cmds.len(), 3);
        assert_eq!(events.drain(), vec![ShellEvent::Select(Some("Salé".into()))]);
    }

    #[test]
    fn unnamed_feature_click_changes_nothing() {
        let (mut c, events) = mounted();
        c.select_from_list("Rabat");
        c.engine_mut().take();
        events.drain();

        c.map_click(Some(FeatureId(2)));
        assert_eq!(c.selected_name(), Some("Rabat"));
        assert!(c.engine().commands().is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn empty_and_stale_clicks_clear() {
        let (mut c, _) = mounted();
        c.select_from_list("Rabat");
        c.map_click(Some(FeatureId(99)));
        assert!(c.selection().is_idle());
        assert!(!c.popup().is_visible());

        c.select_from_list("Rabat");
        c.map_click(None);
        assert!(c.selection().is_idle());
    }

    #[test]
    fn unknown_list_name_clears_without_moving() {
        let (mut c, _) = mounted();
        c.select_from_list("Atlantis");
        assert!(c.selection().is_idle());
        assert!(!c.engine().has_viewport_animation());
    }

    #[test]
    fn reselecting_repeats_the_refresh() {
        let (mut c, _) = mounted();
        c.select_from_list("Rabat");
        c.engine_mut().take();
        c.select_from_list("Rabat");
        assert_eq!(c.engine().fits().count(), 1);
    }

    #[test]
    fn compact_screens_collapse_the_list() {
        let (mut c, events) = mounted();
        c.set_viewport_width(500.0);
        c.select_from_list("Salé");
        assert_eq!(
            events.drain(),
            vec![
                ShellEvent::Select(Some("Salé".into())),
                ShellEvent::CollapseListOverlay
            ]
        );
    }

    #[test]
    fn superseded_loads_are_dropped() {
        let mut c = SelectionCoordinator::new(RecordingEngine::new(), MapConfig::default());
        let old = c.begin_load();
        let new = c.begin_load();
        assert!(!c.finish_load(old, Ok(GeometryLayer::from_parts([square(Some("X"), 0.0)]))));
        assert_eq!(c.load_state(), &LoadState::Loading);
        assert!(c.finish_load(new, Ok(GeometryLayer::empty())));
        assert_eq!(c.load_state(), &LoadState::Ready);
        assert!(c.layer().is_empty());
    }

    #[test]
    fn failed_load_empties_the_view() {
        let (mut c, _) = mounted();
        c.select_from_list("Rabat");
        let t = c.begin_load();
        c.finish_load(t, Err(CartoError::InvalidData("truncated".into())));

        assert!(matches!(c.load_state(), LoadState::Failed(m) if m.contains("truncated")));
        assert!(c.selection().is_idle());
        assert!(c.layer().is_empty());
        c.map_click(Some(FeatureId(0)));
        assert!(c.selection().is_idle());
    }

    #[test]
    fn pointer_updates_readout_and_cursor_once() {
        let (mut c, _) = mounted();
        let rabat = crate::geometry::from_lon_lat(LonLat::new(-6.84, 34.02));
        let readout = c.pointer_moved(rabat, Some(FeatureId(0)));
        assert!((readout.lat - 34.02).abs() < 1e-9);
        c.pointer_moved(rabat, Some(FeatureId(0)));
        c.pointer_moved(rabat, None);
        assert_eq!(
            c.engine_mut().take(),
            vec![
                EngineCommand::SetCursor(Cursor::Pointer),
                EngineCommand::SetCursor(Cursor::Default)
            ]
        );
        assert_eq!(c.pointer_readout().unwrap().to_string(), "LAT: 34.02 • LON: -6.84");
    }

    #[test]
    fn base_layer_switch_is_forwarded() {
        let (mut c, _) = mounted();
        c.set_base_layer(BaseLayer::Terrain);
        assert_eq!(c.base_layer(), BaseLayer::Terrain);
        assert_eq!(
            c.engine_mut().take(),
            vec![EngineCommand::ShowBaseLayer(BaseLayer::Terrain)]
        );
    }
}
