//! carto-wasm — WebAssembly bindings for carto-core
//!
//! Mounts a [`SelectionCoordinator`] over a JavaScript *map adapter* (a thin
//! wrapper around OpenLayers, Leaflet or any other renderer) and exposes the
//! shell-facing operations to JS.
//!
//! The adapter
//! -----------
//! ```javascript
//! const adapter = {
//!   redraw()                          { vectorLayer.changed(); },
//!   fitExtent(extent, options)        { view.fit(extent, { padding: options.padding_px, duration: options.duration_ms, maxZoom: options.max_zoom }); },
//!   animateTo(x, y, zoom, durationMs) { view.animate({ center: [x, y], zoom, duration: durationMs }); },
//!   setOverlayPosition(position)      { overlay.setPosition(position ?? undefined); },
//!   showBaseLayer(name)               { baseLayers.forEach(l => l.setVisible(l.get('title') === name)); },
//!   setCursor(css)                    { map.getTargetElement().style.cursor = css; },
//! };
//! ```
//! The vector layer's style function asks for each feature's style with
//! `feature_style(id)`, where `id` is the feature's position in the source.
//!
//! Quick start (browser)
//! ---------------------
//! ```javascript
//! import init, { mount, load_geojson, map_click } from 'carto-wasm';
//!
//! await init();
//! mount(adapter, { fit: { max_zoom: 13 } }, {
//!   onSelect: name => highlightListItem(name),
//!   onCollapseList: () => sidebar.classList.add('collapsed'),
//!   onSearch: view => renderSuggestions(view),
//!   onLoad: state => showLoadState(state),
//! });
//! load_geojson('data/provinces.geojson');
//! map.on('singleclick', e => map_click(map.forEachFeatureAtPixel(e.pixel, f => f.get('fid'))));
//! ```
//!
//! Notes
//! -----
//! - One view can be mounted at a time; `unmount()` drops it.
//! - Fetches started by an earlier mount are dropped when they complete.
//! - Hook callbacks run after the coordinator has finished updating, so
//!   they may call back into this module.
use carto_core::geocode::{
    nominatim, GeocodeError, GeocodeRequest, GeocodeResult, QueryOutcome, ResponseOutcome,
};
use carto_core::config::FitOptions;
use carto_core::{
    BaseLayer, CartoError, Coordinate, Cursor, EventQueue, Extent, FeatureId, GeometryLayer,
    LoadState, LoadTicket, MapConfig, MapEngine, ReferenceData, SelectionCoordinator, ShellEvent,
    Style,
};
use gloo_net::http::Request;
use js_sys::Function;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use std::cell::{Cell, RefCell};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"carto-wasm ready".into());
}

/* --------------------------------------------------------------------------
   JS Map Adapter
-------------------------------------------------------------------------- */

#[wasm_bindgen]
extern "C" {
    /// Renderer wrapper supplied by the host page.
    pub type MapAdapter;

    #[wasm_bindgen(method)]
    fn redraw(this: &MapAdapter);

    #[wasm_bindgen(method, js_name = fitExtent)]
    fn fit_extent(this: &MapAdapter, extent: Vec<f64>, options: JsValue);

    #[wasm_bindgen(method, js_name = animateTo)]
    fn animate_to(this: &MapAdapter, x: f64, y: f64, zoom: f64, duration_ms: u32);

    #[wasm_bindgen(method, js_name = setOverlayPosition)]
    fn set_overlay_position(this: &MapAdapter, position: JsValue);

    #[wasm_bindgen(method, js_name = showBaseLayer)]
    fn show_base_layer(this: &MapAdapter, name: &str);

    #[wasm_bindgen(method, js_name = setCursor)]
    fn set_cursor(this: &MapAdapter, css: &str);
}

/// [`MapEngine`] backed by the JS adapter.
///
/// `restyle` only asks the adapter to redraw; the layer pulls each feature's
/// style through [`feature_style`].
struct JsMapEngine {
    adapter: MapAdapter,
}

impl MapEngine for JsMapEngine {
    fn restyle(&mut self, _styles: &[Style]) {
        self.adapter.redraw();
    }

    fn fit_extent(&mut self, extent: Extent, options: &FitOptions) {
        let options = to_value(options).unwrap_or(JsValue::UNDEFINED);
        self.adapter.fit_extent(extent.to_array().to_vec(), options);
    }

    fn animate_to(&mut self, center: Coordinate, zoom: f64, duration_ms: u32) {
        self.adapter.animate_to(center.x, center.y, zoom, duration_ms);
    }

    fn set_overlay_position(&mut self, position: Option<Coordinate>) {
        let position = position
            .and_then(|c| to_value(&[c.x, c.y]).ok())
            .unwrap_or(JsValue::NULL);
        self.adapter.set_overlay_position(position);
    }

    fn show_base_layer(&mut self, layer: BaseLayer) {
        self.adapter.show_base_layer(layer.name());
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.adapter.set_cursor(cursor.css());
    }
}

/* --------------------------------------------------------------------------
   Mounted View
-------------------------------------------------------------------------- */

/// Optional JS callbacks, read from the `hooks` object given to [`mount`].
#[derive(Clone, Default)]
struct JsHooks {
    on_select: Option<Function>,
    on_collapse_list: Option<Function>,
    on_search: Option<Function>,
    on_load: Option<Function>,
}

impl JsHooks {
    fn from_object(hooks: &JsValue) -> Self {
        let get = |key: &str| -> Option<Function> {
            if hooks.is_undefined() || hooks.is_null() {
                return None;
            }
            js_sys::Reflect::get(hooks, &JsValue::from_str(key))
                .ok()
                .and_then(|v| v.dyn_into::<Function>().ok())
        };
        Self {
            on_select: get("onSelect"),
            on_collapse_list: get("onCollapseList"),
            on_search: get("onSearch"),
            on_load: get("onLoad"),
        }
    }
}

struct MountedView {
    /// Distinguishes this mount from earlier ones; async completions carry it.
    epoch: u64,
    map: SelectionCoordinator<JsMapEngine>,
    events: EventQueue,
    reference: ReferenceData,
    hooks: JsHooks,
}

thread_local! {
    static VIEW: RefCell<Option<MountedView>> = const { RefCell::new(None) };
    static NEXT_EPOCH: Cell<u64> = const { Cell::new(1) };
}

fn next_epoch() -> u64 {
    NEXT_EPOCH.with(|n| {
        let epoch = n.get();
        n.set(epoch + 1);
        epoch
    })
}

/// Runs `f` on the mounted view; returns `R::default()` when nothing is
/// mounted (or during teardown).
fn with_view<F, R>(f: F) -> R
where
    F: FnOnce(&mut MountedView) -> R,
    R: Default,
{
    VIEW.try_with(|cell| cell.borrow_mut().as_mut().map(f))
        .ok()
        .flatten()
        .unwrap_or_default()
}

fn call(callback: &Option<Function>, arg: &JsValue) {
    if let Some(f) = callback {
        if let Err(e) = f.call1(&JsValue::NULL, arg) {
            web_sys::console::error_1(&e);
        }
    }
}

/// Like [`with_view`], but only while the view mounted at `epoch` is still
/// the mounted one.
fn with_view_at<F, R>(epoch: u64, f: F) -> R
where
    F: FnOnce(&mut MountedView) -> R,
    R: Default,
{
    with_view(|v| if v.epoch == epoch { f(v) } else { R::default() })
}

/// Delivers queued hook calls once the view is no longer borrowed.
fn flush_events() {
    let (events, hooks) = with_view(|v| (v.events.drain(), v.hooks.clone()));
    for event in events {
        match event {
            ShellEvent::Select(name) => {
                let arg = name.map(JsValue::from).unwrap_or(JsValue::NULL);
                call(&hooks.on_select, &arg);
            }
            ShellEvent::CollapseListOverlay => call(&hooks.on_collapse_list, &JsValue::UNDEFINED),
        }
    }
}

/// Mounts a map view over `adapter`. Replaces any previously mounted view.
///
/// `config` is a (partial) `MapConfig` object; `hooks` may carry
/// `onSelect(name|null)`, `onCollapseList()`, `onSearch(view)` and
/// `onLoad(state)`.
#[wasm_bindgen]
pub fn mount(adapter: MapAdapter, config: JsValue, hooks: JsValue) -> Result<(), JsValue> {
    let config: MapConfig = if config.is_undefined() || config.is_null() {
        MapConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)?
    };
    let base = config.view.base_layer;
    let events = EventQueue::new();
    let mut map = SelectionCoordinator::new(JsMapEngine { adapter }, config)
        .with_hooks(events.clone());
    map.set_base_layer(base);

    let view = MountedView {
        epoch: next_epoch(),
        map,
        events,
        reference: ReferenceData::default(),
        hooks: JsHooks::from_object(&hooks),
    };
    VIEW.with(|cell| *cell.borrow_mut() = Some(view));
    web_sys::console::log_1(&format!("carto: map view mounted ({base})").into());
    Ok(())
}

/// Drops the mounted view and its adapter handle.
#[wasm_bindgen]
pub fn unmount() {
    let was_mounted = VIEW
        .try_with(|cell| cell.borrow_mut().take().is_some())
        .unwrap_or(false);
    if was_mounted {
        web_sys::console::log_1(&"carto: map view unmounted".into());
    }
}

#[wasm_bindgen]
pub fn is_mounted() -> bool {
    VIEW.try_with(|cell| cell.borrow().is_some()).unwrap_or(false)
}

/// Sets the region/download tables (`{ regions, downloads, region_list }`).
#[wasm_bindgen]
pub fn set_reference_data(value: JsValue) -> Result<(), JsValue> {
    let reference: ReferenceData = serde_wasm_bindgen::from_value(value)?;
    with_view(|v| v.reference = reference);
    Ok(())
}

/* --------------------------------------------------------------------------
   Geometry Loading
-------------------------------------------------------------------------- */

async fn fetch_text(url: &str) -> Result<String, String> {
    let resp = Request::get(url).send().await.map_err(|e| e.to_string())?;
    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    resp.text().await.map_err(|e| e.to_string())
}

fn finish_load(epoch: u64, ticket: LoadTicket, result: carto_core::Result<GeometryLayer>) {
    let (state, on_load) = with_view_at(epoch, |v| {
        let applied = v.map.finish_load(ticket, result);
        let state = applied.then(|| v.map.load_state().clone());
        (state, v.hooks.on_load.clone())
    });
    if let Some(state) = state {
        if let LoadState::Failed(message) = &state {
            web_sys::console::error_1(&format!("carto: geometry load failed: {message}").into());
        }
        call(&on_load, &to_value(&state).unwrap_or(JsValue::NULL));
    }
    flush_events();
}

/// Fetches and installs the province GeoJSON at `url`.
///
/// A later call supersedes an earlier one still in flight.
#[wasm_bindgen]
pub fn load_geojson(url: String) {
    let Some((epoch, ticket)) = with_view(|v| Some((v.epoch, v.map.begin_load()))) else {
        return;
    };
    spawn_local(async move {
        let result = match fetch_text(&url).await {
            Ok(text) => GeometryLayer::from_geojson_str(&text),
            Err(e) => Err(CartoError::NotFound(format!("{url}: {e}"))),
        };
        finish_load(epoch, ticket, result);
    });
}

/// Installs GeoJSON text the host already has.
#[wasm_bindgen]
pub fn load_geojson_text(text: &str) {
    let Some((epoch, ticket)) = with_view(|v| Some((v.epoch, v.map.begin_load()))) else {
        return;
    };
    finish_load(epoch, ticket, GeometryLayer::from_geojson_str(text));
}

#[wasm_bindgen]
pub fn load_state() -> JsValue {
    with_view(|v| to_value(v.map.load_state()).ok()).unwrap_or(JsValue::NULL)
}

/* --------------------------------------------------------------------------
   Selection & Pointer
-------------------------------------------------------------------------- */

/// A map click; `feature_id` is the hit-tested feature, or `undefined` for
/// empty space.
#[wasm_bindgen]
pub fn map_click(feature_id: Option<usize>) {
    with_view(|v| v.map.map_click(feature_id.map(FeatureId)));
    flush_events();
}

/// A click on a province in the list.
#[wasm_bindgen]
pub fn select_province(name: &str) {
    with_view(|v| v.map.select_from_list(name));
    flush_events();
}

#[wasm_bindgen]
pub fn dismiss_popup() {
    with_view(|v| v.map.dismiss_popup());
    flush_events();
}

#[wasm_bindgen]
pub fn selected_province() -> Option<String> {
    with_view(|v| v.map.selected_name().map(str::to_owned))
}

/// Pointer moved to map coordinate `(x, y)`; returns the readout text.
#[wasm_bindgen]
pub fn pointer_moved(x: f64, y: f64, feature_id: Option<usize>) -> String {
    with_view(|v| {
        v.map
            .pointer_moved(Coordinate::new(x, y), feature_id.map(FeatureId))
            .to_string()
    })
}

#[wasm_bindgen]
pub fn pointer_readout() -> Option<String> {
    with_view(|v| v.map.pointer_readout().map(|p| p.to_string()))
}

#[wasm_bindgen]
pub fn set_base_layer(name: &str) -> Result<(), JsValue> {
    let layer: BaseLayer = name.parse().map_err(|e: String| JsValue::from_str(&e))?;
    with_view(|v| v.map.set_base_layer(layer));
    Ok(())
}

#[wasm_bindgen]
pub fn set_viewport_width(width_px: f64) {
    with_view(|v| v.map.set_viewport_width(width_px));
}

#[wasm_bindgen]
pub fn set_map_size(width_px: f64, height_px: f64) {
    with_view(|v| v.map.set_map_size(width_px, height_px));
}

/* --------------------------------------------------------------------------
   Views (JSON-serializable)
-------------------------------------------------------------------------- */

/// Style in the shape canvas renderers consume.
#[derive(Serialize)]
struct StyleView {
    stroke_color: String,
    stroke_width: f32,
    fill_color: String,
    label: String,
    label_font: String,
    label_color: String,
    halo_color: String,
    halo_width: f32,
    highlighted: bool,
}

impl From<&Style> for StyleView {
    fn from(s: &Style) -> Self {
        Self {
            stroke_color: s.stroke.color.to_css(),
            stroke_width: s.stroke.width,
            fill_color: s.fill.to_css(),
            label: s.label.text.clone(),
            label_font: s.label.font.css(),
            label_color: s.label.fill.to_css(),
            halo_color: s.label.halo.color.to_css(),
            halo_width: s.label.halo.width,
            highlighted: s.is_highlighted(),
        }
    }
}

/// Style of feature `id` under the current selection.
#[wasm_bindgen]
pub fn feature_style(id: usize) -> JsValue {
    with_view(|v| v.map.style_of(FeatureId(id)))
        .and_then(|s| to_value(&StyleView::from(&s)).ok())
        .unwrap_or(JsValue::NULL)
}

#[wasm_bindgen]
pub fn popup_view() -> JsValue {
    with_view(|v| v.map.popup_view(&v.reference))
        .and_then(|p| to_value(&p).ok())
        .unwrap_or(JsValue::NULL)
}

/// Sidebar rows matching `filter` (and `region`, when given).
#[wasm_bindgen]
pub fn province_list(filter: &str, region: Option<String>) -> JsValue {
    with_view(|v| {
        let catalog = v.map.catalog(&v.reference);
        let rows: Vec<_> = catalog.filter(filter, region.as_deref());
        to_value(&rows).ok()
    })
    .unwrap_or(JsValue::NULL)
}

#[wasm_bindgen]
pub fn region_list() -> JsValue {
    with_view(|v| to_value(&v.reference.regions()).ok()).unwrap_or(JsValue::NULL)
}

/* --------------------------------------------------------------------------
   Geocode Search
-------------------------------------------------------------------------- */

fn request_url(endpoint: &str, request: &GeocodeRequest) -> String {
    let query: Vec<String> = nominatim::query_pairs(request)
        .into_iter()
        .map(|(k, v)| format!("{k}={}", String::from(js_sys::encode_uri_component(&v))))
        .collect();
    format!("{endpoint}?{}", query.join("&"))
}

async fn fetch_places(url: &str) -> GeocodeResult {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| GeocodeError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(GeocodeError::Status(resp.status()));
    }
    let body = resp
        .text()
        .await
        .map_err(|e| GeocodeError::Transport(e.to_string()))?;
    nominatim::parse_response(&body)
}

fn notify_search() {
    let (view, on_search) =
        with_view(|v| (to_value(&v.map.search().view()).ok(), v.hooks.on_search.clone()));
    if let Some(view) = view {
        call(&on_search, &view);
    }
}

/// Applies a geocode result to the view mounted at `epoch`.
fn finish_search(epoch: u64, generation: u64, result: GeocodeResult) {
    let error = result.as_ref().err().map(ToString::to_string);
    let outcome = with_view_at(epoch, |v| Some(v.map.apply_geocode(generation, result)));
    match outcome {
        Some(ResponseOutcome::Failed) => {
            let error = error.unwrap_or_default();
            web_sys::console::warn_1(&format!("carto: geocode lookup failed: {error}").into());
        }
        Some(_) => {}
        None => return,
    }
    notify_search();
}

fn dispatch(request: Option<GeocodeRequest>) {
    notify_search();
    let Some(request) = request else {
        return;
    };
    let Some((epoch, endpoint)) =
        with_view(|v| Some((v.epoch, v.map.config().search.endpoint.clone())))
    else {
        return;
    };
    if endpoint.is_empty() {
        return;
    }
    let url = request_url(&endpoint, &request);
    spawn_local(async move {
        let result = fetch_places(&url).await;
        finish_search(epoch, request.generation, result);
    });
}

/// A keystroke in the search box at host time `now_ms`.
///
/// With a debounce window configured, keep calling [`search_poll`] until the
/// request is released.
#[wasm_bindgen]
pub fn search_input(text: &str, now_ms: f64) {
    let outcome = with_view(|v| Some(v.map.submit_query_at(text, now_ms.max(0.0) as u64)));
    dispatch(outcome.and_then(QueryOutcome::into_request));
}

#[wasm_bindgen]
pub fn search_poll(now_ms: f64) {
    if let Some(request) = with_view(|v| v.map.poll_search(now_ms.max(0.0) as u64)) {
        dispatch(Some(request));
    }
}

/// Flies to suggestion `index`; returns `false` when there is none.
#[wasm_bindgen]
pub fn search_select(index: usize) -> bool {
    let flew = with_view(|v| v.map.select_suggestion(index).is_some());
    notify_search();
    flew
}

#[wasm_bindgen]
pub fn search_expand() {
    with_view(|v| v.map.search_mut().expand());
    notify_search();
}

#[wasm_bindgen]
pub fn search_collapse() {
    with_view(|v| v.map.search_mut().collapse());
    notify_search();
}

#[wasm_bindgen]
pub fn search_blur() {
    with_view(|v| v.map.search_mut().blur());
    notify_search();
}

#[wasm_bindgen]
pub fn search_view() -> JsValue {
    with_view(|v| to_value(&v.map.search().view()).ok()).unwrap_or(JsValue::NULL)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use js_sys::{Object, Reflect};
    use wasm_bindgen_test::*;

    const ONE: &str = r#"{"type":"FeatureCollection","features":[
      {"type":"Feature","properties":{"NOM_PROV":"Tiznit"},"geometry":{"type":"Polygon","coordinates":[[[-9.9,29.5],[-9.5,29.5],[-9.5,29.9],[-9.9,29.5]]]}}
    ]}"#;

    fn inert_adapter() -> MapAdapter {
        let adapter = Object::new();
        for method in [
            "redraw",
            "fitExtent",
            "animateTo",
            "setOverlayPosition",
            "showBaseLayer",
            "setCursor",
        ] {
            Reflect::set(&adapter, &method.into(), &Function::new_no_args("")).unwrap();
        }
        adapter.unchecked_into()
    }

    fn remount() -> u64 {
        mount(inert_adapter(), JsValue::UNDEFINED, JsValue::UNDEFINED).unwrap();
        with_view(|v| v.epoch)
    }

    #[wasm_bindgen_test]
    fn load_from_an_earlier_mount_is_dropped() {
        let old = remount();
        let old_ticket = with_view(|v| Some(v.map.begin_load())).unwrap();
        let new = remount();
        assert_ne!(old, new);
        let new_ticket = with_view(|v| Some(v.map.begin_load())).unwrap();
        assert_eq!(old_ticket, new_ticket);

        finish_load(old, old_ticket, GeometryLayer::from_geojson_str(ONE));
        assert_eq!(with_view(|v| v.map.layer().len()), 0);
        assert!(with_view(|v| matches!(v.map.load_state(), LoadState::Loading)));

        finish_load(new, new_ticket, GeometryLayer::from_geojson_str(ONE));
        assert_eq!(with_view(|v| v.map.layer().len()), 1);
        unmount();
    }

    #[wasm_bindgen_test]
    fn geocode_from_an_earlier_mount_is_dropped() {
        let old = remount();
        let old_request = with_view(|v| v.map.submit_query("Tiznit").into_request()).unwrap();
        let new = remount();
        let new_request = with_view(|v| v.map.submit_query("Tiznit").into_request()).unwrap();
        assert_eq!(old_request.generation, new_request.generation);

        let hit = carto_core::GeocodeHit {
            display_name: "Tiznit, Maroc".into(),
            lon: -9.73,
            lat: 29.7,
        };
        finish_search(old, old_request.generation, Ok(vec![hit.clone()]));
        assert!(with_view(|v| v.map.search().suggestions().is_empty()));

        finish_search(new, new_request.generation, Ok(vec![hit]));
        assert_eq!(with_view(|v| v.map.search().suggestions().len()), 1);
        unmount();
    }

    #[wasm_bindgen_test]
    fn failed_geocode_keeps_the_session() {
        let epoch = remount();
        let request = with_view(|v| v.map.submit_query("Guelmim").into_request()).unwrap();
        finish_search(epoch, request.generation, Err(GeocodeError::Status(503)));
        assert_eq!(with_view(|v| v.map.search().in_flight()), None);
        assert_eq!(with_view(|v| v.map.search().query().to_owned()), "Guelmim");
        unmount();
    }
}
