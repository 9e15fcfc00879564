//! # Map Visualizer App
//!
//! Browser front-end for the map visualizer, compiled to WASM.
//!
//! The page supplies a map adapter object plus the ids of the layer panel
//! and overlay elements, then forwards `hashchange`, panel clicks and map
//! move events to the exported [`MapVisualizerApp`] methods:
//!
//! ```js
//! const app = new MapVisualizerApp(adapter, "layer-list", "overlay");
//! window.addEventListener("hashchange", () => app.startWithHash(location.hash));
//! map.on("movestart", () => app.interactionStart());
//! map.on("moveend", () => {
//!     const deadline = app.interactionEnd(performance.now());
//!     if (deadline !== undefined) {
//!         setTimeout(() => app.flushExtent(performance.now()), deadline - performance.now());
//!     }
//! });
//! app.start();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod browser;
pub mod map;
pub mod view;

use std::cell::RefCell;
use std::rc::Rc;

use visualizer_core::{Cycle, Gesture, SourceLoader, SyncController, ViewerConfig, ViewerError};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

pub use browser::{FetchLoader, LocationHashStore};
pub use map::{JsLayer, JsMap, JsMapAdapter};
pub use view::{DomLayerList, DomOverlay};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init_wasm() {
    console_error_panic_hook::set_once();
    tracing::info!("Map Visualizer WASM initialized");
}

type Controller = SyncController<JsMap, DomLayerList, DomOverlay, LocationHashStore>;

/// Milliseconds from a JS timestamp; negative and NaN clamp to zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_millis(now_ms: f64) -> u64 {
    if now_ms.is_nan() {
        return 0;
    }
    now_ms.max(0.0) as u64
}

#[allow(clippy::cast_precision_loss)]
fn from_millis(ms: u64) -> f64 {
    ms as f64
}

fn to_js_error(err: &ViewerError) -> JsValue {
    if matches!(err, ViewerError::OutOfRange { .. }) {
        tracing::error!(error = %err, "layer list out of sync");
    }
    JsValue::from_str(&err.to_string())
}

/// The viewer bound to a page.
#[wasm_bindgen]
pub struct MapVisualizerApp {
    controller: Rc<RefCell<Controller>>,
    loader: Rc<FetchLoader>,
    window: web_sys::Window,
}

#[wasm_bindgen]
impl MapVisualizerApp {
    /// Bind to the page.
    ///
    /// `config_json` is an optional JSON `ViewerConfig`; missing fields take
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an element is missing or the config is malformed.
    #[wasm_bindgen(constructor)]
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(
        adapter: JsMapAdapter,
        panel_id: &str,
        overlay_id: &str,
        config_json: Option<String>,
    ) -> Result<MapVisualizerApp, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document object"))?;
        let panel = document
            .get_element_by_id(panel_id)
            .ok_or_else(|| JsValue::from_str(&format!("Layer panel '{panel_id}' not found")))?;
        let overlay = document
            .get_element_by_id(overlay_id)
            .ok_or_else(|| JsValue::from_str(&format!("Overlay '{overlay_id}' not found")))?;

        let config = match config_json {
            Some(json) => ViewerConfig::from_json(&json)
                .map_err(|e| JsValue::from_str(&format!("Invalid viewer config: {e}")))?,
            None => ViewerConfig::default(),
        };

        let view = DomLayerList::new(document.clone(), panel, config.opacity_step_percent)?;
        let controller = SyncController::new(
            config,
            JsMap::new(adapter),
            view,
            DomOverlay::new(document, overlay),
            LocationHashStore::new(&window),
        );

        tracing::info!(panel_id, overlay_id, "map visualizer bound to page");
        Ok(Self {
            controller: Rc::new(RefCell::new(controller)),
            loader: Rc::new(FetchLoader::new(window.clone())),
            window,
        })
    }

    /// Run a cycle for the hash currently in the address bar.
    #[must_use]
    pub fn start(&self) -> js_sys::Promise {
        let cycle = self.controller.borrow_mut().begin_current();
        self.run(cycle)
    }

    /// Run a cycle for `hash`, typically from a `hashchange` event.
    ///
    /// The promise resolves once any download has been applied and rejects
    /// with the message shown on the overlay when loading fails.
    #[wasm_bindgen(js_name = startWithHash)]
    #[must_use]
    pub fn start_with_hash(&self, hash: &str) -> js_sys::Promise {
        let cycle = self.controller.borrow_mut().begin(hash);
        self.run(cycle)
    }

    /// Move a layer up one step.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown layer id.
    #[wasm_bindgen(js_name = promoteLayer)]
    pub fn promote_layer(&self, id: &str) -> Result<(), JsValue> {
        self.gesture(Gesture::Promote { id: id.to_string() })
    }

    /// Move a layer down one step.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown layer id.
    #[wasm_bindgen(js_name = demoteLayer)]
    pub fn demote_layer(&self, id: &str) -> Result<(), JsValue> {
        self.gesture(Gesture::Demote { id: id.to_string() })
    }

    /// Show or hide a layer.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown layer id.
    #[wasm_bindgen(js_name = toggleLayerVisibility)]
    pub fn toggle_layer_visibility(&self, id: &str) -> Result<(), JsValue> {
        self.gesture(Gesture::ToggleVisibility { id: id.to_string() })
    }

    /// Apply a slider value in percent.
    ///
    /// Pass `suppress_feedback` when the value comes from the model rather
    /// than the user, so the hash is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown layer id.
    #[wasm_bindgen(js_name = changeLayerOpacity)]
    pub fn change_layer_opacity(
        &self,
        id: &str,
        percent: u32,
        suppress_feedback: bool,
    ) -> Result<(), JsValue> {
        self.gesture(Gesture::SetOpacity {
            id: id.to_string(),
            percent,
            suppress_feedback,
        })
    }

    /// Expand or collapse a row's opacity slider.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown layer id.
    #[wasm_bindgen(js_name = toggleOpacityControl)]
    pub fn toggle_opacity_control(&self, id: &str) -> Result<(), JsValue> {
        self.gesture(Gesture::ToggleOpacityControl { id: id.to_string() })
    }

    /// Expand or collapse the layer panel.
    ///
    /// # Errors
    ///
    /// Never fails in practice; kept fallible like the other gestures.
    #[wasm_bindgen(js_name = togglePanel)]
    pub fn toggle_panel(&self) -> Result<(), JsValue> {
        self.gesture(Gesture::TogglePanel)
    }

    /// The map started moving.
    #[wasm_bindgen(js_name = interactionStart)]
    pub fn interaction_start(&self) {
        self.controller.borrow_mut().interaction_start();
    }

    /// The map stopped moving; returns the time at which to call
    /// `flushExtent`, if an extent write was scheduled.
    #[wasm_bindgen(js_name = interactionEnd)]
    #[must_use]
    pub fn interaction_end(&self, now_ms: f64) -> Option<f64> {
        self.controller
            .borrow_mut()
            .interaction_end(to_millis(now_ms))
            .map(from_millis)
    }

    /// Write the settled extent to the hash if it is due.
    #[wasm_bindgen(js_name = flushExtent)]
    pub fn flush_extent(&self, now_ms: f64) -> bool {
        self.controller.borrow_mut().flush_extent(to_millis(now_ms))
    }

    /// Whether a cycle is in progress.
    #[wasm_bindgen(js_name = isBusy)]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.controller.borrow().is_busy()
    }

    /// URL of the loaded source document.
    #[wasm_bindgen(js_name = loadedSourceUrl)]
    #[must_use]
    pub fn loaded_source_url(&self) -> Option<String> {
        self.controller
            .borrow()
            .loaded_source_url()
            .map(str::to_string)
    }

    /// Current rows as JSON, topmost first.
    #[wasm_bindgen(js_name = getLayerRows)]
    #[must_use]
    pub fn get_layer_rows(&self) -> String {
        serde_json::to_string(&self.controller.borrow().presenter().rows()).unwrap_or_default()
    }

    /// Current layer config string.
    #[wasm_bindgen(js_name = getConfigString)]
    #[must_use]
    pub fn get_config_string(&self) -> String {
        self.controller.borrow().presenter().config_string()
    }
}

impl MapVisualizerApp {
    fn gesture(&self, gesture: Gesture) -> Result<(), JsValue> {
        self.controller
            .borrow_mut()
            .gesture(gesture)
            .map_err(|e| to_js_error(&e))
    }

    /// Finish a started cycle. The controller is not borrowed across the
    /// download, so gestures and new hash events stay serviceable.
    fn run(&self, cycle: Cycle) -> js_sys::Promise {
        let controller = Rc::clone(&self.controller);
        let loader = Rc::clone(&self.loader);
        let window = self.window.clone();
        future_to_promise(async move {
            match cycle {
                Cycle::Updated | Cycle::Idle => {}
                Cycle::ForcedReload => {
                    window.location().reload()?;
                }
                Cycle::Download(ticket) => {
                    let body = loader.load(ticket.source_url()).await;
                    controller
                        .borrow_mut()
                        .finish_load(ticket, body)
                        .map_err(|e| to_js_error(&e))?;
                }
            }
            Ok(JsValue::UNDEFINED)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_clamp_bad_timestamps() {
        assert_eq!(to_millis(1234.9), 1234);
        assert_eq!(to_millis(-5.0), 0);
        assert_eq!(to_millis(f64::NAN), 0);
        assert!((from_millis(200) - 200.0).abs() < f64::EPSILON);
    }
}
