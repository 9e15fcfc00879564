//! WebAssembly bindings for visualizer-core.
//!
//! Exposes the hash codecs and the layer ordering model to JavaScript so
//! existing pages can share the exact encoding.

use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;

use crate::hash::{self, HashValue};
use crate::model::{LayerOrderModel, LayerSeed};
use crate::{extent, layer_config, MoveOutcome};

/// Initialize the visualizer WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Parse a URL hash into a JSON object; flags map to `true`.
#[wasm_bindgen(js_name = parseHash)]
#[must_use]
pub fn parse_hash(hash: &str) -> String {
    let object: Map<String, Value> = hash::parse(hash)
        .iter()
        .map(|(key, value)| {
            let value = match value {
                HashValue::Value(v) => Value::from(v.as_str()),
                HashValue::Flag => Value::Bool(true),
            };
            (key.to_string(), value)
        })
        .collect();
    Value::Object(object).to_string()
}

/// Parse a layer config string into a JSON object keyed by layer id.
#[wasm_bindgen(js_name = parseLayerConfig)]
#[must_use]
pub fn parse_layer_config(config: &str) -> String {
    serde_json::to_string(&layer_config::parse(config)).unwrap_or_default()
}

/// Parse an extent string.
#[wasm_bindgen(js_name = parseExtent)]
#[must_use]
pub fn parse_extent(extent: &str) -> Option<Vec<f64>> {
    extent::parse(extent).map(|e| e.0.to_vec())
}

/// Build an extent string.
#[wasm_bindgen(js_name = buildExtent)]
#[must_use]
pub fn build_extent(values: &[f64]) -> String {
    extent::build(values)
}

/// Compare the first four components of two extents.
#[wasm_bindgen(js_name = isIdenticalExtent)]
#[must_use]
pub fn is_identical_extent(a: &[f64], b: &[f64]) -> bool {
    extent::is_identical(a, b)
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsLayer {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    z_index: i32,
    #[serde(default = "JsLayer::visible")]
    visible: bool,
    #[serde(default = "JsLayer::opacity")]
    opacity: f64,
}

impl JsLayer {
    const fn visible() -> bool {
        true
    }

    const fn opacity() -> f64 {
        1.0
    }
}

/// Layer ordering model for WASM.
#[wasm_bindgen]
pub struct WasmLayerList {
    model: LayerOrderModel,
}

#[wasm_bindgen]
impl WasmLayerList {
    /// Create an empty list.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: LayerOrderModel::new(),
        }
    }

    /// Load layers from a JSON array, applying a layer config string.
    ///
    /// # Errors
    ///
    /// Returns an error string if the JSON is malformed.
    pub fn reload(&mut self, layers_json: &str, config: &str) -> Result<(), String> {
        let layers: Vec<JsLayer> = serde_json::from_str(layers_json).map_err(|e| e.to_string())?;
        let seeds = layers
            .into_iter()
            .map(|l| LayerSeed::new(l.id, l.title, l.z_index, l.visible, l.opacity));
        self.model.reload(seeds, &layer_config::parse(config));
        Ok(())
    }

    /// Apply a layer config string; returns whether the order changed.
    #[must_use]
    pub fn update(&mut self, config: &str) -> bool {
        self.model.update(&layer_config::parse(config))
    }

    /// Move a layer up; returns whether it moved.
    ///
    /// # Errors
    ///
    /// Returns an error string for an unknown id.
    pub fn promote(&mut self, id: &str) -> Result<bool, String> {
        self.model
            .promote(id)
            .map(|outcome| outcome != MoveOutcome::AtBoundary)
            .map_err(|e| e.to_string())
    }

    /// Move a layer down; returns whether it moved.
    ///
    /// # Errors
    ///
    /// Returns an error string for an unknown id.
    pub fn demote(&mut self, id: &str) -> Result<bool, String> {
        self.model
            .demote(id)
            .map(|outcome| outcome != MoveOutcome::AtBoundary)
            .map_err(|e| e.to_string())
    }

    /// Layer ids, topmost first.
    #[wasm_bindgen(js_name = getIds)]
    #[must_use]
    pub fn get_ids(&self) -> Vec<String> {
        self.model.ids().to_vec()
    }

    /// Current layer config string.
    #[wasm_bindgen(js_name = getConfigString)]
    #[must_use]
    pub fn get_config_string(&self) -> String {
        layer_config::build(self.model.iter())
    }
}

impl Default for WasmLayerList {
    fn default() -> Self {
        Self::new()
    }
}
