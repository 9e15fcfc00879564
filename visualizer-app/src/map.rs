//! Map backend over a JavaScript adapter object.
//!
//! The page wraps its mapping library in a small adapter and hands it to
//! [`crate::MapVisualizerApp`]. Layers are opaque JS handles; their state is
//! cached here so reads never cross the boundary.

use visualizer_core::{Extent, LayerBlueprint, MapBackend, MapLayer, ViewerError, ViewerResult};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// Adapter object supplied by the page.
    #[derive(Clone)]
    pub type JsMapAdapter;

    #[wasm_bindgen(method, catch, js_name = setProjection)]
    fn set_projection(this: &JsMapAdapter, projection: Option<String>) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = createLayer)]
    fn create_layer(this: &JsMapAdapter, blueprint: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, js_name = setLayers)]
    fn set_layers(this: &JsMapAdapter, layers: &js_sys::Array);

    #[wasm_bindgen(method, js_name = fitExtent)]
    fn fit_extent(this: &JsMapAdapter, extent: &[f64]) -> Vec<f64>;

    #[wasm_bindgen(method, js_name = getViewExtent)]
    fn view_extent(this: &JsMapAdapter) -> Option<Vec<f64>>;

    #[wasm_bindgen(method, js_name = setLayerZIndex)]
    fn set_layer_z_index(this: &JsMapAdapter, layer: &JsValue, z_index: i32);

    #[wasm_bindgen(method, js_name = setLayerVisible)]
    fn set_layer_visible(this: &JsMapAdapter, layer: &JsValue, visible: bool);

    #[wasm_bindgen(method, js_name = setLayerOpacity)]
    fn set_layer_opacity(this: &JsMapAdapter, layer: &JsValue, opacity: f64);
}

/// Text for a value thrown by JavaScript.
pub(crate) fn js_error_text(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| "unknown error".to_string())
}

/// First four numbers of an adapter result, if there are four.
pub(crate) fn extent_from_js(values: &[f64]) -> Option<Extent> {
    values
        .get(..4)
        .and_then(|slice| <[f64; 4]>::try_from(slice).ok())
        .map(Extent)
}

/// A layer handle created by the adapter.
pub struct JsLayer {
    id: String,
    handle: JsValue,
    adapter: JsMapAdapter,
    z_index: i32,
    visible: bool,
    opacity: f64,
}

impl MapLayer for JsLayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn z_index(&self) -> i32 {
        self.z_index
    }

    fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
        self.adapter.set_layer_z_index(&self.handle, z_index);
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.adapter.set_layer_visible(&self.handle, visible);
    }

    fn opacity(&self) -> f64 {
        self.opacity
    }

    fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity;
        self.adapter.set_layer_opacity(&self.handle, opacity);
    }
}

/// [`MapBackend`] that forwards to a [`JsMapAdapter`].
pub struct JsMap {
    adapter: JsMapAdapter,
    layers: Vec<JsLayer>,
}

impl JsMap {
    /// Wrap an adapter.
    #[must_use]
    pub fn new(adapter: JsMapAdapter) -> Self {
        Self {
            adapter,
            layers: Vec::new(),
        }
    }
}

impl MapBackend for JsMap {
    type Layer = JsLayer;

    fn set_projection(&mut self, projection: Option<&str>) -> ViewerResult<()> {
        self.adapter
            .set_projection(projection.map(str::to_string))
            .map_err(|err| ViewerError::Backend(js_error_text(&err)))
    }

    fn create_layer(&mut self, blueprint: &LayerBlueprint) -> ViewerResult<JsLayer> {
        let json = serde_json::to_string(blueprint)?;
        let handle = self
            .adapter
            .create_layer(&json)
            .map_err(|err| ViewerError::Backend(js_error_text(&err)))?;
        Ok(JsLayer {
            id: blueprint.id.clone(),
            handle,
            adapter: self.adapter.clone(),
            z_index: blueprint.z_index,
            visible: blueprint.visible,
            opacity: blueprint.opacity,
        })
    }

    fn set_layers(&mut self, layers: Vec<JsLayer>) {
        let handles: js_sys::Array = layers.iter().map(|layer| layer.handle.clone()).collect();
        self.adapter.set_layers(&handles);
        self.layers = layers;
    }

    fn layers_mut(&mut self) -> &mut [JsLayer] {
        &mut self.layers
    }

    fn fit_extent(&mut self, extent: &Extent) -> Extent {
        let shown = self.adapter.fit_extent(extent.as_slice());
        extent_from_js(&shown).unwrap_or(*extent)
    }

    fn view_extent(&self) -> Option<Extent> {
        self.adapter
            .view_extent()
            .and_then(|values| extent_from_js(&values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_from_js_needs_four_numbers() {
        assert_eq!(
            extent_from_js(&[1.0, 2.0, 3.0, 4.0, 5.0]),
            Some(Extent::new(1.0, 2.0, 3.0, 4.0))
        );
        assert_eq!(extent_from_js(&[1.0, 2.0, 3.0]), None);
        assert_eq!(extent_from_js(&[]), None);
    }
}
