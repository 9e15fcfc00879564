//! In-memory map backend for native drivers and tests.
//!
//! Layers are plain structs; fitting grows the requested extent to the
//! viewport's aspect ratio around the same centre, the way an interactive
//! map would size its view.

use serde::Serialize;

use crate::registry::LayerKind;
use crate::{Extent, LayerBlueprint, ViewerResult};

use super::{MapBackend, MapLayer};

/// A layer held by [`HeadlessMap`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlessLayer {
    id: String,
    z_index: i32,
    visible: bool,
    opacity: f64,
    kind: Option<LayerKind>,
    source_type: Option<String>,
}

impl HeadlessLayer {
    /// Create a layer without a source.
    #[must_use]
    pub fn new(id: impl Into<String>, z_index: i32, visible: bool, opacity: f64) -> Self {
        Self {
            id: id.into(),
            z_index,
            visible,
            opacity,
            kind: None,
            source_type: None,
        }
    }

    /// Layer class, if built from a blueprint.
    #[must_use]
    pub const fn kind(&self) -> Option<LayerKind> {
        self.kind
    }

    /// Source type, if built from a blueprint.
    #[must_use]
    pub fn source_type(&self) -> Option<&str> {
        self.source_type.as_deref()
    }
}

impl MapLayer for HeadlessLayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn z_index(&self) -> i32 {
        self.z_index
    }

    fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn opacity(&self) -> f64 {
        self.opacity
    }

    fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity;
    }
}

/// Headless map backend.
#[derive(Debug, Clone)]
pub struct HeadlessMap {
    width: f64,
    height: f64,
    projection: Option<String>,
    layers: Vec<HeadlessLayer>,
    view: Option<Extent>,
    fit_count: usize,
}

impl HeadlessMap {
    /// Create a backend with the given viewport size in pixels.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            projection: None,
            layers: Vec::new(),
            view: None,
            fit_count: 0,
        }
    }

    /// Projection last set; `None` is the default projection.
    #[must_use]
    pub fn projection(&self) -> Option<&str> {
        self.projection.as_deref()
    }

    /// Layers on the map.
    #[must_use]
    pub fn layers(&self) -> &[HeadlessLayer] {
        &self.layers
    }

    /// Find a layer by id.
    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&HeadlessLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Move the view without fitting, as a pan or zoom would.
    pub fn set_view(&mut self, extent: Extent) {
        self.view = Some(extent);
    }

    /// How many times the view was fitted.
    #[must_use]
    pub const fn fit_count(&self) -> usize {
        self.fit_count
    }
}

impl Default for HeadlessMap {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl MapBackend for HeadlessMap {
    type Layer = HeadlessLayer;

    fn set_projection(&mut self, projection: Option<&str>) -> ViewerResult<()> {
        self.projection = projection.map(str::to_string);
        self.view = None;
        Ok(())
    }

    fn create_layer(&mut self, blueprint: &LayerBlueprint) -> ViewerResult<HeadlessLayer> {
        tracing::trace!(
            layer_id = %blueprint.id,
            source_type = %blueprint.source.source_type,
            "create layer"
        );
        Ok(HeadlessLayer {
            id: blueprint.id.clone(),
            z_index: blueprint.z_index,
            visible: blueprint.visible,
            opacity: blueprint.opacity,
            kind: Some(blueprint.kind),
            source_type: Some(blueprint.source.source_type.clone()),
        })
    }

    fn set_layers(&mut self, layers: Vec<HeadlessLayer>) {
        self.layers = layers;
    }

    fn layers_mut(&mut self) -> &mut [HeadlessLayer] {
        &mut self.layers
    }

    fn fit_extent(&mut self, extent: &Extent) -> Extent {
        self.fit_count += 1;
        let fitted = if self.width > 0.0 && self.height > 0.0 {
            let resolution = (extent.width() / self.width).max(extent.height() / self.height);
            let (cx, cy) = extent.center();
            let (half_w, half_h) = (resolution * self.width / 2.0, resolution * self.height / 2.0);
            Extent::new(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
        } else {
            *extent
        };
        self.view = Some(fitted);
        fitted
    }

    fn view_extent(&self) -> Option<Extent> {
        self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Extent, b: Extent) {
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert!((x - y).abs() < 1e-9, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn fit_grows_to_viewport_aspect() {
        let mut map = HeadlessMap::new(800.0, 600.0);
        let fitted = map.fit_extent(&Extent::new(-100.0, 15.0, -40.0, 50.0));
        // 60 x 35 at 4:3 becomes 60 x 45 around (-70, 32.5)
        assert_close(fitted, Extent::new(-100.0, 10.0, -40.0, 55.0));
        assert_eq!(map.view_extent(), Some(fitted));
        assert_eq!(map.fit_count(), 1);
    }

    #[test]
    fn fit_of_a_matching_aspect_is_unchanged() {
        let mut map = HeadlessMap::new(400.0, 200.0);
        let extent = Extent::new(-180.0, -90.0, 180.0, 90.0);
        assert_close(map.fit_extent(&extent), extent);
    }

    #[test]
    fn zero_sized_viewport_keeps_extent() {
        let mut map = HeadlessMap::new(0.0, 0.0);
        let extent = Extent::new(0.0, 0.0, 1.0, 3.0);
        assert_eq!(map.fit_extent(&extent), extent);
    }

    #[test]
    fn projection_change_resets_view() {
        let mut map = HeadlessMap::default();
        map.set_view(Extent::new(0.0, 0.0, 4.0, 3.0));
        map.set_projection(Some("EPSG:3857")).expect("headless accepts any projection");
        assert_eq!(map.projection(), Some("EPSG:3857"));
        assert_eq!(map.view_extent(), None);
    }
}
