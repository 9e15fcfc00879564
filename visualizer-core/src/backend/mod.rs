//! Map backend implementations.
//!
//! The viewer never draws tiles itself. It hands validated layer blueprints
//! to a [`MapBackend`] and adjusts the layers it gets back.

pub mod headless;

use crate::model::LayerRecord;
use crate::{Extent, LayerBlueprint, ViewerResult};

/// A layer object owned by a map backend.
pub trait MapLayer {
    /// The id tag set at creation.
    fn id(&self) -> &str;

    /// Current stacking order.
    fn z_index(&self) -> i32;

    /// Set the stacking order.
    fn set_z_index(&mut self, z_index: i32);

    /// Current visibility.
    fn visible(&self) -> bool;

    /// Show or hide the layer.
    fn set_visible(&mut self, visible: bool);

    /// Current opacity.
    fn opacity(&self) -> f64;

    /// Set the opacity.
    fn set_opacity(&mut self, opacity: f64);
}

/// Trait for map backends.
pub trait MapBackend {
    /// Layer type created by this backend.
    type Layer: MapLayer;

    /// Swap the view to a new projection; `None` means the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the projection is unknown to the backend.
    fn set_projection(&mut self, projection: Option<&str>) -> ViewerResult<()>;

    /// Build a layer from a validated blueprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot construct the source.
    fn create_layer(&mut self, blueprint: &LayerBlueprint) -> ViewerResult<Self::Layer>;

    /// Replace every layer on the map.
    fn set_layers(&mut self, layers: Vec<Self::Layer>);

    /// The layers currently on the map.
    fn layers_mut(&mut self) -> &mut [Self::Layer];

    /// Fit the view to an extent; returns the extent actually shown, which
    /// is adjusted to the viewport size.
    fn fit_extent(&mut self, extent: &Extent) -> Extent;

    /// The extent currently shown, if the view has a size.
    fn view_extent(&self) -> Option<Extent>;
}

/// Copy list state onto map layers with the same id.
pub fn apply_records<'a, L: MapLayer>(
    layers: &mut [L],
    records: impl IntoIterator<Item = &'a LayerRecord>,
) {
    for record in records {
        if let Some(layer) = layers.iter_mut().find(|l| l.id() == record.id) {
            layer.set_z_index(record.z_index);
            layer.set_visible(record.visible);
            layer.set_opacity(record.opacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::headless::HeadlessLayer;
    use super::*;

    fn layers() -> Vec<HeadlessLayer> {
        vec![
            HeadlessLayer::new("mapquest", 0, true, 0.1),
            HeadlessLayer::new("osm", 0, true, 0.1),
        ]
    }

    #[test]
    fn records_are_copied_by_id() {
        let mut layers = layers();
        let record = LayerRecord {
            id: "mapquest".to_string(),
            title: "MapQuest".to_string(),
            z_index: 3,
            visible: false,
            opacity: 0.7,
            index: 0,
            extent: None,
        };
        apply_records(&mut layers, [&record]);
        assert_eq!(layers[0].z_index(), 3);
        assert!(!layers[0].visible());
        assert_eq!(layers[1].z_index(), 0);
    }
}
