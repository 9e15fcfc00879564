//! Ordered layer list backing the layer panel.
//!
//! Records are owned by id; `order` holds the ids sorted by
//! [`compare_layer_order`], topmost first. Both always contain the same ids.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::clamp_opacity;
use crate::layer_config::{LayerOverride, LayerOverrides};
use crate::{Extent, LayerBlueprint, ViewerError, ViewerResult};

/// One layer as shown in the layer list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    /// Unique, stable layer id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Stacking order; higher is drawn on top.
    pub z_index: i32,
    /// Visibility.
    pub visible: bool,
    /// Opacity in `[0.1, 1.0]`.
    pub opacity: f64,
    /// Position of the layer in the source document; breaks z-index ties.
    pub index: usize,
    /// Optional layer extent.
    pub extent: Option<Extent>,
}

impl LayerRecord {
    fn apply(&mut self, patch: &LayerOverride) {
        if let Some(z_index) = patch.z_index {
            self.z_index = z_index;
        }
        if let Some(visible) = patch.visible {
            self.visible = visible;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = clamp_opacity(opacity);
        }
    }
}

/// Initial values for a layer entering the model.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSeed {
    /// Layer id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Declared z-index.
    pub z_index: i32,
    /// Declared visibility.
    pub visible: bool,
    /// Declared opacity.
    pub opacity: f64,
    /// Declared extent.
    pub extent: Option<Extent>,
}

impl LayerSeed {
    /// Create a seed with no extent.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        z_index: i32,
        visible: bool,
        opacity: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            z_index,
            visible,
            opacity,
            extent: None,
        }
    }
}

impl From<&LayerBlueprint> for LayerSeed {
    fn from(blueprint: &LayerBlueprint) -> Self {
        Self {
            id: blueprint.id.clone(),
            title: blueprint.title.clone(),
            z_index: blueprint.z_index,
            visible: blueprint.visible,
            opacity: blueprint.opacity,
            extent: blueprint.extent,
        }
    }
}

/// Result of a promote or demote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The layer swapped places with its neighbour.
    Moved {
        /// Position before the move.
        from: usize,
        /// Position after the move.
        to: usize,
    },
    /// The layer is already at that end of the list.
    AtBoundary,
}

/// Sort order of the layer list: descending z-index, then descending
/// declaration index, so among equal z-indexes the later-declared layer is on
/// top.
#[must_use]
pub fn compare_layer_order(a: &LayerRecord, b: &LayerRecord) -> Ordering {
    b.z_index
        .cmp(&a.z_index)
        .then_with(|| b.index.cmp(&a.index))
}

/// The ordered layer list.
#[derive(Debug, Clone, Default)]
pub struct LayerOrderModel {
    records: HashMap<String, LayerRecord>,
    order: Vec<String>,
}

impl LayerOrderModel {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every layer.
    ///
    /// Each seed's `index` is its position in `seeds`; `extra` overrides the
    /// declared values field by field. Later seeds reusing an id are skipped.
    pub fn reload(&mut self, seeds: impl IntoIterator<Item = LayerSeed>, extra: &LayerOverrides) {
        self.records.clear();
        self.order.clear();

        for (index, seed) in seeds.into_iter().enumerate() {
            if self.records.contains_key(&seed.id) {
                tracing::warn!(layer_id = %seed.id, "duplicate layer id ignored");
                continue;
            }
            let mut record = LayerRecord {
                id: seed.id,
                title: seed.title,
                z_index: seed.z_index,
                visible: seed.visible,
                opacity: clamp_opacity(seed.opacity),
                index,
                extent: seed.extent,
            };
            if let Some(patch) = extra.get(&record.id) {
                record.apply(patch);
            }
            self.order.push(record.id.clone());
            self.records.insert(record.id.clone(), record);
        }

        self.sort();
    }

    /// Apply overrides to the existing layers and re-sort.
    ///
    /// Returns whether any layer changed position.
    pub fn update(&mut self, extra: &LayerOverrides) -> bool {
        for (id, patch) in extra {
            if let Some(record) = self.records.get_mut(id) {
                record.apply(patch);
            }
        }

        let before = self.order.clone();
        self.sort();
        before != self.order
    }

    /// Move a layer one step towards the top.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::OutOfRange`] if the id is not in the list.
    pub fn promote(&mut self, id: &str) -> ViewerResult<MoveOutcome> {
        let position = self.require_position(id)?;
        if position == 0 {
            tracing::warn!(layer_id = %id, "can not promote top most layer");
            return Ok(MoveOutcome::AtBoundary);
        }
        self.swap_with(position, position - 1);
        Ok(MoveOutcome::Moved {
            from: position,
            to: position - 1,
        })
    }

    /// Move a layer one step towards the bottom.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::OutOfRange`] if the id is not in the list.
    pub fn demote(&mut self, id: &str) -> ViewerResult<MoveOutcome> {
        let position = self.require_position(id)?;
        if position + 1 == self.order.len() {
            tracing::warn!(layer_id = %id, "can not demote bottom most layer");
            return Ok(MoveOutcome::AtBoundary);
        }
        self.swap_with(position, position + 1);
        Ok(MoveOutcome::Moved {
            from: position,
            to: position + 1,
        })
    }

    // After `reindex` the z-indexes are contiguous, so trading one unit with
    // the adjacent layer swaps exactly those two.
    fn swap_with(&mut self, position: usize, neighbour: usize) {
        self.reindex();
        let moving_up = neighbour < position;
        let (this_id, other_id) = (self.order[position].clone(), self.order[neighbour].clone());
        if let Some(other) = self.records.get_mut(&other_id) {
            other.z_index += if moving_up { -1 } else { 1 };
        }
        if let Some(this) = self.records.get_mut(&this_id) {
            this.z_index += if moving_up { 1 } else { -1 };
        }
        self.sort();
    }

    /// Renumber z-indexes to `count - 1 ..= 0` in list order.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn reindex(&mut self) {
        let count = self.order.len();
        for (position, id) in self.order.iter().enumerate() {
            if let Some(record) = self.records.get_mut(id) {
                record.z_index = (count - 1 - position) as i32;
            }
        }
    }

    /// Flip a layer's visibility; returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::OutOfRange`] if the id is not in the list.
    pub fn toggle_visibility(&mut self, id: &str) -> ViewerResult<bool> {
        let record = self.require_mut(id)?;
        record.visible = !record.visible;
        Ok(record.visible)
    }

    /// Set a layer's opacity; returns the clamped value stored.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::OutOfRange`] if the id is not in the list.
    pub fn set_opacity(&mut self, id: &str, opacity: f64) -> ViewerResult<f64> {
        let record = self.require_mut(id)?;
        record.opacity = clamp_opacity(opacity);
        Ok(record.opacity)
    }

    fn sort(&mut self) {
        let records = &self.records;
        self.order
            .sort_by(|a, b| compare_layer_order(&records[a], &records[b]));
    }

    fn require_position(&self, id: &str) -> ViewerResult<usize> {
        self.position(id).ok_or_else(|| ViewerError::OutOfRange { id: id.to_string() })
    }

    fn require_mut(&mut self, id: &str) -> ViewerResult<&mut LayerRecord> {
        self.records
            .get_mut(id)
            .ok_or_else(|| ViewerError::OutOfRange { id: id.to_string() })
    }

    /// Layers in list order, topmost first.
    pub fn iter(&self) -> impl Iterator<Item = &LayerRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Layer ids in list order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Look up a layer.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LayerRecord> {
        self.records.get(id)
    }

    /// Position of a layer in the list.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|candidate| candidate == id)
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop every layer.
    pub fn clear(&mut self) {
        self.records.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer_config;

    fn two_layers() -> Vec<LayerSeed> {
        vec![
            LayerSeed::new("mapquest", "MapQuest", 0, true, 0.1),
            LayerSeed::new("osm", "OpenStreetMap", 0, true, 0.1),
        ]
    }

    fn z_indexes(model: &LayerOrderModel) -> Vec<(String, i32)> {
        model.iter().map(|r| (r.id.clone(), r.z_index)).collect()
    }

    #[test]
    fn reload_sorts_ties_by_declaration_order() {
        let mut model = LayerOrderModel::new();
        model.reload(two_layers(), &LayerOverrides::new());
        assert_eq!(model.ids(), ["osm", "mapquest"]);
        assert_eq!(model.get("osm").map(|r| r.index), Some(1));
    }

    #[test]
    fn reload_applies_overrides_field_by_field() {
        let mut extra = LayerOverrides::new();
        extra.insert(
            "mapquest".to_string(),
            LayerOverride {
                z_index: Some(5),
                ..LayerOverride::default()
            },
        );
        let mut model = LayerOrderModel::new();
        model.reload(two_layers(), &extra);

        let mapquest = model.get("mapquest").expect("present");
        assert_eq!(mapquest.z_index, 5);
        assert!(mapquest.visible);
        assert!((mapquest.opacity - 0.1).abs() < f64::EPSILON);
        assert_eq!(model.ids(), ["mapquest", "osm"]);
    }

    #[test]
    fn reload_skips_duplicate_ids() {
        let mut seeds = two_layers();
        seeds.push(LayerSeed::new("osm", "Again", 9, false, 1.0));
        let mut model = LayerOrderModel::new();
        model.reload(seeds, &LayerOverrides::new());
        assert_eq!(model.len(), 2);
        assert_eq!(model.get("osm").map(|r| r.title.as_str()), Some("OpenStreetMap"));
    }

    #[test]
    fn reload_clamps_opacity() {
        let extra = layer_config::parse("mapquest___1_1_2.0_-_osm___0_1_-1");
        let mut model = LayerOrderModel::new();
        model.reload(two_layers(), &extra);
        assert!((model.get("mapquest").expect("present").opacity - 1.0).abs() < f64::EPSILON);
        assert!((model.get("osm").expect("present").opacity - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn update_with_empty_overrides_is_a_no_op() {
        let mut model = LayerOrderModel::new();
        model.reload(two_layers(), &LayerOverrides::new());
        let before: Vec<_> = model.iter().cloned().collect();

        assert!(!model.update(&LayerOverrides::new()));
        let after: Vec<_> = model.iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn update_reports_order_changes() {
        let mut model = LayerOrderModel::new();
        model.reload(two_layers(), &LayerOverrides::new());

        let changed = model.update(&layer_config::parse("mapquest___3_1_0.1"));
        assert!(changed);
        assert_eq!(model.ids(), ["mapquest", "osm"]);

        let unchanged = model.update(&layer_config::parse("mapquest___3_0_0.5"));
        assert!(!unchanged);
        assert!(!model.get("mapquest").expect("present").visible);
    }

    #[test]
    fn update_ignores_unknown_ids() {
        let mut model = LayerOrderModel::new();
        model.reload(two_layers(), &LayerOverrides::new());
        assert!(!model.update(&layer_config::parse("ghost___9_0_0.5")));
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn reindex_is_contiguous_and_idempotent() {
        let mut model = LayerOrderModel::new();
        model.reload(
            vec![
                LayerSeed::new("a", "A", 7, true, 1.0),
                LayerSeed::new("b", "B", 7, true, 1.0),
                LayerSeed::new("c", "C", -3, true, 1.0),
            ],
            &LayerOverrides::new(),
        );
        model.reindex();
        let first = z_indexes(&model);
        assert_eq!(
            first,
            [("b".to_string(), 2), ("a".to_string(), 1), ("c".to_string(), 0)]
        );
        model.reindex();
        assert_eq!(z_indexes(&model), first);
    }

    #[test]
    fn demote_first_of_two_flips_order() {
        let mut model = LayerOrderModel::new();
        model.reload(two_layers(), &layer_config::parse("mapquest___1_1_0.1_-_osm___0_1_0.1"));
        assert_eq!(model.ids(), ["mapquest", "osm"]);

        let outcome = model.demote("mapquest").expect("known id");
        assert_eq!(outcome, MoveOutcome::Moved { from: 0, to: 1 });
        assert_eq!(model.ids(), ["osm", "mapquest"]);
        assert_eq!(layer_config::build(model.iter()), "mapquest___0_1_0.1_-_osm___1_1_0.1");
    }

    #[test]
    fn promote_swaps_only_the_neighbour() {
        let mut model = LayerOrderModel::new();
        model.reload(
            vec![
                LayerSeed::new("a", "A", 0, true, 1.0),
                LayerSeed::new("b", "B", 0, true, 1.0),
                LayerSeed::new("c", "C", 0, true, 1.0),
                LayerSeed::new("d", "D", 0, true, 1.0),
            ],
            &LayerOverrides::new(),
        );
        assert_eq!(model.ids(), ["d", "c", "b", "a"]);

        model.promote("b").expect("known id");
        assert_eq!(model.ids(), ["d", "b", "c", "a"]);
    }

    #[test]
    fn boundary_moves_are_no_ops() {
        let mut model = LayerOrderModel::new();
        model.reload(two_layers(), &LayerOverrides::new());
        let before = z_indexes(&model);

        assert_eq!(model.promote("osm").expect("known id"), MoveOutcome::AtBoundary);
        assert_eq!(model.demote("mapquest").expect("known id"), MoveOutcome::AtBoundary);
        assert_eq!(z_indexes(&model), before);
    }

    #[test]
    fn unknown_id_is_out_of_range() {
        let mut model = LayerOrderModel::new();
        model.reload(two_layers(), &LayerOverrides::new());
        assert!(matches!(
            model.promote("ghost"),
            Err(ViewerError::OutOfRange { id }) if id == "ghost"
        ));
        assert!(model.demote("ghost").is_err());
        assert!(model.toggle_visibility("ghost").is_err());
    }

    #[test]
    fn toggle_and_opacity_mutate_in_place() {
        let mut model = LayerOrderModel::new();
        model.reload(two_layers(), &LayerOverrides::new());
        assert!(!model.toggle_visibility("osm").expect("known id"));
        let stored = model.set_opacity("osm", 1.7).expect("known id");
        assert!((stored - 1.0).abs() < f64::EPSILON);
        assert_eq!(model.ids(), ["osm", "mapquest"]);
    }
}
