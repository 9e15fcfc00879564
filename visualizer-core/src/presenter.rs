//! Layer list panel.
//!
//! The presenter owns the [`LayerOrderModel`] and drives a [`LayerListView`].
//! Row gestures mutate the model and, unless suppressed, write the new layer
//! config to the hash.

use serde::Serialize;

use crate::config::fields;
use crate::hash::{self, HashStore};
use crate::layer_config::{self, LayerOverrides};
use crate::model::{LayerOrderModel, LayerRecord, LayerSeed, MoveOutcome};
use crate::{ViewerError, ViewerResult};

/// Lowest opacity slider value, in percent.
pub const SLIDER_MIN: u32 = 10;
/// Highest opacity slider value, in percent.
pub const SLIDER_MAX: u32 = 100;

/// Slider position for an opacity.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn slider_percent(opacity: f64) -> u32 {
    if opacity.is_nan() {
        return SLIDER_MAX;
    }
    let percent = (opacity * 100.0).floor().clamp(0.0, f64::from(SLIDER_MAX)) as u32;
    percent.clamp(SLIDER_MIN, SLIDER_MAX)
}

/// Opacity for a slider position.
#[must_use]
pub fn slider_opacity(percent: u32) -> f64 {
    f64::from(percent.clamp(SLIDER_MIN, SLIDER_MAX)) / 100.0
}

/// Text shown next to the slider.
#[must_use]
pub fn opacity_label(percent: u32) -> String {
    format!("{percent}%")
}

/// Everything a view needs to draw one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerRow {
    /// Layer id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Visibility.
    pub visible: bool,
    /// Opacity.
    pub opacity: f64,
    /// Slider position in percent.
    pub slider_percent: u32,
    /// Whether the promote button is enabled.
    pub can_promote: bool,
    /// Whether the demote button is enabled.
    pub can_demote: bool,
}

impl LayerRow {
    fn new(record: &LayerRecord, position: usize, count: usize) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            visible: record.visible,
            opacity: record.opacity,
            slider_percent: slider_percent(record.opacity),
            can_promote: position > 0,
            can_demote: position + 1 < count,
        }
    }

    /// Slider label, e.g. `55%`.
    #[must_use]
    pub fn opacity_label(&self) -> String {
        opacity_label(self.slider_percent)
    }
}

/// The rendered list.
pub trait LayerListView {
    /// Throw away every row and draw `rows` in order.
    fn rebuild(&mut self, rows: &[LayerRow]);

    /// Move existing rows into this order without recreating them.
    fn reorder(&mut self, ids: &[String]);

    /// Update one row's visibility, opacity and button state in place.
    fn refresh_row(&mut self, row: &LayerRow);

    /// Expand or collapse a row's opacity control.
    fn toggle_opacity_control(&mut self, id: &str);

    /// Expand or collapse the whole panel.
    fn toggle_panel(&mut self);
}

/// A user gesture on the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Expand or collapse the panel.
    TogglePanel,
    /// Show or hide a layer.
    ToggleVisibility {
        /// Layer id.
        id: String,
    },
    /// Move a layer up one step.
    Promote {
        /// Layer id.
        id: String,
    },
    /// Move a layer down one step.
    Demote {
        /// Layer id.
        id: String,
    },
    /// Expand or collapse a row's opacity control.
    ToggleOpacityControl {
        /// Layer id.
        id: String,
    },
    /// Slider moved.
    SetOpacity {
        /// Layer id.
        id: String,
        /// Slider value in percent.
        percent: u32,
        /// Set when echoing a model value back into the slider; the hash is
        /// not written.
        suppress_feedback: bool,
    },
}

/// Layer list presenter.
#[derive(Debug)]
pub struct LayerListPresenter<V> {
    model: LayerOrderModel,
    view: V,
}

impl<V: LayerListView> LayerListPresenter<V> {
    /// Create a presenter with an empty list.
    #[must_use]
    pub fn new(view: V) -> Self {
        Self {
            model: LayerOrderModel::new(),
            view,
        }
    }

    /// The model.
    #[must_use]
    pub const fn model(&self) -> &LayerOrderModel {
        &self.model
    }

    /// The view.
    #[must_use]
    pub const fn view(&self) -> &V {
        &self.view
    }

    /// Mutable access to the view.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Rows in list order.
    #[must_use]
    pub fn rows(&self) -> Vec<LayerRow> {
        let count = self.model.len();
        self.model
            .iter()
            .enumerate()
            .map(|(position, record)| LayerRow::new(record, position, count))
            .collect()
    }

    /// Current layer config string.
    #[must_use]
    pub fn config_string(&self) -> String {
        layer_config::build(self.model.iter())
    }

    /// Load a new layer list and redraw every row.
    pub fn reload(&mut self, seeds: impl IntoIterator<Item = LayerSeed>, extra: &LayerOverrides) {
        self.model.reload(seeds, extra);
        self.view.rebuild(&self.rows());
    }

    /// Apply overrides to the current list.
    ///
    /// Rows are moved only when the order changed; otherwise they are
    /// refreshed in place. Returns whether the order changed.
    pub fn update(&mut self, extra: &LayerOverrides) -> bool {
        let order_changed = self.model.update(extra);
        if order_changed {
            self.view.reorder(self.model.ids());
        }
        self.refresh_rows();
        order_changed
    }

    /// Empty the list.
    pub fn clear(&mut self) {
        self.model.clear();
        self.view.rebuild(&[]);
    }

    /// Handle a gesture. Returns whether the model changed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ViewerError::OutOfRange`] if the gesture names a
    /// layer that is not in the list.
    pub fn handle<H: HashStore + ?Sized>(
        &mut self,
        gesture: Gesture,
        store: &mut H,
    ) -> ViewerResult<bool> {
        match gesture {
            Gesture::TogglePanel => {
                self.view.toggle_panel();
                Ok(false)
            }
            Gesture::ToggleOpacityControl { id } => {
                if self.model.position(&id).is_none() {
                    return Err(ViewerError::OutOfRange { id });
                }
                self.view.toggle_opacity_control(&id);
                Ok(false)
            }
            Gesture::ToggleVisibility { id } => {
                let visible = self.model.toggle_visibility(&id)?;
                tracing::debug!(layer_id = %id, visible, "layer visibility toggled");
                self.refresh_row(&id);
                self.write_config(store);
                Ok(true)
            }
            Gesture::Promote { id } => {
                let outcome = self.model.promote(&id)?;
                Ok(self.after_move(outcome, store))
            }
            Gesture::Demote { id } => {
                let outcome = self.model.demote(&id)?;
                Ok(self.after_move(outcome, store))
            }
            Gesture::SetOpacity {
                id,
                percent,
                suppress_feedback,
            } => {
                self.model.set_opacity(&id, slider_opacity(percent))?;
                self.refresh_row(&id);
                if !suppress_feedback {
                    self.write_config(store);
                }
                Ok(true)
            }
        }
    }

    fn after_move<H: HashStore + ?Sized>(&mut self, outcome: MoveOutcome, store: &mut H) -> bool {
        match outcome {
            MoveOutcome::AtBoundary => false,
            MoveOutcome::Moved { .. } => {
                self.view.reorder(self.model.ids());
                self.refresh_rows();
                self.write_config(store);
                true
            }
        }
    }

    fn refresh_rows(&mut self) {
        for row in self.rows() {
            self.view.refresh_row(&row);
        }
    }

    fn refresh_row(&mut self, id: &str) {
        let count = self.model.len();
        let row = self
            .model
            .position(id)
            .zip(self.model.get(id))
            .map(|(position, record)| LayerRow::new(record, position, count));
        if let Some(row) = row {
            self.view.refresh_row(&row);
        }
    }

    fn write_config<H: HashStore + ?Sized>(&self, store: &mut H) {
        hash::set_values(store, [(fields::CONFIG, self.config_string())]);
    }
}

/// A view that records what it was asked to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingView {
    /// Rows in displayed order.
    pub rows: Vec<LayerRow>,
    /// Number of full rebuilds.
    pub rebuilds: usize,
    /// Number of reorders.
    pub reorders: usize,
    /// Whether the panel is expanded.
    pub expanded: bool,
    /// Rows whose opacity control is open.
    pub opacity_open: Vec<String>,
}

impl LayerListView for RecordingView {
    fn rebuild(&mut self, rows: &[LayerRow]) {
        self.rows = rows.to_vec();
        self.opacity_open.clear();
        self.rebuilds += 1;
    }

    fn reorder(&mut self, ids: &[String]) {
        let mut rows = std::mem::take(&mut self.rows);
        self.rows = ids
            .iter()
            .filter_map(|id| {
                let at = rows.iter().position(|row| &row.id == id)?;
                Some(rows.swap_remove(at))
            })
            .collect();
        self.reorders += 1;
    }

    fn refresh_row(&mut self, row: &LayerRow) {
        if let Some(existing) = self.rows.iter_mut().find(|r| r.id == row.id) {
            *existing = row.clone();
        }
    }

    fn toggle_opacity_control(&mut self, id: &str) {
        if let Some(at) = self.opacity_open.iter().position(|open| open == id) {
            self.opacity_open.remove(at);
        } else {
            self.opacity_open.push(id.to_string());
        }
    }

    fn toggle_panel(&mut self) {
        self.expanded = !self.expanded;
    }
}
