//! DOM rendering of the layer list panel and the status overlay.
//!
//! Rows carry `data-layer-id` and each control carries `data-action`, so the
//! page glue binds one delegated handler per panel and forwards the target's
//! id to the matching [`crate::MapVisualizerApp`] method.

use std::collections::HashMap;

use visualizer_core::presenter::{SLIDER_MAX, SLIDER_MIN};
use visualizer_core::{LayerListView, LayerRow, Overlay};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

use crate::map::js_error_text;

/// CSS class names used by the panel.
pub mod classes {
    /// Panel root when expanded.
    pub const PANEL_EXPANDED: &str = "layer-list--expanded";
    /// List holding the rows.
    pub const LIST: &str = "layer-list__list";
    /// One row.
    pub const ITEM: &str = "layer-list__item";
    /// Row of a hidden layer.
    pub const ITEM_HIDDEN: &str = "layer-list__item--hidden";
    /// Row with its opacity slider showing.
    pub const ITEM_OPACITY_EXPANDED: &str = "layer-list__item--opacity-control-expanded";
    /// Title and buttons line of a row.
    pub const ITEM_ROW: &str = "layer-list__item-row";
    /// Title text.
    pub const ITEM_TITLE: &str = "layer-list__item__title";
    /// Show/hide button.
    pub const ACTION_HIDE: &str = "layer-list__item__action-hide";
    /// Move up button.
    pub const ACTION_PROMOTE: &str = "layer-list__item__action-promote";
    /// Move down button.
    pub const ACTION_DEMOTE: &str = "layer-list__item__action-demote";
    /// Opacity control toggle button.
    pub const ACTION_OPACITY: &str = "layer-list__item__action-opacity";
    /// Opacity slider line.
    pub const OPACITY_CONTROL: &str = "layer-list__item__opacity-control";
    /// Opacity value label.
    pub const OPACITY_LABEL: &str = "layer-list__item__opacity-label";
}

/// Handles to the live elements of one row.
struct RowElements {
    item: Element,
    promote: Element,
    demote: Element,
    opacity_button: HtmlElement,
    slider: HtmlInputElement,
    label: Element,
}

/// Layer list drawn into a panel element.
pub struct DomLayerList {
    document: Document,
    panel: Element,
    list: Element,
    rows: HashMap<String, RowElements>,
    opacity_step: u8,
}

impl DomLayerList {
    /// Draw into `panel`, appending a list element to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the list element cannot be created.
    pub fn new(document: Document, panel: Element, opacity_step: u8) -> Result<Self, JsValue> {
        let list = document.create_element("ol")?;
        list.set_class_name(classes::LIST);
        panel.append_child(&list)?;
        Ok(Self {
            document,
            panel,
            list,
            rows: HashMap::new(),
            opacity_step,
        })
    }

    fn button(&self, class: &str, action: &str, id: &str, text: &str) -> Result<Element, JsValue> {
        let button = self.document.create_element("button")?;
        button.set_class_name(class);
        button.set_attribute("type", "button")?;
        button.set_attribute("data-action", action)?;
        button.set_attribute("data-layer-id", id)?;
        button.set_text_content(Some(text));
        Ok(button)
    }

    fn create_row(&self, row: &LayerRow) -> Result<RowElements, JsValue> {
        let item = self.document.create_element("li")?;
        item.set_class_name(classes::ITEM);
        item.set_attribute("data-layer-id", &row.id)?;

        let line = self.document.create_element("div")?;
        line.set_class_name(classes::ITEM_ROW);
        let title = self.document.create_element("span")?;
        title.set_class_name(classes::ITEM_TITLE);
        title.set_text_content(Some(&row.title));
        line.append_child(&title)?;

        let hide = self.button(classes::ACTION_HIDE, "toggle-visibility", &row.id, "Hide")?;
        let promote = self.button(classes::ACTION_PROMOTE, "promote", &row.id, "\u{25b2}")?;
        let demote = self.button(classes::ACTION_DEMOTE, "demote", &row.id, "\u{25bc}")?;
        let opacity_button = self
            .button(classes::ACTION_OPACITY, "toggle-opacity", &row.id, "Opacity")?
            .dyn_into::<HtmlElement>()
            .map_err(|_| JsValue::from_str("Button is not an HtmlElement"))?;
        line.append_child(&hide)?;
        line.append_child(&promote)?;
        line.append_child(&demote)?;
        line.append_child(&opacity_button)?;
        item.append_child(&line)?;

        let control = self.document.create_element("div")?;
        control.set_class_name(classes::OPACITY_CONTROL);
        let slider = self
            .document
            .create_element("input")?
            .dyn_into::<HtmlInputElement>()
            .map_err(|_| JsValue::from_str("Failed to create range input"))?;
        slider.set_type("range");
        slider.set_min(&SLIDER_MIN.to_string());
        slider.set_max(&SLIDER_MAX.to_string());
        slider.set_step(&self.opacity_step.to_string());
        slider.set_attribute("data-action", "opacity")?;
        slider.set_attribute("data-layer-id", &row.id)?;
        let label = self.document.create_element("span")?;
        label.set_class_name(classes::OPACITY_LABEL);
        control.append_child(&slider)?;
        control.append_child(&label)?;
        item.append_child(&control)?;

        let elements = RowElements {
            item,
            promote,
            demote,
            opacity_button,
            slider,
            label,
        };
        paint_row(&elements, row)?;
        Ok(elements)
    }

    fn try_rebuild(&mut self, rows: &[LayerRow]) -> Result<(), JsValue> {
        self.list.set_inner_html("");
        self.rows.clear();
        for row in rows {
            let elements = self.create_row(row)?;
            self.list.append_child(&elements.item)?;
            self.rows.insert(row.id.clone(), elements);
        }
        Ok(())
    }

    fn try_reorder(&self, ids: &[String]) -> Result<(), JsValue> {
        // Appending an attached node moves it.
        for id in ids {
            if let Some(elements) = self.rows.get(id) {
                self.list.append_child(&elements.item)?;
            }
        }
        Ok(())
    }
}

fn set_disabled(element: &Element, disabled: bool) -> Result<(), JsValue> {
    if disabled {
        element.set_attribute("disabled", "")
    } else {
        element.remove_attribute("disabled")
    }
}

fn paint_row(elements: &RowElements, row: &LayerRow) -> Result<(), JsValue> {
    elements
        .item
        .class_list()
        .toggle_with_force(classes::ITEM_HIDDEN, !row.visible)?;
    set_disabled(&elements.promote, !row.can_promote)?;
    set_disabled(&elements.demote, !row.can_demote)?;
    elements.slider.set_value(&row.slider_percent.to_string());
    elements.label.set_text_content(Some(&row.opacity_label()));
    elements
        .opacity_button
        .style()
        .set_property("opacity", &row.opacity.to_string())?;
    Ok(())
}

fn report(result: Result<(), JsValue>, what: &str) {
    if let Err(err) = result {
        tracing::error!(error = %js_error_text(&err), "failed to {what}");
    }
}

impl LayerListView for DomLayerList {
    fn rebuild(&mut self, rows: &[LayerRow]) {
        report(self.try_rebuild(rows), "rebuild layer list");
    }

    fn reorder(&mut self, ids: &[String]) {
        report(self.try_reorder(ids), "reorder layer list");
    }

    fn refresh_row(&mut self, row: &LayerRow) {
        if let Some(elements) = self.rows.get(&row.id) {
            report(paint_row(elements, row), "refresh layer row");
        }
    }

    fn toggle_opacity_control(&mut self, id: &str) {
        if let Some(elements) = self.rows.get(id) {
            report(
                elements
                    .item
                    .class_list()
                    .toggle(classes::ITEM_OPACITY_EXPANDED)
                    .map(|_| ()),
                "toggle opacity control",
            );
        }
    }

    fn toggle_panel(&mut self) {
        report(
            self.panel
                .class_list()
                .toggle(classes::PANEL_EXPANDED)
                .map(|_| ()),
            "toggle layer panel",
        );
    }
}

/// Status overlay drawn into an element, one line per message.
pub struct DomOverlay {
    document: Document,
    element: Element,
}

impl DomOverlay {
    /// Write into `element`.
    #[must_use]
    pub fn new(document: Document, element: Element) -> Self {
        Self { document, element }
    }
}

impl Overlay for DomOverlay {
    fn clear(&mut self) {
        self.element.set_inner_html("");
    }

    fn append_text(&mut self, text: &str) {
        let result = self.document.create_element("div").and_then(|line| {
            line.set_text_content(Some(text));
            self.element.append_child(&line).map(|_| ())
        });
        report(result, "append overlay text");
    }
}
