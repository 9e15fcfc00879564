//! Browser tests for the DOM layer list and overlay.
//!
//! Run with `wasm-pack test --headless --firefox visualizer-app`.

#![cfg(target_arch = "wasm32")]

use visualizer_app::view::classes;
use visualizer_app::{DomLayerList, DomOverlay};
use visualizer_core::{LayerListView, LayerRow, Overlay};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, Element, HtmlInputElement};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window()
        .and_then(|w| w.document())
        .expect("test runs in a page")
}

fn container(document: &Document) -> Element {
    let element = document.create_element("div").expect("div");
    document.body().expect("body").append_child(&element).expect("attach");
    element
}

fn row(id: &str, visible: bool, percent: u32, can_promote: bool, can_demote: bool) -> LayerRow {
    LayerRow {
        id: id.to_string(),
        title: id.to_uppercase(),
        visible,
        opacity: f64::from(percent) / 100.0,
        slider_percent: percent,
        can_promote,
        can_demote,
    }
}

fn item_ids(panel: &Element) -> Vec<String> {
    let items = panel
        .query_selector_all(&format!(".{}", classes::ITEM))
        .expect("selector");
    (0..items.length())
        .filter_map(|i| items.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .filter_map(|el| el.get_attribute("data-layer-id"))
        .collect()
}

fn item(panel: &Element, id: &str) -> Element {
    panel
        .query_selector(&format!("li[data-layer-id=\"{id}\"]"))
        .expect("selector")
        .expect("row exists")
}

#[wasm_bindgen_test]
fn test_rebuild_draws_rows_with_controls() {
    let document = document();
    let panel = container(&document);
    let mut list = DomLayerList::new(document, panel.clone(), 5).expect("list");

    list.rebuild(&[row("osm", true, 50, false, true), row("rivers", false, 100, true, false)]);

    assert_eq!(item_ids(&panel), ["osm", "rivers"]);
    let osm = item(&panel, "osm");
    assert!(!osm.class_list().contains(classes::ITEM_HIDDEN));
    assert!(item(&panel, "rivers").class_list().contains(classes::ITEM_HIDDEN));

    let promote = osm
        .query_selector(&format!(".{}", classes::ACTION_PROMOTE))
        .expect("selector")
        .expect("promote button");
    assert!(promote.has_attribute("disabled"));

    let slider = osm
        .query_selector("input[type=range]")
        .expect("selector")
        .expect("slider")
        .dyn_into::<HtmlInputElement>()
        .expect("input");
    assert_eq!(slider.min(), "10");
    assert_eq!(slider.max(), "100");
    assert_eq!(slider.step(), "5");
    assert_eq!(slider.value(), "50");
}

#[wasm_bindgen_test]
fn test_reorder_moves_existing_rows() {
    let document = document();
    let panel = container(&document);
    let mut list = DomLayerList::new(document, panel.clone(), 5).expect("list");
    list.rebuild(&[row("a", true, 100, false, true), row("b", true, 100, true, false)]);

    list.reorder(&["b".to_string(), "a".to_string()]);
    assert_eq!(item_ids(&panel), ["b", "a"]);
}

#[wasm_bindgen_test]
fn test_view_only_toggles() {
    let document = document();
    let panel = container(&document);
    let mut list = DomLayerList::new(document, panel.clone(), 5).expect("list");
    list.rebuild(&[row("a", true, 100, false, false)]);

    list.toggle_panel();
    assert!(panel.class_list().contains(classes::PANEL_EXPANDED));
    list.toggle_opacity_control("a");
    assert!(item(&panel, "a").class_list().contains(classes::ITEM_OPACITY_EXPANDED));

    list.refresh_row(&row("a", false, 35, false, false));
    let label = item(&panel, "a")
        .query_selector(&format!(".{}", classes::OPACITY_LABEL))
        .expect("selector")
        .expect("label");
    assert_eq!(label.text_content().as_deref(), Some("35%"));
}

#[wasm_bindgen_test]
fn test_overlay_appends_and_clears() {
    let document = document();
    let element = container(&document);
    let mut overlay = DomOverlay::new(document, element.clone());

    overlay.append_text("source: world.json");
    overlay.append_text("Downloading source file...");
    assert_eq!(element.child_element_count(), 2);

    overlay.clear();
    assert_eq!(element.child_element_count(), 0);
}
