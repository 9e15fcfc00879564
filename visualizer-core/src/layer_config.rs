//! Compact per-layer config string stored in the `config` hash field.
//!
//! ```text
//! <id>___<zIndex>_<visible>_<opacity>_-_<id>___<zIndex>_<visible>_<opacity>
//! ```
//!
//! `visible` is written as `1`/`0`. Layers are written sorted by id so the
//! output does not depend on list order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::symbols::{COLON, COMMA, SEMICOLON};
use crate::model::LayerRecord;

/// Per-layer values carried by the hash.
///
/// A `None` field leaves the layer's current value alone when applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerOverride {
    /// Stacking order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    /// Visibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    /// Opacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl LayerOverride {
    /// An override that sets every field.
    #[must_use]
    pub const fn full(z_index: i32, visible: bool, opacity: f64) -> Self {
        Self {
            z_index: Some(z_index),
            visible: Some(visible),
            opacity: Some(opacity),
        }
    }
}

/// Overrides keyed by layer id.
pub type LayerOverrides = BTreeMap<String, LayerOverride>;

/// Coerce a string to a number the way JavaScript's `Number()` does, keeping
/// only finite results.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn coerce_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    let value = match radix {
        Some(radix) => u64::from_str_radix(&text[2..], radix).ok().map(|v| v as f64)?,
        // Rust accepts "inf"/"nan" spellings that JavaScript does not; both
        // are non-finite and rejected below.
        None if text.bytes().any(|b| b.is_ascii_alphabetic() && !matches!(b, b'e' | b'E')) => {
            return None
        }
        None => text.parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

fn config_value(field: Option<&str>) -> Option<f64> {
    field.filter(|f| !f.is_empty()).and_then(coerce_number)
}

#[allow(clippy::cast_possible_truncation)]
fn to_z_index(value: f64) -> i32 {
    value.trunc() as i32
}

/// Parse a config string.
///
/// Segments without an id (no colon, or colon first) are skipped. Invalid
/// values fall back to `zIndex = 0`, `visible = true`, `opacity = 1`.
#[must_use]
pub fn parse(config: &str) -> LayerOverrides {
    let mut overrides = LayerOverrides::new();
    if config.is_empty() {
        return overrides;
    }
    for segment in config.split(SEMICOLON) {
        let Some(at) = segment.find(COLON).filter(|&at| at > 0) else {
            continue;
        };
        let id = &segment[..at];
        let mut values = segment[at + COLON.len()..].split(COMMA).map(str::trim);
        let z_index = config_value(values.next()).map_or(0, to_z_index);
        let visible = config_value(values.next()).map_or(true, |v| v != 0.0);
        let opacity = config_value(values.next()).unwrap_or(1.0);
        overrides.insert(id.to_string(), LayerOverride::full(z_index, visible, opacity));
    }
    overrides
}

/// Build a config string from layer records.
///
/// The input is left untouched; a sorted copy of the references is encoded.
pub fn build<'a>(records: impl IntoIterator<Item = &'a LayerRecord>) -> String {
    let mut sorted: Vec<&LayerRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));
    sorted
        .iter()
        .map(|r| {
            format!(
                "{id}{COLON}{z}{COMMA}{visible}{COMMA}{opacity}",
                id = r.id,
                z = r.z_index,
                visible = u8::from(r.visible),
                opacity = r.opacity,
            )
        })
        .collect::<Vec<_>>()
        .join(SEMICOLON)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, z_index: i32, visible: bool, opacity: f64) -> LayerRecord {
        LayerRecord {
            id: id.to_string(),
            title: id.to_uppercase(),
            z_index,
            visible,
            opacity,
            index: 0,
            extent: None,
        }
    }

    #[test]
    fn parse_two_layers() {
        let parsed = parse("mapquest___0_1_0.55_-_osm___0_1_0.55");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["mapquest"], LayerOverride::full(0, true, 0.55));
        assert_eq!(parsed["osm"], LayerOverride::full(0, true, 0.55));
    }

    #[test]
    fn parse_empty_is_empty() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn parse_skips_segments_without_id() {
        let parsed = parse("___1_1_1_-_noColon_-_osm___2_0_0.5");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["osm"], LayerOverride::full(2, false, 0.5));
    }

    #[test]
    fn parse_defaults_invalid_fields() {
        let parsed = parse("a___x_y_z_-_b___");
        assert_eq!(parsed["a"], LayerOverride::full(0, true, 1.0));
        assert_eq!(parsed["b"], LayerOverride::full(0, true, 1.0));
    }

    #[test]
    fn parse_visible_is_nonzero() {
        let parsed = parse("a___0_0_1_-_b___0_2_1_-_c___0_0.0_1");
        assert_eq!(parsed["a"].visible, Some(false));
        assert_eq!(parsed["b"].visible, Some(true));
        assert_eq!(parsed["c"].visible, Some(false));
    }

    #[test]
    fn parse_keeps_out_of_range_opacity_for_the_model_to_clamp() {
        let parsed = parse("mapquest___1_1_2.0_-_osm___0_1_-1");
        assert_eq!(parsed["mapquest"].opacity, Some(2.0));
        assert_eq!(parsed["osm"].opacity, Some(-1.0));
    }

    #[test]
    fn coerce_number_follows_js_number() {
        assert_eq!(coerce_number("1e2"), Some(100.0));
        assert_eq!(coerce_number(".5"), Some(0.5));
        assert_eq!(coerce_number("0x10"), Some(16.0));
        assert_eq!(coerce_number(" 7 "), Some(7.0));
        assert_eq!(coerce_number("Infinity"), None);
        assert_eq!(coerce_number("inf"), None);
        assert_eq!(coerce_number("nan"), None);
        assert_eq!(coerce_number("12px"), None);
        assert_eq!(coerce_number(""), None);
    }

    #[test]
    fn fractional_z_index_truncates() {
        assert_eq!(parse("a___2.9")["a"].z_index, Some(2));
        assert_eq!(parse("a____2.9")["a"].z_index, Some(0));
    }

    #[test]
    fn build_sorts_by_id() {
        let records = vec![record("osm", 1, true, 0.1), record("mapquest", 0, true, 0.1)];
        assert_eq!(build(&records), "mapquest___0_1_0.1_-_osm___1_1_0.1");
        assert_eq!(records[0].id, "osm", "input order must be untouched");
    }

    #[test]
    fn build_is_case_sensitive_ordinal() {
        let records = vec![record("b", 0, false, 1.0), record("B", 1, true, 0.5)];
        assert_eq!(build(&records), "B___1_1_0.5_-_b___0_0_1");
    }

    #[test]
    fn build_empty_is_empty() {
        assert_eq!(build(&Vec::<LayerRecord>::new()), "");
    }

    #[test]
    fn override_serializes_camel_case() {
        let json = serde_json::to_string(&LayerOverride::full(3, false, 0.5)).expect("json");
        assert_eq!(json, r#"{"zIndex":3,"visible":false,"opacity":0.5}"#);
    }
}
