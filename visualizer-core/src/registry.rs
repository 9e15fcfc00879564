//! Layer source types the mapping library can build.
//!
//! Real source types map to the layer kind that renders them. Virtual source
//! types are rewritten into a real type + options before lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ValidationError;

/// Layer class a source is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    /// Tiled raster layer.
    Tile,
    /// Single-image raster layer.
    Image,
    /// Client-side vector layer.
    Vector,
    /// Vector tile layer.
    VectorTile,
}

/// A layer source descriptor: type tag plus constructor options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Source type name, e.g. `OSM`.
    #[serde(rename = "type")]
    pub source_type: String,
    /// Options handed to the source constructor.
    pub options: Map<String, Value>,
}

impl SourceSpec {
    /// Create a descriptor.
    #[must_use]
    pub fn new(source_type: impl Into<String>, options: Map<String, Value>) -> Self {
        Self {
            source_type: source_type.into(),
            options,
        }
    }
}

/// Rewrites a virtual source's options into a real descriptor.
pub type Expander = fn(&Map<String, Value>) -> Result<SourceSpec, ValidationError>;

const SOURCE_TYPES: &[(&str, LayerKind)] = &[
    ("BingMaps", LayerKind::Tile),
    ("CartoDB", LayerKind::Tile),
    ("Cluster", LayerKind::Vector),
    ("ImageCanvas", LayerKind::Image),
    ("ImageMapGuide", LayerKind::Image),
    ("ImageStatic", LayerKind::Image),
    ("ImageVector", LayerKind::Image),
    ("ImageWMS", LayerKind::Image),
    ("MapQuest", LayerKind::Tile),
    ("OSM", LayerKind::Tile),
    ("Raster", LayerKind::Image),
    ("Stamen", LayerKind::Tile),
    ("TileArcGISRest", LayerKind::Tile),
    ("TileDebug", LayerKind::Tile),
    ("TileImage", LayerKind::Tile),
    ("TileJSON", LayerKind::Tile),
    ("TileUTFGrid", LayerKind::Tile),
    ("TileWMS", LayerKind::Tile),
    ("Vector", LayerKind::Vector),
    ("VectorTile", LayerKind::VectorTile),
    ("WMTS", LayerKind::Tile),
    ("XYZ", LayerKind::Tile),
    ("Zoomify", LayerKind::Tile),
];

/// `GeoJSON` → `Vector`, either with inline features or loading from a URL.
fn expand_geojson(options: &Map<String, Value>) -> Result<SourceSpec, ValidationError> {
    let mut expanded = Map::new();
    expanded.insert("format".to_string(), Value::from("GeoJSON"));

    if let Some(json) = options.get("json").filter(|v| !v.is_null()) {
        expanded.insert("features".to_string(), json.clone());
        return Ok(SourceSpec::new("Vector", expanded));
    }

    let url = options
        .get("jsonFile")
        .and_then(|file| file.get("url"))
        .and_then(Value::as_str);
    match url {
        Some(url) => {
            expanded.insert("url".to_string(), Value::from(url));
            Ok(SourceSpec::new("Vector", expanded))
        }
        None => Err(ValidationError::UnsupportedSourceType("GeoJSON".to_string())),
    }
}

/// Registry of source types.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    kinds: HashMap<String, LayerKind>,
    virtual_types: HashMap<String, Expander>,
}

impl SourceRegistry {
    /// An empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
            virtual_types: HashMap::new(),
        }
    }

    /// Every source type the viewer supports.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for (name, kind) in SOURCE_TYPES {
            registry.register(*name, *kind);
        }
        registry.register_virtual("GeoJSON", expand_geojson);
        registry
    }

    /// Allow a real source type.
    pub fn register(&mut self, name: impl Into<String>, kind: LayerKind) {
        self.kinds.insert(name.into(), kind);
    }

    /// Add a virtual source type.
    pub fn register_virtual(&mut self, name: impl Into<String>, expander: Expander) {
        self.virtual_types.insert(name.into(), expander);
    }

    /// Whether `name` is a real or virtual source type.
    #[must_use]
    pub fn supports(&self, name: &str) -> bool {
        self.kinds.contains_key(name) || self.virtual_types.contains_key(name)
    }

    /// Expand a virtual source (if it is one) and look up its layer kind.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsupportedSourceType`] if the type, after
    /// expansion, is not on the allow-list.
    pub fn resolve(&self, spec: SourceSpec) -> Result<(LayerKind, SourceSpec), ValidationError> {
        let spec = match self.virtual_types.get(&spec.source_type) {
            Some(expand) => expand(&spec.options)?,
            None => spec,
        };
        match self.kinds.get(&spec.source_type) {
            Some(kind) => Ok((*kind, spec)),
            None => Err(ValidationError::UnsupportedSourceType(spec.source_type)),
        }
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn real_types_resolve_to_their_kind() {
        let registry = SourceRegistry::standard();
        let (kind, spec) = registry
            .resolve(SourceSpec::new("OSM", Map::new()))
            .expect("OSM is supported");
        assert_eq!(kind, LayerKind::Tile);
        assert_eq!(spec.source_type, "OSM");

        let (kind, _) = registry
            .resolve(SourceSpec::new("ImageWMS", Map::new()))
            .expect("ImageWMS is supported");
        assert_eq!(kind, LayerKind::Image);
    }

    #[test]
    fn unknown_and_abstract_types_are_rejected() {
        let registry = SourceRegistry::standard();
        for name in ["Tile", "Source", "Image", "Nope"] {
            assert_eq!(
                registry.resolve(SourceSpec::new(name, Map::new())),
                Err(ValidationError::UnsupportedSourceType(name.to_string()))
            );
        }
    }

    #[test]
    fn geojson_inline_expands_to_vector_features() {
        let registry = SourceRegistry::standard();
        let inline = json!({"type": "FeatureCollection", "features": []});
        let (kind, spec) = registry
            .resolve(SourceSpec::new("GeoJSON", options(json!({ "json": inline.clone() }))))
            .expect("inline GeoJSON expands");
        assert_eq!(kind, LayerKind::Vector);
        assert_eq!(spec.source_type, "Vector");
        assert_eq!(spec.options.get("features"), Some(&inline));
        assert_eq!(spec.options.get("format"), Some(&json!("GeoJSON")));
    }

    #[test]
    fn geojson_file_expands_to_vector_url() {
        let registry = SourceRegistry::standard();
        let (_, spec) = registry
            .resolve(SourceSpec::new(
                "GeoJSON",
                options(json!({"jsonFile": {"url": "https://example.com/a.geojson"}})),
            ))
            .expect("GeoJSON file expands");
        assert_eq!(spec.options.get("url"), Some(&json!("https://example.com/a.geojson")));
    }

    #[test]
    fn geojson_without_data_is_unsupported() {
        let registry = SourceRegistry::standard();
        assert!(matches!(
            registry.resolve(SourceSpec::new("GeoJSON", Map::new())),
            Err(ValidationError::UnsupportedSourceType(_))
        ));
    }

    #[test]
    fn custom_registrations() {
        let mut registry = SourceRegistry::empty();
        assert!(!registry.supports("OSM"));
        registry.register("OSM", LayerKind::Tile);
        assert!(registry.supports("OSM"));
    }
}
