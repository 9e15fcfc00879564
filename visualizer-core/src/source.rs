//! Source documents: the JSON file named by the `source` hash field.
//!
//! Validation walks the raw JSON so each problem maps to one
//! [`ValidationError`] with the message shown to the user.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{MAX_OPACITY, MIN_OPACITY};
use crate::registry::{LayerKind, SourceRegistry, SourceSpec};
use crate::{Extent, ValidationError, ViewerResult};

/// A validated layer, ready for the map backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerBlueprint {
    /// Unique layer id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Declared z-index.
    pub z_index: i32,
    /// Declared visibility.
    pub visible: bool,
    /// Declared opacity.
    pub opacity: f64,
    /// Optional layer extent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
    /// Layer class for the source.
    pub kind: LayerKind,
    /// Source descriptor, with virtual types already expanded.
    pub source: SourceSpec,
}

/// A validated source document.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Declared projection.
    pub projection: Option<String>,
    /// Declared default view extent.
    pub extent: Option<Extent>,
    /// Layers in declaration order.
    pub layers: Vec<LayerBlueprint>,
}

impl SourceDocument {
    /// Parse and validate a source document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ViewerError::Json`] for malformed JSON and
    /// [`crate::ViewerError::Validation`] for a well-formed but invalid
    /// document.
    pub fn from_json(json: &str, registry: &SourceRegistry) -> ViewerResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value, registry)?)
    }

    /// Validate an already-parsed source document.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn from_value(value: &Value, registry: &SourceRegistry) -> Result<Self, ValidationError> {
        let document = value.as_object().ok_or(ValidationError::SourceNotObject)?;

        let projection = match document.get("projection") {
            None | Some(Value::Null) => None,
            Some(Value::String(p)) => Some(p.clone()),
            Some(_) => return Err(ValidationError::ProjectionNotString),
        };

        let extent = match document.get("extent") {
            None | Some(Value::Null) => None,
            Some(extent) => Some(validate_extent(extent, "source")?),
        };

        let layers = document
            .get("layers")
            .and_then(Value::as_array)
            .ok_or(ValidationError::LayersNotArray)?;
        if layers.is_empty() {
            return Err(ValidationError::NoLayers);
        }

        let mut seen = HashSet::new();
        let layers = layers
            .iter()
            .map(|layer| {
                let blueprint = validate_layer(layer, registry)?;
                if !seen.insert(blueprint.id.clone()) {
                    return Err(ValidationError::DuplicateId(blueprint.id));
                }
                Ok(blueprint)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            projection,
            extent,
            layers,
        })
    }

    /// The declared projection, or `default`.
    #[must_use]
    pub fn projection_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.projection.as_deref().unwrap_or(default)
    }
}

fn validate_extent(value: &Value, what: &'static str) -> Result<Extent, ValidationError> {
    let cells = value
        .as_array()
        .ok_or(ValidationError::ExtentNotArray(what))?;
    if cells.len() != 4 {
        return Err(ValidationError::ExtentWrongLength(what));
    }
    let mut corners = [0.0; 4];
    for (corner, cell) in corners.iter_mut().zip(cells) {
        *corner = cell
            .as_f64()
            .ok_or(ValidationError::ExtentNotNumbers(what))?;
    }
    Ok(Extent(corners))
}

#[allow(clippy::cast_possible_truncation)]
fn validate_layer(
    value: &Value,
    registry: &SourceRegistry,
) -> Result<LayerBlueprint, ValidationError> {
    let layer = value.as_object().ok_or(ValidationError::LayerNotObject)?;

    let id = string_field(layer, "id").ok_or(ValidationError::IdNotString)?;
    let title = string_field(layer, "title").ok_or(ValidationError::TitleNotString)?;
    let z_index = layer
        .get("zIndex")
        .and_then(Value::as_f64)
        .ok_or(ValidationError::ZIndexNotNumber)?;
    let visible = layer
        .get("visible")
        .and_then(Value::as_bool)
        .ok_or(ValidationError::VisibleNotBoolean)?;
    let opacity = layer
        .get("opacity")
        .and_then(Value::as_f64)
        .ok_or(ValidationError::OpacityNotNumber)?;
    if !(MIN_OPACITY..=MAX_OPACITY).contains(&opacity) {
        return Err(ValidationError::OpacityOutOfRange);
    }
    let extent = match layer.get("extent") {
        None => None,
        Some(extent) => Some(validate_extent(extent, "layer")?),
    };

    let source = layer
        .get("source")
        .and_then(Value::as_object)
        .ok_or(ValidationError::SourceSpecNotObject)?;
    let source_type = string_field(source, "type").ok_or(ValidationError::SourceTypeNotString)?;
    let options = source
        .get("options")
        .and_then(Value::as_object)
        .ok_or(ValidationError::SourceOptionsNotObject)?;
    let (kind, source) = registry.resolve(SourceSpec::new(source_type, options.clone()))?;

    Ok(LayerBlueprint {
        id,
        title,
        z_index: z_index.trunc() as i32,
        visible,
        opacity,
        extent,
        kind,
        source,
    })
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}
