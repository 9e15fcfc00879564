//! View extents and their `minX_minY_maxX_maxY` hash encoding.

use serde::{Deserialize, Serialize};

use crate::config::symbols::COMMA;
use crate::layer_config::coerce_number;

/// A bounding box `[minX, minY, maxX, maxY]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extent(pub [f64; 4]);

impl Extent {
    /// Create an extent from its corners.
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self([min_x, min_y, max_x, max_y])
    }

    /// Width of the box.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.0[2] - self.0[0]
    }

    /// Height of the box.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.0[3] - self.0[1]
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        ((self.0[0] + self.0[2]) / 2.0, (self.0[1] + self.0[3]) / 2.0)
    }

    /// The components as a slice.
    #[must_use]
    pub const fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl From<[f64; 4]> for Extent {
    fn from(values: [f64; 4]) -> Self {
        Self(values)
    }
}

/// Parse an extent string.
///
/// Returns `None` unless there are exactly four non-empty numeric
/// components, so the caller can fall back to a default extent.
#[must_use]
pub fn parse(extent: &str) -> Option<Extent> {
    let segments: Vec<&str> = extent
        .split(COMMA)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let [a, b, c, d] = segments.as_slice() else {
        return None;
    };
    Some(Extent([
        coerce_number(a)?,
        coerce_number(b)?,
        coerce_number(c)?,
        coerce_number(d)?,
    ]))
}

/// Build an extent string from the first four values.
///
/// Returns an empty string when fewer than four values are given.
#[must_use]
pub fn build(values: &[f64]) -> String {
    match values.get(..4) {
        Some(corners) => corners
            .iter()
            .map(f64::to_string)
            .collect::<Vec<_>>()
            .join(COMMA),
        None => String::new(),
    }
}

/// Compare the first four components only.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn is_identical(a: &[f64], b: &[f64]) -> bool {
    (0..4).all(|i| a.get(i) == b.get(i))
}
