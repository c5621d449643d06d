//! Planar map coordinates and their exported string form.
//!
//! The map viewer expects each axis as a one-decimal magnitude followed by
//! a compass letter, e.g. `"16.9E"` and `"22.9S"`. Non-negative values take
//! East/North; negative values take the absolute value with West/South.

use serde::{Deserialize, Serialize};

/// Planar map coordinates in the host's map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCoord {
    /// East-west axis (positive is East).
    pub x: f64,
    /// North-south axis (positive is North).
    pub y: f64,
}

impl MapCoord {
    /// Create a coordinate pair.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both axes are finite numbers.
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Format the east-west axis, e.g. `-16.94` becomes `"16.9W"`.
pub fn format_lon(x: f64) -> String {
    format_axis(x, 'E', 'W')
}

/// Format the north-south axis, e.g. `22.9` becomes `"22.9N"`.
pub fn format_lat(y: f64) -> String {
    format_axis(y, 'N', 'S')
}

fn format_axis(value: f64, positive: char, negative: char) -> String {
    // abs() on both branches keeps -0.0 from printing as "-0.0".
    let suffix = if value >= 0.0 { positive } else { negative };
    format!("{:.1}{suffix}", value.abs())
}
