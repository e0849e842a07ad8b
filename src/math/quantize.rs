use super::Point3;

/// Number of decimal digits kept when quantizing coordinates.
///
/// Points extracted from independent primitives (triangle corners,
/// crease endpoints) rarely agree bit-for-bit; rounding to six digits
/// collapses near-coincident points into one logical node.
pub const QUANTIZE_DIGITS: u32 = 6;

const SCALE: f64 = 1e6;

/// Tolerance-quantized identity of a 3D point.
///
/// Two points whose coordinates agree after rounding to
/// [`QUANTIZE_DIGITS`] decimal digits compare equal, hash identically,
/// and order identically. Ordering is lexicographic over (x, y, z),
/// which gives every sampling pass a deterministic node order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey {
    x: i64,
    y: i64,
    z: i64,
}

impl PointKey {
    /// Quantizes all three coordinates.
    #[must_use]
    pub fn new(point: &Point3) -> Self {
        Self {
            x: quantize(point.x),
            y: quantize(point.y),
            z: quantize(point.z),
        }
    }

    /// Quantizes only the XY coordinates, ignoring Z.
    ///
    /// Used when grouping shape-editor vertices that stack vertically:
    /// the group collapses to a single plan-view location and a
    /// separate tie-break picks the surviving Z.
    #[must_use]
    pub fn plan_view(point: &Point3) -> Self {
        Self {
            x: quantize(point.x),
            y: quantize(point.y),
            z: 0,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn quantize(value: f64) -> i64 {
    (value * SCALE).round() as i64
}
