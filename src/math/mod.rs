pub mod polygon_2d;
pub mod quantize;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// A straight segment in 3D space, the raw-edge unit for boundary
/// and crease input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment3 {
    /// Start point.
    pub a: Point3,
    /// End point.
    pub b: Point3,
}

impl Segment3 {
    /// Creates a new segment between two points.
    #[must_use]
    pub fn new(a: Point3, b: Point3) -> Self {
        Self { a, b }
    }

    /// Euclidean length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.b - self.a).norm()
    }
}
