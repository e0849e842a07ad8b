//! Membership tests against the valid roof region.
//!
//! Graph edges are only admitted when the whole connecting segment
//! stays on the face; this is what keeps connectivity from
//! shortcutting across voids or outside the silhouette.

mod parametric;

pub use parametric::{FaceExtent, ParametricFace, PlanarRoof, ReferenceSurface};

use crate::error::Result;
use crate::math::polygon_2d::{distance_to_ring, point_in_ring};
use crate::math::{Point2, Point3, Segment3};
use crate::topology::{classify, ClassifiedLoops};

/// Minimum number of interior samples for a segment test.
pub const MIN_SEGMENT_SAMPLES: usize = 10;

/// Band around a ring edge within which a point counts as on the
/// boundary. The winding test alone is half-open (top/right edges read
/// as outside), which would disconnect nodes sitting exactly on the
/// silhouette; the band closes the region.
const BOUNDARY_TOLERANCE: f64 = 1e-6;

/// Interior samples per unit of segment length, on top of the minimum.
const SAMPLES_PER_UNIT: f64 = 4.0;

/// Decides whether points and segments lie within the valid surface
/// region.
pub trait FaceMembership {
    /// Returns `true` if the point lies on the face. Never errors;
    /// any failure to decide reports `false`.
    fn is_on_face(&self, point: &Point3) -> bool;

    /// Returns `true` if the whole open segment `(a, b)` lies on the
    /// face.
    ///
    /// Samples interior points strictly between the endpoints
    /// (excluding t=0 and t=1, which are graph nodes and may sit
    /// exactly on a boundary) and requires every sample to pass the
    /// point test. Sample count grows with segment length, floored at
    /// [`MIN_SEGMENT_SAMPLES`].
    fn is_segment_on_face(&self, a: &Point3, b: &Point3) -> bool {
        let direction = b - a;
        let samples = sample_count(direction.norm());
        for i in 1..=samples {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / (samples + 1) as f64;
            let sample = a + direction * t;
            if !self.is_on_face(&sample) {
                return false;
            }
        }
        true
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn sample_count(length: f64) -> usize {
    let scaled = (length * SAMPLES_PER_UNIT).ceil();
    if scaled.is_finite() && scaled > MIN_SEGMENT_SAMPLES as f64 {
        scaled as usize
    } else {
        MIN_SEGMENT_SAMPLES
    }
}

/// Face membership over a flattened boundary region: inside the outer
/// ring, outside every inner void ring.
#[derive(Debug, Clone)]
pub struct RegionFace {
    outer: Vec<Point2>,
    voids: Vec<Vec<Point2>>,
}

impl RegionFace {
    /// Creates a region from an outer ring and zero or more void rings.
    #[must_use]
    pub fn new(outer: Vec<Point2>, voids: Vec<Vec<Point2>>) -> Self {
        Self { outer, voids }
    }

    /// Creates a region from a classified loop set.
    #[must_use]
    pub fn from_loops(loops: &ClassifiedLoops) -> Self {
        Self {
            outer: loops.outer.ring.clone(),
            voids: loops.inner.iter().map(|l| l.ring.clone()).collect(),
        }
    }

    /// Classifies a raw boundary edge set and builds the region from
    /// the result.
    ///
    /// # Errors
    ///
    /// Propagates classification errors, see
    /// [`topology::classify`](crate::topology::classify).
    pub fn from_boundary(edges: &[Segment3]) -> Result<Self> {
        let loops = classify(edges)?;
        Ok(Self::from_loops(&loops))
    }
}

impl FaceMembership for RegionFace {
    fn is_on_face(&self, point: &Point3) -> bool {
        let flat = Point2::new(point.x, point.y);
        if !point_in_ring(&flat, &self.outer)
            && distance_to_ring(&flat, &self.outer) > BOUNDARY_TOLERANCE
        {
            return false;
        }
        // Void boundaries themselves belong to the face; only strict
        // void interiors are excluded.
        !self.voids.iter().any(|v| {
            point_in_ring(&flat, v) && distance_to_ring(&flat, v) > BOUNDARY_TOLERANCE
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    fn region_with_hole() -> RegionFace {
        RegionFace::new(
            square(0.0, 0.0, 20.0, 20.0),
            vec![square(7.5, 7.5, 12.5, 12.5)],
        )
    }

    #[test]
    fn point_inside_region() {
        let face = region_with_hole();
        assert!(face.is_on_face(&Point3::new(2.0, 2.0, 0.0)));
    }

    #[test]
    fn point_in_void_rejected() {
        let face = region_with_hole();
        assert!(!face.is_on_face(&Point3::new(10.0, 10.0, 0.0)));
    }

    #[test]
    fn point_outside_outer_rejected() {
        let face = region_with_hole();
        assert!(!face.is_on_face(&Point3::new(25.0, 10.0, 0.0)));
    }

    #[test]
    fn segment_across_void_rejected() {
        let face = region_with_hole();
        // Straight shot through the centre hole.
        assert!(!face.is_segment_on_face(
            &Point3::new(1.0, 10.0, 0.0),
            &Point3::new(19.0, 10.0, 0.0),
        ));
    }

    #[test]
    fn segment_around_void_accepted() {
        let face = region_with_hole();
        assert!(face.is_segment_on_face(
            &Point3::new(1.0, 2.0, 0.0),
            &Point3::new(19.0, 2.0, 0.0),
        ));
    }

    #[test]
    fn endpoints_on_boundary_still_pass() {
        // Only interior samples are tested, so boundary nodes connect.
        let face = RegionFace::new(square(0.0, 0.0, 10.0, 10.0), Vec::new());
        assert!(face.is_segment_on_face(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(10.0, 0.0 + 1e-9, 0.0),
        ));
    }

    #[test]
    fn segment_along_silhouette_accepted() {
        // Top edge of the outer ring; winding alone reads it as
        // outside, the boundary band keeps it connected.
        let face = RegionFace::new(square(0.0, 0.0, 10.0, 10.0), Vec::new());
        assert!(face.is_segment_on_face(
            &Point3::new(10.0, 10.0, 0.0),
            &Point3::new(0.0, 10.0, 0.0),
        ));
    }

    #[test]
    fn region_from_classified_boundary() {
        let p3 = |x: f64, y: f64| Point3::new(x, y, 0.0);
        let edges = vec![
            Segment3::new(p3(0.0, 0.0), p3(10.0, 0.0)),
            Segment3::new(p3(10.0, 0.0), p3(10.0, 10.0)),
            Segment3::new(p3(10.0, 10.0), p3(0.0, 10.0)),
            Segment3::new(p3(0.0, 10.0), p3(0.0, 0.0)),
        ];
        let face = RegionFace::from_boundary(&edges).unwrap();
        assert!(face.is_on_face(&Point3::new(5.0, 5.0, 1.0)));
        assert!(!face.is_on_face(&Point3::new(15.0, 5.0, 0.0)));
    }

    #[test]
    fn sample_count_scales_with_length() {
        assert_eq!(sample_count(0.5), MIN_SEGMENT_SAMPLES);
        assert_eq!(sample_count(10.0), 40);
    }
}
