//! Mapping of path results to elevation offsets or drainage
//! polylines.
//!
//! This is the last pure stage before the host's document mutator
//! takes over: offsets say how far to drop each control point,
//! polylines trace the flow for annotation. Nothing here touches host
//! state.

use crate::error::{ConfigError, Result};
use crate::graph::Graph;
use crate::math::Point3;
use crate::solver::PathResult;

/// Tolerance below which a polyline segment counts as zero-length and
/// is dropped. Matches the node quantization step.
const SEGMENT_TOLERANCE: f64 = 1e-6;

/// Slope output parameters.
#[derive(Debug, Clone, Copy)]
pub struct SlopePolicy {
    /// Slope as a fraction (percent / 100).
    pub slope_fraction: f64,
    /// When `true`, unreachable targets map to a zero offset instead
    /// of being skipped. Off by default; silent zeroes hide stranded
    /// nodes.
    pub zero_fallback: bool,
}

impl SlopePolicy {
    /// Creates a policy from a slope percentage (e.g. `2.0` for 2%).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the percentage is not positive.
    pub fn from_percent(percent: f64) -> Result<Self> {
        if percent <= 0.0 {
            return Err(ConfigError::NonPositive {
                parameter: "slope percent",
                value: percent,
            }
            .into());
        }
        Ok(Self {
            slope_fraction: percent / 100.0,
            zero_fallback: false,
        })
    }

    /// Enables the explicit zero-offset fallback for unreachable
    /// targets.
    #[must_use]
    pub fn with_zero_fallback(mut self) -> Self {
        self.zero_fallback = true;
        self
    }
}

/// One segment of a drainage polyline. The higher endpoint always
/// comes first: drains flow downhill, and annotation code relies on
/// that orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeSegment {
    /// Upstream (higher-Z) endpoint.
    pub high: Point3,
    /// Downstream (lower-Z) endpoint.
    pub low: Point3,
}

/// Converts a path result into an elevation offset above the drain:
/// `slope_fraction x total_length`.
///
/// Unreachable targets yield `None` unless the policy opts into the
/// zero fallback.
#[must_use]
pub fn elevation_offset(result: &PathResult, policy: &SlopePolicy) -> Option<f64> {
    if result.found {
        Some(policy.slope_fraction * result.total_length)
    } else if policy.zero_fallback {
        Some(0.0)
    } else {
        None
    }
}

/// Converts a path result into an ordered sequence of line segments
/// from the target down to the drain.
///
/// Each segment is built from consecutive path nodes with the higher-Z
/// endpoint first; when both ends share a Z the upstream node (closer
/// to the target) keeps the first slot. Segments whose endpoints
/// coincide within tolerance are dropped. Unfound results produce an
/// empty sequence.
#[must_use]
pub fn drainage_polyline(result: &PathResult, graph: &Graph) -> Vec<SlopeSegment> {
    if !result.found {
        return Vec::new();
    }
    let mut segments = Vec::with_capacity(result.path.len().saturating_sub(1));
    for pair in result.path.windows(2) {
        let (Some(&from), Some(&to)) = (graph.point(pair[0]), graph.point(pair[1])) else {
            continue;
        };
        if (to - from).norm() < SEGMENT_TOLERANCE {
            continue;
        }
        let segment = if to.z > from.z {
            SlopeSegment {
                high: to,
                low: from,
            }
        } else {
            SlopeSegment {
                high: from,
                low: to,
            }
        };
        segments.push(segment);
    }
    segments
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::RunoffError;
    use crate::face::FaceMembership;
    use crate::graph::{build, GraphConfig, ThresholdPolicy};
    use crate::solver::solve;

    struct OpenFace;
    impl FaceMembership for OpenFace {
        fn is_on_face(&self, _point: &Point3) -> bool {
            true
        }
    }

    fn found(length: f64) -> PathResult {
        PathResult {
            found: true,
            nearest_sink: None,
            path: Vec::new(),
            total_length: length,
            failure_reason: None,
        }
    }

    fn unfound() -> PathResult {
        PathResult {
            found: false,
            nearest_sink: None,
            path: Vec::new(),
            total_length: 0.0,
            failure_reason: Some("no path".into()),
        }
    }

    #[test]
    fn offset_is_slope_times_length() {
        let policy = SlopePolicy::from_percent(2.0).unwrap();
        let offset = elevation_offset(&found(10.0), &policy).unwrap();
        approx::assert_relative_eq!(offset, 0.2);
    }

    #[test]
    fn unreachable_yields_no_offset() {
        let policy = SlopePolicy::from_percent(2.0).unwrap();
        assert_eq!(elevation_offset(&unfound(), &policy), None);
    }

    #[test]
    fn zero_fallback_is_explicit_opt_in() {
        let policy = SlopePolicy::from_percent(2.0).unwrap().with_zero_fallback();
        assert_eq!(elevation_offset(&unfound(), &policy), Some(0.0));
    }

    #[test]
    fn non_positive_slope_rejected() {
        let err = SlopePolicy::from_percent(0.0).unwrap_err();
        assert!(matches!(
            err,
            RunoffError::Config(ConfigError::NonPositive { .. })
        ));
        assert!(SlopePolicy::from_percent(-1.5).is_err());
    }

    #[test]
    fn polyline_orients_high_endpoint_first() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 0.0, 0.4),
            Point3::new(10.0, 0.0, 0.1),
        ];
        let config = GraphConfig {
            threshold: ThresholdPolicy::Fixed(6.0),
            ..GraphConfig::default()
        };
        let graph = build(&points, &OpenFace, &config).unwrap();
        let ids: Vec<_> = graph.node_ids().collect();
        let results = solve(&graph, &[ids[0]]).unwrap();

        let segments = drainage_polyline(&results[ids[2]], &graph);
        assert_eq!(segments.len(), 2);
        // First leg climbs from the target to the middle ridge.
        assert!((segments[0].high.z - 0.4).abs() < 1e-12);
        assert!((segments[0].low.z - 0.1).abs() < 1e-12);
        // Second leg falls toward the drain.
        assert!((segments[1].high.z - 0.4).abs() < 1e-12);
        assert!((segments[1].low.z).abs() < 1e-12);
    }

    #[test]
    fn unfound_polyline_is_empty() {
        let graph = Graph::new();
        assert!(drainage_polyline(&unfound(), &graph).is_empty());
    }

    #[test]
    fn trivial_path_produces_no_segments() {
        let mut graph = Graph::new();
        let id = graph.add_node(Point3::new(0.0, 0.0, 0.0));
        let trivial = PathResult {
            found: true,
            nearest_sink: Some(id),
            path: vec![id],
            total_length: 0.0,
            failure_reason: None,
        };
        assert!(drainage_polyline(&trivial, &graph).is_empty());
    }
}
