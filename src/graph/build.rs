use tracing::debug;

use crate::error::{ConfigError, GeometryError, Result};
use crate::face::FaceMembership;
use crate::math::Point3;

use super::{Graph, NodeId};

/// Wide fixed connectivity threshold: 50 m expressed in feet.
///
/// Effectively "connect everything the face allows" on ordinary roofs.
pub const WIDE_FIXED_THRESHOLD: f64 = 164.042;

/// Narrow fixed connectivity threshold of one foot, for dense vertex
/// grids where only immediate neighbors should connect.
pub const UNIT_FIXED_THRESHOLD: f64 = 1.0;

/// Default uphill penalty factor.
///
/// An empirical constant, not a derived one: large enough that the
/// solver only routes a path uphill when no downhill-compatible route
/// exists at all. Tunable via [`GraphConfig::climb_penalty`].
pub const CLIMB_PENALTY_FACTOR: f64 = 100.0;

/// Adaptive threshold derivation parameters.
///
/// The threshold is `clamp(nominal x d, min x d, max x d)` where `d`
/// is the median nearest-neighbor distance, floored at an absolute
/// minimum. A fixed threshold fails on roofs of very different scale;
/// this rule keeps the graph connected without creating long-range
/// edges on sparse point sets. The multipliers are empirical defaults,
/// exposed as configuration rather than hard law.
///
/// Validation enforces `min <= nominal <= max`, so on a validated
/// policy the clamp in [`ThresholdPolicy::resolve`] never binds; it
/// only takes effect when `resolve` is called without going through
/// [`GraphConfig::validate`].
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveThreshold {
    /// Multiplier applied to the median nearest-neighbor distance.
    pub nominal_multiplier: f64,
    /// Lower clamp multiplier.
    pub min_multiplier: f64,
    /// Upper clamp multiplier.
    pub max_multiplier: f64,
    /// Absolute minimum threshold (0.5 ft, roughly 152 mm).
    pub floor: f64,
}

impl Default for AdaptiveThreshold {
    fn default() -> Self {
        Self {
            nominal_multiplier: 2.5,
            min_multiplier: 1.25,
            max_multiplier: 6.0,
            floor: 0.5,
        }
    }
}

/// Connectivity distance limit policy.
#[derive(Debug, Clone, Copy)]
pub enum ThresholdPolicy {
    /// Constant distance threshold.
    Fixed(f64),
    /// Threshold derived from the statistical spacing of the input.
    Adaptive(AdaptiveThreshold),
}

impl ThresholdPolicy {
    /// The wide fixed policy ([`WIDE_FIXED_THRESHOLD`]).
    #[must_use]
    pub fn wide() -> Self {
        Self::Fixed(WIDE_FIXED_THRESHOLD)
    }

    /// The one-foot fixed policy ([`UNIT_FIXED_THRESHOLD`]).
    #[must_use]
    pub fn unit() -> Self {
        Self::Fixed(UNIT_FIXED_THRESHOLD)
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Self::Fixed(value) => {
                if value <= 0.0 {
                    return Err(ConfigError::NonPositive {
                        parameter: "fixed threshold",
                        value,
                    }
                    .into());
                }
            }
            Self::Adaptive(adaptive) => {
                for (parameter, value) in [
                    ("nominal multiplier", adaptive.nominal_multiplier),
                    ("min multiplier", adaptive.min_multiplier),
                    ("max multiplier", adaptive.max_multiplier),
                    ("threshold floor", adaptive.floor),
                ] {
                    if value <= 0.0 {
                        return Err(ConfigError::NonPositive { parameter, value }.into());
                    }
                }
                if adaptive.min_multiplier > adaptive.nominal_multiplier
                    || adaptive.nominal_multiplier > adaptive.max_multiplier
                {
                    return Err(ConfigError::MultiplierOrder {
                        min: adaptive.min_multiplier,
                        nominal: adaptive.nominal_multiplier,
                        max: adaptive.max_multiplier,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Resolves the policy to a concrete distance for a point set.
    ///
    /// Fixed policies return their constant; adaptive policies derive
    /// the threshold from the median nearest-neighbor distance.
    #[must_use]
    pub fn resolve(&self, points: &[Point3]) -> f64 {
        match *self {
            Self::Fixed(value) => value,
            Self::Adaptive(adaptive) => {
                let median = median_nearest_neighbor(points);
                let scaled = (adaptive.nominal_multiplier * median).clamp(
                    adaptive.min_multiplier * median,
                    adaptive.max_multiplier * median,
                );
                scaled.max(adaptive.floor)
            }
        }
    }
}

/// Parameters of one adjacency build.
#[derive(Debug, Clone, Copy)]
pub struct GraphConfig {
    /// Connectivity threshold policy.
    pub threshold: ThresholdPolicy,
    /// Minimum node separation; pairs at or below this distance never
    /// connect (guards against zero-length edges between nodes that
    /// survived quantization but nearly coincide).
    pub min_separation: f64,
    /// Uphill penalty factor, or `None` to leave edge weights purely
    /// Euclidean.
    pub climb_penalty: Option<f64>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdPolicy::Adaptive(AdaptiveThreshold::default()),
            min_separation: 1e-6,
            climb_penalty: None,
        }
    }
}

impl GraphConfig {
    /// Enables the uphill penalty at its default factor
    /// ([`CLIMB_PENALTY_FACTOR`]).
    #[must_use]
    pub fn with_climb_penalty(mut self) -> Self {
        self.climb_penalty = Some(CLIMB_PENALTY_FACTOR);
        self
    }

    /// Validates all parameters.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for non-positive thresholds,
    /// multipliers, separations, or penalty factors.
    pub fn validate(&self) -> Result<()> {
        self.threshold.validate()?;
        if self.min_separation <= 0.0 {
            return Err(ConfigError::NonPositive {
                parameter: "minimum separation",
                value: self.min_separation,
            }
            .into());
        }
        if let Some(factor) = self.climb_penalty {
            if factor <= 0.0 {
                return Err(ConfigError::NonPositive {
                    parameter: "climb penalty factor",
                    value: factor,
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Builds the adjacency graph over a sampled node set.
///
/// Two nodes connect when their distance is within the resolved
/// threshold, above the minimum separation, and the connecting segment
/// stays on the face. O(n^2) pairwise over the node set; acceptable at
/// the tens-to-hundreds of points a roof produces, and deliberately
/// not spatially indexed.
///
/// # Errors
///
/// Returns a [`ConfigError`] for invalid parameters and
/// [`GeometryError::InsufficientNodes`] for fewer than two nodes.
pub fn build(points: &[Point3], face: &impl FaceMembership, config: &GraphConfig) -> Result<Graph> {
    config.validate()?;
    if points.len() < 2 {
        return Err(GeometryError::InsufficientNodes {
            needed: 2,
            got: points.len(),
        }
        .into());
    }

    let threshold = config.threshold.resolve(points);
    let mut graph = Graph::new();
    let ids: Vec<NodeId> = points.iter().map(|p| graph.add_node(*p)).collect();

    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let a = points[i];
            let b = points[j];
            let distance = (b - a).norm();
            if distance <= config.min_separation || distance > threshold {
                continue;
            }
            if !face.is_segment_on_face(&a, &b) {
                continue;
            }
            let (weight_ab, weight_ba) = directional_weights(&a, &b, distance, config);
            graph.connect(ids[i], ids[j], weight_ab, weight_ba);
        }
    }

    debug!(
        nodes = graph.len(),
        edges = graph.edge_count(),
        threshold,
        "built adjacency graph"
    );
    Ok(graph)
}

/// Per-direction edge weights: Euclidean distance, plus the climb
/// penalty on whichever direction gains height.
fn directional_weights(a: &Point3, b: &Point3, distance: f64, config: &GraphConfig) -> (f64, f64) {
    let Some(factor) = config.climb_penalty else {
        return (distance, distance);
    };
    let climb = b.z - a.z;
    if climb > 0.0 {
        (distance + climb * factor, distance)
    } else {
        (distance, distance - climb * factor)
    }
}

/// Median of each point's nearest-neighbor distance.
fn median_nearest_neighbor(points: &[Point3]) -> f64 {
    let mut nearest: Vec<f64> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            points
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, q)| (q - p).norm())
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    nearest.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = nearest.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        nearest[n / 2]
    } else {
        (nearest[n / 2 - 1] + nearest[n / 2]) * 0.5
    }
}
