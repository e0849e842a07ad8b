//! Policy-parameterized drainage pipeline.
//!
//! The host repo this engine distills re-implemented the same pipeline
//! a dozen times, varying only the node source, the connectivity
//! threshold, and the output form. Here those three axes are injected
//! configuration on a single engine: sample, build the
//! boundary-respecting graph, solve toward the drains, map the
//! results.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::elevation::{drainage_polyline, elevation_offset, SlopePolicy, SlopeSegment};
use crate::error::{GeometryError, Result};
use crate::face::FaceMembership;
use crate::graph::{build, Graph, GraphConfig, NodeId};
use crate::math::quantize::PointKey;
use crate::math::Point3;
use crate::sampler::NodeSource;
use crate::solver::{solve, PathResult};

/// Which output form the engine produces per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMapping {
    /// Scalar elevation offsets for the document mutator.
    Elevation,
    /// Downhill-ordered polylines for annotation.
    Polyline,
}

/// Full engine configuration, passed as an explicit typed struct.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Adjacency build parameters.
    pub graph: GraphConfig,
    /// Slope output parameters.
    pub slope: SlopePolicy,
    /// Output form.
    pub mapping: OutputMapping,
}

/// Per-node output of one engine run.
#[derive(Debug, Clone)]
pub enum SlopeOutput {
    /// Elevation delta relative to the node's base elevation.
    Offset(f64),
    /// Flow polyline from the node down to its drain.
    Polyline(Vec<SlopeSegment>),
}

/// One node's complete outcome.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// Graph node identity.
    pub node: NodeId,
    /// Node position.
    pub point: Point3,
    /// Shortest-path result.
    pub result: PathResult,
    /// Mapped output; `None` for drains (nothing to move) and for
    /// unreachable targets without the zero fallback.
    pub output: Option<SlopeOutput>,
}

/// The {processed, skipped, failed} telemetry every host integration
/// needs to report.
#[derive(Debug, Clone, Default)]
pub struct SolveSummary {
    /// Targets that received an output.
    pub processed: usize,
    /// Drain nodes; trivially at elevation zero, nothing to apply.
    pub skipped: usize,
    /// Unreachable targets.
    pub failed: usize,
    /// Human-readable reason per failure.
    pub reasons: Vec<String>,
}

/// Complete result of one engine run.
#[derive(Debug)]
pub struct SlopeSolution {
    /// The adjacency graph the run was computed on; kept so callers
    /// can assert against the topology actually built.
    pub graph: Graph,
    /// Per-node outcomes, in graph node order.
    pub assignments: Vec<Assignment>,
    /// Run telemetry.
    pub summary: SolveSummary,
}

/// The drainage engine: pure, synchronous, no host state.
#[derive(Debug)]
pub struct SlopeEngine<F> {
    face: F,
    config: EngineConfig,
}

impl<F: FaceMembership> SlopeEngine<F> {
    /// Creates an engine over a face membership oracle.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) if the
    /// graph configuration is invalid; slope parameters are validated
    /// when the [`SlopePolicy`] is constructed.
    pub fn new(face: F, config: EngineConfig) -> Result<Self> {
        config.graph.validate()?;
        Ok(Self { face, config })
    }

    /// Runs the full pipeline: sample, build, solve, map.
    ///
    /// Drain points must coincide (within quantization tolerance) with
    /// sampled surface nodes.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] for insufficient nodes or a drain
    /// off the node set, and a [`SolveError`](crate::error::SolveError)
    /// for an empty drain set. Unreachable targets are not errors;
    /// they surface in the summary.
    pub fn execute(&self, source: &NodeSource, drains: &[Point3]) -> Result<SlopeSolution> {
        let nodes = source.sample();
        debug!(nodes = nodes.len(), drains = drains.len(), "sampled surface nodes");

        let graph = build(&nodes, &self.face, &self.config.graph)?;
        let sinks = match_drains(&graph, drains)?;
        let results = solve(&graph, &sinks)?;

        let mut assignments = Vec::with_capacity(graph.len());
        let mut summary = SolveSummary::default();

        for node in graph.node_ids() {
            let result = results[node].clone();
            let point = graph.point(node).copied().unwrap_or_else(Point3::origin);

            let output = if result.is_trivial() {
                summary.skipped += 1;
                None
            } else if result.found {
                summary.processed += 1;
                Some(self.map_output(&result, &graph))
            } else {
                summary.failed += 1;
                if let Some(reason) = &result.failure_reason {
                    summary.reasons.push(format!(
                        "node at ({:.3}, {:.3}, {:.3}): {reason}",
                        point.x, point.y, point.z
                    ));
                }
                // Only the explicit zero fallback produces output for
                // a stranded node, and only in elevation form.
                match (self.config.mapping, self.config.slope.zero_fallback) {
                    (OutputMapping::Elevation, true) => {
                        elevation_offset(&result, &self.config.slope).map(SlopeOutput::Offset)
                    }
                    _ => None,
                }
            };

            assignments.push(Assignment {
                node,
                point,
                result,
                output,
            });
        }

        info!(
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed,
            "drainage run complete"
        );

        Ok(SlopeSolution {
            graph,
            assignments,
            summary,
        })
    }

    fn map_output(&self, result: &PathResult, graph: &Graph) -> SlopeOutput {
        match self.config.mapping {
            OutputMapping::Elevation => {
                // Found results always map; the fallback only concerns
                // unfound ones.
                let offset =
                    elevation_offset(result, &self.config.slope).unwrap_or_default();
                SlopeOutput::Offset(offset)
            }
            OutputMapping::Polyline => SlopeOutput::Polyline(drainage_polyline(result, graph)),
        }
    }
}

/// Matches drain pick-points to graph nodes by quantized identity.
fn match_drains(graph: &Graph, drains: &[Point3]) -> Result<Vec<NodeId>> {
    let index: BTreeMap<PointKey, NodeId> = graph
        .node_ids()
        .filter_map(|id| graph.point(id).map(|p| (PointKey::new(p), id)))
        .collect();

    let mut sinks = Vec::with_capacity(drains.len());
    for drain in drains {
        let Some(&id) = index.get(&PointKey::new(drain)) else {
            return Err(GeometryError::Degenerate(format!(
                "drain point ({}, {}, {}) does not coincide with any surface node",
                drain.x, drain.y, drain.z
            ))
            .into());
        };
        sinks.push(id);
    }
    Ok(sinks)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::RunoffError;
    use crate::face::RegionFace;
    use crate::graph::ThresholdPolicy;
    use crate::math::Point2;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn square_region(size: f64) -> RegionFace {
        RegionFace::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(size, 0.0),
                Point2::new(size, size),
                Point2::new(0.0, size),
            ],
            Vec::new(),
        )
    }

    fn square_config(mapping: OutputMapping) -> EngineConfig {
        EngineConfig {
            graph: GraphConfig {
                // Sides connect, diagonals stay out.
                threshold: ThresholdPolicy::Fixed(12.0),
                ..GraphConfig::default()
            },
            slope: SlopePolicy::from_percent(2.0).unwrap(),
            mapping,
        }
    }

    fn square_corners() -> NodeSource {
        NodeSource::Vertices(vec![
            p(0.0, 0.0, 0.0),
            p(10.0, 0.0, 0.0),
            p(10.0, 10.0, 0.0),
            p(0.0, 10.0, 0.0),
        ])
    }

    #[test]
    fn square_roof_elevation_offsets() {
        let engine =
            SlopeEngine::new(square_region(10.0), square_config(OutputMapping::Elevation))
                .unwrap();
        let solution = engine
            .execute(&square_corners(), &[p(0.0, 0.0, 0.0)])
            .unwrap();

        // Assert against the graph actually built: 4 side edges only.
        assert_eq!(solution.graph.edge_count(), 4);

        let offset_at = |x: f64, y: f64| -> f64 {
            let a = solution
                .assignments
                .iter()
                .find(|a| (a.point.x - x).abs() < 1e-9 && (a.point.y - y).abs() < 1e-9)
                .unwrap();
            match a.output {
                Some(SlopeOutput::Offset(o)) => o,
                _ => panic!("expected offset output"),
            }
        };

        assert!((offset_at(10.0, 0.0) - 0.2).abs() < 1e-9);
        assert!((offset_at(0.0, 10.0) - 0.2).abs() < 1e-9);
        // Opposite corner routes along two sides: 0.02 x 20.
        assert!((offset_at(10.0, 10.0) - 0.4).abs() < 1e-9);

        assert_eq!(solution.summary.processed, 3);
        assert_eq!(solution.summary.skipped, 1);
        assert_eq!(solution.summary.failed, 0);
    }

    #[test]
    fn polyline_mapping_produces_downhill_segments() {
        let engine =
            SlopeEngine::new(square_region(10.0), square_config(OutputMapping::Polyline))
                .unwrap();
        let solution = engine
            .execute(&square_corners(), &[p(0.0, 0.0, 0.0)])
            .unwrap();

        let far = solution
            .assignments
            .iter()
            .find(|a| (a.point.x - 10.0).abs() < 1e-9 && (a.point.y - 10.0).abs() < 1e-9)
            .unwrap();
        let Some(SlopeOutput::Polyline(segments)) = &far.output else {
            panic!("expected polyline output");
        };
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn drain_off_surface_rejected() {
        let engine =
            SlopeEngine::new(square_region(10.0), square_config(OutputMapping::Elevation))
                .unwrap();
        let err = engine
            .execute(&square_corners(), &[p(3.0, 3.0, 0.0)])
            .unwrap_err();
        assert!(matches!(
            err,
            RunoffError::Geometry(GeometryError::Degenerate(_))
        ));
    }

    #[test]
    fn stranded_cluster_lands_in_summary() {
        let source = NodeSource::Vertices(vec![
            p(0.0, 0.0, 0.0),
            p(5.0, 0.0, 0.0),
            p(60.0, 0.0, 0.0),
            p(65.0, 0.0, 0.0),
        ]);
        let config = EngineConfig {
            graph: GraphConfig {
                threshold: ThresholdPolicy::Fixed(10.0),
                ..GraphConfig::default()
            },
            slope: SlopePolicy::from_percent(1.0).unwrap(),
            mapping: OutputMapping::Elevation,
        };
        let engine = SlopeEngine::new(square_region(100.0), config).unwrap();
        let solution = engine.execute(&source, &[p(0.0, 0.0, 0.0)]).unwrap();

        assert_eq!(solution.summary.processed, 1);
        assert_eq!(solution.summary.skipped, 1);
        assert_eq!(solution.summary.failed, 2);
        assert_eq!(solution.summary.reasons.len(), 2);
        assert!(solution.summary.reasons[0].contains("no path"));
    }

    #[test]
    fn zero_fallback_assigns_offsets_to_stranded_nodes() {
        let source = NodeSource::Vertices(vec![
            p(0.0, 0.0, 0.0),
            p(5.0, 0.0, 0.0),
            p(60.0, 0.0, 0.0),
        ]);
        let config = EngineConfig {
            graph: GraphConfig {
                threshold: ThresholdPolicy::Fixed(10.0),
                ..GraphConfig::default()
            },
            slope: SlopePolicy::from_percent(1.0).unwrap().with_zero_fallback(),
            mapping: OutputMapping::Elevation,
        };
        let engine = SlopeEngine::new(square_region(100.0), config).unwrap();
        let solution = engine.execute(&source, &[p(0.0, 0.0, 0.0)]).unwrap();

        let stranded = solution
            .assignments
            .iter()
            .find(|a| (a.point.x - 60.0).abs() < 1e-9)
            .unwrap();
        assert!(!stranded.result.found);
        assert!(matches!(stranded.output, Some(SlopeOutput::Offset(o)) if o.abs() < 1e-12));
        // Still reported as failed; the fallback is output policy, not
        // success.
        assert_eq!(solution.summary.failed, 1);
    }
}
