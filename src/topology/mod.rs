//! Closed-loop tracing and outer/inner classification of boundary
//! edge sets.
//!
//! The classifier consumes raw boundary segments (typically the mesh
//! silhouette from [`sampler::boundary_edges`](crate::sampler::boundary_edges)
//! or host-picked boundary curves), traces them into closed loops in
//! the flattened XY plane, and declares the largest-area loop the
//! outer silhouette; every other loop is an inner void.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{GeometryError, Result};
use crate::math::polygon_2d::{perimeter, signed_area};
use crate::math::quantize::PointKey;
use crate::math::{Point2, Point3, Segment3};

/// A traced closed loop in the flattened XY plane.
///
/// The ring is ordered and implicitly closed: consecutive points share
/// an edge and the last point connects back to the first. A ring is
/// never stored with a duplicated closing point.
#[derive(Debug, Clone)]
pub struct Loop {
    /// Ordered ring of flattened points.
    pub ring: Vec<Point2>,
    /// Absolute enclosed area (shoelace).
    pub area: f64,
    /// Total ring length including the closing edge.
    pub perimeter: f64,
}

impl Loop {
    /// Number of edges in the loop (equal to the number of points,
    /// counting the implicit closing edge).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.ring.len()
    }
}

/// Result of classifying a boundary edge set.
#[derive(Debug, Clone)]
pub struct ClassifiedLoops {
    /// The loop enclosing the largest area: the roof silhouette.
    pub outer: Loop,
    /// All remaining loops: voids the graph must route around.
    pub inner: Vec<Loop>,
}

/// Traces a boundary edge set into closed loops and classifies them.
///
/// # Errors
///
/// Returns [`GeometryError::NoLoops`] for an empty edge set,
/// [`GeometryError::OpenEdges`] when any node does not have exactly
/// two incident edges, [`GeometryError::DegenerateLoop`] for loops of
/// fewer than three edges, and [`GeometryError::LoopTraceOverflow`]
/// if a walk fails to close within the iteration cap.
pub fn classify(edges: &[Segment3]) -> Result<ClassifiedLoops> {
    if edges.is_empty() {
        return Err(GeometryError::NoLoops.into());
    }

    let (points, edge_list) = flatten_edges(edges)?;
    let incident = incident_edges(points.len(), &edge_list);

    let open = incident.iter().filter(|e| e.len() != 2).count();
    if open > 0 {
        return Err(GeometryError::OpenEdges { count: open }.into());
    }

    let mut used = vec![false; edge_list.len()];
    let mut loops = Vec::new();

    for start_edge in 0..edge_list.len() {
        if used[start_edge] {
            continue;
        }
        let ring = trace_loop(start_edge, &points, &edge_list, &incident, &mut used)?;
        if ring.len() < 3 {
            return Err(GeometryError::DegenerateLoop { edges: ring.len() }.into());
        }
        let area = signed_area(&ring).abs();
        let length = perimeter(&ring);
        loops.push(Loop {
            ring,
            area,
            perimeter: length,
        });
    }

    // Largest area wins; ties keep the first-traced loop.
    let mut outer_idx = 0;
    for (i, l) in loops.iter().enumerate().skip(1) {
        if l.area > loops[outer_idx].area {
            outer_idx = i;
        }
    }
    let outer = loops.remove(outer_idx);

    debug!(
        outer_edges = outer.edge_count(),
        outer_area = outer.area,
        inner_loops = loops.len(),
        "classified boundary loops"
    );

    Ok(ClassifiedLoops {
        outer,
        inner: loops,
    })
}

/// Flattens segments to indexed 2D points, deduplicating endpoints by
/// quantized plan-view key.
fn flatten_edges(edges: &[Segment3]) -> Result<(Vec<Point2>, Vec<(usize, usize)>)> {
    let mut index: BTreeMap<PointKey, usize> = BTreeMap::new();
    let mut points: Vec<Point2> = Vec::new();
    let mut edge_list = Vec::with_capacity(edges.len());

    for edge in edges {
        let si = intern(&mut index, &mut points, &edge.a);
        let ei = intern(&mut index, &mut points, &edge.b);
        if si == ei {
            return Err(GeometryError::Degenerate(format!(
                "zero-length boundary edge at ({}, {})",
                edge.a.x, edge.a.y
            ))
            .into());
        }
        edge_list.push((si, ei));
    }
    Ok((points, edge_list))
}

fn intern(index: &mut BTreeMap<PointKey, usize>, points: &mut Vec<Point2>, p: &Point3) -> usize {
    let key = PointKey::plan_view(p);
    *index.entry(key).or_insert_with(|| {
        points.push(Point2::new(p.x, p.y));
        points.len() - 1
    })
}

fn incident_edges(point_count: usize, edge_list: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut incident = vec![Vec::new(); point_count];
    for (edge_idx, &(si, ei)) in edge_list.iter().enumerate() {
        incident[si].push(edge_idx);
        incident[ei].push(edge_idx);
    }
    incident
}

/// Walks one closed loop starting from the given edge, re-orienting
/// each traversed edge to leave the current node.
fn trace_loop(
    start_edge: usize,
    points: &[Point2],
    edge_list: &[(usize, usize)],
    incident: &[Vec<usize>],
    used: &mut [bool],
) -> Result<Vec<Point2>> {
    let cap = edge_list.len() + 1;
    let start_point = edge_list[start_edge].0;

    let mut ring = Vec::new();
    let mut current_point = start_point;
    let mut current_edge = start_edge;

    for _ in 0..cap {
        used[current_edge] = true;
        ring.push(points[current_point]);

        let (si, ei) = edge_list[current_edge];
        let next_point = if si == current_point { ei } else { si };
        if next_point == start_point {
            return Ok(ring);
        }

        // Degree is exactly 2, so exactly one unused edge remains here.
        let next_edge = incident[next_point]
            .iter()
            .copied()
            .find(|&e| !used[e])
            .ok_or(GeometryError::LoopTraceOverflow { cap })?;

        current_point = next_point;
        current_edge = next_edge;
    }

    Err(GeometryError::LoopTraceOverflow { cap }.into())
}

/// Finds corner nodes of a crease set: endpoints with exactly one
/// incident crease edge in the unflattened (full 3D) adjacency.
///
/// Corners are the natural drainage-path start points in the
/// crease-based variant. Returned in deterministic key order.
#[must_use]
pub fn corner_nodes(creases: &[Segment3]) -> Vec<Point3> {
    let mut counts: BTreeMap<PointKey, (Point3, usize)> = BTreeMap::new();
    for crease in creases {
        for endpoint in [&crease.a, &crease.b] {
            counts
                .entry(PointKey::new(endpoint))
                .and_modify(|(_, n)| *n += 1)
                .or_insert((*endpoint, 1));
        }
    }
    counts
        .into_values()
        .filter_map(|(point, n)| (n == 1).then_some(point))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::RunoffError;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn square_edges(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Segment3> {
        vec![
            Segment3::new(p(x0, y0), p(x1, y0)),
            Segment3::new(p(x1, y0), p(x1, y1)),
            Segment3::new(p(x1, y1), p(x0, y1)),
            Segment3::new(p(x0, y1), p(x0, y0)),
        ]
    }

    #[test]
    fn rectangle_classifies_as_single_outer() {
        let loops = classify(&square_edges(0.0, 0.0, 10.0, 6.0)).unwrap();
        assert_eq!(loops.outer.edge_count(), 4);
        assert!(loops.inner.is_empty());
        assert!((loops.outer.perimeter - 32.0).abs() < 1e-9);
        assert!((loops.outer.area - 60.0).abs() < 1e-9);
    }

    #[test]
    fn outer_and_void_classified_by_area() {
        // Edge order deliberately puts the small loop first.
        let mut edges = square_edges(7.5, 7.5, 12.5, 12.5);
        edges.extend(square_edges(0.0, 0.0, 20.0, 20.0));
        let loops = classify(&edges).unwrap();
        assert!((loops.outer.perimeter - 80.0).abs() < 1e-9);
        assert_eq!(loops.inner.len(), 1);
        assert!((loops.inner[0].perimeter - 20.0).abs() < 1e-9);
    }

    #[test]
    fn shuffled_edge_order_still_closes() {
        let mut edges = square_edges(0.0, 0.0, 10.0, 10.0);
        edges.swap(0, 2);
        edges.swap(1, 3);
        let loops = classify(&edges).unwrap();
        assert_eq!(loops.outer.edge_count(), 4);
    }

    #[test]
    fn open_edges_rejected() {
        let edges = vec![
            Segment3::new(p(0.0, 0.0), p(10.0, 0.0)),
            Segment3::new(p(10.0, 0.0), p(10.0, 10.0)),
        ];
        let err = classify(&edges).unwrap_err();
        assert!(matches!(
            err,
            RunoffError::Geometry(GeometryError::OpenEdges { .. })
        ));
    }

    #[test]
    fn two_edge_loop_rejected() {
        let edges = vec![
            Segment3::new(p(0.0, 0.0), p(5.0, 0.0)),
            Segment3::new(p(5.0, 0.0), p(0.0, 0.0)),
        ];
        let err = classify(&edges).unwrap_err();
        assert!(matches!(
            err,
            RunoffError::Geometry(GeometryError::DegenerateLoop { edges: 2 })
        ));
    }

    #[test]
    fn empty_input_rejected() {
        let err = classify(&[]).unwrap_err();
        assert!(matches!(
            err,
            RunoffError::Geometry(GeometryError::NoLoops)
        ));
    }

    #[test]
    fn zero_length_edge_rejected() {
        let edges = vec![Segment3::new(p(1.0, 1.0), p(1.0, 1.0))];
        let err = classify(&edges).unwrap_err();
        assert!(matches!(
            err,
            RunoffError::Geometry(GeometryError::Degenerate(_))
        ));
    }

    #[test]
    fn ring_is_closed_without_duplicate_point() {
        let loops = classify(&square_edges(0.0, 0.0, 4.0, 4.0)).unwrap();
        let ring = &loops.outer.ring;
        let first = ring[0];
        let last = ring[ring.len() - 1];
        // Distinct endpoints in storage; closure is the implicit edge.
        assert!((first - last).norm() > 1.0);
        assert_eq!(ring.len(), 4);
    }

    #[test]
    fn crease_path_corners() {
        let creases = vec![
            Segment3::new(Point3::new(0.0, 0.0, 1.0), Point3::new(5.0, 0.0, 0.5)),
            Segment3::new(Point3::new(5.0, 0.0, 0.5), Point3::new(10.0, 0.0, 1.0)),
        ];
        let corners = corner_nodes(&creases);
        assert_eq!(corners.len(), 2);
        assert!((corners[0].x).abs() < 1e-9);
        assert!((corners[1].x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn crease_loop_has_no_corners() {
        let corners = corner_nodes(&square_edges(0.0, 0.0, 3.0, 3.0));
        assert!(corners.is_empty());
    }
}
