//! Extraction of candidate surface nodes from raw geometry.
//!
//! Every sampling variant deduplicates through tolerance-quantized
//! [`PointKey`]s and returns nodes in key-sorted order, so repeated
//! runs over the same geometry always yield the same node sequence.

use std::collections::BTreeMap;

use tracing::warn;

use crate::math::quantize::PointKey;
use crate::math::{Point3, Segment3};

/// A mesh triangle as a corner triple.
pub type Triangle = [Point3; 3];

/// Raw geometry a drainage run can start from.
#[derive(Debug, Clone)]
pub enum NodeSource {
    /// Flat list of existing shape-editor vertices.
    Vertices(Vec<Point3>),
    /// Triangulated surface mesh.
    Mesh(Vec<Triangle>),
    /// Crease curves; every segment endpoint becomes a candidate node.
    Creases(Vec<Segment3>),
}

impl NodeSource {
    /// Samples the deduplicated node set for this source.
    #[must_use]
    pub fn sample(&self) -> Vec<Point3> {
        match self {
            Self::Vertices(points) => sample_vertices(points),
            Self::Mesh(triangles) => sample_mesh(triangles),
            Self::Creases(creases) => sample_crease_endpoints(creases),
        }
    }
}

/// Samples shape-editor vertices, grouping by plan-view (XY) location.
///
/// When several vertices stack on one XY location, the highest Z wins.
/// This is an explicit tie-break, not an accident of iteration order:
/// a slope run over an already-sloped roof must pick up the current
/// control point, which sits above its flat original.
#[must_use]
pub fn sample_vertices(vertices: &[Point3]) -> Vec<Point3> {
    let mut groups: BTreeMap<PointKey, Point3> = BTreeMap::new();
    for point in vertices {
        let key = PointKey::plan_view(point);
        match groups.get_mut(&key) {
            Some(existing) => {
                if point.z > existing.z {
                    warn!(
                        x = point.x,
                        y = point.y,
                        kept_z = point.z,
                        dropped_z = existing.z,
                        "stacked vertices collapsed, highest Z wins"
                    );
                    *existing = *point;
                }
            }
            None => {
                groups.insert(key, *point);
            }
        }
    }
    groups.into_values().collect()
}

/// Samples every triangle corner of a mesh, deduplicated in full XYZ.
#[must_use]
pub fn sample_mesh(triangles: &[Triangle]) -> Vec<Point3> {
    let mut nodes: BTreeMap<PointKey, Point3> = BTreeMap::new();
    for triangle in triangles {
        for corner in triangle {
            nodes.entry(PointKey::new(corner)).or_insert(*corner);
        }
    }
    nodes.into_values().collect()
}

/// Samples the endpoints of a set of crease segments.
#[must_use]
pub fn sample_crease_endpoints(creases: &[Segment3]) -> Vec<Point3> {
    let mut nodes: BTreeMap<PointKey, Point3> = BTreeMap::new();
    for crease in creases {
        nodes.entry(PointKey::new(&crease.a)).or_insert(crease.a);
        nodes.entry(PointKey::new(&crease.b)).or_insert(crease.b);
    }
    nodes.into_values().collect()
}

/// Extracts the boundary edges of a triangulated mesh.
///
/// Each triangle registers its three edges under an unordered key;
/// interior edges are shared by two triangles and cancel out, edges
/// seen exactly once form the mesh silhouette (outer boundary plus any
/// void boundaries). The result feeds
/// [`topology::classify`](crate::topology::classify).
#[must_use]
pub fn boundary_edges(triangles: &[Triangle]) -> Vec<Segment3> {
    let mut counts: BTreeMap<(PointKey, PointKey), (Segment3, usize)> = BTreeMap::new();
    for triangle in triangles {
        for i in 0..3 {
            let a = triangle[i];
            let b = triangle[(i + 1) % 3];
            let (ka, kb) = (PointKey::new(&a), PointKey::new(&b));
            if ka == kb {
                continue;
            }
            let key = if ka < kb { (ka, kb) } else { (kb, ka) };
            counts
                .entry(key)
                .and_modify(|(_, n)| *n += 1)
                .or_insert((Segment3::new(a, b), 1));
        }
    }
    counts
        .into_values()
        .filter_map(|(segment, n)| (n == 1).then_some(segment))
        .collect()
}
