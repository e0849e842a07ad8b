//! Boundary-aware adjacency graph over sampled surface nodes.

mod build;

pub use build::{
    build, AdaptiveThreshold, GraphConfig, ThresholdPolicy, CLIMB_PENALTY_FACTOR,
    UNIT_FIXED_THRESHOLD, WIDE_FIXED_THRESHOLD,
};

use slotmap::{SecondaryMap, SlotMap};

use crate::math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a node in the drainage graph.
    pub struct NodeId;
}

/// Data associated with a graph node. Never mutated after creation;
/// solve results are returned separately, not written back.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// The 3D position of the node.
    pub point: Point3,
}

/// A directed half of an undirected graph edge.
///
/// Both directions always exist with the same Euclidean base weight;
/// when a climb penalty is configured the uphill direction carries the
/// extra cost, so the two halves may differ in `weight`.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    /// The neighbor this half-edge points at.
    pub to: NodeId,
    /// Traversal cost in this direction.
    pub weight: f64,
}

/// Adjacency graph owned by one drainage solve.
///
/// Nodes live in a slotmap arena; adjacency lists hold no self-loops
/// and no parallel edges, and are symmetric by construction.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: SlotMap<NodeId, NodeData>,
    adjacency: SecondaryMap<NodeId, Vec<Edge>>,
    order: Vec<NodeId>,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node and returns its ID.
    pub fn add_node(&mut self, point: Point3) -> NodeId {
        let id = self.nodes.insert(NodeData { point });
        self.adjacency.insert(id, Vec::new());
        self.order.push(id);
        id
    }

    /// Returns the position of a node, if it exists.
    #[must_use]
    pub fn point(&self, id: NodeId) -> Option<&Point3> {
        self.nodes.get(id).map(|n| &n.point)
    }

    /// Returns `true` if the node belongs to this graph.
    ///
    /// Keys carry only an arena index and version, so a key minted by
    /// a different graph can alias a node in this one and pass this
    /// check. Membership is only meaningful for keys issued by `self`.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Adjacency list of a node; empty for unknown nodes.
    #[must_use]
    pub fn neighbors(&self, id: NodeId) -> &[Edge] {
        self.adjacency.get(id).map_or(&[], Vec::as_slice)
    }

    /// Directed traversal cost from `from` to `to`, if the edge exists.
    #[must_use]
    pub fn weight(&self, from: NodeId, to: NodeId) -> Option<f64> {
        self.neighbors(from)
            .iter()
            .find(|e| e.to == to)
            .map(|e| e.weight)
    }

    /// Iterates node IDs in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum::<usize>() / 2
    }

    /// Connects two nodes with per-direction weights.
    ///
    /// Callers guarantee `a != b` and that the pair is not already
    /// connected; the builder's pairwise loop visits each unordered
    /// pair once.
    pub(crate) fn connect(&mut self, a: NodeId, b: NodeId, weight_ab: f64, weight_ba: f64) {
        if let Some(list) = self.adjacency.get_mut(a) {
            list.push(Edge {
                to: b,
                weight: weight_ab,
            });
        }
        if let Some(list) = self.adjacency.get_mut(b) {
            list.push(Edge {
                to: a,
                weight: weight_ba,
            });
        }
    }
}
