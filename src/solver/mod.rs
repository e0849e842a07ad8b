//! Multi-sink shortest-path computation over the drainage graph.
//!
//! Two interchangeable algorithms live here: [`solve`] runs one
//! multi-source Dijkstra seeded with every drain at distance zero,
//! [`solve_per_target`] runs one single-source Dijkstra per target.
//! Both satisfy the same contract and produce identical nearest drains
//! and path lengths on a fixed graph, including the tie-break: when
//! two drains are equally near, the one earliest in drain-iteration
//! order wins.
//!
//! Path costs are accumulated in flow direction (node toward drain),
//! so a configured climb penalty charges segments that gain height on
//! the way down to the drain.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use slotmap::SecondaryMap;
use tracing::debug;

use crate::error::{Result, SolveError};
use crate::graph::{Graph, NodeId};

/// Shortest-path outcome for one target node.
///
/// Unreachable targets are reported here with `found = false`, never
/// as an `Err`: one stranded node must not abort the batch.
#[derive(Debug, Clone)]
pub struct PathResult {
    /// Whether a path to a drain exists.
    pub found: bool,
    /// The nearest drain, when found.
    pub nearest_sink: Option<NodeId>,
    /// Ordered node sequence from the target down to the drain;
    /// `path[0]` is the target, the last entry the drain.
    pub path: Vec<NodeId>,
    /// Accumulated path cost.
    pub total_length: f64,
    /// Human-readable reason when `found` is `false`.
    pub failure_reason: Option<String>,
}

impl PathResult {
    /// The zero-length path of a node that is itself a drain.
    fn trivial(node: NodeId) -> Self {
        Self {
            found: true,
            nearest_sink: Some(node),
            path: vec![node],
            total_length: 0.0,
            failure_reason: None,
        }
    }

    fn unreachable(sink_count: usize) -> Self {
        Self {
            found: false,
            nearest_sink: None,
            path: Vec::new(),
            total_length: 0.0,
            failure_reason: Some(format!("no path to any of the {sink_count} drain(s)")),
        }
    }

    /// Returns `true` if this is the trivial path of a drain node.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.found && self.path.len() == 1
    }
}

/// Heap entry: (accumulated distance, tie rank, node). In the
/// multi-source pass the rank is the seed position of the node's
/// drain; in the per-target pass it is a push sequence number that
/// makes equal-distance pops deterministic.
type Frontier = BinaryHeap<Reverse<(OrderedFloat<f64>, u64, NodeId)>>;

fn validated_sinks(graph: &Graph, sinks: &[NodeId]) -> Result<SecondaryMap<NodeId, ()>> {
    if sinks.is_empty() {
        return Err(SolveError::NoSinks.into());
    }
    let mut set = SecondaryMap::new();
    for &sink in sinks {
        if !graph.contains(sink) {
            return Err(SolveError::UnknownSink.into());
        }
        set.insert(sink, ());
    }
    Ok(set)
}

/// Computes every node's shortest path to its nearest drain with one
/// multi-source Dijkstra pass.
///
/// All drains are seeded at distance zero; relaxation walks edges in
/// reverse (drain outward) while accumulating flow-direction weights.
/// Drain nodes themselves receive a trivial zero-length path,
/// explicitly marked rather than omitted.
///
/// # Errors
///
/// Returns [`SolveError::NoSinks`] for an empty drain set and
/// [`SolveError::UnknownSink`] for a drain key the graph does not
/// contain. Keys carry only an arena index and version, so a key
/// minted by a different graph can alias a node here and pass the
/// check; drains must be keys issued by this graph.
pub fn solve(graph: &Graph, sinks: &[NodeId]) -> Result<SecondaryMap<NodeId, PathResult>> {
    let is_sink = validated_sinks(graph, sinks)?;

    // Label per settled node: (distance, seed rank of its drain).
    // Relaxing lexicographically over the pair resolves equal-length
    // paths toward the earliest-seeded drain, exactly as the
    // per-target pass does with its strict less-than sweep.
    let mut best: SecondaryMap<NodeId, (OrderedFloat<f64>, u64)> = SecondaryMap::new();
    let mut prev: SecondaryMap<NodeId, NodeId> = SecondaryMap::new();
    let mut root: SecondaryMap<NodeId, NodeId> = SecondaryMap::new();
    let mut frontier: Frontier = BinaryHeap::new();
    let mut next_rank: u64 = 0;

    for &sink in sinks {
        if best.contains_key(sink) {
            continue; // duplicate drain
        }
        best.insert(sink, (OrderedFloat(0.0), next_rank));
        root.insert(sink, sink);
        frontier.push(Reverse((OrderedFloat(0.0), next_rank, sink)));
        next_rank += 1;
    }

    while let Some(Reverse((d, rank, node))) = frontier.pop() {
        if best.get(node).is_some_and(|&label| (d, rank) > label) {
            continue; // stale entry
        }
        let node_root = root[node];
        for edge in graph.neighbors(node) {
            // Flow direction is neighbor -> node (toward the drain).
            let Some(weight) = graph.weight(edge.to, node) else {
                continue;
            };
            let candidate = (OrderedFloat(d.0 + weight), rank);
            if best.get(edge.to).is_none_or(|&label| candidate < label) {
                best.insert(edge.to, candidate);
                prev.insert(edge.to, node);
                root.insert(edge.to, node_root);
                frontier.push(Reverse((candidate.0, rank, edge.to)));
            }
        }
    }

    let mut results = SecondaryMap::new();
    let mut unreachable = 0usize;
    for node in graph.node_ids() {
        let result = if is_sink.contains_key(node) {
            PathResult::trivial(node)
        } else if let Some(&(length, _)) = best.get(node) {
            PathResult {
                found: true,
                nearest_sink: Some(root[node]),
                path: backtrack(node, &prev, &is_sink, graph.len()),
                total_length: length.0,
                failure_reason: None,
            }
        } else {
            unreachable += 1;
            PathResult::unreachable(sinks.len())
        };
        results.insert(node, result);
    }

    debug!(
        nodes = graph.len(),
        sinks = sinks.len(),
        unreachable,
        "multi-source drainage solve complete"
    );
    Ok(results)
}

/// Walks `prev` pointers from a settled node down to the drain.
fn backtrack(
    node: NodeId,
    prev: &SecondaryMap<NodeId, NodeId>,
    is_sink: &SecondaryMap<NodeId, ()>,
    cap: usize,
) -> Vec<NodeId> {
    let mut path = vec![node];
    let mut current = node;
    for _ in 0..cap {
        if is_sink.contains_key(current) {
            break;
        }
        let Some(&next) = prev.get(current) else {
            break;
        };
        path.push(next);
        current = next;
    }
    path
}

/// Computes the same result set as [`solve`], one single-source
/// Dijkstra per target.
///
/// Simpler to verify, slower to run; kept as the reference
/// implementation the multi-source pass is checked against.
///
/// # Errors
///
/// Same as [`solve`].
pub fn solve_per_target(
    graph: &Graph,
    sinks: &[NodeId],
) -> Result<SecondaryMap<NodeId, PathResult>> {
    let is_sink = validated_sinks(graph, sinks)?;

    let mut results = SecondaryMap::new();
    for node in graph.node_ids() {
        let result = if is_sink.contains_key(node) {
            PathResult::trivial(node)
        } else {
            single_target(graph, node, sinks)
        };
        results.insert(node, result);
    }
    Ok(results)
}

fn single_target(graph: &Graph, source: NodeId, sinks: &[NodeId]) -> PathResult {
    let mut dist: SecondaryMap<NodeId, f64> = SecondaryMap::new();
    let mut prev: SecondaryMap<NodeId, NodeId> = SecondaryMap::new();
    let mut frontier: Frontier = BinaryHeap::new();
    let mut seq: u64 = 0;

    dist.insert(source, 0.0);
    frontier.push(Reverse((OrderedFloat(0.0), seq, source)));
    seq += 1;

    while let Some(Reverse((OrderedFloat(d), _, node))) = frontier.pop() {
        if dist.get(node).is_some_and(|&best| d > best) {
            continue;
        }
        // Forward weights: traversal already runs in flow direction.
        for edge in graph.neighbors(node) {
            let candidate = d + edge.weight;
            if dist.get(edge.to).is_none_or(|&best| candidate < best) {
                dist.insert(edge.to, candidate);
                prev.insert(edge.to, node);
                frontier.push(Reverse((OrderedFloat(candidate), seq, edge.to)));
                seq += 1;
            }
        }
    }

    // First drain in iteration order wins ties (strict less-than).
    let mut best: Option<(NodeId, f64)> = None;
    for &sink in sinks {
        if let Some(&d) = dist.get(sink) {
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((sink, d));
            }
        }
    }

    let Some((sink, length)) = best else {
        return PathResult::unreachable(sinks.len());
    };

    // prev pointers run source -> sink; collect backwards and flip.
    let mut path = vec![sink];
    let mut current = sink;
    for _ in 0..graph.len() {
        if current == source {
            break;
        }
        let Some(&p) = prev.get(current) else {
            break;
        };
        path.push(p);
        current = p;
    }
    path.reverse();

    PathResult {
        found: true,
        nearest_sink: Some(sink),
        path,
        total_length: length,
        failure_reason: None,
    }
}
