//! Partitioned routing graph model.
//!
//! # Overview
//!
//! Every routing record names an edge `source → destination` and the
//! partition it belongs to. A partition is identified by the pair
//! `(claim_id, status_code)`; edges from different partitions never interact.
//!
//! ```text
//! A|B|C1|S1  ─┐
//! B|C|C1|S1  ─┼─▶ PartitionKey(C1, S1) ─▶ RouteGraph { A → B, B → C, C → A }
//! C|A|C1|S1  ─┘
//! X|Y|C2|S2  ───▶ PartitionKey(C2, S2) ─▶ RouteGraph { X → Y }
//! ```
//!
//! ## Parallel Edges
//!
//! Repeated records are kept as parallel edges. Each is a distinct traversal
//! option during cycle search, so nothing is deduplicated here.
//!
//! ## Iteration Order
//!
//! [`PartitionedGraphs`] iterates partitions in the order their keys were
//! first seen. Cross-partition reductions rely on this for tie-breaking.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

// ---------------------------------------------------------------------------
// PartitionKey
// ---------------------------------------------------------------------------

/// The `(claim_id, status_code)` pair scoping one routing graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PartitionKey {
    pub claim_id: String,
    pub status_code: String,
}

impl PartitionKey {
    #[must_use]
    pub fn new(claim_id: impl Into<String>, status_code: impl Into<String>) -> Self {
        Self {
            claim_id: claim_id.into(),
            status_code: status_code.into(),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.claim_id, self.status_code)
    }
}

// ---------------------------------------------------------------------------
// RouteGraph
// ---------------------------------------------------------------------------

/// A directed routing graph for a single partition.
///
/// Nodes are opaque routing node ids. An edge `A → B` means a record routed
/// from `A` to `B`. Nodes seen only as destinations are present but have no
/// outgoing edges.
#[derive(Debug, Clone, Default)]
pub struct RouteGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl RouteGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(source, destination)` pairs, in order.
    #[must_use]
    pub fn from_edges<'a, I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut graph = Self::new();
        for (source, destination) in edges {
            graph.add_edge(source, destination);
        }
        graph
    }

    /// Append `source → destination`, adding either endpoint on first sight.
    ///
    /// Parallel edges are preserved.
    pub fn add_edge(&mut self, source: &str, destination: &str) {
        let from = self.intern(source);
        let to = self.intern(destination);
        self.graph.add_edge(from, to, ());
    }

    fn intern(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.node_map.insert(id.to_string(), idx);
        idx
    }

    /// The underlying petgraph graph.
    #[must_use]
    pub const fn graph(&self) -> &DiGraph<String, ()> {
        &self.graph
    }

    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    #[must_use]
    pub fn node_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Destinations of `id` in record order, parallel edges repeated.
    ///
    /// Returns an empty list for unknown nodes and dead ends.
    #[must_use]
    pub fn destinations(&self, id: &str) -> Vec<&str> {
        let Some(idx) = self.node_index(id) else {
            return Vec::new();
        };
        // petgraph yields the most recently added edge first.
        let mut out: Vec<&str> = self
            .graph
            .neighbors(idx)
            .filter_map(|n| self.node_id(n))
            .collect();
        out.reverse();
        out
    }
}

// ---------------------------------------------------------------------------
// PartitionedGraphs
// ---------------------------------------------------------------------------

/// One partition's key and graph.
#[derive(Debug, Clone)]
pub struct PartitionGraph {
    pub key: PartitionKey,
    pub graph: RouteGraph,
}

/// All partition graphs of one input, in first-seen key order.
#[derive(Debug, Clone, Default)]
pub struct PartitionedGraphs {
    partitions: Vec<PartitionGraph>,
    index: HashMap<PartitionKey, usize>,
}

impl PartitionedGraphs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `source → destination` to the graph for `key`, creating the
    /// partition on first occurrence.
    pub fn add_edge(&mut self, key: PartitionKey, source: &str, destination: &str) {
        let slot = if let Some(&slot) = self.index.get(&key) {
            slot
        } else {
            let slot = self.partitions.len();
            self.index.insert(key.clone(), slot);
            self.partitions.push(PartitionGraph {
                key,
                graph: RouteGraph::new(),
            });
            slot
        };
        self.partitions[slot].graph.add_edge(source, destination);
    }

    #[must_use]
    pub fn get(&self, key: &PartitionKey) -> Option<&RouteGraph> {
        self.index.get(key).map(|&slot| &self.partitions[slot].graph)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Total edges across all partitions.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.partitions.iter().map(|p| p.graph.edge_count()).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PartitionGraph> {
        self.partitions.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PartitionKey> {
        self.partitions.iter().map(|p| &p.key)
    }
}

impl<'a> IntoIterator for &'a PartitionedGraphs {
    type Item = &'a PartitionGraph;
    type IntoIter = std::slice::Iter<'a, PartitionGraph>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
