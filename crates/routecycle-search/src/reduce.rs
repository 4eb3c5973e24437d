//! Cross-partition reduction: pick the partition with the longest cycle.
//!
//! Partitions are visited in [`PartitionedGraphs`] iteration order (first
//! seen in the input). A partition replaces the current best only when its
//! cycle is strictly longer, so on ties the earliest partition wins.

use std::fmt;

use routecycle_core::{PartitionKey, PartitionedGraphs};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::cycles::longest_cycle;

/// The winning partition and its longest cycle length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleResult {
    pub claim_id: String,
    pub status_code: String,
    pub cycle_length: usize,
}

impl CycleResult {
    #[must_use]
    pub fn new(key: &PartitionKey, cycle_length: usize) -> Self {
        Self {
            claim_id: key.claim_id.clone(),
            status_code: key.status_code.clone(),
            cycle_length,
        }
    }

    #[must_use]
    pub fn key(&self) -> PartitionKey {
        PartitionKey::new(self.claim_id.clone(), self.status_code.clone())
    }
}

impl fmt::Display for CycleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.claim_id, self.status_code, self.cycle_length
        )
    }
}

/// Longest cycle length of one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionLength {
    pub key: PartitionKey,
    pub nodes: usize,
    pub edges: usize,
    pub cycle_length: usize,
}

/// Search every partition, in iteration order.
#[must_use]
#[instrument(skip_all, fields(partitions = graphs.len()))]
pub fn partition_lengths(graphs: &PartitionedGraphs) -> Vec<PartitionLength> {
    graphs
        .iter()
        .map(|partition| {
            let cycle_length = longest_cycle(&partition.graph);
            debug!(
                partition = %partition.key,
                nodes = partition.graph.node_count(),
                edges = partition.graph.edge_count(),
                cycle_length,
                "searched partition"
            );
            PartitionLength {
                key: partition.key.clone(),
                nodes: partition.graph.node_count(),
                edges: partition.graph.edge_count(),
                cycle_length,
            }
        })
        .collect()
}

/// Fold per-partition lengths into the single best result.
///
/// Returns `None` when no partition has a cycle.
#[must_use]
pub fn select_best(lengths: &[PartitionLength]) -> Option<CycleResult> {
    let mut best: Option<&PartitionLength> = None;
    for entry in lengths {
        if entry.cycle_length > best.map_or(0, |b| b.cycle_length) {
            best = Some(entry);
        }
    }
    best.map(|b| CycleResult::new(&b.key, b.cycle_length))
}

/// Find the partition containing the longest routing cycle.
///
/// Returns `None` when no partition has a cycle.
#[must_use]
pub fn find_longest_routing_cycle(graphs: &PartitionedGraphs) -> Option<CycleResult> {
    select_best(&partition_lengths(graphs))
}
