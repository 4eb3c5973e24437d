//! Longest simple cycle search for a single routing graph.
//!
//! # Cycle Length
//!
//! A cycle's length is its edge count. A self-loop `A → A` is a cycle of
//! length 1; `A → B → A` has length 2. Parallel edges never make a cycle
//! longer, since a simple cycle visits each node once.
//!
//! # Search
//!
//! The search is exhaustive (exponential in the worst case). Two facts keep
//! it tractable on real routing data:
//!
//! - Every simple cycle lies inside one strongly connected component, so each
//!   SCC is searched on its own and acyclic parts are never explored.
//! - Every cycle has a lowest-ranked member within its SCC. A search that
//!   starts at the member ranked `i` only walks members ranked above `i`,
//!   so each cycle is explored from one start instead of from every member.
//!
//! A search stops as soon as it finds a cycle through every member of the
//! SCC, since nothing longer exists there.
//!
//! The DFS uses an explicit frame stack, so long routing chains cannot
//! overflow the call stack.

use fixedbitset::FixedBitSet;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, Neighbors, NodeIndex};
use routecycle_core::RouteGraph;
use tracing::{instrument, trace};

const UNASSIGNED: usize = usize::MAX;

/// Length of the longest simple cycle in `graph`, or 0 if it has none.
#[must_use]
#[instrument(level = "trace", skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn longest_cycle(graph: &RouteGraph) -> usize {
    let g = graph.graph();
    if g.node_count() == 0 {
        return 0;
    }

    let components = kosaraju_scc(g);

    // Component id and rank within that component, indexed by node.
    let mut component_of = vec![UNASSIGNED; g.node_count()];
    let mut rank = vec![0_usize; g.node_count()];
    for (id, component) in components.iter().enumerate() {
        for (pos, node) in component.iter().enumerate() {
            component_of[node.index()] = id;
            rank[node.index()] = pos;
        }
    }

    let mut on_path = FixedBitSet::with_capacity(g.node_count());
    let mut best = 0;

    for (id, component) in components.iter().enumerate() {
        if component.len() <= best {
            continue;
        }

        let found = match component.as_slice() {
            [] => 0,
            [node] => usize::from(g.contains_edge(*node, *node)),
            members => {
                let limit = members.len();
                let mut local = 0;
                for &start in members {
                    let start_rank = rank[start.index()];
                    let allowed = |n: NodeIndex| {
                        component_of[n.index()] == id && rank[n.index()] > start_rank
                    };
                    local = local.max(search_from(g, start, allowed, limit, &mut on_path));
                    if local == limit {
                        break;
                    }
                }
                local
            }
        };

        if found > 0 {
            trace!(component = id, members = component.len(), found, "cycle in component");
        }
        best = best.max(found);
    }

    best
}

/// Length of the longest simple cycle through `start`, or 0 if there is none
/// or `start` is not in the graph.
#[must_use]
pub fn longest_cycle_from(graph: &RouteGraph, start: &str) -> usize {
    let Some(start) = graph.node_index(start) else {
        return 0;
    };
    let g = graph.graph();
    let mut on_path = FixedBitSet::with_capacity(g.node_count());
    search_from(g, start, |_| true, g.node_count(), &mut on_path)
}

/// Depth-first search for the longest simple cycle that returns to `start`.
///
/// Only nodes accepted by `allowed` are entered (`start` is always on the
/// path). Stops early once a cycle of `limit` edges is found. `on_path` must
/// be clear on entry and is left clear on return.
fn search_from<F>(
    g: &DiGraph<String, ()>,
    start: NodeIndex,
    allowed: F,
    limit: usize,
    on_path: &mut FixedBitSet,
) -> usize
where
    F: Fn(NodeIndex) -> bool,
{
    let mut best = 0;

    // Each frame: (node, its remaining outgoing neighbors).
    // A frame at height `k` means the current path has `k - 1` edges.
    let mut stack: Vec<(NodeIndex, Neighbors<'_, ()>)> = vec![(start, g.neighbors(start))];
    on_path.insert(start.index());

    while let Some((_, neighbors)) = stack.last_mut() {
        let Some(next) = neighbors.next() else {
            if let Some((done, _)) = stack.pop() {
                on_path.set(done.index(), false);
            }
            continue;
        };

        if next == start {
            // Closing edge: path edges plus this one.
            best = best.max(stack.len());
            if best >= limit {
                break;
            }
        } else if allowed(next) && !on_path.contains(next.index()) {
            on_path.insert(next.index());
            stack.push((next, g.neighbors(next)));
        }
    }

    for (node, _) in stack {
        on_path.set(node.index(), false);
    }

    best
}
