//! Structural pruning of empty leaves and pass-through nodes.
//!
//! Each pass chooses its candidates from the graph as it stands when the pass
//! starts, then removes them one by one; later removals see the edges rewired
//! by earlier ones. Removing an empty leaf can turn its parent into a bridge,
//! so passes repeat until one removes nothing. A pruned graph is therefore a
//! fixed point: pruning it again changes nothing.

use domcypher_core::{GraphError, PrunerConfig, Result};
use petgraph::stable_graph::NodeIndex;
use serde::Serialize;
use tracing::{debug, info};

use crate::graph::DomGraph;

/// Result of pruning, summed over all passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    #[serde(rename = "emptyLeaves")]
    pub empty_leaves: usize,
    pub bridges: usize,
    pub removed: usize,
    pub roots: usize,
    /// Passes that removed at least one node.
    pub passes: usize,
}

/// Removes non-informative structure from a freshly built graph.
pub struct GraphPruner<'c> {
    config: &'c PrunerConfig,
}

impl<'c> GraphPruner<'c> {
    pub fn new(config: &'c PrunerConfig) -> Self {
        Self { config }
    }

    /// Prune to a fixed point, then re-elect roots and primary parents.
    pub fn prune(&self, graph: &mut DomGraph) -> Result<PruneReport> {
        let mut report = PruneReport::default();

        // every productive pass removes a node, so this is bounded by the node count
        while self.pass(graph, &mut report)? > 0 {
            report.passes += 1;
        }

        let orphans: Vec<NodeIndex> = graph
            .node_indices()
            .filter(|&idx| graph.in_degree(idx) == 0)
            .collect();
        for idx in orphans {
            if let Some(node) = graph.node_mut(idx) {
                node.is_root = true;
            }
        }
        graph.refresh_primary_parents();
        report.roots = graph.roots().len();

        info!(
            "Pruned graph in {} passes: removed {} ({} empty leaves, {} bridges), {} nodes left, {} roots",
            report.passes,
            report.removed,
            report.empty_leaves,
            report.bridges,
            graph.node_count(),
            report.roots
        );

        Ok(report)
    }

    /// One pass over the current candidates. Returns how many nodes it removed.
    fn pass(&self, graph: &mut DomGraph, report: &mut PruneReport) -> Result<usize> {
        let candidates: Vec<(NodeIndex, String)> = graph
            .nodes()
            .filter(|(_, node)| !self.config.keeps(&node.element_type))
            .filter_map(|(idx, node)| {
                if is_empty_leaf(graph, idx) {
                    report.empty_leaves += 1;
                } else if is_bridge(graph, idx) {
                    report.bridges += 1;
                } else {
                    return None;
                }
                Some((idx, node.id.clone()))
            })
            .collect();

        let mut removed_here = 0;
        for (idx, id) in candidates {
            let removed = graph
                .node(idx)
                .cloned()
                .ok_or_else(|| GraphError::MissingNode(id.clone()))?;
            let parents = graph.parents(idx);
            let children = graph.children(idx);

            for &parent in &parents {
                for &child in &children {
                    graph.add_edge(parent, child);
                }
            }
            for &child in &children {
                let node = graph
                    .node_mut(child)
                    .ok_or_else(|| GraphError::MissingNode(id.clone()))?;
                let mut class = removed.class.clone();
                class.append(&mut node.class);
                node.class = class;
                node.is_root |= removed.is_root;
            }

            debug!(
                "Pruned {} ({} parents, {} children)",
                id,
                parents.len(),
                children.len()
            );
            graph.remove_node(idx);
            removed_here += 1;
        }

        report.removed += removed_here;
        Ok(removed_here)
    }
}

fn is_empty_leaf(graph: &DomGraph, idx: NodeIndex) -> bool {
    graph.node(idx).is_some_and(|n| n.payload.is_none()) && graph.out_degree(idx) == 0
}

/// In-degree equals out-degree: the node only passes structure through.
fn is_bridge(graph: &DomGraph, idx: NodeIndex) -> bool {
    graph.in_degree(idx) == graph.out_degree(idx)
}
