//! DOM graph backend using petgraph.
//!
//! Nodes live in a `StableDiGraph` so removals during pruning keep every other
//! index valid and iteration stays in insertion order. Each edge carries its
//! insertion sequence number; "children in order" and "first predecessor"
//! are both resolved through it.

use std::collections::{HashMap, HashSet};

use domcypher_core::{Error, GraphError, Result};
use petgraph::algo::dijkstra;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::node::{DomNode, SemanticLabel};

/// In-memory DOM graph. Single writer during build/prune/classify, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct DomGraph {
    graph: StableDiGraph<DomNode, u64>,
    node_index: HashMap<String, NodeIndex>,
    next_edge_seq: u64,
}

impl DomGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Ids must be unique within one graph.
    pub fn add_node(&mut self, node: DomNode) -> Result<NodeIndex> {
        if self.node_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id).into());
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
        Ok(idx)
    }

    /// Add a parent → child edge. Re-adding an existing edge is a no-op.
    pub fn add_edge(&mut self, parent: NodeIndex, child: NodeIndex) -> bool {
        if self.graph.find_edge(parent, child).is_some() {
            return false;
        }
        self.graph.add_edge(parent, child, self.next_edge_seq);
        self.next_edge_seq += 1;
        true
    }

    pub fn remove_node(&mut self, idx: NodeIndex) -> Option<DomNode> {
        let node = self.graph.remove_node(idx)?;
        self.node_index.remove(&node.id);
        Some(node)
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&DomNode> {
        self.graph.node_weight(idx)
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> Option<&mut DomNode> {
        self.graph.node_weight_mut(idx)
    }

    pub fn contains(&self, idx: NodeIndex) -> bool {
        self.graph.contains_node(idx)
    }

    /// Resolve a node id to its index.
    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.node_index.get(id).copied()
    }

    /// Look up a node by id, reporting unknown ids as `Error::Lookup`.
    pub fn lookup(&self, id: &str) -> Result<&DomNode> {
        self.index_of(id)
            .and_then(|idx| self.node(idx))
            .ok_or_else(|| Error::Lookup(id.to_string()))
    }

    /// Node indices in insertion order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &DomNode)> + '_ {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx).map(|n| (idx, n)))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All edges as (parent id, child id) pairs, in insertion order.
    pub fn edge_ids(&self) -> Vec<(String, String)> {
        let mut edges: Vec<(u64, NodeIndex, NodeIndex)> = self
            .graph
            .edge_references()
            .map(|e| (*e.weight(), e.source(), e.target()))
            .collect();
        edges.sort_by_key(|(seq, _, _)| *seq);
        edges
            .into_iter()
            .filter_map(|(_, s, t)| Some((self.node(s)?.id.clone(), self.node(t)?.id.clone())))
            .collect()
    }

    fn ordered_neighbors(&self, idx: NodeIndex, dir: Direction) -> Vec<NodeIndex> {
        let mut edges: Vec<(u64, NodeIndex)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| {
                let other = match dir {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (*e.weight(), other)
            })
            .collect();
        edges.sort_by_key(|(seq, _)| *seq);
        edges.into_iter().map(|(_, n)| n).collect()
    }

    /// Successors in edge-insertion order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.ordered_neighbors(idx, Direction::Outgoing)
    }

    /// Predecessors in edge-insertion order.
    pub fn parents(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.ordered_neighbors(idx, Direction::Incoming)
    }

    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    /// Nodes flagged as roots, in node order.
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.nodes()
            .filter(|(_, n)| n.is_root)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// First root in node order; used wherever a single root is required.
    pub fn designated_root(&self) -> std::result::Result<NodeIndex, GraphError> {
        if self.node_count() == 0 {
            return Err(GraphError::EmptyGraph);
        }
        self.nodes()
            .find(|(_, n)| n.is_root)
            .map(|(idx, _)| idx)
            .ok_or(GraphError::NoRoot)
    }

    /// Re-point every node's primary parent at its earliest surviving predecessor.
    pub fn refresh_primary_parents(&mut self) {
        let firsts: Vec<(NodeIndex, Option<NodeIndex>)> = self
            .node_indices()
            .map(|idx| (idx, self.parents(idx).first().copied()))
            .collect();
        for (idx, parent) in firsts {
            if let Some(node) = self.graph.node_weight_mut(idx) {
                node.primary_parent = parent;
            }
        }
    }

    /// `idx` followed by its primary-parent chain up to a root.
    pub fn ancestors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = Vec::new();
        let mut current = Some(idx);
        while let Some(at) = current {
            // a chain longer than the graph means a cycle
            if chain.len() > self.node_count() {
                break;
            }
            chain.push(at);
            current = self.node(at).and_then(|n| n.primary_parent);
        }
        chain
    }

    /// Lowest common ancestor over primary-parent chains.
    ///
    /// `None` when the nodes sit in different trees of the forest.
    pub fn lca(&self, a: NodeIndex, b: NodeIndex) -> Option<NodeIndex> {
        if a == b {
            return Some(a);
        }
        let above_a: HashSet<NodeIndex> = self.ancestors(a).into_iter().collect();
        self.ancestors(b).into_iter().find(|n| above_a.contains(n))
    }

    /// Hop count walking primary parents from `down` until `up` is reached.
    pub fn hops(&self, down: NodeIndex, up: NodeIndex) -> Option<usize> {
        self.ancestors(down).iter().position(|n| *n == up)
    }

    /// True when `ancestor` lies on `node`'s primary-parent chain.
    pub fn is_ancestor(&self, ancestor: NodeIndex, node: NodeIndex) -> bool {
        self.lca(ancestor, node) == Some(ancestor)
    }

    /// Shortest-path hop distance from `root` to every reachable node.
    pub fn depths_from(&self, root: NodeIndex) -> HashMap<NodeIndex, usize> {
        dijkstra(&self.graph, root, None, |_| 1usize)
    }

    pub fn nodes_with_label(&self, label: SemanticLabel) -> Vec<NodeIndex> {
        self.nodes()
            .filter(|(_, n)| n.labels.contains(label))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Get graph statistics.
    pub fn stats(&self) -> GraphStats {
        let mut label_counts: HashMap<String, usize> = HashMap::new();
        for (_, node) in self.nodes() {
            for label in node.labels.iter() {
                *label_counts.entry(label.to_string()).or_default() += 1;
            }
        }
        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            root_count: self.roots().len(),
            payload_count: self.nodes().filter(|(_, n)| n.has_payload()).count(),
            label_counts,
        }
    }

    /// Render a node and its descendants as indented text.
    pub fn render(&self, id: &str) -> Result<String> {
        let start = self.index_of(id).ok_or_else(|| Error::Lookup(id.to_string()))?;
        let mut out = String::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(start, 0usize)];

        while let Some((idx, depth)) = stack.pop() {
            if !visited.insert(idx) {
                continue;
            }
            let Some(node) = self.node(idx) else {
                continue;
            };
            let shown = node.payload.as_ref().map(|p| {
                if node.is_anchor() {
                    p.href.clone().unwrap_or_default()
                } else if node.element_type.eq_ignore_ascii_case("img") {
                    p.alt.clone().unwrap_or_default()
                } else {
                    p.text.clone()
                }
            });
            out.push_str(&"    ".repeat(depth));
            out.push_str(&node.element_type);
            if !node.class.is_empty() {
                out.push_str(&format!(" .{}", node.class.join(".")));
            }
            if !node.labels.is_empty() {
                let labels: Vec<&str> = node.labels.iter().map(|l| l.as_str()).collect();
                out.push_str(&format!(" <{}>", labels.join(",")));
            }
            out.push_str(&format!(" [{}]", node.id));
            if let Some(shown) = shown {
                out.push_str(&format!(" / {}", shown));
            }
            out.push('\n');

            for child in self.children(idx).into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }

        Ok(out)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    #[serde(rename = "nodeCount")]
    pub node_count: usize,
    #[serde(rename = "edgeCount")]
    pub edge_count: usize,
    #[serde(rename = "rootCount")]
    pub root_count: usize,
    #[serde(rename = "payloadCount")]
    pub payload_count: usize,
    #[serde(rename = "labelCounts")]
    pub label_counts: HashMap<String, usize>,
}
