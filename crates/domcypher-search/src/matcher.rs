//! LCA nearest-neighbour matcher.
//!
//! For every anchor each candidate is scored by hop distances to their lowest
//! common ancestor along primary-parent chains:
//!
//! - candidate is the LCA (it contains the anchor): `dist = ancestorDist =
//!   hops(anchor → candidate)`
//! - otherwise: `ancestorDist = hops(anchor → lca)` and
//!   `dist = max(hops(candidate → lca), ancestorDist)`
//!
//! Candidates are ranked by `(ancestorDist, dist, childCount desc)`; only the
//! ones tied with the best `(ancestorDist, dist)` survive.

use std::cmp::Reverse;

use domcypher_graph::{DomGraph, NodeIndex, SemanticLabel};
use domcypher_query::SearchPlan;
use serde::Serialize;
use tracing::{debug, info};

use crate::retriever::Anchor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedNode {
    #[serde(rename = "nodeId")]
    pub node_id: String,
    #[serde(rename = "ancestorDist")]
    pub ancestor_dist: usize,
    pub dist: usize,
    #[serde(rename = "childCount")]
    pub child_count: usize,
    #[serde(rename = "type")]
    pub node_type: Option<SemanticLabel>,
}

/// Ranked neighbours of one anchor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorMatches {
    #[serde(rename = "anchorId")]
    pub anchor_id: String,
    pub score: f64,
    pub snippet: String,
    pub matches: Vec<MatchedNode>,
}

pub struct GraphMatcher<'p> {
    plan: &'p SearchPlan,
}

impl<'p> GraphMatcher<'p> {
    pub fn new(plan: &'p SearchPlan) -> Self {
        Self { plan }
    }

    /// Nodes eligible as neighbours: carrying a target label, or all nodes
    /// when the plan names none.
    pub fn candidates(&self, graph: &DomGraph) -> Vec<NodeIndex> {
        let targets = &self.plan.target_types;
        graph
            .nodes()
            .filter(|(_, n)| targets.is_empty() || n.labels.intersects(targets))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Match anchors (already ranked) after applying the plan's skip and top-k.
    pub fn match_anchors(&self, graph: &DomGraph, anchors: &[Anchor]) -> Vec<AnchorMatches> {
        let candidates = self.candidates(graph);
        let selected: Vec<&Anchor> = anchors
            .iter()
            .skip(self.plan.skip_anchors)
            .take(self.plan.top_k_anchors)
            .collect();

        let results: Vec<AnchorMatches> = selected
            .into_iter()
            .map(|anchor| AnchorMatches {
                anchor_id: anchor.node_id.clone(),
                score: anchor.score,
                snippet: anchor.snippet.clone(),
                matches: self.nearest(graph, anchor.node, &candidates),
            })
            .collect();

        info!(
            "Matched {} anchors against {} candidates ({} neighbours)",
            results.len(),
            candidates.len(),
            results.iter().map(|r| r.matches.len()).sum::<usize>()
        );
        results
    }

    fn nearest(&self, graph: &DomGraph, anchor: NodeIndex, candidates: &[NodeIndex]) -> Vec<MatchedNode> {
        let mut scored: Vec<(NodeIndex, MatchedNode)> = candidates
            .iter()
            .filter_map(|&cand| Some((cand, self.score_pair(graph, anchor, cand)?)))
            .collect();
        scored.sort_by_key(|(_, m)| (m.ancestor_dist, m.dist, Reverse(m.child_count)));

        let Some(best) = scored.first().map(|(_, m)| (m.ancestor_dist, m.dist)) else {
            return Vec::new();
        };
        let mut matches: Vec<MatchedNode> = scored
            .into_iter()
            .filter(|(cand, m)| {
                (m.ancestor_dist, m.dist) == best
                    && (!self.plan.require_ancestor_inclusion || graph.is_ancestor(*cand, anchor))
            })
            .map(|(_, m)| m)
            .collect();
        matches.truncate(self.plan.top_k_neighbors);
        matches
    }

    /// `None` when the pair shares no ancestor (different trees of the forest).
    fn score_pair(&self, graph: &DomGraph, anchor: NodeIndex, cand: NodeIndex) -> Option<MatchedNode> {
        let ancestor = graph.lca(anchor, cand)?;
        let (ancestor_dist, dist) = if ancestor == cand {
            let d = graph.hops(anchor, ancestor)?;
            (d, d)
        } else {
            let node_dist = graph.hops(cand, ancestor)?;
            let ref_dist = graph.hops(anchor, ancestor)?;
            (ref_dist, node_dist.max(ref_dist))
        };

        let node = graph.node(cand)?;
        let targets = &self.plan.target_types;
        let node_type = if targets.is_empty() {
            node.labels.first()
        } else {
            node.labels.iter().find(|l| targets.contains(l))
        };
        debug!(
            "Pair {:?} ~ {}: ancestorDist {}, dist {}",
            anchor, node.id, ancestor_dist, dist
        );

        Some(MatchedNode {
            node_id: node.id.clone(),
            ancestor_dist,
            dist,
            child_count: graph.out_degree(cand),
            node_type,
        })
    }
}
