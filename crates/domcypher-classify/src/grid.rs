//! Grid detection: containers of uniform repeated children.
//!
//! Payload nodes are clustered by their hop distance from the designated
//! root. Every pair inside a cluster votes for its lowest common ancestor;
//! an ancestor becomes a grid when its direct children all share one tag
//! prefix and one first label.
//!
//! The vote count (incidence) is reported and logged but does not decide
//! anything: acceptance rests on homogeneity alone.

use std::collections::{BTreeMap, HashSet};

use domcypher_core::Result;
use domcypher_graph::{DomGraph, NodeIndex, SemanticLabel};
use serde::Serialize;
use tracing::{debug, warn};

use crate::Classifier;

/// An LCA that collected at least one pair vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCandidate {
    #[serde(rename = "nodeId")]
    pub node_id: String,
    pub incidence: usize,
    pub homogeneous: bool,
}

pub struct GridClassifier;

impl GridClassifier {
    /// Tally LCA votes per depth cluster and test each ancestor for homogeneity.
    ///
    /// Candidates come back in node order.
    pub fn candidates(&self, graph: &DomGraph) -> Result<Vec<(NodeIndex, GridCandidate)>> {
        let root = graph.designated_root()?;
        let depths = graph.depths_from(root);

        let mut clusters: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
        for (idx, node) in graph.nodes().filter(|(_, n)| n.has_payload()) {
            match depths.get(&idx) {
                Some(&depth) => clusters.entry(depth).or_default().push(idx),
                None => warn!("Payload node {} is unreachable from the designated root", node.id),
            }
        }

        let mut incidence: BTreeMap<NodeIndex, usize> = BTreeMap::new();
        for members in clusters.values() {
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    if let Some(ancestor) = graph.lca(a, b) {
                        *incidence.entry(ancestor).or_default() += 1;
                    }
                }
            }
        }

        Ok(incidence
            .into_iter()
            .filter_map(|(idx, votes)| {
                let node = graph.node(idx)?;
                Some((
                    idx,
                    GridCandidate {
                        node_id: node.id.clone(),
                        incidence: votes,
                        homogeneous: has_homogeneous_children(graph, idx),
                    },
                ))
            })
            .collect())
    }
}

impl Classifier for GridClassifier {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn classify(&self, graph: &mut DomGraph) -> Result<usize> {
        let candidates = self.candidates(graph)?;

        let mut labelled = 0;
        for (idx, candidate) in candidates {
            debug!(
                "Grid candidate {} (incidence {}, homogeneous {})",
                candidate.node_id, candidate.incidence, candidate.homogeneous
            );
            if !candidate.homogeneous {
                continue;
            }
            if let Some(node) = graph.node_mut(idx) {
                if node.labels.prepend(SemanticLabel::Grid) {
                    labelled += 1;
                }
            }
        }
        Ok(labelled)
    }
}

/// Children share one tag prefix and one first label (absent counts as its own value).
fn has_homogeneous_children(graph: &DomGraph, idx: NodeIndex) -> bool {
    let children: Vec<_> = graph
        .children(idx)
        .into_iter()
        .filter_map(|c| graph.node(c))
        .collect();

    let prefixes: HashSet<&str> = children.iter().map(|n| n.tag_prefix()).collect();
    let first_labels: HashSet<Option<SemanticLabel>> =
        children.iter().map(|n| n.labels.first()).collect();

    prefixes.len() == 1 && first_labels.len() == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::graph_of;
    use domcypher_core::{Error, GraphError};

    fn grids(graph: &DomGraph) -> Vec<String> {
        graph
            .nodes_with_label(SemanticLabel::Grid)
            .into_iter()
            .map(|idx| graph.node(idx).unwrap().id.clone())
            .collect()
    }

    #[test]
    fn test_homogeneous_list_is_grid() {
        let mut graph = graph_of(
            &[
                ("body_1", None),
                ("ul_1", Some("body_1")),
                ("li_1", Some("ul_1")),
                ("li_2", Some("ul_1")),
                ("li_3", Some("ul_1")),
            ],
            &["li_1", "li_2", "li_3"],
        );
        let candidates = GridClassifier.candidates(&graph).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].1.node_id, "ul_1");
        assert_eq!(candidates[0].1.incidence, 3);

        assert_eq!(GridClassifier.classify(&mut graph).unwrap(), 1);
        assert_eq!(grids(&graph), vec!["ul_1"]);
    }

    #[test]
    fn test_mixed_children_are_not_grid() {
        let mut graph = graph_of(
            &[
                ("body_1", None),
                ("ul_1", Some("body_1")),
                ("li_1", Some("ul_1")),
                ("li_2", Some("ul_1")),
                ("div_1", Some("ul_1")),
            ],
            &["li_1", "li_2", "div_1"],
        );
        assert_eq!(GridClassifier.classify(&mut graph).unwrap(), 0);
        assert!(grids(&graph).is_empty());
    }

    #[test]
    fn test_first_labels_must_agree() {
        let mut graph = graph_of(
            &[
                ("body_1", None),
                ("ul_1", Some("body_1")),
                ("li_1", Some("ul_1")),
                ("li_2", Some("ul_1")),
            ],
            &["li_1", "li_2"],
        );
        let li = graph.index_of("li_2").unwrap();
        graph.node_mut(li).unwrap().labels.push(SemanticLabel::Title);

        GridClassifier.classify(&mut graph).unwrap();
        assert!(grids(&graph).is_empty());
    }

    #[test]
    fn test_card_container_is_grid_but_cards_are_not() {
        let mut graph = graph_of(
            &[
                ("body_1", None),
                ("section_1", Some("body_1")),
                ("div_1", Some("section_1")),
                ("h3_1", Some("div_1")),
                ("p_1", Some("div_1")),
                ("div_2", Some("section_1")),
                ("h3_2", Some("div_2")),
                ("p_2", Some("div_2")),
            ],
            &["h3_1", "p_1", "h3_2", "p_2"],
        );
        GridClassifier.classify(&mut graph).unwrap();
        assert_eq!(grids(&graph), vec!["section_1"]);

        let candidates = GridClassifier.candidates(&graph).unwrap();
        let section = candidates.iter().find(|(_, c)| c.node_id == "section_1").unwrap();
        // h3_1/h3_2, h3_1/p_2, p_1/h3_2, p_1/p_2
        assert_eq!(section.1.incidence, 4);
        let card = candidates.iter().find(|(_, c)| c.node_id == "div_1").unwrap();
        assert!(!card.1.homogeneous);
    }

    #[test]
    fn test_unreachable_payloads_are_skipped() {
        let mut graph = graph_of(
            &[
                ("body_1", None),
                ("p_1", Some("body_1")),
                ("aside_1", None),
                ("li_1", Some("aside_1")),
                ("li_2", Some("aside_1")),
            ],
            &["p_1", "li_1", "li_2"],
        );
        assert_eq!(GridClassifier.classify(&mut graph).unwrap(), 0);
        assert!(grids(&graph).is_empty());
    }

    #[test]
    fn test_grid_requires_root() {
        let mut empty = DomGraph::new();
        let err = GridClassifier.classify(&mut empty).unwrap_err();
        assert!(matches!(err, Error::Graph(GraphError::EmptyGraph)));

        let mut rootless = graph_of(&[("div_1", None)], &["div_1"]);
        let idx = rootless.index_of("div_1").unwrap();
        rootless.node_mut(idx).unwrap().is_root = false;
        let err = GridClassifier.classify(&mut rootless).unwrap_err();
        assert!(matches!(err, Error::Graph(GraphError::NoRoot)));
    }

    #[test]
    fn test_grid_is_idempotent() {
        let mut graph = graph_of(
            &[
                ("body_1", None),
                ("ol_1", Some("body_1")),
                ("li_1", Some("ol_1")),
                ("li_2", Some("ol_1")),
            ],
            &["li_1", "li_2"],
        );
        assert_eq!(GridClassifier.classify(&mut graph).unwrap(), 1);
        assert_eq!(GridClassifier.classify(&mut graph).unwrap(), 0);
        assert_eq!(graph.lookup("ol_1").unwrap().labels.len(), 1);
    }
}
