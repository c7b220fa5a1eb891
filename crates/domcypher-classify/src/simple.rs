//! Single-node classifiers: headings, links and link lists.

use domcypher_core::Result;
use domcypher_graph::{DomGraph, NodeIndex, Payload, SemanticLabel};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::Classifier;

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^h[1-6]$").unwrap());

/// Labels `h1`..`h6` nodes as titles.
///
/// A heading without its own payload gets one built from its children's
/// text, joined with single spaces in edge order.
pub struct TitleClassifier;

impl Classifier for TitleClassifier {
    fn name(&self) -> &'static str {
        "title"
    }

    fn classify(&self, graph: &mut DomGraph) -> Result<usize> {
        let headings: Vec<NodeIndex> = graph
            .nodes()
            .filter(|(_, n)| HEADING_RE.is_match(&n.element_type))
            .map(|(idx, _)| idx)
            .collect();

        let mut labelled = 0;
        for idx in headings {
            let synthesized = match graph.node(idx) {
                Some(node) if node.payload.is_none() => Some(child_text(graph, idx)),
                _ => None,
            };
            if let Some(node) = graph.node_mut(idx) {
                if let Some(text) = synthesized {
                    debug!("Synthesized title payload for {}: {:?}", node.id, text);
                    node.payload = Some(Payload::text(text));
                }
                if node.labels.push(SemanticLabel::Title) {
                    labelled += 1;
                }
            }
        }
        Ok(labelled)
    }
}

fn child_text(graph: &DomGraph, idx: NodeIndex) -> String {
    graph
        .children(idx)
        .into_iter()
        .filter_map(|c| graph.node(c)?.payload.as_ref().map(|p| p.text.clone()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Labels anchor elements as links.
pub struct LinkClassifier;

impl Classifier for LinkClassifier {
    fn name(&self) -> &'static str {
        "link"
    }

    fn classify(&self, graph: &mut DomGraph) -> Result<usize> {
        let anchors: Vec<NodeIndex> = graph
            .nodes()
            .filter(|(_, n)| n.is_anchor())
            .map(|(idx, _)| idx)
            .collect();

        let mut labelled = 0;
        for idx in anchors {
            if let Some(node) = graph.node_mut(idx) {
                if node.labels.prepend(SemanticLabel::Link) {
                    labelled += 1;
                }
            }
        }
        Ok(labelled)
    }
}

/// Labels nodes whose children are all anchors. A childless node never qualifies.
pub struct LinkListClassifier;

impl Classifier for LinkListClassifier {
    fn name(&self) -> &'static str {
        "linklist"
    }

    fn classify(&self, graph: &mut DomGraph) -> Result<usize> {
        let lists: Vec<NodeIndex> = graph
            .node_indices()
            .filter(|&idx| {
                let children = graph.children(idx);
                !children.is_empty()
                    && children
                        .iter()
                        .all(|&c| graph.node(c).is_some_and(|n| n.is_anchor()))
            })
            .collect();

        let mut labelled = 0;
        for idx in lists {
            if let Some(node) = graph.node_mut(idx) {
                if node.labels.push(SemanticLabel::LinkList) {
                    labelled += 1;
                }
            }
        }
        Ok(labelled)
    }
}
