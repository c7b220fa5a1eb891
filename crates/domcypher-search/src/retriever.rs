//! Text retriever: scores payload text against the plan's query.

use std::cmp::Ordering;

use domcypher_graph::{DomGraph, NodeIndex};
use domcypher_query::{MatchKind, TextMatch};
use serde::Serialize;
use tracing::{debug, info};

/// A node whose payload matched the query; the origin of a neighbour search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anchor {
    #[serde(skip)]
    pub node: NodeIndex,
    #[serde(rename = "nodeId")]
    pub node_id: String,
    pub score: f64,
    pub snippet: String,
}

pub struct TextRetriever<'p> {
    text_match: &'p TextMatch,
    window: usize,
}

impl<'p> TextRetriever<'p> {
    pub fn new(text_match: &'p TextMatch, window: usize) -> Self {
        Self { text_match, window }
    }

    /// Score every eligible payload node. Best first; ties keep discovery order.
    pub fn retrieve(&self, graph: &DomGraph) -> Vec<Anchor> {
        let tm = self.text_match;
        let mut scanned = 0usize;
        let mut anchors: Vec<Anchor> = graph
            .nodes()
            .filter(|(_, n)| tm.anchor_types.is_empty() || n.labels.intersects(&tm.anchor_types))
            .filter_map(|(idx, node)| {
                let text = tm.field.read(node.payload.as_ref()?)?;
                scanned += 1;
                let (score, snippet) =
                    score_text(text, &tm.query, tm.match_kind, tm.case_insensitive, self.window)?;
                debug!("Anchor {} scored {:.3}", node.id, score);
                Some(Anchor {
                    node: idx,
                    node_id: node.id.clone(),
                    score,
                    snippet,
                })
            })
            .collect();

        anchors.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        info!(
            "Retrieved {} anchors for {:?} ({} payloads scanned)",
            anchors.len(),
            tm.query,
            scanned
        );
        anchors
    }
}

/// Score `text` against `query`. `None` when the score would be zero.
///
/// `exact` scores 1 on equality. `contains` scores
/// `chars(query) / chars(text)`, favouring short, specific hits. The snippet
/// keeps `window` characters either side of the first occurrence.
pub fn score_text(
    text: &str,
    query: &str,
    kind: MatchKind,
    case_insensitive: bool,
    window: usize,
) -> Option<(f64, String)> {
    let (text, query) = if case_insensitive {
        (text.to_lowercase(), query.to_lowercase())
    } else {
        (text.to_string(), query.to_string())
    };

    let score = match kind {
        MatchKind::Exact if text == query => 1.0,
        MatchKind::Exact => 0.0,
        MatchKind::Contains if text.contains(&query) => {
            let text_len = text.chars().count();
            if text_len == 0 {
                0.0
            } else {
                query.chars().count() as f64 / text_len as f64
            }
        }
        MatchKind::Contains => 0.0,
    };
    if score <= 0.0 {
        return None;
    }

    let byte_start = text.find(&query)?;
    let char_start = text[..byte_start].chars().count();
    let from = char_start.saturating_sub(window);
    let to = char_start + query.chars().count() + window;
    let excerpt: String = text.chars().skip(from).take(to - from).collect();
    Some((score, format!("...{}...", excerpt)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::graph_of;
    use domcypher_graph::SemanticLabel;
    use domcypher_query::PayloadField;

    fn text_match(query: &str, kind: MatchKind) -> TextMatch {
        TextMatch {
            query: query.into(),
            case_insensitive: true,
            match_kind: kind,
            field: PayloadField::Text,
            anchor_types: Vec::new(),
        }
    }

    #[test]
    fn test_score_contains_prefers_short_text() {
        let (short, _) = score_text("Risks", "risks", MatchKind::Contains, true, 50).unwrap();
        let (long, _) = score_text("Key risks ahead", "risks", MatchKind::Contains, true, 50).unwrap();
        assert_eq!(short, 1.0);
        assert!((long - 5.0 / 15.0).abs() < 1e-9);
        assert!(score_text("Nothing here", "risks", MatchKind::Contains, true, 50).is_none());
    }

    #[test]
    fn test_score_case_policy() {
        assert!(score_text("About", "about", MatchKind::Exact, true, 50).is_some());
        assert!(score_text("About", "about", MatchKind::Exact, false, 50).is_none());
        assert!(score_text("About us", "about", MatchKind::Exact, true, 50).is_none());
        assert!(score_text("", "", MatchKind::Contains, true, 50).is_none());
    }

    #[test]
    fn test_snippet_window() {
        let text = format!("{}needle{}", "a".repeat(80), "b".repeat(80));
        let (_, snippet) = score_text(&text, "needle", MatchKind::Contains, false, 50).unwrap();
        assert_eq!(snippet, format!("...{}needle{}...", "a".repeat(50), "b".repeat(50)));

        // clamped at both ends
        let (_, snippet) = score_text("Ünïcode needle", "NEEDLE", MatchKind::Contains, true, 3).unwrap();
        assert_eq!(snippet, "...de needle...");
    }

    #[test]
    fn test_retrieve_orders_by_score_then_discovery() {
        let graph = graph_of(&[
            ("body_1", None, &[], None),
            ("p_1", Some("body_1"), &[], Some("Key risks ahead")),
            ("p_2", Some("body_1"), &[], Some("Risks")),
            ("p_3", Some("body_1"), &[], Some("More risks ahead")),
            ("p_4", Some("body_1"), &[], Some("risks")),
            ("p_5", Some("body_1"), &[], Some("Unrelated")),
        ]);
        let tm = text_match("risks", MatchKind::Contains);
        let anchors = TextRetriever::new(&tm, 50).retrieve(&graph);
        let ids: Vec<&str> = anchors.iter().map(|a| a.node_id.as_str()).collect();
        assert_eq!(ids, vec!["p_2", "p_4", "p_1", "p_3"]);
    }

    #[test]
    fn test_retrieve_filters_anchor_types_and_field() {
        let mut graph = graph_of(&[
            ("body_1", None, &[], None),
            ("h2_1", Some("body_1"), &[SemanticLabel::Title], Some("Pricing")),
            ("p_1", Some("body_1"), &[], Some("Pricing")),
            ("a_1", Some("body_1"), &[SemanticLabel::Link], Some("Plans")),
        ]);
        let mut tm = text_match("pricing", MatchKind::Exact);
        tm.anchor_types = vec![SemanticLabel::Title];
        let anchors = TextRetriever::new(&tm, 50).retrieve(&graph);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].node_id, "h2_1");

        let a = graph.index_of("a_1").unwrap();
        graph.node_mut(a).unwrap().payload.as_mut().unwrap().href = Some("/pricing".into());
        let mut tm = text_match("pricing", MatchKind::Contains);
        tm.field = PayloadField::Href;
        let anchors = TextRetriever::new(&tm, 50).retrieve(&graph);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].node_id, "a_1");
        assert_eq!(anchors[0].snippet, ".../pricing...");
    }
}
