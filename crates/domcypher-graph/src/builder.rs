//! HTML → graph construction.
//!
//! Depth-first over the parsed element tree with an explicit stack. Denied
//! elements are dropped together with their subtree; bare text becomes a
//! synthetic `p` node. Node ids hash `<tag>_<counter>_<classes>` where the
//! counter is per tag name across the whole document (not per parent):
//! grid homogeneity compares id prefixes, so this scheme must not change.

use std::collections::HashMap;

use domcypher_core::{BuilderConfig, Result};
use petgraph::stable_graph::NodeIndex;
use scraper::{ElementRef, Html, Node};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::graph::DomGraph;
use crate::node::{DomNode, LabelSet, Payload};

const TEXT_TAG: &str = "p";
const ID_MODULUS: u64 = 100_000_000;

/// Pending traversal work.
enum Frame<'a> {
    Element(ElementRef<'a>, Option<NodeIndex>),
    Text(&'a str, Option<NodeIndex>),
}

/// Builds the raw (unpruned) DOM graph.
pub struct GraphBuilder<'c> {
    config: &'c BuilderConfig,
}

impl<'c> GraphBuilder<'c> {
    pub fn new(config: &'c BuilderConfig) -> Self {
        Self { config }
    }

    /// Parse `html` and build its graph.
    pub fn build(&self, html: &str) -> Result<DomGraph> {
        let document = Html::parse_document(html);
        let mut graph = DomGraph::new();
        let mut tag_counter: HashMap<String, usize> = HashMap::new();
        let mut item_index = 0usize;

        // The document element itself is never a node; its children are the entry points.
        let mut stack = Self::child_frames(document.root_element(), None);

        while let Some(frame) = stack.pop() {
            let (tag, classes, payload, parent, expand) = match frame {
                Frame::Text(text, parent) => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() || self.config.is_denied_text(&trimmed.to_lowercase()) {
                        continue;
                    }
                    let payload = Payload::text(collapse_whitespace(text));
                    (TEXT_TAG.to_string(), Vec::new(), Some(payload), parent, None)
                }
                Frame::Element(element, parent) => {
                    if !self.is_valid_element(element) {
                        debug!("Dropping element <{}>", element.value().name());
                        continue;
                    }
                    let tag = element.value().name().to_string();
                    let classes: Vec<String> = element
                        .value()
                        .attr("class")
                        .map(|c| c.split_whitespace().map(str::to_string).collect())
                        .unwrap_or_default();
                    let payload = element_payload(element);
                    let expand = is_expandable(element).then_some(element);
                    (tag, classes, payload, parent, expand)
                }
            };

            let counter = tag_counter.entry(tag.clone()).or_insert(0);
            let element_name = format!("{}_{}_{:?}", tag, counter, classes);
            *counter += 1;

            let node = DomNode {
                id: format!("{}_{:08}", tag, hash_element_name(&element_name)),
                element_type: tag,
                element_name,
                item_index,
                class: classes,
                payload,
                is_root: parent.is_none(),
                labels: LabelSet::new(),
                primary_parent: parent,
            };
            item_index += 1;

            let idx = graph.add_node(node)?;
            if let Some(parent) = parent {
                graph.add_edge(parent, idx);
            }

            if let Some(element) = expand {
                stack.extend(Self::child_frames(element, Some(idx)));
            }
        }

        info!(
            "Built DOM graph: {} nodes, {} edges, {} roots",
            graph.node_count(),
            graph.edge_count(),
            graph.roots().len()
        );

        Ok(graph)
    }

    /// Child frames of `element`, reversed so the stack pops them in document order.
    fn child_frames<'a>(element: ElementRef<'a>, parent: Option<NodeIndex>) -> Vec<Frame<'a>> {
        let mut frames: Vec<Frame<'a>> = element
            .children()
            .filter_map(|child| match child.value() {
                Node::Text(text) => Some(Frame::Text(&**text, parent)),
                Node::Element(_) => ElementRef::wrap(child).map(|e| Frame::Element(e, parent)),
                _ => None,
            })
            .collect();
        frames.reverse();
        frames
    }

    fn is_valid_element(&self, element: ElementRef<'_>) -> bool {
        if self.config.is_denied_tag(element.value().name()) {
            return false;
        }
        let text: String = element.text().collect();
        !self.config.is_denied_text(&text.trim().to_lowercase())
    }
}

fn has_element_children(element: ElementRef<'_>) -> bool {
    element.children().any(|c| c.value().is_element())
}

/// Leaves and anchors carry a payload; anchors keep theirs even when wrapping markup.
fn element_payload(element: ElementRef<'_>) -> Option<Payload> {
    let is_anchor = element.value().name().eq_ignore_ascii_case("a");
    if has_element_children(element) && !is_anchor {
        return None;
    }
    let text: String = element.text().collect();
    let attr = |name: &str| element.value().attr(name).map(str::to_string);
    Some(if is_anchor {
        Payload {
            text: collapse_whitespace(&text),
            href: attr("href"),
            alt: None,
            src: None,
        }
    } else {
        Payload {
            text: collapse_whitespace(&text),
            href: None,
            alt: attr("alt"),
            src: attr("src"),
        }
    })
}

/// Whether traversal descends into `element`'s children.
///
/// A `p` with only text is already a paragraph leaf and is not re-wrapped.
fn is_expandable(element: ElementRef<'_>) -> bool {
    if element.children().next().is_none() {
        return false;
    }
    !(element.value().name() == TEXT_TAG && !has_element_children(element))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// SHA-256 of the element name reduced modulo 10^8.
fn hash_element_name(name: &str) -> u64 {
    Sha256::digest(name.as_bytes())
        .iter()
        .fold(0u64, |acc, b| (acc * 256 + u64::from(*b)) % ID_MODULUS)
}
