//! Node attributes: identity, payload and semantic labels.

use std::str::FromStr;

use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Semantic label attached by a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticLabel {
    Title,
    Link,
    LinkList,
    Grid,
}

impl SemanticLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Link => "link",
            Self::LinkList => "linklist",
            Self::Grid => "grid",
        }
    }
}

impl std::fmt::Display for SemanticLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticLabel {
    type Err = String;

    /// Accepts query spellings such as `Grid`, `TITLE`, `LinkList` or `link_list`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "title" => Ok(Self::Title),
            "link" => Ok(Self::Link),
            "linklist" => Ok(Self::LinkList),
            "grid" => Ok(Self::Grid),
            _ => Err(s.to_string()),
        }
    }
}

/// Ordered, duplicate-free set of semantic labels.
///
/// Order matters: the grid homogeneity check compares first labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(Vec<SemanticLabel>);

impl LabelSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert at the front. Returns false if the label was already present.
    pub fn prepend(&mut self, label: SemanticLabel) -> bool {
        if self.contains(label) {
            return false;
        }
        self.0.insert(0, label);
        true
    }

    /// Insert at the back. Returns false if the label was already present.
    pub fn push(&mut self, label: SemanticLabel) -> bool {
        if self.contains(label) {
            return false;
        }
        self.0.push(label);
        true
    }

    pub fn contains(&self, label: SemanticLabel) -> bool {
        self.0.contains(&label)
    }

    pub fn first(&self) -> Option<SemanticLabel> {
        self.0.first().copied()
    }

    pub fn intersects(&self, labels: &[SemanticLabel]) -> bool {
        self.0.iter().any(|l| labels.contains(l))
    }

    pub fn iter(&self) -> impl Iterator<Item = SemanticLabel> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Content captured from a leaf or anchor element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A node of the DOM graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    /// `<tag>_<hash>`, unique within one build.
    pub id: String,
    /// Tag name, or `p` for bare text.
    pub element_type: String,
    /// Pre-hash identifier (`<tag>_<counter>_<classes>`), kept for debugging.
    pub element_name: String,
    /// Discovery order.
    pub item_index: usize,
    pub class: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    pub is_root: bool,
    #[serde(rename = "type")]
    pub labels: LabelSet,
    /// Earliest surviving predecessor; the only parent ancestry walks follow.
    #[serde(skip)]
    pub primary_parent: Option<NodeIndex>,
}

impl DomNode {
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Portion of the id before the first separator (the tag name).
    pub fn tag_prefix(&self) -> &str {
        self.id.split('_').next().unwrap_or(&self.id)
    }

    pub fn is_anchor(&self) -> bool {
        self.element_type.eq_ignore_ascii_case("a")
    }
}
