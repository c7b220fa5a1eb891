//! Compiled search plan consumed by the retriever and the matcher.

use std::fmt;

use domcypher_graph::{Payload, SemanticLabel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Contains,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchKind::Exact => "exact",
            MatchKind::Contains => "contains",
        })
    }
}

/// Payload field a text match reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadField {
    #[default]
    Text,
    Href,
    Alt,
    Src,
}

impl PayloadField {
    pub fn from_property(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "href" => Some(Self::Href),
            "alt" => Some(Self::Alt),
            "src" => Some(Self::Src),
            _ => None,
        }
    }

    /// The field's value, `None` when the payload lacks it.
    pub fn read<'p>(&self, payload: &'p Payload) -> Option<&'p str> {
        match self {
            Self::Text => Some(payload.text.as_str()),
            Self::Href => payload.href.as_deref(),
            Self::Alt => payload.alt.as_deref(),
            Self::Src => payload.src.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMatch {
    pub query: String,
    #[serde(rename = "caseInsensitive")]
    pub case_insensitive: bool,
    #[serde(rename = "matchKind")]
    pub match_kind: MatchKind,
    #[serde(default)]
    pub field: PayloadField,
    /// Only nodes carrying one of these labels are scored; empty means every node.
    #[serde(rename = "anchorTypes", default)]
    pub anchor_types: Vec<SemanticLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPlan {
    #[serde(rename = "pageUrl", default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(rename = "textMatch")]
    pub text_match: TextMatch,
    /// Candidate labels for the matcher; empty means every node.
    #[serde(rename = "targetTypes")]
    pub target_types: Vec<SemanticLabel>,
    #[serde(rename = "topKAnchors")]
    pub top_k_anchors: usize,
    #[serde(rename = "topKNeighbors")]
    pub top_k_neighbors: usize,
    #[serde(rename = "skipAnchors", default)]
    pub skip_anchors: usize,
    #[serde(rename = "requireAncestorInclusion")]
    pub require_ancestor_inclusion: bool,
    #[serde(default)]
    pub returns: Vec<String>,
}
