//! Configuration for graph construction, pruning, search and fetching.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Effectively "no cap" for anchor and neighbor truncation.
pub const DEFAULT_TOP_K: usize = 10_000;

/// Settings for the DOM → graph traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Tags dropped together with their subtree.
    #[serde(default = "default_denied_tags")]
    pub denied_tags: Vec<String>,
    /// Boilerplate phrases (trimmed, lower-cased) that invalidate an element.
    #[serde(default = "default_denied_texts")]
    pub denied_texts: Vec<String>,
}

fn default_denied_tags() -> Vec<String> {
    [
        "script",
        "noscript",
        "style",
        "svg",
        "img",
        "image",
        "picture",
        "input",
        "head",
        "kin-address-form",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_denied_texts() -> Vec<String> {
    [
        "view",
        "x",
        "apply",
        "sort by",
        "skip",
        "skip to content",
        "skip to navigation menu",
        "×",
        "cancel",
        "sort/view",
        "filter",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            denied_tags: default_denied_tags(),
            denied_texts: default_denied_texts(),
        }
    }
}

impl BuilderConfig {
    pub fn is_denied_tag(&self, tag: &str) -> bool {
        self.denied_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// `text` must already be trimmed and lower-cased.
    pub fn is_denied_text(&self, text: &str) -> bool {
        self.denied_texts.iter().any(|t| t == text)
    }
}

/// Settings for the structural pruning pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrunerConfig {
    /// Tags never removed, even when they are bridges or empty leaves.
    #[serde(default = "default_keep_tags")]
    pub keep_tags: Vec<String>,
}

fn default_keep_tags() -> Vec<String> {
    ["a", "h1", "h2", "h3", "h4", "h5", "h6"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for PrunerConfig {
    fn default() -> Self {
        Self {
            keep_tags: default_keep_tags(),
        }
    }
}

impl PrunerConfig {
    pub fn keeps(&self, tag: &str) -> bool {
        self.keep_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Defaults applied to compiled search plans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_top_k")]
    pub top_k_anchors: usize,
    #[serde(default = "default_top_k")]
    pub top_k_neighbors: usize,
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
    /// Characters kept on each side of the first match in a snippet.
    #[serde(default = "default_snippet_window")]
    pub snippet_window: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_true() -> bool {
    true
}
fn default_snippet_window() -> usize {
    50
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k_anchors: DEFAULT_TOP_K,
            top_k_neighbors: DEFAULT_TOP_K,
            case_insensitive: true,
            snippet_window: 50,
        }
    }
}

/// Settings for the HTTP page fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_user_agent() -> String {
    "Mozilla/5.0".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Top-level domcypher configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomCypherConfig {
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default)]
    pub pruner: PrunerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl DomCypherConfig {
    /// Load config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Create configuration from environment and defaults.
    ///
    /// `DOMCYPHER_CONFIG` points at a JSON file; `DOMCYPHER_USER_AGENT`,
    /// `DOMCYPHER_FETCH_TIMEOUT_SECS` and `DOMCYPHER_TOP_K` override single fields.
    pub fn from_env() -> Self {
        let mut config = match std::env::var("DOMCYPHER_CONFIG") {
            Ok(path) => Self::load(&path).unwrap_or_else(|e| {
                warn!("Ignoring config file: {}", e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };

        if let Ok(agent) = std::env::var("DOMCYPHER_USER_AGENT") {
            config.fetch.user_agent = agent;
        }
        if let Some(secs) = std::env::var("DOMCYPHER_FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.fetch.timeout_secs = secs;
        }
        if let Some(k) = std::env::var("DOMCYPHER_TOP_K")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.search.top_k_anchors = k;
            config.search.top_k_neighbors = k;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DomCypherConfig::default();
        assert!(config.builder.is_denied_tag("SCRIPT"));
        assert!(config.builder.is_denied_text("skip to content"));
        assert!(config.pruner.keeps("a"));
        assert!(!config.pruner.keeps("div"));
        assert_eq!(config.search.top_k_anchors, DEFAULT_TOP_K);
        assert!(config.search.case_insensitive);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domcypher.json");
        std::fs::write(
            &path,
            r#"{"pruner": {"keep_tags": ["a", "li"]}, "search": {"top_k_anchors": 3}}"#,
        )
        .unwrap();

        let config = DomCypherConfig::load(&path).unwrap();
        assert!(config.pruner.keeps("li"));
        assert_eq!(config.search.top_k_anchors, 3);
        // untouched sections keep their defaults
        assert_eq!(config.search.top_k_neighbors, DEFAULT_TOP_K);
        assert!(config.builder.is_denied_tag("style"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DomCypherConfig::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
