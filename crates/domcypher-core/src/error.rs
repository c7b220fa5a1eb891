//! Error types for domcypher.
//!
//! Query errors (`ParseError`, `CompileError`) are raised before any graph
//! work starts. Graph and fetch errors abort the pipeline. `Error::Lookup`
//! is local to the caller that asked for an unknown node.

use thiserror::Error;

/// Malformed query text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Parse error at offset {offset}: {message}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the query text.
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Query parsed fine but its shape is outside the supported subset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("query has no MATCH clause")]
    NoMatchClause,

    #[error("only one MATCH clause is supported, got {0}")]
    MultipleMatchClauses(usize),

    #[error("unsupported pattern shape: {nodes} node(s), {edges} edge(s)")]
    UnsupportedShape { nodes: usize, edges: usize },

    #[error("node `{0}` needs at least one type label")]
    MissingLabel(String),

    #[error("unknown type label `{0}`")]
    UnknownLabel(String),

    #[error("query has no WHERE condition")]
    MissingCondition,

    #[error("operator `{0}` is not supported for text matching")]
    UnsupportedOperator(String),

    #[error("value `{0}` cannot be used as a text query")]
    UnsupportedValue(String),

    #[error("unknown property `{0}`")]
    UnknownProperty(String),

    #[error("variable `{0}` is not declared in MATCH")]
    UnknownVariable(String),

    #[error("hop ranges are not supported on bidirectional edges")]
    BidirectionalHopRange,

    #[error("invalid hop range {min}..{max}")]
    InvalidHopRange { min: u32, max: u32 },

    #[error("typed edges are not supported (`:{0}`)")]
    UnsupportedEdgeType(String),

    #[error("property maps on node `{0}` are not supported")]
    UnsupportedPropertyFilter(String),

    #[error("query has no USE clause and no page was supplied")]
    MissingPageUrl,
}

/// Failure of the external page-fetch collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{0} returned an empty body")]
    EmptyBody(String),
}

/// Structural failure while building, pruning or classifying a graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("graph has no root node")]
    NoRoot,

    #[error("graph has no nodes")]
    EmptyGraph,

    #[error("duplicate node id {0}")]
    DuplicateNode(String),

    #[error("node {0} disappeared during pruning")]
    MissingNode(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Unknown node: {0}")]
    Lookup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
