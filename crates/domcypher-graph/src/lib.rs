//! domcypher graph — turns rendered HTML into an annotated directed graph.
//!
//! Construction runs depth-first over the DOM ([`GraphBuilder`]), then a
//! single structural pass ([`GraphPruner`]) collapses empty leaves and
//! pass-through nodes. After pruning the graph is treated as read-only.

pub mod builder;
pub mod graph;
pub mod node;
pub mod prune;

pub use builder::GraphBuilder;
pub use graph::{DomGraph, GraphStats};
pub use node::{DomNode, LabelSet, Payload, SemanticLabel};
pub use prune::{GraphPruner, PruneReport};

pub use petgraph::stable_graph::NodeIndex;
