//! domcypher classify — additive semantic labelling of the pruned graph.
//!
//! Each classifier only ever adds labels. [`ClassifierChain`] runs them in
//! the fixed order grid, linklist, title, link.

pub mod chain;
pub mod grid;
pub mod simple;

pub use chain::{ClassifierChain, ClassifyReport};
pub use grid::GridClassifier;
pub use simple::{LinkClassifier, LinkListClassifier, TitleClassifier};

use domcypher_core::Result;
use domcypher_graph::DomGraph;

/// A read/annotate pass over the graph.
pub trait Classifier: Send + Sync {
    /// Label name, used in logs and reports.
    fn name(&self) -> &'static str;

    /// Label qualifying nodes. Returns how many nodes gained the label.
    fn classify(&self, graph: &mut DomGraph) -> Result<usize>;
}
