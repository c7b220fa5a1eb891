//! Fixed-order classifier chain.

use std::collections::BTreeMap;

use domcypher_core::Result;
use domcypher_graph::DomGraph;
use serde::Serialize;
use tracing::info;

use crate::grid::GridClassifier;
use crate::simple::{LinkClassifier, LinkListClassifier, TitleClassifier};
use crate::Classifier;

/// Newly labelled node count per classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifyReport {
    pub labelled: BTreeMap<String, usize>,
}

impl ClassifyReport {
    pub fn total(&self) -> usize {
        self.labelled.values().sum()
    }
}

pub struct ClassifierChain {
    classifiers: Vec<Box<dyn Classifier>>,
}

impl Default for ClassifierChain {
    /// grid → linklist → title → link.
    fn default() -> Self {
        Self {
            classifiers: vec![
                Box::new(GridClassifier),
                Box::new(LinkListClassifier),
                Box::new(TitleClassifier),
                Box::new(LinkClassifier),
            ],
        }
    }
}

impl ClassifierChain {
    pub fn new(classifiers: Vec<Box<dyn Classifier>>) -> Self {
        Self { classifiers }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.classifiers.iter().map(|c| c.name()).collect()
    }

    /// Run every classifier in order. The first failure aborts the chain.
    pub fn run(&self, graph: &mut DomGraph) -> Result<ClassifyReport> {
        let mut report = ClassifyReport::default();
        for classifier in &self.classifiers {
            let labelled = classifier.classify(graph)?;
            info!("Classifier {}: labelled {} nodes", classifier.name(), labelled);
            report.labelled.insert(classifier.name().to_string(), labelled);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::graph_of;
    use domcypher_graph::SemanticLabel;

    #[test]
    fn test_default_order() {
        assert_eq!(
            ClassifierChain::default().names(),
            vec!["grid", "linklist", "title", "link"]
        );
    }

    #[test]
    fn test_chain_labels_link_grid() {
        let mut graph = graph_of(
            &[
                ("body_1", None),
                ("nav_1", Some("body_1")),
                ("a_1", Some("nav_1")),
                ("a_2", Some("nav_1")),
                ("a_3", Some("nav_1")),
            ],
            &["a_1", "a_2", "a_3"],
        );
        let report = ClassifierChain::default().run(&mut graph).unwrap();
        assert_eq!(report.labelled["grid"], 1);
        assert_eq!(report.labelled["linklist"], 1);
        assert_eq!(report.labelled["link"], 3);
        assert_eq!(report.total(), 5);

        let nav = graph.lookup("nav_1").unwrap();
        let labels: Vec<SemanticLabel> = nav.labels.iter().collect();
        assert_eq!(labels, vec![SemanticLabel::Grid, SemanticLabel::LinkList]);

        // second run adds nothing
        let again = ClassifierChain::default().run(&mut graph).unwrap();
        assert_eq!(again.total(), 0);
    }

    #[test]
    fn test_chain_stops_on_error() {
        let mut graph = DomGraph::new();
        assert!(ClassifierChain::default().run(&mut graph).is_err());
    }
}
