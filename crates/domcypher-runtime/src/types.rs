//! Runtime types.

use std::collections::HashMap;

use domcypher_classify::ClassifyReport;
use domcypher_graph::{GraphStats, PruneReport};
use domcypher_query::SearchPlan;
use domcypher_search::{AnchorMatches, MatchedNode};
use serde::Serialize;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Compile,
    Fetch,
    Build,
    Prune,
    Classify,
    Retrieve,
    Match,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Self::Compile,
            Self::Fetch,
            Self::Build,
            Self::Prune,
            Self::Classify,
            Self::Retrieve,
            Self::Match,
        ]
    }
}

/// Wall-clock time of one stage. Informational only.
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    #[serde(rename = "runTimeMs")]
    pub run_time_ms: f64,
}

/// Everything one query run produced.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub plan: SearchPlan,
    /// SHA-256 of the HTML the graph was built from.
    #[serde(rename = "pageHash")]
    pub page_hash: String,
    #[serde(rename = "executedAt")]
    pub executed_at: String,
    pub graph: GraphStats,
    pub prune: PruneReport,
    pub classify: ClassifyReport,
    #[serde(rename = "anchorCount")]
    pub anchor_count: usize,
    pub results: Vec<AnchorMatches>,
    pub timings: Vec<StageTiming>,
}

impl QueryResult {
    /// Anchor id → ranked neighbours.
    pub fn by_anchor(&self) -> HashMap<&str, &[MatchedNode]> {
        self.results
            .iter()
            .map(|r| (r.anchor_id.as_str(), r.matches.as_slice()))
            .collect()
    }

    pub fn timing(&self, stage: Stage) -> Option<f64> {
        self.timings
            .iter()
            .find(|t| t.stage == stage)
            .map(|t| t.run_time_ms)
    }

    pub fn total_time_ms(&self) -> f64 {
        self.timings.iter().map(|t| t.run_time_ms).sum()
    }
}
