//! Pipeline that sequences every stage for a single query.

use std::time::Instant;

use domcypher_classify::{ClassifierChain, ClassifyReport};
use domcypher_core::{CompileError, DomCypherConfig, Result};
use domcypher_graph::{DomGraph, GraphBuilder, GraphPruner, PruneReport};
use domcypher_query::{compile, SearchPlan};
use domcypher_search::{GraphMatcher, TextRetriever};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::fetch::{HttpFetcher, PageFetcher};
use crate::types::*;

/// A classified graph together with the reports of the stages that shaped it.
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub graph: DomGraph,
    pub prune: PruneReport,
    pub classify: ClassifyReport,
}

pub struct Pipeline {
    config: DomCypherConfig,
    classifiers: ClassifierChain,
    fetcher: Box<dyn PageFetcher>,
}

impl Pipeline {
    /// Pipeline fetching pages over HTTP.
    pub fn new(config: DomCypherConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Ok(Self::with_fetcher(config, Box::new(fetcher)))
    }

    pub fn with_fetcher(config: DomCypherConfig, fetcher: Box<dyn PageFetcher>) -> Self {
        Self {
            config,
            classifiers: ClassifierChain::default(),
            fetcher,
        }
    }

    pub fn config(&self) -> &DomCypherConfig {
        &self.config
    }

    /// Run a query against the page named in its USE clause.
    pub fn run(&self, query: &str) -> Result<QueryResult> {
        let mut timings = Vec::new();
        let plan = timed(&mut timings, Stage::Compile, || {
            compile(query, &self.config.search)
        })?;
        let url = plan.page_url.clone().ok_or(CompileError::MissingPageUrl)?;
        let html = timed(&mut timings, Stage::Fetch, || Ok(self.fetcher.fetch(&url)?))?;
        self.execute(plan, &html, timings)
    }

    /// Run a query against supplied HTML. A USE clause is kept in the plan but not fetched.
    pub fn run_html(&self, query: &str, html: &str) -> Result<QueryResult> {
        let mut timings = Vec::new();
        let plan = timed(&mut timings, Stage::Compile, || {
            compile(query, &self.config.search)
        })?;
        self.execute(plan, html, timings)
    }

    /// Build, prune and classify without querying.
    pub fn build_graph(&self, html: &str) -> Result<BuiltGraph> {
        self.build_timed(html, &mut Vec::new())
    }

    fn build_timed(&self, html: &str, timings: &mut Vec<StageTiming>) -> Result<BuiltGraph> {
        let mut graph = timed(timings, Stage::Build, || {
            GraphBuilder::new(&self.config.builder).build(html)
        })?;
        let prune = timed(timings, Stage::Prune, || {
            GraphPruner::new(&self.config.pruner).prune(&mut graph)
        })?;
        let classify = timed(timings, Stage::Classify, || self.classifiers.run(&mut graph))?;
        Ok(BuiltGraph {
            graph,
            prune,
            classify,
        })
    }

    fn execute(&self, plan: SearchPlan, html: &str, mut timings: Vec<StageTiming>) -> Result<QueryResult> {
        let built = self.build_timed(html, &mut timings)?;
        let graph = &built.graph;

        let anchors = timed(&mut timings, Stage::Retrieve, || {
            Ok(TextRetriever::new(&plan.text_match, self.config.search.snippet_window).retrieve(graph))
        })?;
        let results = timed(&mut timings, Stage::Match, || {
            Ok(GraphMatcher::new(&plan).match_anchors(graph, &anchors))
        })?;

        let result = QueryResult {
            page_hash: hex::encode(Sha256::digest(html.as_bytes())),
            executed_at: chrono::Utc::now().to_rfc3339(),
            graph: graph.stats(),
            prune: built.prune,
            classify: built.classify,
            anchor_count: anchors.len(),
            results,
            timings,
            plan,
        };

        info!(
            "Query complete: {} anchors, {} results, {:.1}ms",
            result.anchor_count,
            result.results.len(),
            result.total_time_ms()
        );
        Ok(result)
    }
}

fn timed<T>(timings: &mut Vec<StageTiming>, stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let out = f()?;
    let run_time_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!("Stage {:?} finished in {:.2}ms", stage, run_time_ms);
    timings.push(StageTiming { stage, run_time_ms });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;

    fn pipeline() -> Pipeline {
        Pipeline::with_fetcher(DomCypherConfig::default(), Box::new(StaticFetcher::new()))
    }

    #[test]
    fn test_build_graph_runs_every_structural_stage() {
        let built = pipeline()
            .build_graph("<body><ul><li><a href='/a'>A</a></li><li><a href='/b'>B</a></li></ul></body>")
            .unwrap();
        assert!(built.graph.node_count() > 0);
        assert_eq!(built.classify.labelled.len(), 4);
        assert_eq!(built.graph.roots().len(), 1);
    }

    #[test]
    fn test_run_html_records_stage_timings() {
        let result = pipeline()
            .run_html(
                r#"MATCH (t:Link) WHERE t.text = "B" RETURN t"#,
                "<body><ul><li><a href='/a'>A</a></li><li><a href='/b'>B</a></li></ul></body>",
            )
            .unwrap();
        let stages: Vec<Stage> = result.timings.iter().map(|t| t.stage).collect();
        let expected: Vec<Stage> = Stage::all()
            .iter()
            .copied()
            .filter(|s| *s != Stage::Fetch)
            .collect();
        assert_eq!(stages, expected);
        assert_eq!(result.page_hash.len(), 64);
        assert!(result.timing(Stage::Fetch).is_none());
    }

    #[test]
    fn test_run_without_use_clause() {
        let err = pipeline()
            .run(r#"MATCH (t:Title) WHERE t.text = "x" RETURN t"#)
            .unwrap_err();
        assert!(matches!(
            err,
            domcypher_core::Error::Compile(CompileError::MissingPageUrl)
        ));
    }
}
