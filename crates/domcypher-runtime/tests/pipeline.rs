//! End-to-end query runs over an in-memory page.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use domcypher_core::{DomCypherConfig, Error, FetchError};
use domcypher_graph::SemanticLabel;
use domcypher_runtime::{PageFetcher, Pipeline, Stage, StaticFetcher};

const URL: &str = "https://example.com/reports";

const PAGE: &str = r#"
<!DOCTYPE html>
<html>
 <head><title>Quarterly reports</title><script>var x = 1;</script></head>
 <body>
  <nav>
   <a href="/">Home</a>
   <a href="/about">About</a>
   <a href="/risks">Risks</a>
  </nav>
  <section class="reports">
   <div class="card"><h3>Market risks</h3><p>Volatility outlook</p></div>
   <div class="card"><h3>Credit risks</h3><p>Default rates</p></div>
   <div class="card"><h3>Growth</h3><p>New markets</p></div>
  </section>
  <footer><p>Contact</p></footer>
 </body>
</html>
"#;

fn pipeline() -> Pipeline {
    Pipeline::with_fetcher(
        DomCypherConfig::default(),
        Box::new(StaticFetcher::new().with_page(URL, PAGE)),
    )
}

/// Counts fetches so tests can prove compile errors stop the run early.
struct CountingFetcher {
    calls: Arc<AtomicUsize>,
}

impl PageFetcher for CountingFetcher {
    fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PAGE.to_string())
    }
}

#[test]
fn test_page_is_classified() {
    let built = pipeline().build_graph(PAGE).unwrap();
    let graph = &built.graph;

    let tags_with = |label: SemanticLabel| -> Vec<String> {
        graph
            .nodes_with_label(label)
            .into_iter()
            .map(|idx| graph.node(idx).unwrap().element_type.clone())
            .collect()
    };
    assert_eq!(tags_with(SemanticLabel::Grid), vec!["nav", "section"]);
    assert_eq!(tags_with(SemanticLabel::LinkList), vec!["nav"]);
    assert_eq!(tags_with(SemanticLabel::Title), vec!["h3", "h3", "h3"]);
    assert_eq!(tags_with(SemanticLabel::Link), vec!["a", "a", "a"]);

    // the footer only wrapped one paragraph
    assert!(graph.nodes().all(|(_, n)| n.element_type != "footer"));
    assert_eq!(built.prune.removed, 1);
    // head and script never became nodes
    assert!(graph.nodes().all(|(_, n)| n.element_type != "title" && n.element_type != "script"));
    assert_eq!(graph.roots().len(), 1);
}

#[test]
fn test_grid_title_query() {
    let pipeline = pipeline();
    let result = pipeline
        .run(&format!(
            r#"USE "{}" MATCH (g:Grid)-[*1..2]->(t:Title) WHERE t.text CONTAINS "risks" RETURN g, t"#,
            URL
        ))
        .unwrap();

    assert_eq!(result.anchor_count, 2);
    assert_eq!(result.results.len(), 2);

    let built = pipeline.build_graph(PAGE).unwrap();
    let graph = &built.graph;
    let anchor_texts: Vec<String> = result
        .results
        .iter()
        .map(|r| graph.lookup(&r.anchor_id).unwrap().payload.as_ref().unwrap().text.clone())
        .collect();
    assert_eq!(anchor_texts, vec!["Market risks", "Credit risks"]);

    for entry in &result.results {
        assert_eq!(entry.matches.len(), 1);
        let hit = &entry.matches[0];
        let node = graph.lookup(&hit.node_id).unwrap();
        assert_eq!(node.element_type, "section");
        assert_eq!(node.class, vec!["reports".to_string()]);
        assert_eq!(hit.ancestor_dist, 2);
        assert_eq!(hit.dist, 2);
        assert_eq!(hit.child_count, 3);
        assert_eq!(hit.node_type, Some(SemanticLabel::Grid));
        assert!(entry.snippet.contains("risks"));
    }

    let stages: Vec<Stage> = result.timings.iter().map(|t| t.stage).collect();
    assert_eq!(stages, Stage::all().to_vec());
    assert_eq!(result.by_anchor().len(), 2);
}

#[test]
fn test_single_node_query_returns_anchor() {
    let result = pipeline()
        .run_html(r#"MATCH (l:Link) WHERE l.href = "/about" RETURN l"#, PAGE)
        .unwrap();
    assert_eq!(result.results.len(), 1);
    let entry = &result.results[0];
    assert_eq!(entry.matches.len(), 1);
    assert_eq!(entry.matches[0].node_id, entry.anchor_id);
    assert_eq!(entry.matches[0].dist, 0);
    assert_eq!(entry.matches[0].node_type, Some(SemanticLabel::Link));
}

#[test]
fn test_limit_and_skip() {
    let query = r#"MATCH (g:Grid)-->(t:Title) WHERE t.text CONTAINS "risks" RETURN g SKIP 1 LIMIT 5"#;
    let result = pipeline().run_html(query, PAGE).unwrap();
    assert_eq!(result.anchor_count, 2);
    assert_eq!(result.results.len(), 1);
    assert_eq!(result.plan.top_k_anchors, 5);
}

#[test]
fn test_result_serializes() {
    let result = pipeline()
        .run_html(r#"MATCH (t:Title) WHERE t.text CONTAINS "growth" RETURN t"#, PAGE)
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["plan"]["textMatch"]["matchKind"], "contains");
    assert_eq!(json["results"][0]["matches"][0]["type"], "title");
    assert!(json["executedAt"].as_str().unwrap().contains('T'));
    assert_eq!(json["timings"][0]["stage"], "compile");
    assert!(json["graph"]["nodeCount"].as_u64().unwrap() > 0);
}

#[test]
fn test_compile_errors_stop_before_fetch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::with_fetcher(
        DomCypherConfig::default(),
        Box::new(CountingFetcher {
            calls: calls.clone(),
        }),
    );

    let err = pipeline
        .run(&format!(r#"USE "{}" MATCH (a:Grid)-->(b:Grid)-->(t:Title) WHERE t.text = "x" RETURN a"#, URL))
        .unwrap_err();
    assert!(matches!(err, Error::Compile(_)));

    let err = pipeline.run(r#"USE "x" MATCH (a:Grid"#).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    pipeline
        .run(&format!(r#"USE "{}" MATCH (t:Title) WHERE t.text = "growth" RETURN t"#, URL))
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_fetch_failure_aborts() {
    let err = pipeline()
        .run(r#"USE "https://example.com/missing" MATCH (t:Title) WHERE t.text = "x" RETURN t"#)
        .unwrap_err();
    assert!(matches!(err, Error::Fetch(FetchError::Status { status: 404, .. })));
}

#[test]
fn test_runs_are_deterministic() {
    let query = r#"MATCH (g:Grid)-->(t:Title) WHERE t.text CONTAINS "risks" RETURN g"#;
    let first = pipeline().run_html(query, PAGE).unwrap();
    let second = pipeline().run_html(query, PAGE).unwrap();
    assert_eq!(first.results, second.results);
    assert_eq!(first.page_hash, second.page_hash);
}
