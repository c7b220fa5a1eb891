//! Command execution. Every command returns the text to print on stdout.

use std::path::Path;

use anyhow::Context;
use domcypher_core::DomCypherConfig;
use domcypher_runtime::{Pipeline, StaticFetcher};
use tracing::info;

use crate::args::{Command, USAGE};

pub fn execute(command: &Command) -> anyhow::Result<String> {
    match command {
        Command::Query {
            query,
            html,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let result = match html {
                Some(path) => {
                    let page = read_page(path)?;
                    offline(config).run_html(query, &page)?
                }
                None => Pipeline::new(config)?.run(query)?,
            };
            Ok(serde_json::to_string_pretty(&result)?)
        }
        Command::Graph { file, node, config } => {
            let config = load_config(config.as_deref())?;
            let page = read_page(file)?;
            let built = offline(config).build_graph(&page)?;
            match node {
                Some(id) => Ok(built.graph.render(id)?),
                None => {
                    let summary = serde_json::json!({
                        "graph": built.graph.stats(),
                        "prune": built.prune,
                        "classify": built.classify,
                    });
                    Ok(serde_json::to_string_pretty(&summary)?)
                }
            }
        }
        Command::Help => Ok(USAGE.to_string()),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DomCypherConfig> {
    match path {
        Some(path) => {
            info!("Loading config from {}", path.display());
            Ok(DomCypherConfig::load(path)?)
        }
        None => Ok(DomCypherConfig::from_env()),
    }
}

fn read_page(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// A pipeline that never reaches the network.
fn offline(config: DomCypherConfig) -> Pipeline {
    Pipeline::with_fetcher(config, Box::new(StaticFetcher::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const PAGE: &str = "<body><ul><li><a href='/a'>Alpha</a></li><li><a href='/b'>Beta</a></li></ul><h2>News</h2></body>";

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_query_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let html = write(&dir, "page.html", PAGE);
        let out = execute(&Command::Query {
            query: r#"MATCH (l:Link) WHERE l.href = "/b" RETURN l"#.into(),
            html: Some(html),
            config: None,
        })
        .unwrap();

        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["anchorCount"], 1);
        assert_eq!(json["results"][0]["matches"][0]["type"], "link");
        assert_eq!(json["results"][0]["matches"][0]["dist"], 0);
    }

    #[test]
    fn test_query_reports_compile_errors() {
        let dir = tempfile::tempdir().unwrap();
        let html = write(&dir, "page.html", PAGE);
        let err = execute(&Command::Query {
            query: "MATCH (l:Button) RETURN l".into(),
            html: Some(html),
            config: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("Button"));
    }

    #[test]
    fn test_config_file_limits_anchors() {
        let dir = tempfile::tempdir().unwrap();
        let html = write(&dir, "page.html", PAGE);
        let config = write(&dir, "config.json", r#"{"search": {"top_k_anchors": 1}}"#);
        let out = execute(&Command::Query {
            query: r#"MATCH (l:Link) WHERE l.href CONTAINS "/" RETURN l"#.into(),
            html: Some(html),
            config: Some(config),
        })
        .unwrap();

        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["anchorCount"], 2);
        assert_eq!(json["results"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_graph_summary_and_render() {
        let dir = tempfile::tempdir().unwrap();
        let html = write(&dir, "page.html", PAGE);

        let out = execute(&Command::Graph {
            file: html.clone(),
            node: None,
            config: None,
        })
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(json["graph"]["nodeCount"].as_u64().unwrap() > 0);
        assert_eq!(json["classify"]["labelled"]["title"], 1);

        let err = execute(&Command::Graph {
            file: html,
            node: Some("nope_0".into()),
            config: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("nope_0"));
    }

    #[test]
    fn test_missing_file() {
        let err = execute(&Command::Graph {
            file: PathBuf::from("/definitely/not/here.html"),
            node: None,
            config: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_help() {
        assert!(execute(&Command::Help).unwrap().contains("Usage: domcypher"));
    }
}
