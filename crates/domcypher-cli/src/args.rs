//! Argument handling.

use std::path::PathBuf;

pub const USAGE: &str = "\
domcypher: query a web page's DOM graph with Cypher

Usage: domcypher <command> [options]

Commands:
  query <cypher> [--html FILE] [--config FILE]   Run a query; without --html the USE url is fetched
  graph <FILE> [--node ID] [--config FILE]       Print graph stats, or render the subtree under ID
  help                                           Show this help message

Environment:
  DOMCYPHER_CONFIG, DOMCYPHER_USER_AGENT, DOMCYPHER_FETCH_TIMEOUT_SECS, DOMCYPHER_TOP_K, RUST_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Query {
        query: String,
        html: Option<PathBuf>,
        config: Option<PathBuf>,
    },
    Graph {
        file: PathBuf,
        node: Option<String>,
        config: Option<PathBuf>,
    },
    Help,
}

/// Parse arguments after the program name.
pub fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some(command) = args.first() else {
        return Ok(Command::Help);
    };
    let rest = &args[1..];

    match command.as_str() {
        "query" => {
            let (positional, flags) = split_flags(rest, &["--html", "--config"])?;
            let [query] = positional.as_slice() else {
                return Err("query takes exactly one query string".into());
            };
            Ok(Command::Query {
                query: query.clone(),
                html: flag(&flags, "--html").map(PathBuf::from),
                config: flag(&flags, "--config").map(PathBuf::from),
            })
        }
        "graph" => {
            let (positional, flags) = split_flags(rest, &["--node", "--config"])?;
            let [file] = positional.as_slice() else {
                return Err("graph takes exactly one HTML file".into());
            };
            Ok(Command::Graph {
                file: PathBuf::from(file),
                node: flag(&flags, "--node"),
                config: flag(&flags, "--config").map(PathBuf::from),
            })
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => Err(format!("Unknown command: {}. Use 'domcypher help' for usage.", other)),
    }
}

type Flags = Vec<(String, String)>;

fn split_flags(args: &[String], known: &[&str]) -> Result<(Vec<String>, Flags), String> {
    let mut positional = Vec::new();
    let mut flags = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if !arg.starts_with("--") {
            positional.push(arg.clone());
            continue;
        }
        if !known.contains(&arg.as_str()) {
            return Err(format!("unknown option {}", arg));
        }
        let value = iter
            .next()
            .ok_or_else(|| format!("{} needs a value", arg))?;
        flags.push((arg.clone(), value.clone()));
    }
    Ok((positional, flags))
}

fn flag(flags: &Flags, name: &str) -> Option<String> {
    flags
        .iter()
        .rev()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
}
