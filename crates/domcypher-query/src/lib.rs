//! domcypher query — a small Cypher dialect compiled into a [`SearchPlan`].
//!
//! ```text
//! USE "https://example.com"
//! MATCH (g:Grid)-[*1..2]->(t:Title)
//! WHERE t.text CONTAINS "pricing"
//! RETURN g, t LIMIT 5
//! ```

pub mod ast;
pub mod compile;
pub mod lexer;
pub mod parser;
pub mod plan;

pub use ast::Query;
pub use compile::{compile, compile_query};
pub use parser::parse;
pub use plan::{MatchKind, PayloadField, SearchPlan, TextMatch};
