//! domcypher core — error taxonomy and configuration.

pub mod config;
pub mod error;

pub use config::{BuilderConfig, DomCypherConfig, FetchConfig, PrunerConfig, SearchConfig};
pub use error::{CompileError, Error, FetchError, GraphError, ParseError, Result};
