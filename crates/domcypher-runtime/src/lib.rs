//! Runtime orchestrator. Runs one query end to end.
//!
//! compile → fetch → build → prune → classify → retrieve → match, strictly in
//! order. The graph is owned by a single run and never shared.

pub mod fetch;
pub mod pipeline;
pub mod types;

pub use fetch::{HttpFetcher, PageFetcher, StaticFetcher};
pub use pipeline::{BuiltGraph, Pipeline};
pub use types::*;
