//! domcypher search — scores payload text against a plan and ranks
//! structurally nearby nodes for every hit.

pub mod matcher;
pub mod retriever;

pub use matcher::{AnchorMatches, GraphMatcher, MatchedNode};
pub use retriever::{score_text, Anchor, TextRetriever};
