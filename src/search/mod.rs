//! Turning raw index hits into ranked, human-readable results.

mod ranker;
mod threshold;

pub use ranker::{SearchRanker, SearchResult, round_similarity, similarity_from_distance};
pub use threshold::{SimilarityLevel, parse_threshold};
