//! Semantic text retrieval over sentence embeddings.
//!
//! Text is embedded into unit-length vectors, stored in an exact flat index
//! and queried by squared Euclidean distance, which for unit vectors maps
//! directly onto cosine similarity.
//!
//! ```no_run
//! use docsim::{DocumentId, SemanticRetriever, Settings};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let retriever = SemanticRetriever::from_settings(&Settings::default())?;
//! retriever.add_documents(&[
//!     (DocumentId::new(1), "Senior Rust engineer, async networking"),
//!     (DocumentId::new(2), "Pastry chef, ten years in French bakeries"),
//! ])?;
//! for hit in retriever.search("systems programmer", 1)? {
//!     println!("{} {} {:.4}", hit.rank, hit.id, hit.similarity);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod retriever;
pub mod search;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use document::{Document, DocumentRecord, DocumentStore};
pub use error::{RetrievalError, RetrievalResult};
pub use retriever::{Corpus, IndexState, SemanticRetriever};
pub use search::{SearchRanker, SearchResult, SimilarityLevel, parse_threshold};
pub use vector::{
    DocumentId, EmbeddingProvider, FastEmbedProvider, FlatIndex, NormalizationMode, Ordinal,
    SearchHit, VectorDimension,
};
