//! Vector embedding and exact nearest-neighbor search.
//!
//! This module turns text into unit-length embeddings and stores them in a
//! flat index that answers queries by brute-force squared-Euclidean scan.
//!
//! # Architecture
//! - [`EmbeddingProvider`] produces normalized vectors; [`FastEmbedProvider`]
//!   loads its encoder lazily, once, on first use.
//! - [`FlatIndex`] keeps every vector in one contiguous buffer addressed by
//!   [`Ordinal`], the same key the document store uses.

mod embedding;
mod flat;
mod types;

// Re-export core types for public API
#[cfg(test)]
pub use embedding::MockEmbeddingProvider;
pub use embedding::{
    DEFAULT_BATCH_SIZE, EmbeddingProvider, FastEmbedProvider, LazyModel, finalize_embeddings,
    parse_embedding_model, texts_from_json,
};
pub use flat::{DEFAULT_NORM_TOLERANCE, FlatIndex, SCAN_BLOCK_SIZE, SearchHit};
pub use types::{
    DocumentId, NormalizationMode, Ordinal, VECTOR_DIMENSION_384, VectorDimension, l2_norm,
    normalize_in_place, squared_l2,
};
