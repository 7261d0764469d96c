//! Distance to similarity conversion and result assembly.
//!
//! For unit vectors `a` and `b`, `|a - b|^2 = 2 - 2 cos(a, b)`, so the cosine
//! similarity can be recovered from the squared distance the index reports.
//! The conversion is only meaningful when both sides are unit length; this
//! layer does not check that.

use serde::Serialize;

use crate::document::DocumentStore;
use crate::error::RetrievalResult;
use crate::vector::{DocumentId, SearchHit};

/// One ranked match, ready to be serialized for a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// 1-based position in the result list.
    pub rank: usize,
    pub id: DocumentId,
    pub text: String,
    /// Squared Euclidean distance between query and document embeddings.
    pub distance: f32,
    /// Cosine similarity estimate, clamped at zero and rounded to 4 digits.
    pub similarity: f32,
}

/// Estimates cosine similarity from a squared L2 distance between unit vectors.
#[must_use]
pub fn similarity_from_distance(distance: f32) -> f32 {
    (1.0 - distance / 2.0).max(0.0)
}

/// Rounds a similarity to 4 decimal digits.
#[must_use]
pub fn round_similarity(similarity: f32) -> f32 {
    ((f64::from(similarity) * 10_000.0).round() / 10_000.0) as f32
}

/// Converts index hits into ranked results joined with document metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchRanker {
    min_similarity: Option<f32>,
}

impl SearchRanker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops results whose rounded similarity falls below `threshold`.
    #[must_use]
    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            min_similarity: Some(threshold),
        }
    }

    /// Builds the final result list.
    ///
    /// Hits are re-sorted by distance (stable, so index order breaks ties)
    /// and ranks are assigned after threshold filtering. A hit whose ordinal
    /// is missing from `store` is an internal consistency failure.
    pub fn rank(
        &self,
        hits: &[SearchHit],
        store: &DocumentStore,
    ) -> RetrievalResult<Vec<SearchResult>> {
        let mut ordered: Vec<&SearchHit> = hits.iter().collect();
        ordered.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        let mut results = Vec::with_capacity(ordered.len());
        for hit in ordered {
            let record = store.get(hit.ordinal)?;
            let similarity = round_similarity(similarity_from_distance(hit.distance));
            if self.min_similarity.is_some_and(|min| similarity < min) {
                continue;
            }
            results.push(SearchResult {
                rank: results.len() + 1,
                id: record.id,
                text: record.text.clone(),
                distance: hit.distance,
                similarity,
            });
        }
        Ok(results)
    }
}
