//! Shared fakes for integration tests.
#![allow(dead_code)]

use docsim::vector::finalize_embeddings;
use docsim::{EmbeddingProvider, RetrievalError, RetrievalResult, VectorDimension};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic provider: one axis per vocabulary word plus a bias axis.
///
/// Texts that share vocabulary words land close together; a text with no
/// known words maps onto the bias axis alone.
pub struct KeywordProvider {
    vocabulary: Vec<&'static str>,
    calls: AtomicUsize,
}

impl KeywordProvider {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for KeywordProvider {
    fn embed(&self, texts: &[&str]) -> RetrievalResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let dim = self.vocabulary.len() + 1;
        let raw = texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut v = vec![0.0; dim];
                v[dim - 1] = 0.1;
                for (axis, word) in self.vocabulary.iter().enumerate() {
                    if lower.split_whitespace().any(|w| w == *word) {
                        v[axis] = 1.0;
                    }
                }
                v
            })
            .collect();
        finalize_embeddings(raw, texts.len(), self.dimension())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(self.vocabulary.len() + 1).unwrap()
    }
}

/// Provider whose encoder never loads.
pub struct UnavailableProvider;

impl EmbeddingProvider for UnavailableProvider {
    fn embed(&self, _texts: &[&str]) -> RetrievalResult<Vec<Vec<f32>>> {
        Err(RetrievalError::ModelInitialization(
            "model files unavailable".to_string(),
        ))
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(4).unwrap()
    }
}

/// Provider that drops the first embedding of every batch.
pub struct ShortBatchProvider;

impl EmbeddingProvider for ShortBatchProvider {
    fn embed(&self, texts: &[&str]) -> RetrievalResult<Vec<Vec<f32>>> {
        Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0]).collect())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(2).unwrap()
    }
}

pub const JOB_VOCABULARY: &[&str] = &[
    "rust", "python", "backend", "frontend", "chef", "nurse", "data", "design",
];
