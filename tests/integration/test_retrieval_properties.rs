//! End-to-end retrieval behavior with a deterministic embedding provider.
//!
//! Covers the add/search contract: counts stay aligned, a document's own
//! text finds it first, empty indexes answer with nothing, and failed batches
//! leave no trace.

use crate::common::{JOB_VOCABULARY, KeywordProvider, ShortBatchProvider, UnavailableProvider};
use docsim::vector::l2_norm;
use docsim::{
    Document, DocumentId, EmbeddingProvider, IndexState, NormalizationMode, RetrievalError,
    SemanticRetriever,
};
use std::sync::Arc;

fn job_retriever() -> (SemanticRetriever, Arc<KeywordProvider>) {
    let provider = Arc::new(KeywordProvider::new(JOB_VOCABULARY));
    let retriever = SemanticRetriever::new(provider.clone(), NormalizationMode::Strict);
    (retriever, provider)
}

const POSTINGS: &[(i64, &str)] = &[
    (11, "Rust backend engineer"),
    (12, "Python data engineer"),
    (13, "Frontend design lead"),
    (14, "Head chef"),
    (15, "ICU nurse"),
];

fn add_postings(retriever: &SemanticRetriever) {
    let docs: Vec<(DocumentId, &str)> = POSTINGS
        .iter()
        .map(|(id, text)| (DocumentId::new(*id), *text))
        .collect();
    retriever.add_documents(&docs).unwrap();
}

#[test]
fn test_embeddings_have_fixed_dimension_and_unit_norm() {
    let provider = KeywordProvider::new(JOB_VOCABULARY);
    let texts = ["rust backend", "", "unrelated words only", "chef nurse data"];
    let embeddings = provider.embed(&texts).unwrap();

    assert_eq!(embeddings.len(), texts.len());
    for embedding in &embeddings {
        assert_eq!(embedding.len(), provider.dimension().get());
        assert!((l2_norm(embedding) - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_counts_match_after_add() {
    let (retriever, _) = job_retriever();
    assert_eq!(retriever.state(), IndexState::Empty);

    add_postings(&retriever);
    assert_eq!(retriever.len(), POSTINGS.len());
    assert_eq!(retriever.counts(), (POSTINGS.len(), POSTINGS.len()));
    assert_eq!(retriever.state(), IndexState::Populated);
}

#[test]
fn test_own_text_ranks_first() {
    let (retriever, _) = job_retriever();
    add_postings(&retriever);

    for (id, text) in POSTINGS {
        let results = retriever.search(text, 3).unwrap();
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[0].id, DocumentId::new(*id), "query: {text}");
        assert!(results[0].distance.abs() < 1e-5);
        assert!((results[0].similarity - 1.0).abs() < 1e-4);
    }
}

#[test]
fn test_empty_index_search_skips_embedding() {
    let (retriever, provider) = job_retriever();
    let results = retriever.search("rust backend", 10).unwrap();
    assert!(results.is_empty());
    assert_eq!(provider.calls(), 0);

    // The same holds when the model could never load.
    let offline = SemanticRetriever::new(Arc::new(UnavailableProvider), NormalizationMode::Strict);
    assert!(offline.search("anything", 3).unwrap().is_empty());
}

#[test]
fn test_top_k_larger_than_count_returns_everything_sorted() {
    let (retriever, _) = job_retriever();
    add_postings(&retriever);

    let results = retriever.search("rust data engineer", 100).unwrap();
    assert_eq!(results.len(), POSTINGS.len());
    for (i, pair) in results.windows(2).enumerate() {
        assert!(pair[0].distance <= pair[1].distance);
        assert!(pair[0].similarity >= pair[1].similarity);
        assert_eq!(pair[0].rank, i + 1);
    }
}

#[test]
fn test_equal_embeddings_keep_insertion_order() {
    let (retriever, _) = job_retriever();
    retriever
        .add_documents(&[
            (DocumentId::new(2), "Senior Rust developer"),
            (DocumentId::new(1), "Rust developer wanted"),
        ])
        .unwrap();

    let results = retriever.search("rust", 2).unwrap();
    assert_eq!(results[0].distance, results[1].distance);
    assert_eq!(results[0].id, DocumentId::new(2));
    assert_eq!(results[1].id, DocumentId::new(1));
}

#[test]
fn test_cat_dog_scenario() {
    let provider = Arc::new(KeywordProvider::new(&["cat", "dog"]));
    let retriever = SemanticRetriever::new(provider, NormalizationMode::Strict);
    retriever
        .add_embedded(vec![
            Document::new(1, "cat", vec![1.0, 0.0, 0.0]),
            Document::new(2, "dog", vec![0.0, 1.0, 0.0]),
        ])
        .unwrap();

    let results = retriever.search_vector(&[1.0, 0.0, 0.0], 2).unwrap();
    let summary: Vec<(i64, f32, f32)> = results
        .iter()
        .map(|r| (r.id.get(), r.distance, r.similarity))
        .collect();
    assert_eq!(summary, vec![(1, 0.0, 1.0), (2, 2.0, 0.0)]);

    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json[0]["id"], 1);
    assert_eq!(json[1]["text"], "dog");
}

#[test]
fn test_wrong_dimension_batch_changes_nothing() {
    let provider = Arc::new(KeywordProvider::new(&["cat", "dog"]));
    let retriever = SemanticRetriever::new(provider, NormalizationMode::Strict);
    retriever
        .add_embedded(vec![Document::new(1, "cat", vec![1.0, 0.0, 0.0])])
        .unwrap();

    let err = retriever
        .add_embedded(vec![
            Document::new(2, "dog", vec![0.0, 1.0, 0.0]),
            Document::new(3, "fish", vec![0.0, 1.0]),
        ])
        .unwrap_err();
    assert!(matches!(
        err,
        RetrievalError::DimensionMismatch {
            expected: 3,
            actual: 2
        }
    ));
    assert_eq!(retriever.counts(), (1, 1));

    let results = retriever.search_vector(&[0.0, 1.0, 0.0], 5).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, DocumentId::new(1));
}

#[test]
fn test_model_failure_surfaces_on_add() {
    let retriever = SemanticRetriever::new(Arc::new(UnavailableProvider), NormalizationMode::Strict);
    let err = retriever
        .add_documents(&[(DocumentId::new(1), "text")])
        .unwrap_err();
    assert_eq!(err.status_code(), "MODEL_INITIALIZATION_FAILURE");
    assert!(retriever.is_empty());
}

#[test]
fn test_short_provider_batch_is_rejected() {
    let retriever = SemanticRetriever::new(Arc::new(ShortBatchProvider), NormalizationMode::Strict);
    let err = retriever
        .add_documents(&[(DocumentId::new(1), "a"), (DocumentId::new(2), "b")])
        .unwrap_err();
    assert!(matches!(
        err,
        RetrievalError::BatchLengthMismatch {
            texts: 2,
            embeddings: 1
        }
    ));
    assert_eq!(retriever.counts(), (0, 0));
}

#[test]
fn test_threshold_drops_weak_matches() {
    let (retriever, _) = job_retriever();
    add_postings(&retriever);

    let all = retriever.search("rust backend", 5).unwrap();
    let strong = retriever.search_with_threshold("rust backend", 5, 0.9).unwrap();
    assert!(strong.len() < all.len());
    assert_eq!(strong[0].id, DocumentId::new(11));
    assert!(strong.iter().all(|r| r.similarity >= 0.9));
}
