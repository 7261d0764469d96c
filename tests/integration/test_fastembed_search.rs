//! Searches backed by the real all-MiniLM-L6-v2 encoder.

use docsim::vector::{VECTOR_DIMENSION_384, l2_norm};
use docsim::{DocumentId, EmbeddingProvider, FastEmbedProvider, SemanticRetriever, Settings};
use std::path::PathBuf;
use std::sync::Arc;

/// Get a unique cache directory for each test to avoid conflicts
fn get_test_cache_dir(test_name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "docsim_test_fastembed_{}_{}",
        test_name,
        std::process::id()
    ))
}

fn settings_for(test_name: &str) -> Settings {
    let mut settings = Settings::default();
    settings.embedding.cache_dir = Some(get_test_cache_dir(test_name));
    settings
}

#[test]
#[ignore = "Downloads 86MB model - run with --ignored for semantic tests"]
fn test_resume_matches_job_post() {
    let retriever = SemanticRetriever::from_settings(&settings_for("resume_match")).unwrap();
    retriever
        .add_documents(&[
            (DocumentId::new(1), "Backend engineer: Rust, Tokio, PostgreSQL, distributed systems"),
            (DocumentId::new(2), "Pastry chef with ten years of experience in French bakeries"),
            (DocumentId::new(3), "Registered nurse, intensive care unit, night shifts"),
        ])
        .unwrap();

    let results = retriever
        .search("Looking for a systems programmer to build async network services", 3)
        .unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].id, DocumentId::new(1));
    assert!(results[0].similarity > results[2].similarity);
}

#[test]
#[ignore = "Downloads 86MB model - run with --ignored for semantic tests"]
fn test_own_text_is_exact_match() {
    let retriever = SemanticRetriever::from_settings(&settings_for("own_text")).unwrap();
    let text = "Data analyst fluent in SQL and dashboards";
    retriever
        .add_documents(&[
            (DocumentId::new(7), "Carpenter building custom furniture"),
            (DocumentId::new(8), text),
        ])
        .unwrap();

    let results = retriever.search(text, 1).unwrap();
    assert_eq!(results[0].id, DocumentId::new(8));
    assert!(results[0].distance < 1e-4);
    assert!(results[0].similarity > 0.9999);
}

#[test]
#[ignore = "Downloads 86MB model - run with --ignored for semantic tests"]
fn test_concurrent_first_use_loads_once() {
    let mut config = Settings::default().embedding;
    config.cache_dir = Some(get_test_cache_dir("concurrent_first_use"));
    let provider = Arc::new(FastEmbedProvider::from_config(&config).unwrap());
    assert!(!provider.is_loaded());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let provider = Arc::clone(&provider);
            std::thread::spawn(move || provider.embed_one(&format!("thread {i} text")).unwrap())
        })
        .collect();

    for handle in handles {
        let embedding = handle.join().unwrap();
        assert_eq!(embedding.len(), VECTOR_DIMENSION_384);
        assert!((l2_norm(&embedding) - 1.0).abs() < 1e-5);
    }
    assert!(provider.is_loaded());
}
