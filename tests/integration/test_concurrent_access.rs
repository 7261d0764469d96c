//! Readers and writers sharing one retriever.
//!
//! A search must only ever see whole batches: with every batch the same size,
//! the number of documents a reader observes is always a multiple of it.

use crate::common::{JOB_VOCABULARY, KeywordProvider};
use docsim::{DocumentId, NormalizationMode, SemanticRetriever};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const BATCH: usize = 7;
const BATCHES: usize = 40;

fn batch_texts(batch: usize) -> Vec<(DocumentId, String)> {
    (0..BATCH)
        .map(|i| {
            let word = JOB_VOCABULARY[(batch + i) % JOB_VOCABULARY.len()];
            (
                DocumentId::new((batch * BATCH + i) as i64),
                format!("{word} role number {i}"),
            )
        })
        .collect()
}

#[test]
fn test_readers_never_see_partial_batches() {
    let provider = Arc::new(KeywordProvider::new(JOB_VOCABULARY));
    let retriever = SemanticRetriever::new(provider, NormalizationMode::Strict);
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for batch in 0..BATCHES {
                let docs = batch_texts(batch);
                let borrowed: Vec<(DocumentId, &str)> =
                    docs.iter().map(|(id, t)| (*id, t.as_str())).collect();
                retriever.add_documents(&borrowed).unwrap();
            }
            done.store(true, Ordering::SeqCst);
        });

        for _ in 0..4 {
            scope.spawn(|| {
                loop {
                    let finished = done.load(Ordering::SeqCst);
                    let (index_len, store_len) = retriever.counts();
                    assert_eq!(index_len, store_len);

                    let results = retriever.search("rust backend", usize::MAX).unwrap();
                    assert_eq!(results.len() % BATCH, 0, "saw a partial batch");
                    for pair in results.windows(2) {
                        assert!(pair[0].distance <= pair[1].distance);
                    }

                    if finished {
                        break;
                    }
                }
            });
        }
    });

    assert_eq!(retriever.len(), BATCH * BATCHES);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_searches_run_concurrently() {
    let provider = Arc::new(KeywordProvider::new(JOB_VOCABULARY));
    let retriever = Arc::new(SemanticRetriever::new(provider, NormalizationMode::Strict));

    let added = Arc::clone(&retriever)
        .add_documents_async(vec![
            (DocumentId::new(1), "Rust backend engineer".to_string()),
            (DocumentId::new(2), "Head chef".to_string()),
            (DocumentId::new(3), "Python data analyst".to_string()),
        ])
        .await
        .unwrap();
    assert_eq!(added, 3);

    let queries = ["rust backend", "chef", "python data"];
    let handles: Vec<_> = queries
        .iter()
        .map(|q| tokio::spawn(Arc::clone(&retriever).search_async(q.to_string(), 1)))
        .collect();

    let mut top_ids = Vec::new();
    for handle in handles {
        let results = handle.await.unwrap().unwrap();
        top_ids.push(results[0].id.get());
    }
    assert_eq!(top_ids, vec![1, 2, 3]);
}
