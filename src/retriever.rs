//! Semantic retriever that orchestrates embedding, indexing and ranking.
//!
//! This module provides the caller-facing entry point: documents go in as
//! `(id, text)` pairs, queries come back as ranked [`SearchResult`]s.
//!
//! The flat index and the document store live together in one [`Corpus`]
//! behind a single reader-writer lock. A batch add takes the write lock once
//! and appends to both, so readers never see a vector without its record.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::{IndexConfig, Settings};
use crate::document::{Document, DocumentRecord, DocumentStore};
use crate::error::{RetrievalError, RetrievalResult};
use crate::search::{SearchRanker, SearchResult};
use crate::vector::{
    DocumentId, EmbeddingProvider, FastEmbedProvider, FlatIndex, NormalizationMode, Ordinal,
    SearchHit, VectorDimension,
};

/// Whether any document has been added yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Empty,
    Populated,
}

/// Vector index plus the document records aligned with it.
#[derive(Debug)]
pub struct Corpus {
    index: FlatIndex,
    store: DocumentStore,
}

impl Corpus {
    #[must_use]
    pub fn new(index: FlatIndex) -> Self {
        Self {
            index,
            store: DocumentStore::new(),
        }
    }

    /// Appends records and their vectors as one unit.
    ///
    /// The index validates the whole batch before touching anything, and the
    /// store cannot fail, so either both grow or neither does.
    pub fn append(
        &mut self,
        records: Vec<DocumentRecord>,
        vectors: &[Vec<f32>],
    ) -> RetrievalResult<()> {
        if records.len() != vectors.len() {
            return Err(RetrievalError::BatchLengthMismatch {
                texts: records.len(),
                embeddings: vectors.len(),
            });
        }
        self.index.add_batch(vectors)?;
        self.store.add_batch(records);
        debug_assert_eq!(self.index.len(), self.store.len());
        Ok(())
    }

    /// Runs `hits` through `ranker` against this corpus' records.
    pub fn rank(&self, ranker: &SearchRanker, hits: &[SearchHit]) -> RetrievalResult<Vec<SearchResult>> {
        ranker.rank(hits, &self.store).inspect_err(|e| {
            if e.is_fatal() {
                tracing::error!(
                    index_len = self.index.len(),
                    store_len = self.store.len(),
                    "index and document store out of step: {e}"
                );
            }
        })
    }

    #[must_use]
    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    #[must_use]
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// Main retrieval engine shared between threads.
pub struct SemanticRetriever {
    provider: Arc<dyn EmbeddingProvider>,
    corpus: RwLock<Corpus>,
}

impl std::fmt::Debug for SemanticRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticRetriever")
            .field("dimension", &self.provider.dimension())
            .field("documents", &self.len())
            .finish()
    }
}

impl SemanticRetriever {
    /// Creates an empty retriever around an embedding provider.
    ///
    /// The index dimension is taken from the provider.
    #[must_use]
    pub fn new(provider: Arc<dyn EmbeddingProvider>, normalization: NormalizationMode) -> Self {
        let index = FlatIndex::with_normalization(provider.dimension(), normalization);
        Self::with_index(provider, index)
    }

    /// Creates a retriever using index settings from configuration.
    #[must_use]
    pub fn with_config(provider: Arc<dyn EmbeddingProvider>, config: &IndexConfig) -> Self {
        let index = FlatIndex::with_normalization(provider.dimension(), config.normalization)
            .norm_tolerance(config.norm_tolerance);
        Self::with_index(provider, index)
    }

    fn with_index(provider: Arc<dyn EmbeddingProvider>, index: FlatIndex) -> Self {
        Self {
            provider,
            corpus: RwLock::new(Corpus::new(index)),
        }
    }

    /// Creates a fastembed-backed retriever from settings.
    ///
    /// The model itself is not loaded until the first embedding is needed.
    pub fn from_settings(settings: &Settings) -> RetrievalResult<Self> {
        let provider = FastEmbedProvider::from_config(&settings.embedding)?;
        Ok(Self::with_config(Arc::new(provider), &settings.index))
    }

    /// Embeds and stores a batch of documents.
    ///
    /// Embedding runs before the write lock is taken. Any error leaves the
    /// retriever exactly as it was. Returns the number of documents added.
    pub fn add_documents(&self, documents: &[(DocumentId, &str)]) -> RetrievalResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = documents.iter().map(|(_, text)| *text).collect();
        let embeddings = self.provider.embed(&texts)?;

        let records = documents
            .iter()
            .map(|(id, text)| DocumentRecord::new(*id, *text))
            .collect();
        self.append(records, &embeddings)
    }

    /// Stores documents whose embeddings were computed elsewhere.
    pub fn add_embedded(&self, documents: Vec<Document>) -> RetrievalResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let (records, embeddings): (Vec<_>, Vec<_>) =
            documents.into_iter().map(Document::into_parts).unzip();
        self.append(records, &embeddings)
    }

    fn append(&self, records: Vec<DocumentRecord>, embeddings: &[Vec<f32>]) -> RetrievalResult<usize> {
        let count = records.len();
        let mut corpus = self.corpus.write();
        match corpus.append(records, embeddings) {
            Ok(()) => {
                tracing::debug!(added = count, total = corpus.len(), "added documents");
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(batch = count, "rejected document batch: {e}");
                Err(e)
            }
        }
    }

    /// Returns the `top_k` documents most similar to `query`.
    ///
    /// Searching an empty retriever returns no results without loading the
    /// embedding model.
    pub fn search(&self, query: &str, top_k: usize) -> RetrievalResult<Vec<SearchResult>> {
        self.search_ranked(query, top_k, &SearchRanker::new(), None)
    }

    /// Like [`search`](Self::search), keeping only results at or above
    /// `min_similarity`.
    pub fn search_with_threshold(
        &self,
        query: &str,
        top_k: usize,
        min_similarity: f32,
    ) -> RetrievalResult<Vec<SearchResult>> {
        self.search_ranked(query, top_k, &SearchRanker::with_threshold(min_similarity), None)
    }

    /// Like [`search`](Self::search), giving up with
    /// [`RetrievalError::Cancelled`] once `cancel` fires.
    pub fn search_cancellable(
        &self,
        query: &str,
        top_k: usize,
        cancel: &CancellationToken,
    ) -> RetrievalResult<Vec<SearchResult>> {
        self.search_ranked(query, top_k, &SearchRanker::new(), Some(cancel))
    }

    fn search_ranked(
        &self,
        query: &str,
        top_k: usize,
        ranker: &SearchRanker,
        cancel: Option<&CancellationToken>,
    ) -> RetrievalResult<Vec<SearchResult>> {
        if self.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let query_vector = self.provider.embed_one(query)?;
        self.search_embedded(&query_vector, top_k, ranker, cancel)
    }

    /// Searches with a query vector that is already embedded.
    pub fn search_vector(&self, query: &[f32], top_k: usize) -> RetrievalResult<Vec<SearchResult>> {
        self.search_embedded(query, top_k, &SearchRanker::new(), None)
    }

    fn search_embedded(
        &self,
        query: &[f32],
        top_k: usize,
        ranker: &SearchRanker,
        cancel: Option<&CancellationToken>,
    ) -> RetrievalResult<Vec<SearchResult>> {
        let corpus = self.corpus.read();
        let hits = match cancel {
            Some(token) => corpus.index().search_cancellable(query, top_k, token)?,
            None => corpus.index().search(query, top_k)?,
        };
        let results = corpus.rank(ranker, &hits)?;
        tracing::debug!(
            top_k,
            scanned = corpus.len(),
            returned = results.len(),
            "search complete"
        );
        Ok(results)
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.corpus.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corpus.read().is_empty()
    }

    #[must_use]
    pub fn state(&self) -> IndexState {
        if self.is_empty() {
            IndexState::Empty
        } else {
            IndexState::Populated
        }
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.provider.dimension()
    }

    /// Returns a copy of the record stored at `ordinal`.
    pub fn document(&self, ordinal: Ordinal) -> RetrievalResult<DocumentRecord> {
        self.corpus.read().store().get(ordinal).cloned()
    }

    /// Counts held by the index and the store, for consistency checks.
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        let corpus = self.corpus.read();
        (corpus.index().len(), corpus.store().len())
    }

    /// Runs [`add_documents`](Self::add_documents) on the blocking pool.
    pub async fn add_documents_async(
        self: Arc<Self>,
        documents: Vec<(DocumentId, String)>,
    ) -> RetrievalResult<usize> {
        tokio::task::spawn_blocking(move || {
            let borrowed: Vec<(DocumentId, &str)> = documents
                .iter()
                .map(|(id, text)| (*id, text.as_str()))
                .collect();
            self.add_documents(&borrowed)
        })
        .await
        .map_err(|e| RetrievalError::TaskJoin(e.to_string()))?
    }

    /// Runs [`search`](Self::search) on the blocking pool.
    ///
    /// Model inference can take a while; this keeps it off async worker
    /// threads that need to stay responsive.
    pub async fn search_async(
        self: Arc<Self>,
        query: String,
        top_k: usize,
    ) -> RetrievalResult<Vec<SearchResult>> {
        tokio::task::spawn_blocking(move || self.search(&query, top_k))
            .await
            .map_err(|e| RetrievalError::TaskJoin(e.to_string()))?
    }
}
