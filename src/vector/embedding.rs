//! Embedding generation for semantic retrieval.
//!
//! This module provides the [`EmbeddingProvider`] trait and a fastembed
//! implementation using the all-MiniLM-L6-v2 sentence encoder by default.
//! Every vector a provider returns is unit length, which is what lets the
//! flat index turn squared distances back into cosine similarity.
//!
//! The encoder itself is loaded lazily on first use. Loading downloads and
//! initializes an ONNX session, so it is done at most once per provider;
//! concurrent first callers block until the load finishes.

use std::path::Path;
use std::time::Instant;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;

use crate::config::EmbeddingConfig;
use crate::error::{RetrievalError, RetrievalResult};
use crate::vector::{VectorDimension, normalize_in_place};

/// Default number of texts per encoder forward pass.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Trait for turning text into unit-length embeddings.
///
/// Implementations of this trait should be thread-safe and
/// capable of handling batch processing efficiently.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for multiple texts.
    ///
    /// Returns one vector per input text, in input order, each of length
    /// [`dimension`](Self::dimension) and unit norm.
    fn embed(&self, texts: &[&str]) -> RetrievalResult<Vec<Vec<f32>>>;

    /// Get the dimension of embeddings produced by this provider.
    #[must_use]
    fn dimension(&self) -> VectorDimension;

    /// Generate the embedding for a single text.
    fn embed_one(&self, text: &str) -> RetrievalResult<Vec<f32>> {
        let mut embeddings = self.embed(&[text])?;
        if embeddings.len() != 1 {
            return Err(RetrievalError::BatchLengthMismatch {
                texts: 1,
                embeddings: embeddings.len(),
            });
        }
        Ok(embeddings.swap_remove(0))
    }
}

/// Validates a loosely-typed batch and borrows its strings.
///
/// Fails with [`RetrievalError::InputType`] on the first element that is
/// not a JSON string.
pub fn texts_from_json(values: &[Value]) -> RetrievalResult<Vec<&str>> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            value.as_str().ok_or_else(|| RetrievalError::InputType {
                index,
                found: json_type_name(value).to_string(),
            })
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Checks and normalizes raw encoder output for a batch of `expected` texts.
pub fn finalize_embeddings(
    mut embeddings: Vec<Vec<f32>>,
    expected: usize,
    dimension: VectorDimension,
) -> RetrievalResult<Vec<Vec<f32>>> {
    if embeddings.len() != expected {
        return Err(RetrievalError::BatchLengthMismatch {
            texts: expected,
            embeddings: embeddings.len(),
        });
    }
    for embedding in &mut embeddings {
        dimension.validate_vector(embedding)?;
        normalize_in_place(embedding);
    }
    Ok(embeddings)
}

type Loader<T> = Box<dyn Fn() -> RetrievalResult<T> + Send + Sync>;

/// A value built on first access and shared behind a mutex afterwards.
///
/// Only one caller runs the loader; the rest block until it finishes. A
/// failed load leaves the cell empty so a later call can try again.
pub struct LazyModel<T> {
    cell: OnceCell<Mutex<T>>,
    loader: Loader<T>,
}

impl<T> LazyModel<T> {
    pub fn new(loader: impl Fn() -> RetrievalResult<T> + Send + Sync + 'static) -> Self {
        Self {
            cell: OnceCell::new(),
            loader: Box::new(loader),
        }
    }

    /// Returns exclusive access to the value, loading it if needed.
    pub fn lock(&self) -> RetrievalResult<MutexGuard<'_, T>> {
        let model = self.cell.get_or_try_init(|| (self.loader)().map(Mutex::new))?;
        Ok(model.lock())
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// Maps a configuration name to a fastembed model.
///
/// Accepts the enum-style names used in settings files as well as the
/// Hugging Face repository names.
pub fn parse_embedding_model(name: &str) -> RetrievalResult<EmbeddingModel> {
    match name.trim() {
        "AllMiniLML6V2" | "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
            Ok(EmbeddingModel::AllMiniLML6V2)
        }
        "AllMiniLML12V2" | "all-MiniLM-L12-v2" | "sentence-transformers/all-MiniLM-L12-v2" => {
            Ok(EmbeddingModel::AllMiniLML12V2)
        }
        "BGESmallENV15" | "BAAI/bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" | "BAAI/bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        other => Err(RetrievalError::UnknownModel(other.to_string())),
    }
}

/// FastEmbed implementation of [`EmbeddingProvider`].
///
/// # Performance
/// - Batch processing: ~1-10ms per embedding on average
/// - Memory: 384 * 4 bytes = 1536 bytes per embedding with the default model
pub struct FastEmbedProvider {
    model_name: String,
    encoder: LazyModel<TextEmbedding>,
    dimension: VectorDimension,
    batch_size: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model", &self.model_name)
            .field("dimension", &self.dimension)
            .field("batch_size", &self.batch_size)
            .field("loaded", &self.encoder.is_loaded())
            .finish()
    }
}

impl FastEmbedProvider {
    /// Create a provider for the default all-MiniLM-L6-v2 model.
    ///
    /// Nothing is downloaded here; the model loads on the first `embed` call.
    pub fn new() -> RetrievalResult<Self> {
        Self::from_config(&EmbeddingConfig::default())
    }

    /// Create a provider from embedding settings.
    ///
    /// # Errors
    /// Returns an error if the configured model name is not recognized.
    pub fn from_config(config: &EmbeddingConfig) -> RetrievalResult<Self> {
        let model = parse_embedding_model(&config.model)?;
        let info = TextEmbedding::get_model_info(&model)
            .map_err(|e| RetrievalError::ModelInitialization(e.to_string()))?;
        let dimension = VectorDimension::new(info.dim)?;

        let cache_dir = config
            .cache_dir
            .clone()
            .unwrap_or_else(crate::config::models_dir);
        let show_progress = config.show_download_progress;
        let model_name = config.model.clone();

        let encoder = LazyModel::new(move || load_encoder(model.clone(), &cache_dir, show_progress));

        Ok(Self {
            model_name,
            encoder,
            dimension,
            batch_size: config.batch_size.max(1),
        })
    }

    /// Name of the configured model.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Whether the encoder has been loaded yet.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.encoder.is_loaded()
    }
}

fn load_encoder(
    model: EmbeddingModel,
    cache_dir: &Path,
    show_progress: bool,
) -> RetrievalResult<TextEmbedding> {
    let started = Instant::now();
    tracing::info!(?model, cache_dir = %cache_dir.display(), "loading embedding model");

    let encoder = TextEmbedding::try_new(
        InitOptions::new(model)
            .with_cache_dir(cache_dir.to_path_buf())
            .with_show_download_progress(show_progress),
    )
    .map_err(|e| {
        tracing::error!("embedding model failed to load: {e}");
        RetrievalError::ModelInitialization(e.to_string())
    })?;

    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "embedding model ready"
    );
    Ok(encoder)
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed(&self, texts: &[&str]) -> RetrievalResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .encoder
            .lock()?
            .embed(texts.to_vec(), Some(self.batch_size))
            .map_err(|e| RetrievalError::EmbeddingFailed(e.to_string()))?;

        tracing::trace!(texts = texts.len(), "generated embeddings");
        finalize_embeddings(embeddings, texts.len(), self.dimension)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Mock embedding provider for testing.
///
/// Hashes each lowercase word into a bucket, so texts sharing words end up
/// close together and identical texts get identical vectors.
#[cfg(test)]
pub struct MockEmbeddingProvider {
    dimension: VectorDimension,
}

#[cfg(test)]
impl MockEmbeddingProvider {
    #[must_use]
    pub fn with_dimension(dim: usize) -> Self {
        Self {
            dimension: VectorDimension::new(dim).unwrap(),
        }
    }
}

#[cfg(test)]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn embed(&self, texts: &[&str]) -> RetrievalResult<Vec<Vec<f32>>> {
        let dim = self.dimension.get();
        let raw = texts
            .iter()
            .map(|text| {
                let mut embedding = vec![0.01; dim];
                for word in text.split_whitespace() {
                    let bucket = word
                        .to_lowercase()
                        .bytes()
                        .fold(17usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
                    embedding[bucket % dim] += 1.0;
                }
                embedding
            })
            .collect();
        finalize_embeddings(raw, texts.len(), self.dimension)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}
