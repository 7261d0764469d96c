//! Error types for the retrieval core
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use thiserror::Error;

/// Main error type for embedding, indexing and search operations
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// A text batch contained something other than a string
    #[error(
        "Batch element {index} is {found}, expected a string\nSuggestion: Pass only text values to the embedding provider"
    )]
    InputType { index: usize, found: String },

    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors use the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error(
        "Vector at batch position {position} has norm {norm}, expected 1.0\nSuggestion: Normalize embeddings before insertion or enable auto normalization"
    )]
    NotNormalized { position: usize, norm: f32 },

    /// Index and document store disagree about an ordinal
    #[error(
        "Ordinal {ordinal} is out of range for a store holding {len} documents\nSuggestion: This is an internal consistency failure, rebuild the index"
    )]
    OrdinalOutOfRange { ordinal: usize, len: usize },

    #[error(
        "Failed to initialize embedding model: {0}\nSuggestion: Ensure you have internet connection for first-time model download"
    )]
    ModelInitialization(String),

    #[error(
        "Embedding generation failed: {0}\nSuggestion: Verify the embedding model is properly initialized"
    )]
    EmbeddingFailed(String),

    #[error(
        "Embedding provider returned {embeddings} vectors for {texts} texts\nSuggestion: Check the embedding provider implementation"
    )]
    BatchLengthMismatch { texts: usize, embeddings: usize },

    #[error(
        "Unknown embedding model '{0}'\nSuggestion: Use one of: {models}",
        models = KNOWN_MODELS
    )]
    UnknownModel(String),

    #[error(
        "Invalid similarity threshold '{0}'\nSuggestion: Use a number between 0 and 1, or one of: strong, moderate, loose"
    )]
    InvalidThreshold(String),

    #[error("Search was cancelled before the scan completed")]
    Cancelled,

    #[error("Background task failed: {0}")]
    TaskJoin(String),
}

const KNOWN_MODELS: &str = "AllMiniLML6V2, AllMiniLML12V2, BGESmallENV15, BGEBaseENV15";

impl RetrievalError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::InputType { .. } => "INPUT_TYPE_ERROR",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::InvalidDimension { .. } => "INVALID_DIMENSION",
            Self::NotNormalized { .. } => "NOT_NORMALIZED",
            Self::OrdinalOutOfRange { .. } => "ORDINAL_OUT_OF_RANGE",
            Self::ModelInitialization(_) => "MODEL_INITIALIZATION_FAILURE",
            Self::EmbeddingFailed(_) => "EMBEDDING_FAILED",
            Self::BatchLengthMismatch { .. } => "BATCH_LENGTH_MISMATCH",
            Self::UnknownModel(_) => "UNKNOWN_MODEL",
            Self::InvalidThreshold(_) => "INVALID_THRESHOLD",
            Self::Cancelled => "CANCELLED",
            Self::TaskJoin(_) => "TASK_JOIN_ERROR",
        }
        .to_string()
    }

    /// Whether this error means the index and store are out of step.
    ///
    /// Callers should stop using the retriever after such an error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::OrdinalOutOfRange { .. })
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::ModelInitialization(_) => vec![
                "Check network access for the first model download",
                "Set embedding.cache_dir to a writable directory",
            ],
            Self::DimensionMismatch { .. } => vec![
                "Embeddings from different models cannot share an index",
                "Rebuild the index with a single embedding model",
            ],
            Self::NotNormalized { .. } => vec![
                "Divide each vector by its Euclidean norm before adding it",
                "Set index.normalization = \"auto\" to normalize on insert",
            ],
            Self::OrdinalOutOfRange { .. } => vec![
                "Restart the process and re-add all documents",
            ],
            Self::UnknownModel(_) => vec!["Check the embedding.model setting"],
            _ => vec![],
        }
    }
}

/// Result type alias for retrieval operations
pub type RetrievalResult<T> = Result<T, RetrievalError>;
