//! Document records and the ordinal-aligned metadata store.

mod store;

pub use store::DocumentStore;

use crate::vector::DocumentId;
use serde::{Deserialize, Serialize};

/// Metadata stored for one indexed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub text: String,
}

impl DocumentRecord {
    pub fn new(id: impl Into<DocumentId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A document that arrives with its embedding already computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding,
        }
    }

    /// Splits into the metadata record and the raw embedding.
    pub fn into_parts(self) -> (DocumentRecord, Vec<f32>) {
        (
            DocumentRecord {
                id: self.id,
                text: self.text,
            },
            self.embedding,
        )
    }
}
