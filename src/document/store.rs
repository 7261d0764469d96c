//! Append-only metadata storage keyed by ordinal.

use super::DocumentRecord;
use crate::error::{RetrievalError, RetrievalResult};
use crate::vector::Ordinal;

/// Ordered document records; the position of a record is its ordinal.
///
/// The store never validates or reorders entries. Keeping it aligned with
/// the vector index is the job of the caller that appends to both.
#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    records: Vec<DocumentRecord>,
}

impl DocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a batch of records in order.
    pub fn add_batch(&mut self, entries: impl IntoIterator<Item = DocumentRecord>) {
        self.records.extend(entries);
    }

    /// Looks up the record stored at `ordinal`.
    pub fn get(&self, ordinal: Ordinal) -> RetrievalResult<&DocumentRecord> {
        self.records
            .get(ordinal.get())
            .ok_or(RetrievalError::OrdinalOutOfRange {
                ordinal: ordinal.get(),
                len: self.records.len(),
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
