//! Exact nearest-neighbor index over a contiguous embedding buffer.
//!
//! Vectors are stored row-major in one `Vec<f32>`; the row number is the
//! [`Ordinal`] shared with the document store. Search is a brute-force
//! squared-Euclidean scan over every row, so results are exact.
//!
//! # Ordering
//! Hits are ordered by ascending distance. Equal distances are ordered by
//! ordinal, which means the earlier-inserted vector ranks first.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::error::{RetrievalError, RetrievalResult};
use crate::vector::{
    NormalizationMode, Ordinal, VectorDimension, l2_norm, normalize_in_place, squared_l2,
};

/// Number of vectors compared between two cancellation checks.
pub const SCAN_BLOCK_SIZE: usize = 4096;

/// Indexes with fewer vectors than this are scanned on the calling thread.
const PARALLEL_SCAN_MIN: usize = 2048;

/// Default allowed deviation from unit norm in strict mode.
pub const DEFAULT_NORM_TOLERANCE: f32 = 1e-3;

/// One raw match from the index: where it is stored and how far it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub ordinal: Ordinal,
    /// Squared Euclidean distance to the query.
    pub distance: f32,
}

/// Heap entry ordered by (distance, ordinal) so the worst hit sits on top.
#[derive(Debug, Clone, Copy)]
struct Ranked(SearchHit);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .distance
            .total_cmp(&other.0.distance)
            .then_with(|| self.0.ordinal.cmp(&other.0.ordinal))
    }
}

/// Bounded max-heap keeping the `k` best hits seen so far.
struct TopK {
    k: usize,
    heap: BinaryHeap<Ranked>,
}

impl TopK {
    fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k.saturating_add(1).min(SCAN_BLOCK_SIZE)),
        }
    }

    fn push(&mut self, hit: SearchHit) {
        let candidate = Ranked(hit);
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if candidate < *worst {
                *worst = candidate;
            }
        }
    }

    fn into_sorted(self) -> Vec<SearchHit> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Ranked(hit)| hit)
            .collect()
    }
}

/// Append-only flat index with exact squared-L2 search.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: VectorDimension,
    normalization: NormalizationMode,
    norm_tolerance: f32,
    data: Vec<f32>,
    len: usize,
}

impl FlatIndex {
    /// Creates an empty index in strict normalization mode.
    #[must_use]
    pub fn new(dimension: VectorDimension) -> Self {
        Self::with_normalization(dimension, NormalizationMode::Strict)
    }

    #[must_use]
    pub fn with_normalization(dimension: VectorDimension, normalization: NormalizationMode) -> Self {
        Self {
            dimension,
            normalization,
            norm_tolerance: DEFAULT_NORM_TOLERANCE,
            data: Vec::new(),
            len: 0,
        }
    }

    /// Overrides the unit-norm tolerance used in strict mode.
    #[must_use]
    pub fn norm_tolerance(mut self, tolerance: f32) -> Self {
        self.norm_tolerance = tolerance.abs();
        self
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the stored (possibly normalized) vector at `ordinal`.
    #[must_use]
    pub fn vector(&self, ordinal: Ordinal) -> Option<&[f32]> {
        let dim = self.dimension.get();
        let start = ordinal.get().checked_mul(dim)?;
        let end = start.checked_add(dim)?;
        self.data.get(start..end)
    }

    /// Checks a whole batch against this index without modifying it.
    ///
    /// Every vector must have the index dimension; in strict mode every
    /// vector must also be unit length within the tolerance.
    pub fn validate_batch<V: AsRef<[f32]>>(&self, vectors: &[V]) -> RetrievalResult<()> {
        for (position, vector) in vectors.iter().enumerate() {
            let vector = vector.as_ref();
            self.dimension.validate_vector(vector)?;
            self.check_norm(vector, position)?;
        }
        Ok(())
    }

    fn check_norm(&self, vector: &[f32], position: usize) -> RetrievalResult<()> {
        if self.normalization == NormalizationMode::Strict {
            let norm = l2_norm(vector);
            if !((norm - 1.0).abs() <= self.norm_tolerance) {
                return Err(RetrievalError::NotNormalized { position, norm });
            }
        }
        Ok(())
    }

    /// Appends a batch of vectors.
    ///
    /// The batch is validated in full first; on error nothing is appended.
    /// Every accepted non-zero vector is rescaled to exactly unit length, so
    /// strict mode also drops the small drift it tolerates.
    pub fn add_batch<V: AsRef<[f32]>>(&mut self, vectors: &[V]) -> RetrievalResult<()> {
        self.validate_batch(vectors)?;
        if vectors.is_empty() {
            return Ok(());
        }

        let dim = self.dimension.get();
        self.data.reserve(vectors.len() * dim);
        for vector in vectors {
            let start = self.data.len();
            self.data.extend_from_slice(vector.as_ref());
            normalize_in_place(&mut self.data[start..]);
        }
        self.len += vectors.len();

        tracing::debug!(
            added = vectors.len(),
            total = self.len,
            "appended vectors to flat index"
        );
        Ok(())
    }

    /// Applies the insert-time policy to a query vector.
    ///
    /// Queries must match the index dimension. Strict mode rejects non-unit
    /// queries; an accepted query that is not already exactly unit length is
    /// normalized into a copy.
    pub fn prepare_query<'a>(&self, query: &'a [f32]) -> RetrievalResult<Cow<'a, [f32]>> {
        self.dimension.validate_vector(query)?;
        self.check_norm(query, 0)?;

        let norm = l2_norm(query);
        if norm == 1.0 || norm == 0.0 {
            return Ok(Cow::Borrowed(query));
        }
        let mut owned = query.to_vec();
        normalize_in_place(&mut owned);
        Ok(Cow::Owned(owned))
    }

    /// Returns the `top_k` nearest stored vectors, nearest first.
    ///
    /// An empty index or `top_k == 0` yields an empty result. When fewer than
    /// `top_k` vectors are stored, all of them are returned in order.
    pub fn search(&self, query: &[f32], top_k: usize) -> RetrievalResult<Vec<SearchHit>> {
        self.scan(query, top_k, |_| false)
    }

    /// Same as [`search`](Self::search), checking `cancel` every
    /// [`SCAN_BLOCK_SIZE`] comparisons.
    pub fn search_cancellable(
        &self,
        query: &[f32],
        top_k: usize,
        cancel: &CancellationToken,
    ) -> RetrievalResult<Vec<SearchHit>> {
        self.scan(query, top_k, |_| cancel.is_cancelled())
    }

    /// Scans block by block, asking `stop` with the block number before each.
    fn scan(
        &self,
        query: &[f32],
        top_k: usize,
        mut stop: impl FnMut(usize) -> bool,
    ) -> RetrievalResult<Vec<SearchHit>> {
        let query = self.prepare_query(query)?;
        if self.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let dim = self.dimension.get();
        let parallel = self.len >= PARALLEL_SCAN_MIN;
        let mut best = TopK::new(top_k.min(self.len));

        for (block_index, block) in self.data.chunks(dim * SCAN_BLOCK_SIZE).enumerate() {
            if stop(block_index) {
                tracing::debug!(
                    scanned = block_index * SCAN_BLOCK_SIZE,
                    total = self.len,
                    "flat scan cancelled"
                );
                return Err(RetrievalError::Cancelled);
            }

            let distances: Vec<f32> = if parallel {
                block
                    .par_chunks_exact(dim)
                    .map(|row| squared_l2(&query, row))
                    .collect()
            } else {
                block
                    .chunks_exact(dim)
                    .map(|row| squared_l2(&query, row))
                    .collect()
            };

            let base = block_index * SCAN_BLOCK_SIZE;
            for (offset, distance) in distances.into_iter().enumerate() {
                best.push(SearchHit {
                    ordinal: Ordinal::new(base + offset),
                    distance,
                });
            }
        }

        let hits = best.into_sorted();
        tracing::trace!(top_k, returned = hits.len(), "flat scan complete");
        Ok(hits)
    }
}
