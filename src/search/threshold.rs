//! Minimum-similarity cutoffs, either numeric or by name.

use std::str::FromStr;

use crate::error::{RetrievalError, RetrievalResult};

/// Named cutoffs for filtering search results.
///
/// Values were picked against all-MiniLM-L6-v2 on short job and resume texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityLevel {
    /// Same concept, different wording.
    Strong,
    /// Related concepts.
    Moderate,
    /// Loosely on topic.
    Loose,
}

impl SimilarityLevel {
    #[must_use]
    pub const fn min_similarity(self) -> f32 {
        match self {
            Self::Strong => 0.75,
            Self::Moderate => 0.60,
            Self::Loose => 0.40,
        }
    }
}

impl FromStr for SimilarityLevel {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strong" => Ok(Self::Strong),
            "moderate" => Ok(Self::Moderate),
            "loose" => Ok(Self::Loose),
            _ => Err(RetrievalError::InvalidThreshold(s.to_string())),
        }
    }
}

/// Parses a threshold given as a level name or a number in `0..=1`.
pub fn parse_threshold(value: &str) -> RetrievalResult<f32> {
    if let Ok(level) = value.parse::<SimilarityLevel>() {
        return Ok(level.min_similarity());
    }
    match value.trim().parse::<f32>() {
        Ok(number) if (0.0..=1.0).contains(&number) => Ok(number),
        _ => Err(RetrievalError::InvalidThreshold(value.to_string())),
    }
}
