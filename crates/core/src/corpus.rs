//! Corpus value objects.
//!
//! A corpus is a fixed set of book sections plus one pre-computed embedding
//! per section, joined by title. Everything here is immutable once loaded.

use serde::{Deserialize, Serialize};

/// A single section of the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Unique key within a corpus.
    pub title: String,

    /// The section text.
    pub content: String,

    /// Token count of `content`, computed when the corpus was built.
    pub tokens: usize,
}

impl Section {
    pub fn new(title: impl Into<String>, content: impl Into<String>, tokens: usize) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tokens,
        }
    }
}

/// A fixed-dimensionality embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(pub Vec<f32>);

impl EmbeddingVector {
    pub fn new(components: Vec<f32>) -> Self {
        Self(components)
    }

    /// Number of components.
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Inner product with another vector of the same length.
    ///
    /// Returns `None` when the lengths differ. Accumulates in f64.
    pub fn dot(&self, other: &[f32]) -> Option<f32> {
        if self.0.len() != other.len() {
            return None;
        }
        let sum: f64 = self
            .0
            .iter()
            .zip(other)
            .map(|(a, b)| *a as f64 * *b as f64)
            .sum();
        Some(sum as f32)
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(v: Vec<f32>) -> Self {
        Self(v)
    }
}

/// A section title paired with its similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSection {
    pub score: f32,
    pub title: String,
}
