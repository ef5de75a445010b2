//! Corpus loading for Askbook.
//!
//! A corpus is two CSV files produced offline: one row per book section
//! (`title,content,tokens`) and one row per section embedding
//! (`title,0,1,...`). They are parsed once into typed records, checked
//! against each other, and shared read-only for the life of the process.

pub mod loader;
pub mod store;
pub mod title_map;

use askbook_core::corpus::{EmbeddingVector, Section};
use askbook_core::error::{Error, Result};

pub use loader::{load_corpus, load_embeddings, load_sections};
pub use store::CorpusStore;
pub use title_map::TitleMap;

/// Sections and their embeddings, joined by title.
///
/// Both maps always have the same key set; [`Corpus::new`] refuses
/// anything else.
#[derive(Debug, Clone)]
pub struct Corpus {
    sections: TitleMap<Section>,
    embeddings: TitleMap<EmbeddingVector>,
    dimensions: usize,
}

impl Corpus {
    /// Join sections and embeddings, checking both directions of the key set.
    pub fn new(sections: TitleMap<Section>, embeddings: TitleMap<EmbeddingVector>) -> Result<Self> {
        if let Some(title) = embeddings.titles().find(|t| !sections.contains(t)) {
            return Err(Error::CorpusInconsistency(format!(
                "embedding for '{title}' has no matching section"
            )));
        }
        if let Some(title) = sections.titles().find(|t| !embeddings.contains(t)) {
            return Err(Error::CorpusInconsistency(format!(
                "section '{title}' has no embedding"
            )));
        }

        let dimensions = embeddings
            .values()
            .next()
            .map(EmbeddingVector::dimensions)
            .unwrap_or(0);
        if embeddings.values().any(|e| e.dimensions() != dimensions) {
            return Err(Error::malformed(
                "embeddings",
                "embedding vectors have differing dimensionality",
            ));
        }

        Ok(Self {
            sections,
            embeddings,
            dimensions,
        })
    }

    pub fn sections(&self) -> &TitleMap<Section> {
        &self.sections
    }

    pub fn embeddings(&self) -> &TitleMap<EmbeddingVector> {
        &self.embeddings
    }

    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.get(title)
    }

    pub fn embedding(&self, title: &str) -> Option<&EmbeddingVector> {
        self.embeddings.get(title)
    }

    /// Embedding dimensionality shared by every section (0 for an empty corpus).
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sum of all section token counts.
    pub fn total_tokens(&self) -> usize {
        self.sections.values().map(|s| s.tokens).sum()
    }
}
