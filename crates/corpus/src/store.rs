//! Process-wide corpus store.
//!
//! The corpus is read from disk on first use and then shared as an
//! `Arc<Corpus>` by every request. Initialization runs at most once at a
//! time; a failed load is not remembered, so the next caller retries.

use std::path::PathBuf;
use std::sync::Arc;

use askbook_config::CorpusConfig;
use askbook_core::error::{Error, Result};
use tokio::sync::OnceCell;
use tracing::info;

use crate::Corpus;
use crate::loader::load_corpus;

pub struct CorpusStore {
    sections_path: PathBuf,
    embeddings_path: PathBuf,
    corpus: OnceCell<Arc<Corpus>>,
}

impl CorpusStore {
    /// A store that loads lazily from the configured files.
    pub fn new(config: &CorpusConfig) -> Self {
        Self {
            sections_path: config.sections_path.clone(),
            embeddings_path: config.embeddings_path.clone(),
            corpus: OnceCell::new(),
        }
    }

    /// A store around an already-built corpus (tests, embedded data).
    pub fn preloaded(corpus: Corpus) -> Self {
        Self {
            sections_path: PathBuf::new(),
            embeddings_path: PathBuf::new(),
            corpus: OnceCell::new_with(Some(Arc::new(corpus))),
        }
    }

    /// Get the corpus, loading it on first call.
    pub async fn get(&self) -> Result<Arc<Corpus>> {
        self.corpus
            .get_or_try_init(|| async {
                info!(
                    sections = %self.sections_path.display(),
                    embeddings = %self.embeddings_path.display(),
                    "Loading corpus"
                );
                let sections = self.sections_path.clone();
                let embeddings = self.embeddings_path.clone();
                let corpus = tokio::task::spawn_blocking(move || load_corpus(&sections, &embeddings))
                    .await
                    .map_err(|e| {
                        Error::malformed(
                            self.sections_path.display().to_string(),
                            format!("corpus loader task failed: {e}"),
                        )
                    })??;
                Ok::<_, Error>(Arc::new(corpus))
            })
            .await
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.corpus.initialized()
    }
}
