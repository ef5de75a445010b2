//! Similarity ranking over the corpus embeddings.
//!
//! Scores are plain inner products: no normalization step. For the
//! embedding models in use the ordering matches cosine similarity closely
//! enough, and the dot product is cheaper.

use askbook_core::corpus::RankedSection;
use askbook_core::error::{Error, Result};
use askbook_corpus::Corpus;

/// Rank every section of the corpus against a query embedding.
///
/// Returns all titles, best first. The sort is stable, so equal scores keep
/// corpus order. A query whose length differs from any section embedding
/// aborts the whole ranking.
pub fn rank(query_embedding: &[f32], corpus: &Corpus) -> Result<Vec<RankedSection>> {
    let mut ranked = Vec::with_capacity(corpus.len());

    for (title, embedding) in corpus.embeddings().iter() {
        let score = embedding
            .dot(query_embedding)
            .ok_or_else(|| Error::DimensionMismatch {
                title: title.to_string(),
                expected: embedding.dimensions(),
                actual: query_embedding.len(),
            })?;
        ranked.push(RankedSection {
            score,
            title: title.to_string(),
        });
    }

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(ranked)
}
