//! `askbook corpus`: Load the corpus and report on it.

use std::path::{Path, PathBuf};

use askbook_corpus::load_corpus;

use super::load_config;

pub async fn run(
    config_path: Option<&Path>,
    sections: Option<PathBuf>,
    embeddings: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let sections = sections.unwrap_or(config.corpus.sections_path);
    let embeddings = embeddings.unwrap_or(config.corpus.embeddings_path);

    println!("📚 Loading corpus");
    println!("   Sections:   {}", sections.display());
    println!("   Embeddings: {}", embeddings.display());

    let corpus = tokio::task::spawn_blocking(move || load_corpus(&sections, &embeddings)).await??;

    println!();
    println!("   ✅ {} sections", corpus.len());
    println!("   ✅ {} dimensions", corpus.dimensions());
    println!("   ✅ {} tokens in total", corpus.total_tokens());

    Ok(())
}
