//! `askbook doctor`: Diagnose system health.

use std::path::Path;
use std::sync::Arc;

use askbook_config::AppConfig;
use askbook_corpus::{CorpusStore, load_corpus};
use askbook_pipeline::{AnswerService, PipelineSettings};

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Askbook Doctor — System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    // Check config
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if !path.exists() {
        println!("  ⚠️  No config file at {} — using defaults", path.display());
    }

    let config = match AppConfig::load_at(&path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Cannot continue without a valid config.");
            return Ok(());
        }
    };

    // Check API key
    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key — set ASKBOOK_API_KEY or OPENAI_API_KEY");
        issues += 1;
    }

    // Check corpus
    let sections = config.corpus.sections_path.clone();
    let embeddings = config.corpus.embeddings_path.clone();
    let corpus = match tokio::task::spawn_blocking(move || load_corpus(&sections, &embeddings)).await? {
        Ok(corpus) => {
            println!(
                "  ✅ Corpus loaded ({} sections, {} dimensions)",
                corpus.len(),
                corpus.dimensions()
            );
            Some(corpus)
        }
        Err(e) => {
            println!("  ❌ Corpus: {e}");
            issues += 1;
            None
        }
    };

    // Check provider
    let provider = askbook_providers::build_from_config(&config)?;
    let reachable = match provider.health_check().await {
        Ok(true) => {
            println!("  ✅ Provider '{}' reachable", provider.name());
            true
        }
        Ok(false) => {
            println!("  ⚠️  Provider '{}' rejected the health check", provider.name());
            issues += 1;
            false
        }
        Err(e) => {
            println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
            issues += 1;
            false
        }
    };

    // Check the document model against the corpus
    if let (Some(corpus), true) = (corpus, reachable) {
        let service = AnswerService::new(
            provider,
            Arc::new(CorpusStore::preloaded(corpus)),
            PipelineSettings::from_config(&config),
        );
        let model = &service.settings().doc_embeddings_model;
        match service.check_document_model().await {
            Ok(dimensions) => {
                println!("  ✅ Document model '{model}' matches the corpus ({dimensions} dimensions)")
            }
            Err(e) => {
                println!("  ❌ Document model '{model}': {e}");
                issues += 1;
            }
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
