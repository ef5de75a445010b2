//! Model provider implementations for Askbook.
//!
//! All providers implement the `askbook_core::Provider` trait.
//! [`build_from_config`] creates the one the configuration names.

pub mod openai_compat;

use std::sync::Arc;
use std::time::Duration;

use askbook_config::AppConfig;
use askbook_core::error::ProviderError;
use askbook_core::provider::Provider;
use tracing::{debug, warn};

pub use openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
///
/// A missing API key is not an error here; the endpoint rejects the first
/// request instead, and `askbook doctor` reports it up front.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider_config = &config.provider;

    let api_key = config.resolved_api_key().unwrap_or_default();
    if api_key.is_empty() {
        warn!(provider = %provider_config.name, "No API key configured");
    }

    let base_url = provider_config
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(&provider_config.name));

    debug!(provider = %provider_config.name, base_url = %base_url, "Building provider");

    let provider = OpenAiCompatProvider::new(
        &provider_config.name,
        base_url,
        api_key,
        Duration::from_secs(provider_config.timeout_secs),
    )?
    .with_completion_api(provider_config.completion_api);

    Ok(Arc::new(provider))
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
