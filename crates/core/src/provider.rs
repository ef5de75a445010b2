//! Provider trait: the abstraction over the remote model capabilities.
//!
//! The pipeline needs exactly two remote functions: turn text into an
//! embedding, and turn a prompt into a completion. A Provider offers both.
//!
//! Implementations: OpenAI-compatible endpoints (see `askbook-providers`),
//! scripted fakes in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Why a text is being embedded.
///
/// Document and query embeddings may come from different models, but both
/// must produce vectors with the corpus dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingPurpose {
    Document,
    Query,
}

/// An embedding request for a single text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// The embedding model (e.g., "text-search-curie-query-001").
    pub model: String,

    /// The text to embed.
    pub input: String,

    pub purpose: EmbeddingPurpose,
}

/// An embedding response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,

    /// Which model was used.
    pub model: String,

    pub usage: Option<Usage>,
}

/// Fixed generation settings for a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// The completion model identifier.
    pub model: String,

    /// Sampling temperature (0.0 = deterministic)
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_max_output_tokens() -> u32 {
    150
}

impl CompletionConfig {
    /// A reproducible configuration: temperature 0.0, 150 output tokens.
    pub fn deterministic(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.0,
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// A text-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub config: CompletionConfig,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text, untrimmed.
    pub text: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The answer service calls `embed()` for the query and `complete()` for
/// the answer without knowing which backend serves them.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Embed a single text.
    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError>;

    /// Send a prompt and get the completion back.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;

    /// Whether the provider is reachable.
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
