//! Shared test helpers for pipeline tests.

use std::sync::Mutex;
use std::time::Duration;

use askbook_core::corpus::{EmbeddingVector, Section};
use askbook_core::error::ProviderError;
use askbook_core::provider::{
    CompletionRequest, CompletionResponse, EmbeddingRequest, EmbeddingResponse, Provider, Usage,
};
use askbook_corpus::{Corpus, TitleMap};

/// A provider that returns the same embedding and completion every time,
/// and records what it was asked.
pub struct ScriptedProvider {
    embedding: Vec<f32>,
    completion: String,
    failure: Option<ProviderError>,
    delay: Option<Duration>,
    embed_requests: Mutex<Vec<EmbeddingRequest>>,
    completion_requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(embedding: Vec<f32>, completion: &str) -> Self {
        Self {
            embedding,
            completion: completion.to_string(),
            failure: None,
            delay: None,
            embed_requests: Mutex::new(Vec::new()),
            completion_requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every call fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        let mut provider = Self::new(Vec::new(), "");
        provider.failure = Some(error);
        provider
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn embed_requests(&self) -> Vec<EmbeddingRequest> {
        self.embed_requests.lock().unwrap().clone()
    }

    pub fn completion_requests(&self) -> Vec<CompletionRequest> {
        self.completion_requests.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        self.embed_requests.lock().unwrap().push(request.clone());
        self.pause().await;
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(EmbeddingResponse {
            embedding: self.embedding.clone(),
            model: request.model,
            usage: None,
        })
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        self.completion_requests.lock().unwrap().push(request.clone());
        self.pause().await;
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(CompletionResponse {
            text: self.completion.clone(),
            model: request.config.model,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }
}

/// Two sections on orthogonal axes: "Community" on x, "Pricing" on y.
pub fn tiny_corpus() -> Corpus {
    let mut sections = TitleMap::new();
    sections
        .insert("Community", Section::new("Community", "Find your people first.", 4))
        .unwrap();
    sections
        .insert("Pricing", Section::new("Pricing", "Charge from day one.", 5))
        .unwrap();

    let mut embeddings = TitleMap::new();
    embeddings
        .insert("Community", EmbeddingVector::new(vec![1.0, 0.0]))
        .unwrap();
    embeddings
        .insert("Pricing", EmbeddingVector::new(vec![0.0, 1.0]))
        .unwrap();

    Corpus::new(sections, embeddings).unwrap()
}
