//! Answer service: question in, grounded answer out.
//!
//! # Flow
//!
//! 1. Normalize the question
//! 2. Fetch the shared corpus (loaded on first use)
//! 3. Embed the question with the query model
//! 4. Rank every section by similarity
//! 5. Pack the best sections into the token budget
//! 6. Assemble the prompt and request a completion
//!
//! Each remote call is bounded by the configured timeout. Provider failures
//! are returned as-is: no retries, no fallback answer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use askbook_config::{AppConfig, PromptConfig};
use askbook_core::error::{Error, ProviderError, Result};
use askbook_core::provider::{
    CompletionConfig, CompletionRequest, EmbeddingPurpose, EmbeddingRequest, Provider,
};
use askbook_core::question::normalize_question;
use askbook_corpus::CorpusStore;
use serde::Serialize;
use tracing::{debug, info};

use crate::packer::pack;
use crate::prompt::assemble;
use crate::ranker::rank;

/// Everything the service needs besides the provider and the corpus.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub doc_embeddings_model: String,
    pub query_embeddings_model: String,
    pub completion: CompletionConfig,
    pub separator: String,
    pub max_section_tokens: usize,
    pub prompt: PromptConfig,
    pub timeout: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            doc_embeddings_model: config
                .provider
                .embeddings_model(EmbeddingPurpose::Document)
                .to_string(),
            query_embeddings_model: config
                .provider
                .embeddings_model(EmbeddingPurpose::Query)
                .to_string(),
            completion: config.provider.completion_config(),
            separator: config.pipeline.separator.clone(),
            max_section_tokens: config.pipeline.max_section_tokens,
            prompt: config.prompt.clone(),
            timeout: Duration::from_secs(config.provider.timeout_secs),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// A generated answer with the material it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// The normalized question.
    pub question: String,
    /// The completion text, trimmed.
    pub answer: String,
    /// The packed context that went into the prompt.
    pub context: String,
    /// Titles of the packed sections, best first.
    pub sections_used: Vec<String>,
    /// The full prompt sent to the completion model.
    pub prompt: String,
}

pub struct AnswerService {
    provider: Arc<dyn Provider>,
    corpus: Arc<CorpusStore>,
    settings: PipelineSettings,
}

impl AnswerService {
    pub fn new(
        provider: Arc<dyn Provider>,
        corpus: Arc<CorpusStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            provider,
            corpus,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn corpus(&self) -> &Arc<CorpusStore> {
        &self.corpus
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Answer a question from the book.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let question = normalize_question(question)?;
        let corpus = self.corpus.get().await?;

        info!(
            provider = %self.provider.name(),
            model = %self.settings.completion.model,
            "Answering question"
        );

        let embedding = self
            .bounded(self.provider.embed(EmbeddingRequest {
                model: self.settings.query_embeddings_model.clone(),
                input: question.clone(),
                purpose: EmbeddingPurpose::Query,
            }))
            .await?;

        let ranked = rank(&embedding.embedding, &corpus)?;
        let packed = pack(
            &ranked,
            corpus.sections(),
            &self.settings.separator,
            self.settings.max_section_tokens,
        )?;

        debug!(
            sections = packed.len(),
            truncated = packed.truncated,
            titles = ?packed.titles,
            "Context packed"
        );

        let assembled = assemble(&self.settings.prompt, &packed, &question);

        let completion = self
            .bounded(self.provider.complete(CompletionRequest {
                prompt: assembled.prompt.clone(),
                config: self.settings.completion.clone(),
            }))
            .await?;

        let answer = completion.text.trim().to_string();

        info!(
            sections = packed.len(),
            answer_len = answer.len(),
            "Answer generated"
        );

        Ok(Answer {
            question,
            answer,
            context: assembled.context,
            sections_used: packed.titles,
            prompt: assembled.prompt,
        })
    }

    /// Embed the first section with the document model and check that the
    /// vector matches the corpus dimensionality.
    ///
    /// Returns the dimensionality on success. An empty corpus has nothing to
    /// compare and passes with 0.
    pub async fn check_document_model(&self) -> Result<usize> {
        let corpus = self.corpus.get().await?;
        let Some((title, section)) = corpus.sections().iter().next() else {
            return Ok(0);
        };

        let embedding = self
            .bounded(self.provider.embed(EmbeddingRequest {
                model: self.settings.doc_embeddings_model.clone(),
                input: section.content.clone(),
                purpose: EmbeddingPurpose::Document,
            }))
            .await?;

        let actual = embedding.embedding.len();
        if actual != corpus.dimensions() {
            return Err(Error::DimensionMismatch {
                title: title.to_string(),
                expected: corpus.dimensions(),
                actual,
            });
        }
        Ok(actual)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, ProviderError>>,
    ) -> std::result::Result<T, ProviderError> {
        match tokio::time::timeout(self.settings.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.settings.timeout.as_secs())),
        }
    }
}
