//! Cached asking.
//!
//! A question is answered at most once per cache. Repeats, including ones
//! that only differ by surrounding whitespace or a missing `?`, are served
//! from the cache and bump the stored ask count.

use std::sync::Arc;

use askbook_core::cache::{PreviousAnswer, QuestionCache};
use askbook_core::error::{Error, Result};
use askbook_core::question::normalize_question;
use rand::seq::IndexedRandom;
use serde::Serialize;
use tracing::{debug, info};

use crate::service::AnswerService;

/// The result of one ask.
#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    /// Cache entry ID, usable with [`AskFlow::previous`].
    pub id: String,
    pub question: String,
    pub answer: String,
    pub context: String,
    pub ask_count: u64,
    /// Whether the answer came from the cache.
    pub cached: bool,
}

impl AskOutcome {
    fn from_entry(entry: PreviousAnswer, cached: bool) -> Self {
        Self {
            id: entry.id,
            question: entry.question,
            answer: entry.answer,
            context: entry.context,
            ask_count: entry.ask_count,
            cached,
        }
    }
}

pub struct AskFlow {
    service: Arc<AnswerService>,
    cache: Arc<dyn QuestionCache>,
    lucky_questions: Vec<String>,
}

impl AskFlow {
    pub fn new(
        service: Arc<AnswerService>,
        cache: Arc<dyn QuestionCache>,
        lucky_questions: Vec<String>,
    ) -> Self {
        Self {
            service,
            cache,
            lucky_questions,
        }
    }

    pub fn service(&self) -> &Arc<AnswerService> {
        &self.service
    }

    pub fn cache(&self) -> &Arc<dyn QuestionCache> {
        &self.cache
    }

    /// Answer `question`, from the cache when it has been asked before.
    pub async fn ask(&self, question: &str) -> Result<AskOutcome> {
        let question = normalize_question(question)?;

        if let Some(previous) = self.cache.lookup(&question).await? {
            debug!(id = %previous.id, "Cache hit");
            let entry = self.cache.increment_ask_count(&previous.id).await?;
            info!(id = %entry.id, ask_count = entry.ask_count, "Served cached answer");
            return Ok(AskOutcome::from_entry(entry, true));
        }

        let answer = self.service.answer(&question).await?;
        let entry = self
            .cache
            .store(&answer.question, &answer.answer, &answer.context)
            .await?;

        info!(id = %entry.id, cache = %self.cache.name(), "Stored new answer");
        Ok(AskOutcome::from_entry(entry, false))
    }

    /// Ask one of the configured questions, picked at random.
    pub async fn lucky(&self) -> Result<AskOutcome> {
        let question = self
            .lucky_questions
            .choose(&mut rand::rng())
            .cloned()
            .ok_or_else(|| Error::Config {
                message: "no lucky questions configured".into(),
            })?;

        debug!(question = %question, "Feeling lucky");
        self.ask(&question).await
    }

    /// Look up a stored answer by ID.
    pub async fn previous(&self, id: &str) -> Result<Option<PreviousAnswer>> {
        Ok(self.cache.get(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::PipelineSettings;
    use crate::test_helpers::{ScriptedProvider, tiny_corpus};
    use askbook_cache::InMemoryCache;
    use askbook_core::error::ProviderError;
    use askbook_corpus::CorpusStore;

    fn flow(provider: Arc<ScriptedProvider>, lucky: Vec<String>) -> AskFlow {
        let service = AnswerService::new(
            provider,
            Arc::new(CorpusStore::preloaded(tiny_corpus())),
            PipelineSettings::default(),
        );
        AskFlow::new(Arc::new(service), Arc::new(InMemoryCache::new()), lucky)
    }

    #[tokio::test]
    async fn first_ask_generates_and_stores() {
        let provider = Arc::new(ScriptedProvider::new(vec![1.0, 0.0], "Be minimal."));
        let flow = flow(provider.clone(), vec![]);

        let outcome = flow.ask("What is a minimalist entrepreneur").await.unwrap();
        assert!(!outcome.cached);
        assert_eq!(outcome.ask_count, 1);
        assert_eq!(outcome.question, "What is a minimalist entrepreneur?");
        assert_eq!(outcome.answer, "Be minimal.");
        assert!(outcome.context.contains("Find your people first."));

        assert_eq!(flow.cache().count().await.unwrap(), 1);
        assert_eq!(provider.completion_requests().len(), 1);
    }

    #[tokio::test]
    async fn repeat_without_question_mark_hits_the_cache() {
        let provider = Arc::new(ScriptedProvider::new(vec![1.0, 0.0], "Be minimal."));
        let flow = flow(provider.clone(), vec![]);

        let first = flow.ask("What is a minimalist entrepreneur?").await.unwrap();
        let second = flow.ask("  What is a minimalist entrepreneur ").await.unwrap();

        assert!(second.cached);
        assert_eq!(second.id, first.id);
        assert_eq!(second.ask_count, 2);
        assert_eq!(second.answer, "Be minimal.");
        // Only the first ask reached the models.
        assert_eq!(provider.embed_requests().len(), 1);
        assert_eq!(provider.completion_requests().len(), 1);
    }

    #[tokio::test]
    async fn failed_generation_is_not_cached() {
        let provider = Arc::new(ScriptedProvider::failing(
            ProviderError::AuthenticationFailed("bad key".into()),
        ));
        let flow = flow(provider, vec![]);

        let err = flow.ask("Why?").await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert_eq!(flow.cache().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn invalid_question_is_rejected_before_the_cache() {
        let provider = Arc::new(ScriptedProvider::new(vec![1.0, 0.0], "x"));
        let flow = flow(provider, vec![]);
        assert!(matches!(
            flow.ask("\t\n").await,
            Err(Error::InvalidQuestion(_))
        ));
    }

    #[tokio::test]
    async fn lucky_asks_a_configured_question() {
        let provider = Arc::new(ScriptedProvider::new(vec![0.0, 1.0], "Charge early."));
        let lucky = vec!["How do I price my product?".to_string()];
        let flow = flow(provider, lucky);

        let outcome = flow.lucky().await.unwrap();
        assert_eq!(outcome.question, "How do I price my product?");
        assert_eq!(outcome.answer, "Charge early.");

        let again = flow.lucky().await.unwrap();
        assert!(again.cached);
        assert_eq!(again.ask_count, 2);
    }

    #[tokio::test]
    async fn lucky_without_questions_is_a_config_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![1.0, 0.0], "x"));
        let flow = flow(provider, vec![]);
        assert!(matches!(flow.lucky().await, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn previous_finds_stored_answers_by_id() {
        let provider = Arc::new(ScriptedProvider::new(vec![1.0, 0.0], "Be minimal."));
        let flow = flow(provider, vec![]);

        let outcome = flow.ask("Why?").await.unwrap();
        let entry = flow.previous(&outcome.id).await.unwrap().unwrap();
        assert_eq!(entry.question, "Why?");
        assert!(flow.previous("missing").await.unwrap().is_none());
    }
}
