//! In-memory cache: useful for testing and ephemeral runs.

use async_trait::async_trait;
use askbook_core::cache::{PreviousAnswer, QuestionCache};
use askbook_core::error::CacheError;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A cache that keeps previous answers in a Vec.
/// Everything is lost when the process exits.
pub struct InMemoryCache {
    entries: Arc<RwLock<Vec<PreviousAnswer>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionCache for InMemoryCache {
    fn name(&self) -> &str {
        "memory"
    }

    async fn lookup(&self, question: &str) -> Result<Option<PreviousAnswer>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|e| e.question == question).cloned())
    }

    async fn store(
        &self,
        question: &str,
        answer: &str,
        context: &str,
    ) -> Result<PreviousAnswer, CacheError> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();

        if let Some(existing) = entries.iter_mut().find(|e| e.question == question) {
            existing.answer = answer.to_string();
            existing.context = context.to_string();
            existing.ask_count += 1;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let entry = PreviousAnswer {
            id: Uuid::new_v4().to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            context: context.to_string(),
            ask_count: 1,
            created_at: now,
            updated_at: now,
        };
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn increment_ask_count(&self, id: &str) -> Result<PreviousAnswer, CacheError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CacheError::NotFound(id.to_string()))?;
        entry.ask_count += 1;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<PreviousAnswer>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    async fn count(&self) -> Result<usize, CacheError> {
        Ok(self.entries.read().await.len())
    }
}
