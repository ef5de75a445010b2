//! Question cache trait: previously answered questions.
//!
//! Answers are keyed by the normalized question text. A repeat question is
//! served from the cache and bumps the entry's ask count instead of calling
//! the models again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// A stored answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviousAnswer {
    /// Unique ID for this entry
    pub id: String,

    /// The normalized question (cache key)
    pub question: String,

    pub answer: String,

    /// The packed context that was sent to the model
    pub context: String,

    /// How many times this question has been asked
    pub ask_count: u64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// The core QuestionCache trait.
///
/// Implementations: in-memory (for testing and ephemeral runs), SQLite.
#[async_trait]
pub trait QuestionCache: Send + Sync {
    /// The backend name (e.g., "memory", "sqlite").
    fn name(&self) -> &str;

    /// Find a previous answer by normalized question.
    async fn lookup(&self, question: &str) -> Result<Option<PreviousAnswer>, CacheError>;

    /// Persist a new answer with an ask count of 1.
    ///
    /// Storing a question that already exists replaces its answer and
    /// context and increments its ask count.
    async fn store(
        &self,
        question: &str,
        answer: &str,
        context: &str,
    ) -> Result<PreviousAnswer, CacheError>;

    /// Record one more ask of an existing entry.
    async fn increment_ask_count(&self, id: &str) -> Result<PreviousAnswer, CacheError>;

    /// Get an entry by ID.
    async fn get(&self, id: &str) -> Result<Option<PreviousAnswer>, CacheError>;

    /// Total number of stored questions.
    async fn count(&self) -> Result<usize, CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_answer_serialization() {
        let entry = PreviousAnswer {
            id: "q_001".into(),
            question: "What is Gumroad?".into(),
            answer: "A platform for creators.".into(),
            context: "\n* Gumroad started in 2011.".into(),
            ask_count: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("What is Gumroad?"));
        assert!(json.contains("\"ask_count\":3"));
    }
}
