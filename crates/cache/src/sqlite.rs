//! SQLite cache backend.
//!
//! One table, `previous_answers`, keyed by a UUID with a unique index on the
//! normalized question. Repeat stores and ask-count bumps are single
//! statements, so concurrent askers never lose a count.

use async_trait::async_trait;
use askbook_core::cache::{PreviousAnswer, QuestionCache};
use askbook_core::error::CacheError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    /// Open (or create) the cache database at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database.
    pub async fn new(path: &str) -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| CacheError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| CacheError::Storage(format!("Failed to open SQLite: {e}")))?;

        let cache = Self { pool };
        cache.run_migrations().await?;
        info!("SQLite question cache initialized at {path}");
        Ok(cache)
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, CacheError> {
        let cache = Self { pool };
        cache.run_migrations().await?;
        Ok(cache)
    }

    async fn run_migrations(&self) -> Result<(), CacheError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS previous_answers (
                id          TEXT PRIMARY KEY NOT NULL,
                question    TEXT UNIQUE NOT NULL,
                answer      TEXT NOT NULL,
                context     TEXT NOT NULL DEFAULT '',
                ask_count   INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| CacheError::MigrationFailed(format!("previous_answers table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<PreviousAnswer, CacheError> {
        let column = |name: &str, e: sqlx::Error| CacheError::QueryFailed(format!("{name} column: {e}"));

        let id: String = row.try_get("id").map_err(|e| column("id", e))?;
        let question: String = row.try_get("question").map_err(|e| column("question", e))?;
        let answer: String = row.try_get("answer").map_err(|e| column("answer", e))?;
        let context: String = row.try_get("context").map_err(|e| column("context", e))?;
        let ask_count: i64 = row.try_get("ask_count").map_err(|e| column("ask_count", e))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| column("created_at", e))?;
        let updated_at: String = row
            .try_get("updated_at")
            .map_err(|e| column("updated_at", e))?;

        Ok(PreviousAnswer {
            id,
            question,
            answer,
            context,
            ask_count: u64::try_from(ask_count).unwrap_or(0),
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CacheError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CacheError::QueryFailed(format!("bad timestamp '{raw}': {e}")))
}

#[async_trait]
impl QuestionCache for SqliteCache {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn lookup(&self, question: &str) -> Result<Option<PreviousAnswer>, CacheError> {
        let row = sqlx::query("SELECT * FROM previous_answers WHERE question = ?1")
            .bind(question)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CacheError::QueryFailed(format!("Lookup failed: {e}")))?;

        row.as_ref().map(Self::row_to_entry).transpose()
    }

    async fn store(
        &self,
        question: &str,
        answer: &str,
        context: &str,
    ) -> Result<PreviousAnswer, CacheError> {
        let now = Utc::now().to_rfc3339();

        let row = sqlx::query(
            r#"
            INSERT INTO previous_answers (id, question, answer, context, ask_count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
            ON CONFLICT(question) DO UPDATE SET
                answer = excluded.answer,
                context = excluded.context,
                ask_count = previous_answers.ask_count + 1,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(question)
        .bind(answer)
        .bind(context)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CacheError::Storage(format!("INSERT failed: {e}")))?;

        let entry = Self::row_to_entry(&row)?;
        debug!("Stored answer {}", entry.id);
        Ok(entry)
    }

    async fn increment_ask_count(&self, id: &str) -> Result<PreviousAnswer, CacheError> {
        let row = sqlx::query(
            r#"
            UPDATE previous_answers
            SET ask_count = ask_count + 1, updated_at = ?2
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Utc::now().to_rfc3339())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CacheError::Storage(format!("UPDATE failed: {e}")))?;

        match row {
            Some(row) => Self::row_to_entry(&row),
            None => Err(CacheError::NotFound(id.to_string())),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<PreviousAnswer>, CacheError> {
        let row = sqlx::query("SELECT * FROM previous_answers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CacheError::QueryFailed(format!("Get failed: {e}")))?;

        row.as_ref().map(Self::row_to_entry).transpose()
    }

    async fn count(&self) -> Result<usize, CacheError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM previous_answers")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CacheError::QueryFailed(format!("Count failed: {e}")))?;
        Ok(count as usize)
    }
}
