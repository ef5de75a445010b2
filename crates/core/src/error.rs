//! Error types for the Askbook domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Corpus and ranking failures are top-level variants; the remote
//! capabilities and the question cache each get their own bounded-context
//! enum that the top-level error wraps.

use thiserror::Error;

/// The top-level error type for all Askbook operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Corpus loading ---
    #[error("Malformed corpus in {source_name}: {reason}")]
    MalformedCorpus { source_name: String, reason: String },

    #[error("Corpus inconsistency: {0}")]
    CorpusInconsistency(String),

    // --- Ranking ---
    #[error(
        "Embedding dimension mismatch for section '{title}': embedding has {actual} components, corpus has {expected}"
    )]
    DimensionMismatch {
        title: String,
        expected: usize,
        actual: usize,
    },

    // --- Remote capabilities ---
    #[error("Generation failed: {0}")]
    Generation(#[from] ProviderError),

    // --- Question cache ---
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    // --- Input ---
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Shorthand for a [`Error::MalformedCorpus`].
    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedCorpus {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from the corpus (load, shape or consistency).
    pub fn is_corpus_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedCorpus { .. }
                | Self::CorpusInconsistency(_)
                | Self::DimensionMismatch { .. }
        )
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the embedding or completion capability.
///
/// Surfaced to callers as a single [`Error::Generation`]; the variants only
/// exist so logs say what went wrong.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Previous answer not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Generation(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn dimension_mismatch_names_section() {
        let err = Error::DimensionMismatch {
            title: "Chapter 1".into(),
            expected: 4,
            actual: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("Chapter 1"));
        assert!(msg.contains('3'));
        assert!(msg.contains('4'));
    }

    #[test]
    fn corpus_errors_are_classified() {
        assert!(Error::malformed("sections.csv", "bad header").is_corpus_error());
        assert!(Error::CorpusInconsistency("x".into()).is_corpus_error());
        assert!(!Error::InvalidQuestion("".into()).is_corpus_error());
        assert!(!Error::Generation(ProviderError::Timeout(30)).is_corpus_error());
    }

    #[test]
    fn cache_error_converts() {
        let err: Error = CacheError::NotFound("abc".into()).into();
        assert!(matches!(err, Error::Cache(CacheError::NotFound(_))));
    }
}
