//! Question cache backends for Askbook.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::sync::Arc;

use askbook_config::CacheConfig;
use askbook_core::cache::QuestionCache;
use askbook_core::error::CacheError;

pub use in_memory::InMemoryCache;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCache;

/// Build the cache backend named in the configuration.
pub async fn build_from_config(config: &CacheConfig) -> Result<Arc<dyn QuestionCache>, CacheError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryCache::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let url = if config.path.starts_with("sqlite:") {
                config.path.clone()
            } else {
                format!("sqlite://{}", config.path)
            };
            Ok(Arc::new(SqliteCache::new(&url).await?))
        }
        other => Err(CacheError::Storage(format!(
            "Unsupported cache backend: {other}"
        ))),
    }
}
