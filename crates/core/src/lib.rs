//! # Askbook Core
//!
//! Domain types, traits, and error definitions for the Askbook question
//! answering pipeline. This crate has **no I/O**: it defines the model that
//! the corpus loader, the provider clients, the cache backends and the
//! pipeline all implement against.
//!
//! ## Design Philosophy
//!
//! The two remote capabilities (embedding + completion) and the question
//! cache are traits here. Implementations live in their own crates, so the
//! ranking/packing/assembly logic can run against deterministic fakes.

pub mod cache;
pub mod corpus;
pub mod error;
pub mod provider;
pub mod question;

// Re-export key types at crate root for ergonomics
pub use cache::{PreviousAnswer, QuestionCache};
pub use corpus::{EmbeddingVector, RankedSection, Section};
pub use error::{CacheError, Error, ProviderError, Result};
pub use provider::{
    CompletionConfig, CompletionRequest, CompletionResponse, EmbeddingPurpose, EmbeddingRequest,
    EmbeddingResponse, Provider, Usage,
};
pub use question::normalize_question;
