//! # Askbook Pipeline
//!
//! Turns a question into an answer grounded in the book:
//!
//! ```text
//! question → embed → rank → pack → assemble → complete
//! ```
//!
//! The ranking, packing and assembly steps are pure functions; the
//! [`AnswerService`] drives them against an injected provider, and the
//! [`AskFlow`] puts a question cache in front of it.

pub mod ask;
pub mod packer;
pub mod prompt;
pub mod ranker;
pub mod service;

#[cfg(test)]
mod test_helpers;

pub use ask::{AskFlow, AskOutcome};
pub use packer::{PackedContext, pack};
pub use prompt::{AssembledPrompt, assemble};
pub use ranker::rank;
pub use service::{Answer, AnswerService, PipelineSettings};
