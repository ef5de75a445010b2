//! Question normalization.
//!
//! Cache keys are normalized questions, so every entry point must run
//! questions through [`normalize_question`] before lookup.

use crate::error::{Error, Result};

/// Trim surrounding whitespace and make sure the question ends with `?`.
pub fn normalize_question(question: &str) -> Result<String> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidQuestion("question is empty".into()));
    }

    if trimmed.ends_with('?') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}?"))
    }
}
