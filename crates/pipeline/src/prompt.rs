//! Prompt assembly.
//!
//! The layout is fixed:
//!
//! ```text
//! {preamble}{packed context}
//!
//!
//! Q: {few-shot question}
//!
//! A: {few-shot answer}
//!
//!
//! ...
//!
//!
//! Q: {question}
//!
//! A:
//! ```

use askbook_config::{FewShotExchange, PromptConfig};
use serde::Serialize;

use crate::packer::PackedContext;

const BLOCK_BREAK: &str = "\n\n\n";

/// A finished prompt and the context that went into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledPrompt {
    pub prompt: String,

    /// The packed fragments as one string, without preamble or examples.
    pub context: String,
}

/// Build the completion prompt for `question`.
pub fn assemble(config: &PromptConfig, packed: &PackedContext, question: &str) -> AssembledPrompt {
    let context = packed.render();
    let examples = render_examples(&config.few_shot);

    let mut prompt = String::with_capacity(
        config.preamble.len() + context.len() + examples.len() + question.len() + 16,
    );
    prompt.push_str(&config.preamble);
    prompt.push_str(&context);
    prompt.push_str(BLOCK_BREAK);
    prompt.push_str(&examples);
    prompt.push_str(BLOCK_BREAK);
    prompt.push_str("Q: ");
    prompt.push_str(question);
    prompt.push_str("\n\nA: ");

    AssembledPrompt { prompt, context }
}

fn render_examples(examples: &[FewShotExchange]) -> String {
    examples
        .iter()
        .map(|ex| format!("Q: {}\n\nA: {}", ex.question, ex.answer))
        .collect::<Vec<_>>()
        .join(BLOCK_BREAK)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PromptConfig {
        PromptConfig {
            preamble: "PRE\n".into(),
            few_shot: vec![
                FewShotExchange::new("One?", "First."),
                FewShotExchange::new("Two?", "Second."),
            ],
        }
    }

    fn packed() -> PackedContext {
        PackedContext {
            fragments: vec!["\n* alpha".into(), "\n* beta".into()],
            titles: vec!["A".into(), "B".into()],
            truncated: false,
        }
    }

    #[test]
    fn lays_out_preamble_context_examples_question() {
        let out = assemble(&config(), &packed(), "Why?");
        assert_eq!(
            out.prompt,
            "PRE\n\n* alpha\n* beta\n\n\nQ: One?\n\nA: First.\n\n\nQ: Two?\n\nA: Second.\n\n\nQ: Why?\n\nA: "
        );
    }

    #[test]
    fn context_is_the_rendered_fragments() {
        let out = assemble(&config(), &packed(), "Why?");
        assert_eq!(out.context, "\n* alpha\n* beta");
        assert_eq!(out.context, packed().render());
    }

    #[test]
    fn assembling_twice_is_byte_identical() {
        let a = assemble(&config(), &packed(), "Why?");
        let b = assemble(&config(), &packed(), "Why?");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_context_and_no_examples() {
        let cfg = PromptConfig {
            preamble: "PRE".into(),
            few_shot: Vec::new(),
        };
        let out = assemble(&cfg, &PackedContext::default(), "Q1?");
        assert_eq!(out.prompt, "PRE\n\n\n\n\n\nQ: Q1?\n\nA: ");
        assert!(out.context.is_empty());
    }

    #[test]
    fn default_prompt_ends_with_the_question() {
        let out = assemble(&PromptConfig::default(), &packed(), "How do I start?");
        assert!(out.prompt.ends_with("\n\n\nQ: How do I start?\n\nA: "));
        assert!(out.prompt.contains("\n* alpha\n* beta\n\n\nQ: "));
    }
}
