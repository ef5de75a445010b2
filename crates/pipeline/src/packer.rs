//! Greedy, budget-constrained context packing.
//!
//! Walks the ranked sections best-first and appends each one, prefixed by
//! the separator, until the token budget overflows. The overflowing section
//! is clipped and packing stops there, even if later sections would fit.
//!
//! # Budget accounting
//!
//! Every section costs `tokens + separator_len`. On overflow the remaining
//! room is `max_tokens - running_total - separator_len`, which counts the
//! separator a second time and is always negative. The content is cut with
//! slice semantics: a negative room drops that many characters from the
//! end, and a room larger than the content leaves nothing.

use askbook_core::corpus::{RankedSection, Section};
use askbook_core::error::{Error, Result};
use askbook_corpus::TitleMap;
use serde::Serialize;
use tracing::debug;

/// The fragments chosen for a prompt, in rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackedContext {
    /// `separator + content` for each included section.
    pub fragments: Vec<String>,

    /// Titles of the included sections, aligned with `fragments`.
    pub titles: Vec<String>,

    /// Whether the last fragment was clipped by the budget.
    pub truncated: bool,
}

impl PackedContext {
    /// The fragments concatenated, exactly as they appear in the prompt.
    pub fn render(&self) -> String {
        self.fragments.concat()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Pack ranked sections into at most `max_tokens`.
///
/// A ranked title without a section record means the corpus is corrupt and
/// aborts packing.
pub fn pack(
    ranked: &[RankedSection],
    sections: &TitleMap<Section>,
    separator: &str,
    max_tokens: usize,
) -> Result<PackedContext> {
    let separator_len = separator.chars().count() as i64;
    let max_tokens = max_tokens as i64;
    let mut running_total: i64 = 0;
    let mut packed = PackedContext::default();

    for candidate in ranked {
        let section = sections.get(&candidate.title).ok_or_else(|| {
            Error::CorpusInconsistency(format!(
                "ranked section '{}' has no content record",
                candidate.title
            ))
        })?;

        running_total += section.tokens as i64 + separator_len;

        if running_total > max_tokens {
            let space_left = max_tokens - running_total - separator_len;
            let clipped = clip(&section.content, space_left);

            packed.fragments.push(format!("{separator}{clipped}"));
            packed.titles.push(section.title.clone());
            packed.truncated = true;

            debug!(
                title = %section.title,
                running_total,
                space_left,
                "Token budget exceeded, stopping"
            );
            break;
        }

        packed.fragments.push(format!("{separator}{}", section.content));
        packed.titles.push(section.title.clone());
    }

    Ok(packed)
}

/// Take the first `space_left` characters, counting from the end when negative.
fn clip(content: &str, space_left: i64) -> &str {
    let len = content.chars().count() as i64;
    let keep = if space_left >= 0 {
        space_left.min(len)
    } else {
        (len + space_left).max(0)
    };
    match content.char_indices().nth(keep as usize) {
        Some((byte_idx, _)) => &content[..byte_idx],
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEP: &str = "\n* ";

    fn sections(rows: &[(&str, &str, usize)]) -> TitleMap<Section> {
        let mut map = TitleMap::new();
        for (title, content, tokens) in rows {
            map.insert(*title, Section::new(*title, *content, *tokens))
                .unwrap();
        }
        map
    }

    fn ranked(titles: &[&str]) -> Vec<RankedSection> {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| RankedSection {
                score: 1.0 - i as f32 * 0.1,
                title: t.to_string(),
            })
            .collect()
    }

    fn two_sections() -> TitleMap<Section> {
        sections(&[
            ("A", "Alpha content here.", 10),
            ("B", "Beta content here.", 10),
        ])
    }

    #[test]
    fn both_sections_fit_a_large_budget() {
        let packed = pack(&ranked(&["A", "B"]), &two_sections(), SEP, 500).unwrap();
        assert_eq!(
            packed.fragments,
            vec!["\n* Alpha content here.", "\n* Beta content here."]
        );
        assert_eq!(packed.titles, vec!["A", "B"]);
        assert!(!packed.truncated);
    }

    #[test]
    fn overflow_clips_and_stops() {
        // A: 10 + 3 = 13 <= 15. B: 13 + 13 = 26 > 15, space_left = 15 - 26 - 3 = -14.
        // "Beta content here." has 18 characters; dropping the last 14 leaves "Beta".
        let packed = pack(&ranked(&["A", "B"]), &two_sections(), SEP, 15).unwrap();
        assert_eq!(packed.fragments, vec!["\n* Alpha content here.", "\n* Beta"]);
        assert_eq!(packed.titles, vec!["A", "B"]);
        assert!(packed.truncated);
    }

    #[test]
    fn overflow_on_short_content_leaves_only_the_separator() {
        let s = sections(&[("A", "Alpha", 10), ("B", "Beta", 10)]);
        let packed = pack(&ranked(&["A", "B"]), &s, SEP, 15).unwrap();
        assert_eq!(packed.fragments, vec!["\n* Alpha", "\n* "]);
    }

    #[test]
    fn stops_at_first_overflow_even_if_later_sections_fit() {
        let content = "x".repeat(100);
        let s = sections(&[
            ("big", content.as_str(), 100),
            ("small", "tiny", 1),
            ("after", "never seen", 1),
        ]);
        // 103 > 50, space_left = 50 - 103 - 3 = -56 -> 44 characters kept.
        let packed = pack(&ranked(&["big", "small", "after"]), &s, SEP, 50).unwrap();
        assert_eq!(packed.len(), 1);
        assert_eq!(packed.titles, vec!["big"]);
        assert_eq!(packed.fragments[0], format!("{SEP}{}", "x".repeat(44)));
        assert!(packed.truncated);
    }

    #[test]
    fn exact_fit_is_not_an_overflow() {
        let s = sections(&[("A", "abc", 7), ("B", "def", 5)]);
        // A: 7 + 3 = 10 == 10 -> included whole. B: 18 > 10 -> clipped away.
        let packed = pack(&ranked(&["A", "B"]), &s, SEP, 10).unwrap();
        assert_eq!(packed.fragments[0], "\n* abc");
        assert_eq!(packed.fragments[1], "\n* ");
    }

    #[test]
    fn never_reorders() {
        let s = sections(&[("A", "a", 1), ("B", "b", 1), ("C", "c", 1)]);
        let packed = pack(&ranked(&["C", "A", "B"]), &s, SEP, 500).unwrap();
        assert_eq!(packed.titles, vec!["C", "A", "B"]);
        assert_eq!(packed.render(), "\n* c\n* a\n* b");
    }

    #[test]
    fn fragment_count_never_exceeds_ranked_count() {
        let s = sections(&[("A", "a", 0), ("B", "b", 0)]);
        for budget in [0, 1, 3, 6, 100] {
            let packed = pack(&ranked(&["A", "B"]), &s, SEP, budget).unwrap();
            assert!(packed.len() <= 2, "budget {budget}");
        }
    }

    #[test]
    fn zero_budget_clips_the_first_section() {
        // 13 > 0, space_left = 0 - 13 - 3 = -16: "Alpha content here." keeps 19 - 16 = 3.
        let packed = pack(&ranked(&["A", "B"]), &two_sections(), SEP, 0).unwrap();
        assert_eq!(packed.fragments, vec!["\n* Alp"]);
        assert_eq!(packed.titles, vec!["A"]);
        assert!(packed.truncated);
    }

    #[test]
    fn clip_counts_characters_not_bytes() {
        assert_eq!(clip("ééééé", -2), "ééé");
        assert_eq!(clip("ééééé", 2), "éé");
        assert_eq!(clip("ééééé", 9), "ééééé");
        assert_eq!(clip("ééééé", -9), "");
        assert_eq!(clip("", -1), "");
    }

    #[test]
    fn missing_section_record_aborts() {
        let s = sections(&[("A", "a", 1)]);
        let err = pack(&ranked(&["A", "ghost"]), &s, SEP, 500).unwrap_err();
        assert!(matches!(err, Error::CorpusInconsistency(ref m) if m.contains("ghost")));
    }

    #[test]
    fn empty_ranking_packs_nothing() {
        let packed = pack(&[], &two_sections(), SEP, 500).unwrap();
        assert!(packed.is_empty());
        assert_eq!(packed.render(), "");
    }
}
