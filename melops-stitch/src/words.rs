//! Word segmentation of decoded token groups.
//!
//! Whitespace languages start a word wherever whitespace follows text, also
//! inside a group; such a group's tokens belong to every word it touches.
//! Unspaced languages (Chinese, Japanese, Thai, ...) get one word per code
//! point group.

use crate::language::Segmentation;
use crate::unicode::TokenGroup;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Groups made only of punctuation or symbols always start their own word.
static PUNCTUATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{P}\p{S}]+$").expect("Invalid punctuation regex"));

/// Word text with the span of tokens it was decoded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordSpan {
    pub text: String,
    /// Token indices, relative to the grouped sequence
    pub range: Range<usize>,
}

impl WordSpan {
    fn from_group(group: TokenGroup) -> Self {
        Self {
            text: group.text,
            range: group.range,
        }
    }

    fn extend(&mut self, text: &str, range: &Range<usize>) {
        self.text.push_str(text);
        self.range.end = self.range.end.max(range.end);
    }

    /// Absorb a neighbouring word; `other` must directly follow `self`.
    pub(crate) fn append(&mut self, other: WordSpan) {
        self.text.push_str(&other.text);
        self.range.end = self.range.end.max(other.range.end);
    }

    /// Absorb a neighbouring word; `other` must directly precede `self`.
    pub(crate) fn prepend(&mut self, other: WordSpan) {
        self.text.insert_str(0, &other.text);
        self.range.start = self.range.start.min(other.range.start);
    }

    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }
}

/// Split groups into words according to `segmentation`.
pub fn split_words(groups: Vec<TokenGroup>, segmentation: Segmentation) -> Vec<WordSpan> {
    match segmentation {
        Segmentation::Unicode => groups
            .into_iter()
            .map(WordSpan::from_group)
            .filter(|w| !w.trimmed().is_empty())
            .collect(),
        Segmentation::Whitespace => split_on_spaces(groups),
    }
}

fn split_on_spaces(groups: Vec<TokenGroup>) -> Vec<WordSpan> {
    let mut words: Vec<WordSpan> = Vec::new();

    for group in &groups {
        // pieces of one group all carry the group's tokens
        for piece in split_before_spaces(&group.text) {
            let starts_word = piece.starts_with(char::is_whitespace)
                || PUNCTUATION_PATTERN.is_match(piece.trim());

            match words.last_mut() {
                Some(last) if !starts_word => last.extend(piece, &group.range),
                _ => words.push(WordSpan {
                    text: piece.to_string(),
                    range: group.range.clone(),
                }),
            }
        }
    }

    words.retain(|w| !w.trimmed().is_empty());
    words
}

/// Split `text` where a whitespace run follows non-whitespace.
///
/// `" a b"` gives `[" a", " b"]`, `"a "` gives `["a", " "]`.
fn split_before_spaces(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut after_space = true;

    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        if space && !after_space {
            pieces.push(&text[start..i]);
            start = i;
        }
        after_space = space;
    }

    pieces.push(&text[start..]);
    pieces
}
