//! Re-attachment of punctuation-only words to their neighbors.

use crate::words::WordSpan;
use serde::Deserialize;

/// Default marks merged into the following word
pub const DEFAULT_PREPENDED: &str = "\"“¿([{-";

/// Default marks merged into the preceding word
pub const DEFAULT_APPENDED: &str = "\"”.,!?:)]};";

/// Punctuation sets used when merging words.
#[derive(clap::Args, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Punctuation {
    /// Punctuation marks attached to the following word
    #[arg(long = "prepend-punctuation", default_value = DEFAULT_PREPENDED)]
    pub prepended: String,

    /// Punctuation marks attached to the preceding word
    #[arg(long = "append-punctuation", default_value = DEFAULT_APPENDED)]
    pub appended: String,
}

impl Default for Punctuation {
    fn default() -> Self {
        Self {
            prepended: DEFAULT_PREPENDED.to_string(),
            appended: DEFAULT_APPENDED.to_string(),
        }
    }
}

impl Punctuation {
    pub fn new(prepended: impl Into<String>, appended: impl Into<String>) -> Self {
        Self {
            prepended: prepended.into(),
            appended: appended.into(),
        }
    }

    /// Merge punctuation-only words into adjacent words.
    ///
    /// Appended marks join the preceding word (left to right), then prepended
    /// marks join the following word (right to left). Whatever is still bare
    /// afterwards joins any neighbor, so no returned word is punctuation only.
    /// A sequence made only of punctuation yields no words.
    pub fn merge(&self, words: Vec<WordSpan>) -> Vec<WordSpan> {
        let words = self.merge_appended(words);
        let words = self.merge_prepended(words);
        self.absorb_bare(words)
    }

    fn merge_appended(&self, words: Vec<WordSpan>) -> Vec<WordSpan> {
        let mut merged: Vec<WordSpan> = Vec::with_capacity(words.len());

        for word in words {
            if let Some(previous) = merged.last_mut()
                && !previous.text.ends_with(char::is_whitespace)
                && only(&word, &self.appended)
            {
                previous.append(word);
            } else {
                merged.push(word);
            }
        }

        merged
    }

    fn merge_prepended(&self, words: Vec<WordSpan>) -> Vec<WordSpan> {
        let mut merged: Vec<WordSpan> = Vec::with_capacity(words.len());

        for word in words.into_iter().rev() {
            if let Some(next) = merged.last_mut()
                && !word.text.ends_with(char::is_whitespace)
                && only(&word, &self.prepended)
            {
                next.prepend(word);
            } else {
                merged.push(word);
            }
        }

        merged.reverse();
        merged
    }

    fn absorb_bare(&self, words: Vec<WordSpan>) -> Vec<WordSpan> {
        let mut merged: Vec<WordSpan> = Vec::with_capacity(words.len());
        let mut pending: Option<WordSpan> = None;

        for mut word in words {
            if !self.is_bare(&word) {
                if let Some(bare) = pending.take() {
                    word.prepend(bare);
                }
                merged.push(word);
                continue;
            }

            if pending.is_none()
                && only(&word, &self.appended)
                && let Some(previous) = merged.last_mut()
            {
                previous.append(word);
                continue;
            }

            pending = Some(match pending.take() {
                Some(mut bare) => {
                    bare.append(word);
                    bare
                }
                None => word,
            });
        }

        if let Some(bare) = pending {
            match merged.last_mut() {
                Some(previous) => previous.append(bare),
                None => tracing::debug!(text = ?bare.text, "dropping punctuation-only words"),
            }
        }

        merged
    }

    fn is_bare(&self, word: &WordSpan) -> bool {
        let trimmed = word.trimmed();

        !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| self.prepended.contains(c) || self.appended.contains(c))
    }
}

/// Whether the trimmed word is non-empty and made only of `marks`.
fn only(word: &WordSpan, marks: &str) -> bool {
    let trimmed = word.trimmed();
    !trimmed.is_empty() && trimmed.chars().all(|c| marks.contains(c))
}
