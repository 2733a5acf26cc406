//! Vocabulary constants: timestamp, language and control token ids.

use crate::error::{ConfigError, Result};
use crate::language::{LANGUAGES, Language};
use crate::traits::Decode;
use crate::types::TokenId;
use std::collections::HashMap;
use tokenizers::Tokenizer;

/// End of text token
pub const EOT_TOKEN: &str = "<|endoftext|>";

/// No timestamps token; timestamp tokens follow it directly
pub const NO_TIMESTAMPS_TOKEN: &str = "<|notimestamps|>";

/// Category of a token id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Ordinary content token
    Text,
    /// Timestamp token, carrying the number of time quanta since chunk start
    Timestamp(u32),
    /// Detected language tag
    Language(Language),
    /// Any other special token (start of transcript, task, no-timestamps, ...)
    Control,
}

/// Special token ids of a decoder vocabulary.
///
/// All ids at or above `eot` are special; ids from `timestamp_begin` on are
/// timestamps.
#[derive(Clone, Debug)]
pub struct SpecialTokens {
    pub eot: TokenId,
    pub no_timestamps: TokenId,
    pub timestamp_begin: TokenId,
    languages: HashMap<TokenId, Language>,
}

impl SpecialTokens {
    /// Special tokens without language tags.
    pub fn new(eot: TokenId, no_timestamps: TokenId, timestamp_begin: TokenId) -> Self {
        Self {
            eot,
            no_timestamps,
            timestamp_begin,
            languages: HashMap::new(),
        }
    }

    /// Register `id` as the tag for `language`.
    pub fn with_language(mut self, id: TokenId, language: Language) -> Self {
        self.languages.insert(id, language);
        self
    }

    /// Multilingual vocabulary with 99 languages (large-v2 and earlier).
    pub fn multilingual() -> Self {
        Self::with_language_block(50257, 50259, 99, 50363)
    }

    /// Multilingual vocabulary with 100 languages, Cantonese included (large-v3).
    pub fn multilingual_v3() -> Self {
        Self::with_language_block(50257, 50259, 100, 50364)
    }

    /// English-only vocabulary; no language tags are emitted.
    pub fn english_only() -> Self {
        Self::new(50256, 50362, 50363)
    }

    fn with_language_block(
        eot: TokenId,
        lang_base: TokenId,
        count: usize,
        no_timestamps: TokenId,
    ) -> Self {
        let languages = (0..count)
            .filter_map(Language::from_index)
            .zip(lang_base..)
            .map(|(language, id)| (id, language))
            .collect();

        Self {
            eot,
            no_timestamps,
            timestamp_begin: no_timestamps + 1,
            languages,
        }
    }

    /// Resolve special token ids by name from a tokenizer vocabulary.
    pub fn from_tokenizer(tokenizer: &Tokenizer) -> Result<Self> {
        let resolve = |token: &str| {
            tokenizer
                .token_to_id(token)
                .ok_or_else(|| ConfigError::MissingSpecialToken(token.to_string()))
        };

        let eot = resolve(EOT_TOKEN)?;
        let no_timestamps = resolve(NO_TIMESTAMPS_TOKEN)?;

        let languages: HashMap<_, _> = LANGUAGES
            .iter()
            .enumerate()
            .filter_map(|(index, (code, _))| {
                let id = tokenizer.token_to_id(&format!("<|{code}|>"))?;
                Some((id, Language::from_index(index)?))
            })
            .collect();

        tracing::debug!(
            eot,
            no_timestamps,
            languages = languages.len(),
            "resolved special tokens"
        );

        Ok(Self {
            eot,
            no_timestamps,
            timestamp_begin: no_timestamps + 1,
            languages,
        })
    }

    /// Token id tagging `language`, if the vocabulary has one.
    pub fn language_token(&self, language: Language) -> Option<TokenId> {
        self.languages
            .iter()
            .find_map(|(&id, &l)| (l == language).then_some(id))
    }

    pub fn classify(&self, token: TokenId) -> TokenKind {
        if token >= self.timestamp_begin {
            TokenKind::Timestamp(token - self.timestamp_begin)
        } else if let Some(&language) = self.languages.get(&token) {
            TokenKind::Language(language)
        } else if token >= self.eot {
            TokenKind::Control
        } else {
            TokenKind::Text
        }
    }

    pub fn is_text(&self, token: TokenId) -> bool {
        self.classify(token) == TokenKind::Text
    }
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self::multilingual()
    }
}

/// Vocabulary of raw byte fragments.
///
/// Decodes by concatenating fragments, replacing incomplete UTF-8 with U+FFFD.
/// Unknown ids decode to U+FFFD, so they stay visible in the text.
#[derive(Clone, Debug, Default)]
pub struct ByteVocab {
    fragments: HashMap<TokenId, Vec<u8>>,
}

impl ByteVocab {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: TokenId, bytes: impl Into<Vec<u8>>) {
        self.fragments.insert(token, bytes.into());
    }

    pub fn with(mut self, token: TokenId, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(token, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl FromIterator<(TokenId, Vec<u8>)> for ByteVocab {
    fn from_iter<I: IntoIterator<Item = (TokenId, Vec<u8>)>>(iter: I) -> Self {
        Self {
            fragments: iter.into_iter().collect(),
        }
    }
}

impl Decode for ByteVocab {
    fn decode(&self, tokens: &[TokenId]) -> Result<String> {
        const REPLACEMENT: &[u8] = "\u{FFFD}".as_bytes();

        let bytes: Vec<u8> = tokens
            .iter()
            .flat_map(|t| self.fragments.get(t).map_or(REPLACEMENT, Vec::as_slice))
            .copied()
            .collect();

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_multilingual_ids() {
        let specials = SpecialTokens::multilingual();

        assert_eq!(specials.classify(440), TokenKind::Text);
        assert_eq!(specials.classify(50257), TokenKind::Control);
        assert_eq!(
            specials.classify(50259),
            TokenKind::Language(Language::from_code("en").unwrap())
        );
        assert_eq!(
            specials.classify(50260),
            TokenKind::Language(Language::from_code("zh").unwrap())
        );
        assert_eq!(specials.classify(50358), TokenKind::Control);
        assert_eq!(specials.classify(50363), TokenKind::Control);
        assert_eq!(specials.classify(50364), TokenKind::Timestamp(0));
        assert_eq!(specials.classify(50414), TokenKind::Timestamp(50));
    }

    #[test]
    fn v3_shifts_timestamps_by_one() {
        let specials = SpecialTokens::multilingual_v3();
        let yue = Language::from_code("yue").unwrap();

        assert_eq!(specials.language_token(yue), Some(50358));
        assert_eq!(specials.classify(50364), TokenKind::Control);
        assert_eq!(specials.classify(50365), TokenKind::Timestamp(0));
    }

    #[test]
    fn english_only_has_no_language_tags() {
        let specials = SpecialTokens::english_only();

        assert_eq!(specials.classify(50259), TokenKind::Control);
        assert_eq!(specials.classify(50363), TokenKind::Timestamp(0));
    }

    #[test]
    fn byte_vocab_decodes_partial_bytes_lossily() {
        // "é" is 0xC3 0xA9
        let vocab = ByteVocab::new().with(1, vec![0xC3]).with(2, vec![0xA9]);

        assert_eq!(vocab.decode(&[1, 2]).unwrap(), "é");
        assert_eq!(vocab.decode(&[1]).unwrap(), "\u{FFFD}");
        assert_eq!(vocab.decode(&[]).unwrap(), "");
    }

    #[test]
    fn byte_vocab_marks_unknown_ids() {
        let vocab = ByteVocab::new().with(1, "a").with(2, "b");

        assert_eq!(vocab.decode(&[1, 99, 2]).unwrap(), "a\u{FFFD}b");
        assert_eq!(vocab.decode(&[99]).unwrap(), "\u{FFFD}");
    }
}
