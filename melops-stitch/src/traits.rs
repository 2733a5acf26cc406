//! Decode primitive supplied by the tokenizer collaborator.

use crate::error::Result;
use crate::types::TokenId;
use tokenizers::Tokenizer;

/// Converts a run of content token ids back to text.
///
/// Byte-level vocabularies may split one code point over several tokens;
/// decoding such a partial run must yield U+FFFD rather than fail. Errors are
/// reserved for real decoder failures such as an id outside the vocabulary.
pub trait Decode {
    fn decode(&self, tokens: &[TokenId]) -> Result<String>;
}

impl<T: Decode + ?Sized> Decode for &T {
    fn decode(&self, tokens: &[TokenId]) -> Result<String> {
        (**self).decode(tokens)
    }
}

impl Decode for Tokenizer {
    fn decode(&self, tokens: &[TokenId]) -> Result<String> {
        // inherent decode lives on the derefed TokenizerImpl
        Ok((**self).decode(tokens, false)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::str::FromStr;

    /// Word-level tokenizer with a byte-level decoder, as Whisper uses.
    pub(crate) const TOKENIZER_JSON: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": null,
        "post_processor": null,
        "decoder": {
            "type": "ByteLevel",
            "add_prefix_space": true,
            "trim_offsets": true,
            "use_regex": true
        },
        "model": {
            "type": "WordLevel",
            "vocab": {"<unk>": 0, "Hello": 1, "Ġworld": 2, ",": 3},
            "unk_token": "<unk>"
        }
    }"#;

    #[test]
    fn tokenizer_decodes_byte_level_tokens() {
        let tokenizer = Tokenizer::from_str(TOKENIZER_JSON).unwrap();

        assert_eq!(Decode::decode(&tokenizer, &[1, 3, 2]).unwrap(), "Hello, world");
        assert_eq!(Decode::decode(&tokenizer, &[]).unwrap(), "");
    }

    #[test]
    fn references_decode_like_their_target() {
        let tokenizer = Tokenizer::from_str(TOKENIZER_JSON).unwrap();
        let decoder: &dyn Decode = &tokenizer;

        assert_eq!((&decoder).decode(&[1, 2]).unwrap(), "Hello world");
    }
}
