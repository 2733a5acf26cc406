//! Grouping of byte-level tokens into complete Unicode code points.

use crate::error::Result;
use crate::traits::Decode;
use crate::types::TokenId;
use std::ops::Range;

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

/// Minimal run of consecutive tokens that decodes to whole code points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGroup {
    /// Decoded text of the run
    pub text: String,
    /// Indices of the run in the input token slice
    pub range: Range<usize>,
}

/// Split `tokens` into groups that each decode without a partial character.
///
/// Tokens are decoded incrementally; a group closes as soon as its text has
/// no replacement character, or when the replacement character is genuine:
/// the slice decoded up to the group's end is then a prefix of the whole
/// slice decoded. Positions are never carried between decodes, so decoders
/// that add or strip text per call do not shift the check. A run that never
/// resolves is flushed as a final group rather than dropped.
pub fn split_on_unicode<D>(decoder: &D, tokens: &[TokenId]) -> Result<Vec<TokenGroup>>
where
    D: Decode + ?Sized,
{
    let full = decoder.decode(tokens)?;

    let mut groups = Vec::new();
    let mut start = 0;

    for end in 1..=tokens.len() {
        let text = decoder.decode(&tokens[start..end])?;

        let resolved =
            !text.contains(REPLACEMENT) || full.starts_with(&decoder.decode(&tokens[..end])?);

        if resolved {
            groups.push(TokenGroup {
                text,
                range: start..end,
            });
            start = end;
        }
    }

    if start < tokens.len() {
        let text = decoder.decode(&tokens[start..])?;

        tracing::debug!(
            tokens = tokens.len() - start,
            ?text,
            "flushing unresolved unicode group"
        );

        groups.push(TokenGroup {
            text,
            range: start..tokens.len(),
        });
    }

    Ok(groups)
}
