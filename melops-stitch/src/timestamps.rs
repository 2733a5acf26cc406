//! Timestamp extraction from a flat token id stream.
//!
//! Timestamp tokens delimit runs of content tokens:
//!
//! ```text
//! <|0.00|> Hello <|1.00|><|1.00|> world <|2.00|>
//! └──── (0.0, 1.0) ───┘  └─ empty ┘└── (1.0, 2.0) ──┘
//! ```

use crate::types::TokenId;
use crate::vocab::{SpecialTokens, TokenKind};

/// Default seconds per timestamp unit
pub const DEFAULT_TIME_PRECISION: f32 = 0.02;

/// A run of content tokens bounded by timestamps.
///
/// Times are relative to the chunk start.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenSegment {
    /// Content token ids
    pub tokens: Vec<TokenId>,
    /// Position of each content token in the source id sequence
    pub positions: Vec<usize>,
    /// Time of the opening timestamp
    pub start: Option<f32>,
    /// Time of the closing timestamp; unset for an open trailing run
    pub end: Option<f32>,
}

impl TokenSegment {
    fn push(&mut self, position: usize, token: TokenId) {
        self.positions.push(position);
        self.tokens.push(token);
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Timestamp extraction options.
#[derive(Clone, Copy, Debug)]
pub struct Extraction {
    /// Seconds per timestamp unit
    pub time_precision: f32,
    /// Honor timestamp tokens; when false the whole sequence is one segment
    pub timestamps: bool,
    /// Keep a trailing run that has no closing timestamp
    pub force_full_sequences: bool,
}

impl Default for Extraction {
    fn default() -> Self {
        Self {
            time_precision: DEFAULT_TIME_PRECISION,
            timestamps: true,
            force_full_sequences: true,
        }
    }
}

impl Extraction {
    /// Split `tokens` into timestamped segments of content tokens.
    ///
    /// Language and control tokens are skipped. Positions index into `tokens`.
    pub fn extract(&self, tokens: &[TokenId], specials: &SpecialTokens) -> Vec<TokenSegment> {
        if !self.timestamps {
            let mut segment = TokenSegment::default();

            for (position, &token) in tokens.iter().enumerate() {
                if specials.is_text(token) {
                    segment.push(position, token);
                }
            }

            return if segment.is_empty() {
                Vec::new()
            } else {
                vec![segment]
            };
        }

        let mut segments = Vec::new();
        let mut current = TokenSegment::default();

        for (position, &token) in tokens.iter().enumerate() {
            match specials.classify(token) {
                TokenKind::Timestamp(units) => {
                    let time = units as f32 * self.time_precision;

                    if !current.is_empty() {
                        current.end = Some(time);
                        segments.push(std::mem::take(&mut current));
                    }

                    current.start = Some(time);
                }
                TokenKind::Text => current.push(position, token),
                TokenKind::Language(_) | TokenKind::Control => {}
            }
        }

        if !current.is_empty() {
            if self.force_full_sequences {
                segments.push(current);
            } else {
                tracing::debug!(
                    tokens = current.tokens.len(),
                    start = ?current.start,
                    "dropping trailing segment without closing timestamp"
                );
            }
        }

        segments
    }
}
