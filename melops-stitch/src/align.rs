//! Overlap alignment between consecutive chunks.
//!
//! The tail of the previous chunk is matched against the head of the next
//! one; the longest suffix of the tail that is also a prefix of the head is
//! the duplicated region and is cut from the head:
//!
//! ```text
//! tail:  ... a b c d
//! head:          c d e f ...
//!                └─┘ cut
//! ```

use crate::chunk::Stride;
use crate::error::ConfigError;
use crate::types::TokenId;
use serde::Deserialize;

/// Default minimum overlap length accepted as an alignment
pub const DEFAULT_MIN_MATCH: usize = 1;

/// Default minimum share of the overlap window a match must cover
pub const DEFAULT_MIN_RATIO: f32 = 0.0;

/// Acceptance thresholds for overlap matches.
#[derive(clap::Args, Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Minimum number of matching tokens to trust an overlap
    #[arg(long, default_value_t = DEFAULT_MIN_MATCH)]
    pub min_match: usize,

    /// Minimum fraction of the overlap window the match must cover (0 to 1)
    #[arg(long, default_value_t = DEFAULT_MIN_RATIO)]
    pub min_ratio: f32,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            min_match: DEFAULT_MIN_MATCH,
            min_ratio: DEFAULT_MIN_RATIO,
        }
    }
}

/// Where to cut the head of the next chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cut {
    /// The first `len` head tokens duplicate the tail
    Aligned { len: usize },
    /// No trusted overlap; keep both sequences whole
    Concatenate,
}

impl Cut {
    /// Number of head tokens to drop.
    pub fn skip(self) -> usize {
        match self {
            Cut::Aligned { len } => len,
            Cut::Concatenate => 0,
        }
    }
}

impl AlignConfig {
    pub fn new(min_match: usize, min_ratio: f32) -> Self {
        Self {
            min_match,
            min_ratio,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_ratio) {
            return Err(ConfigError::InvalidMatchRatio(self.min_ratio));
        }

        Ok(())
    }

    /// Decide the cut for `head` given the previous `tail`.
    ///
    /// A match is trusted only if it is at least `min_match` tokens long and
    /// covers at least `min_ratio` of the shorter of both sequences.
    pub fn align(&self, tail: &[TokenId], head: &[TokenId]) -> Cut {
        let window = tail.len().min(head.len());

        let Some(len) = longest_overlap(tail, head) else {
            tracing::debug!(
                tail = tail.len(),
                head = head.len(),
                "no overlap, concatenating"
            );
            return Cut::Concatenate;
        };

        let ratio = len as f32 / window as f32;

        if len < self.min_match || ratio < self.min_ratio {
            tracing::debug!(
                len,
                window,
                ratio,
                "overlap below threshold, concatenating"
            );
            return Cut::Concatenate;
        }

        tracing::debug!(len, offset = tail.len() - len, window, "aligned overlap");

        Cut::Aligned { len }
    }
}

/// Length of the longest suffix of `tail` equal to a prefix of `head`.
pub fn longest_overlap(tail: &[TokenId], head: &[TokenId]) -> Option<usize> {
    let max = tail.len().min(head.len());

    (1..=max)
        .rev()
        .find(|&len| tail[tail.len() - len..] == head[..len])
}

/// Fold chunks of content tokens into one de-duplicated stream.
///
/// Each chunk's head (its left overlap) is aligned against the last tokens
/// of the stream (the previous chunk's right overlap).
pub fn stitch_sequences<I>(chunks: I, config: &AlignConfig) -> Vec<TokenId>
where
    I: IntoIterator<Item = (Vec<TokenId>, Stride)>,
{
    let (stitched, _) = chunks.into_iter().fold(
        (Vec::new(), 0),
        |(mut stitched, right): (Vec<TokenId>, usize), (tokens, stride)| {
            let tail = &stitched[stitched.len() - right.min(stitched.len())..];
            let head = &tokens[..stride.left.min(tokens.len())];

            let skip = config.align(tail, head).skip();
            stitched.extend_from_slice(&tokens[skip..]);

            (stitched, stride.right)
        },
    );

    stitched
}
