//! Decoded chunks of a long recording and their overlap descriptors.

use crate::error::ChunkError;
use crate::types::TokenId;
use serde::{Deserialize, Serialize};

/// Overlap between a chunk and its neighbors.
///
/// Overlaps are counted in content tokens: timestamp, language and control
/// tokens do not count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Stride {
    /// Full chunk length
    pub length: usize,
    /// Tokens shared with the previous chunk
    pub left: usize,
    /// Tokens shared with the next chunk
    pub right: usize,
}

impl Stride {
    pub fn new(length: usize, left: usize, right: usize) -> Self {
        Self {
            length,
            left,
            right,
        }
    }

    /// Stride of a chunk that overlaps nothing.
    pub fn none(length: usize) -> Self {
        Self::new(length, 0, 0)
    }

    fn validate(&self, index: usize) -> Result<(), ChunkError> {
        if self.left > self.length {
            return Err(ChunkError::LeftOverlap {
                index,
                left: self.left,
                length: self.length,
            });
        }

        if self.right > self.length {
            return Err(ChunkError::RightOverlap {
                index,
                right: self.right,
                length: self.length,
            });
        }

        Ok(())
    }
}

/// One independently decoded window of the recording.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Chunk {
    /// Decoded token ids in time order
    pub tokens: Vec<TokenId>,
    /// Per-token times in seconds relative to the chunk start, parallel to `tokens`
    #[serde(default)]
    pub token_timestamps: Option<Vec<f32>>,
    /// Overlap with neighbors; `None` means no overlap
    #[serde(default)]
    pub stride: Option<Stride>,
    /// Chunk start in seconds, added to every time in the chunk
    #[serde(default)]
    pub offset: f32,
}

impl Chunk {
    pub fn new(tokens: Vec<TokenId>) -> Self {
        Self {
            tokens,
            ..Default::default()
        }
    }

    pub fn with_token_timestamps(mut self, timestamps: Vec<f32>) -> Self {
        self.token_timestamps = Some(timestamps);
        self
    }

    pub fn with_stride(mut self, stride: Stride) -> Self {
        self.stride = Some(stride);
        self
    }

    pub fn with_offset(mut self, offset_sec: f32) -> Self {
        self.offset = offset_sec;
        self
    }

    /// Declared stride, or a zero-overlap stride spanning the whole chunk.
    pub fn stride(&self) -> Stride {
        self.stride.unwrap_or_else(|| Stride::none(self.tokens.len()))
    }

    /// Check the chunk against its structural contract.
    ///
    /// `index` is the chunk position in the recording, used in error reports.
    pub fn validate(&self, index: usize) -> Result<(), ChunkError> {
        if let Some(timestamps) = &self.token_timestamps
            && timestamps.len() != self.tokens.len()
        {
            return Err(ChunkError::TimestampLength {
                index,
                tokens: self.tokens.len(),
                timestamps: timestamps.len(),
            });
        }

        self.stride().validate(index)
    }

    /// Relative time of the token at `position`, if per-token times are known.
    pub fn token_time(&self, position: usize) -> Option<f32> {
        self.token_timestamps.as_ref()?.get(position).copied()
    }
}
