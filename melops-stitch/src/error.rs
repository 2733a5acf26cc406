//! Error types for melops-stitch organized by processing stage.

use thiserror::Error;

/// Stitching error variants organized by processing stage.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration stage error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Chunk input violates the caller contract
    #[error(transparent)]
    Chunk(#[from] ChunkError),

    /// Tokenizer error
    #[error("tokenizer error: {0}")]
    Tokenizers(tokenizers::Error),
}

/// Configuration errors (time precision, alignment thresholds, vocabulary).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Time precision must be a positive, finite number of seconds
    #[error("invalid time precision: {0}s per timestamp unit")]
    InvalidTimePrecision(f32),

    /// Match ratio must lie in [0, 1]
    #[error("invalid alignment match ratio: {0} (expected 0.0..=1.0)")]
    InvalidMatchRatio(f32),

    /// Required special token missing from the tokenizer vocabulary
    #[error("special token not found in vocabulary: {0}")]
    MissingSpecialToken(String),
}

/// Structural violations in a decoded chunk.
///
/// These indicate an upstream bug and are never silently truncated.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Per-token timestamp array does not match the token id array
    #[error("chunk {index}: {timestamps} token timestamps for {tokens} token ids")]
    TimestampLength {
        index: usize,
        tokens: usize,
        timestamps: usize,
    },

    /// Left overlap larger than the chunk itself
    #[error("chunk {index}: left overlap {left} exceeds chunk length {length}")]
    LeftOverlap {
        index: usize,
        left: usize,
        length: usize,
    },

    /// Right overlap larger than the chunk itself
    #[error("chunk {index}: right overlap {right} exceeds chunk length {length}")]
    RightOverlap {
        index: usize,
        right: usize,
        length: usize,
    },
}

/// Result type alias for melops-stitch operations.
pub type Result<T> = std::result::Result<T, Error>;

// tokenizers::Error is a boxed trait object, so it gets a manual conversion
impl From<tokenizers::Error> for Error {
    fn from(e: tokenizers::Error) -> Self {
        Error::Tokenizers(e)
    }
}
