//! melops-stitch: Transcript stitching for chunked Whisper-style decoding.
//!
//! Long recordings are decoded in overlapping windows. This crate turns the
//! per-window token ids back into one transcript, removing the text that
//! neighboring windows both decoded.
//!
//! # Architecture
//!
//! Each chunk flows through a fixed set of stages:
//!
//! - [`align`]: Cuts the part of a chunk that repeats the previous chunk
//! - [`timestamps`]: Splits token ids into timestamped segments
//! - [`unicode`]: Groups byte-level tokens into whole code points
//! - [`words`]: Segments groups into words, per language script
//! - [`punctuation`]: Attaches punctuation-only words to their neighbors
//!
//! [`stitcher::Stitcher`] drives the stages chunk by chunk, and the text
//! itself comes from any [`traits::Decode`] implementation, such as a
//! [`tokenizers::Tokenizer`].
//!
//! # Quick Start
//!
//! ```ignore
//! use melops_stitch::chunk::{Chunk, Stride};
//! use melops_stitch::config::{ReturnTimestamps, StitchConfig};
//! use melops_stitch::stitcher::stitch;
//! use melops_stitch::vocab::SpecialTokens;
//! use tokenizers::Tokenizer;
//!
//! let tokenizer = Tokenizer::from_file("tokenizer.json")?;
//! let specials = SpecialTokens::from_tokenizer(&tokenizer)?;
//!
//! let chunks = vec![
//!     Chunk::new(first_ids).with_stride(Stride::new(first_len, 0, 8)),
//!     Chunk::new(second_ids).with_stride(Stride::new(second_len, 8, 0)).with_offset(28.0),
//! ];
//!
//! let config = StitchConfig::default().with_timestamps(ReturnTimestamps::Word);
//! let transcript = stitch(&chunks, &tokenizer, &specials, config)?;
//!
//! for word in transcript.words() {
//!     println!("{:?} {:?} {}", word.start, word.end, word.text);
//! }
//! ```

pub mod align;
pub mod chunk;
pub mod config;
pub mod error;
pub mod language;
pub mod punctuation;
pub mod stitcher;
pub mod timestamps;
pub mod traits;
pub mod types;
pub mod unicode;
pub mod vocab;
pub mod words;

pub use config::{ReturnTimestamps, StitchConfig};
pub use error::{Error, Result};
pub use stitcher::{Stitcher, stitch};
pub use types::{Transcript, TranscriptChunk, Word};
