//! Core types for melops-stitch

use crate::language::Language;
use serde::Serialize;

/// Vocabulary index of a decoded token.
pub type TokenId = u32;

/// A word with its contributing tokens and timestamps in seconds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Word {
    /// Word text, including any leading whitespace
    pub text: String,
    /// Token ids the word was decoded from
    pub tokens: Vec<TokenId>,
    /// Start time in seconds
    pub start: Option<f32>,
    /// End time in seconds
    pub end: Option<f32>,
    /// Language of the chunk the word was decoded from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

impl Word {
    pub fn new(text: impl Into<String>, tokens: Vec<TokenId>) -> Self {
        Self {
            text: text.into(),
            tokens,
            start: None,
            end: None,
            language: None,
        }
    }

    pub fn with_times(mut self, start: Option<f32>, end: Option<f32>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

/// One entry of a structured transcript.
///
/// Depending on the output mode this is a timestamped segment, a run of
/// text in one language, or a segment with its words.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TranscriptChunk {
    pub text: String,
    /// `(start, end)` in seconds; either side may be unknown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<(Option<f32>, Option<f32>)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Word>>,
}

/// Final stitched transcript.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Transcript {
    /// Plain text, no timing or language information requested
    Text(String),
    /// Structured entries in recording order
    Chunks(Vec<TranscriptChunk>),
}

impl Transcript {
    /// Full transcript text.
    pub fn text(&self) -> String {
        match self {
            Transcript::Text(text) => text.clone(),
            Transcript::Chunks(chunks) => chunks.iter().map(|c| c.text.as_str()).collect(),
        }
    }

    /// Structured entries, empty for plain text output.
    pub fn chunks(&self) -> &[TranscriptChunk] {
        match self {
            Transcript::Text(_) => &[],
            Transcript::Chunks(chunks) => chunks,
        }
    }

    /// All words across entries, in order.
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.chunks()
            .iter()
            .flat_map(|c| c.words.as_deref().unwrap_or_default())
    }
}
