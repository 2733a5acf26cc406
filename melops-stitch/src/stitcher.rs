//! Transcript aggregation over a stream of overlapping chunks.
//!
//! Chunks are pushed in recording order. The first chunk seeds the
//! transcript; every later chunk is aligned against the tail of what has been
//! emitted so far, and only the tokens after the cut are extracted, grouped
//! into words and appended.

use crate::chunk::Chunk;
use crate::config::{ReturnTimestamps, StitchConfig};
use crate::error::Result;
use crate::language::{Language, segmentation_for};
use crate::timestamps::TokenSegment;
use crate::traits::Decode;
use crate::types::{TokenId, Transcript, TranscriptChunk, Word};
use crate::unicode::split_on_unicode;
use crate::vocab::{SpecialTokens, TokenKind};
use crate::words::split_words;
use std::borrow::Borrow;

/// Aggregation state between chunks.
#[derive(Debug)]
enum State {
    /// No chunk seen yet
    Start,
    /// Last emitted content tokens of the stream, up to the previous right overlap
    Accumulating { tail: Vec<TokenId> },
}

/// An emitted segment with absolute times.
#[derive(Clone, Debug)]
struct Span {
    text: String,
    start: Option<f32>,
    end: Option<f32>,
    language: Option<Language>,
    words: Vec<Word>,
}

/// Incremental transcript builder.
///
/// ```ignore
/// let mut stitcher = Stitcher::new(&tokenizer, &specials, config)?;
/// for chunk in &chunks {
///     stitcher.push(chunk)?;
/// }
/// let transcript = stitcher.finish();
/// ```
pub struct Stitcher<'a, D: Decode + ?Sized> {
    decoder: &'a D,
    specials: &'a SpecialTokens,
    config: StitchConfig,
    fallback: Option<Language>,
    last_language: Option<Language>,
    state: State,
    spans: Vec<Span>,
    index: usize,
}

impl<'a, D: Decode + ?Sized> Stitcher<'a, D> {
    pub fn new(decoder: &'a D, specials: &'a SpecialTokens, config: StitchConfig) -> Result<Self> {
        config.validate()?;

        let fallback = config.language.as_deref().and_then(|value| {
            let language = Language::parse(value);
            if language.is_none() {
                tracing::warn!(
                    language = value,
                    "unknown language, falling back to whitespace segmentation"
                );
            }
            language
        });

        Ok(Self {
            decoder,
            specials,
            config,
            fallback,
            last_language: None,
            state: State::Start,
            spans: Vec::new(),
            index: 0,
        })
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Number of chunks pushed so far.
    pub fn chunks(&self) -> usize {
        self.index
    }

    /// Stitch the next chunk onto the transcript.
    ///
    /// Fails without changing state if the chunk violates its structural
    /// contract, or if the decoder fails.
    pub fn push(&mut self, chunk: &Chunk) -> Result<()> {
        let index = self.index;
        chunk.validate(index)?;

        let stride = chunk.stride();

        let mut detected = None;
        let mut content = Vec::new();

        for (position, &token) in chunk.tokens.iter().enumerate() {
            match self.specials.classify(token) {
                TokenKind::Text => content.push(position),
                TokenKind::Language(language) => {
                    detected.get_or_insert(language);
                }
                TokenKind::Timestamp(_) | TokenKind::Control => {}
            }
        }

        let language = detected.or(self.last_language).or(self.fallback);

        let cut = match &self.state {
            State::Start => 0,
            State::Accumulating { tail } => {
                let head: Vec<TokenId> = content
                    .iter()
                    .take(stride.left)
                    .map(|&position| chunk.tokens[position])
                    .collect();

                match self.config.align.align(tail, &head).skip() {
                    0 => 0,
                    skip => content[skip - 1] + 1,
                }
            }
        };

        let segments = self
            .config
            .extraction()
            .extract(&chunk.tokens[cut..], self.specials);

        let mut spans = Vec::with_capacity(segments.len());

        for segment in &segments {
            let words = if self.config.word_timestamps() {
                self.words(chunk, segment, cut, language)?
            } else {
                Vec::new()
            };

            spans.push(Span {
                text: self.decoder.decode(&segment.tokens)?,
                start: segment.start.map(|t| t + chunk.offset),
                end: segment.end.map(|t| t + chunk.offset),
                language,
                words,
            });
        }

        let emitted: Vec<TokenId> = segments
            .iter()
            .flat_map(|s| s.tokens.iter().copied())
            .collect();

        tracing::debug!(
            index,
            tokens = chunk.tokens.len(),
            language = ?language.map(Language::code),
            cut,
            segments = spans.len(),
            "stitched chunk"
        );

        // the tail rolls over short chunks, so it may reach into earlier ones
        let mut tail = match std::mem::replace(&mut self.state, State::Start) {
            State::Accumulating { tail } => tail,
            State::Start => Vec::new(),
        };
        tail.extend(emitted);
        tail.drain(..tail.len().saturating_sub(stride.right));
        self.state = State::Accumulating { tail };

        if detected.is_some() {
            self.last_language = detected;
        }

        self.spans.extend(spans);
        self.index += 1;

        Ok(())
    }

    /// Words of one segment, with absolute times.
    fn words(
        &self,
        chunk: &Chunk,
        segment: &TokenSegment,
        cut: usize,
        language: Option<Language>,
    ) -> Result<Vec<Word>> {
        let groups = split_on_unicode(self.decoder, &segment.tokens)?;
        let spans = self
            .config
            .punctuation
            .merge(split_words(groups, segmentation_for(language)));

        let count = spans.len();
        let tagged = if self.config.return_language {
            language
        } else {
            None
        };

        let words = spans
            .into_iter()
            .enumerate()
            .map(|(i, span)| {
                let (start, end) = if chunk.token_timestamps.is_some() {
                    let first = cut + segment.positions[span.range.start];
                    let after = cut + segment.positions[span.range.end - 1] + 1;
                    (
                        chunk.token_time(first),
                        chunk.token_time(after).or(segment.end),
                    )
                } else {
                    interpolate(segment.start, segment.end, i, count)
                };

                Word {
                    text: span.text,
                    tokens: segment.tokens[span.range].to_vec(),
                    start: start.map(|t| t + chunk.offset),
                    end: end.map(|t| t + chunk.offset),
                    language: tagged,
                }
            })
            .collect();

        Ok(words)
    }

    /// Transcript of the chunks pushed so far.
    pub fn snapshot(&self) -> Transcript {
        assemble(&self.config, self.spans.clone())
    }

    /// Consume the stitcher and return the final transcript.
    pub fn finish(self) -> Transcript {
        let Self { config, spans, .. } = self;
        assemble(&config, spans)
    }
}

/// Stitch all `chunks` in order and return the final transcript.
pub fn stitch<D, I>(
    chunks: I,
    decoder: &D,
    specials: &SpecialTokens,
    config: StitchConfig,
) -> Result<Transcript>
where
    D: Decode + ?Sized,
    I: IntoIterator,
    I::Item: Borrow<Chunk>,
{
    let mut stitcher = Stitcher::new(decoder, specials, config)?;

    for chunk in chunks {
        stitcher.push(chunk.borrow())?;
    }

    Ok(stitcher.finish())
}

/// Evenly spread `count` words over a segment with known bounds.
fn interpolate(
    start: Option<f32>,
    end: Option<f32>,
    i: usize,
    count: usize,
) -> (Option<f32>, Option<f32>) {
    match (start, end) {
        (Some(start), Some(end)) if count > 0 => {
            let step = (end - start) / count as f32;
            let word_end = if i + 1 == count {
                end
            } else {
                start + step * (i + 1) as f32
            };
            (Some(start + step * i as f32), Some(word_end))
        }
        _ => (None, None),
    }
}

/// Running lower bound keeping output times non-decreasing.
#[derive(Default)]
struct Clock {
    floor: Option<f32>,
}

impl Clock {
    fn clamp(&mut self, start: Option<f32>, end: Option<f32>) -> (Option<f32>, Option<f32>) {
        let start = match (start, self.floor) {
            (Some(start), Some(floor)) => Some(start.max(floor)),
            (start, _) => start,
        };

        let end = match (end, start.or(self.floor)) {
            (Some(end), Some(lower)) => Some(end.max(lower)),
            (end, _) => end,
        };

        if let Some(time) = end.or(start) {
            self.floor = Some(self.floor.map_or(time, |floor| floor.max(time)));
        }

        (start, end)
    }
}

fn assemble(config: &StitchConfig, spans: Vec<Span>) -> Transcript {
    match config.return_timestamps {
        ReturnTimestamps::None if !config.return_language => {
            Transcript::Text(spans.into_iter().map(|s| s.text).collect())
        }
        ReturnTimestamps::None => Transcript::Chunks(language_runs(spans)),
        mode => {
            let mut segments = Clock::default();
            let mut words = Clock::default();

            let chunks = spans
                .into_iter()
                .map(|span| {
                    let (start, end) = segments.clamp(span.start, span.end);

                    let span_words = (mode == ReturnTimestamps::Word).then(|| {
                        span.words
                            .into_iter()
                            .map(|word| {
                                let (start, end) = words.clamp(word.start, word.end);
                                word.with_times(start, end)
                            })
                            .collect()
                    });

                    TranscriptChunk {
                        text: span.text,
                        timestamp: Some((start, end)),
                        language: span.language.filter(|_| config.return_language),
                        words: span_words,
                    }
                })
                .collect();

            Transcript::Chunks(chunks)
        }
    }
}

/// Merge consecutive spans that share a language.
fn language_runs(spans: Vec<Span>) -> Vec<TranscriptChunk> {
    let mut runs: Vec<TranscriptChunk> = Vec::new();

    for span in spans {
        match runs.last_mut() {
            Some(run) if run.language == span.language => run.text.push_str(&span.text),
            _ => runs.push(TranscriptChunk {
                text: span.text,
                language: span.language,
                ..Default::default()
            }),
        }
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{AlignConfig, stitch_sequences};
    use crate::chunk::Stride;
    use crate::vocab::ByteVocab;

    const TS: TokenId = 200;
    const EN: TokenId = 150;
    const ZH: TokenId = 151;

    fn specials() -> SpecialTokens {
        SpecialTokens::new(100, TS - 1, TS)
            .with_language(EN, Language::from_code("en").unwrap())
            .with_language(ZH, Language::from_code("zh").unwrap())
    }

    fn vocab() -> ByteVocab {
        ByteVocab::new()
            .with(1, "Hello")
            .with(2, " world")
            .with(3, ",")
            .with(4, " again")
            .with(10, "你")
            .with(11, "好")
    }

    fn ts(secs: f32) -> TokenId {
        TS + (secs / 0.02).round() as TokenId
    }

    fn close(time: Option<f32>, expected: f32) -> bool {
        time.is_some_and(|t| (t - expected).abs() < 0.001)
    }

    fn config(mode: ReturnTimestamps) -> StitchConfig {
        StitchConfig::default().with_timestamps(mode)
    }

    #[test]
    fn single_chunk_plain_text() {
        let (vocab, specials) = (vocab(), specials());
        let chunk = Chunk::new(vec![ts(0.0), 1, 2, ts(1.0)]);

        let transcript = stitch([chunk], &vocab, &specials, StitchConfig::default()).unwrap();

        assert_eq!(transcript, Transcript::Text("Hello world".into()));
    }

    #[test]
    fn cuts_duplicated_head() {
        let (vocab, specials) = (vocab(), specials());
        let chunks = [
            Chunk::new(vec![ts(0.0), 1, ts(1.0)]).with_stride(Stride::new(3, 0, 1)),
            Chunk::new(vec![1, ts(1.0), 2, ts(2.0)]).with_stride(Stride::new(4, 1, 0)),
        ];

        let transcript =
            stitch(&chunks, &vocab, &specials, config(ReturnTimestamps::Chunk)).unwrap();

        match transcript.chunks() {
            [hello, world] => {
                assert_eq!(hello.text, "Hello");
                assert_eq!(world.text, " world");
                let (start, end) = world.timestamp.unwrap();
                assert!(close(start, 1.0) && close(end, 2.0));
            }
            other => panic!("unexpected chunks: {other:?}"),
        }
    }

    #[test]
    fn tail_rolls_over_a_short_middle_chunk() {
        let (vocab, specials) = (vocab(), specials());
        let chunks = [
            (vec![1, 2, 3], Stride::new(3, 0, 3)),
            (vec![2, 3, 4], Stride::new(3, 2, 3)),
            (vec![3, 4, 1], Stride::new(3, 2, 0)),
        ];

        let mut stitcher = Stitcher::new(&vocab, &specials, StitchConfig::default()).unwrap();
        for (tokens, stride) in &chunks {
            stitcher
                .push(&Chunk::new(tokens.clone()).with_stride(*stride))
                .unwrap();
        }

        let folded = stitch_sequences(chunks, &AlignConfig::default());

        assert_eq!(folded, [1, 2, 3, 4, 1]);
        assert_eq!(stitcher.finish().text(), "Hello world, againHello");
    }

    #[test]
    fn offsets_make_times_absolute() {
        let (vocab, specials) = (vocab(), specials());
        let chunk = Chunk::new(vec![ts(0.0), 1, ts(1.0)]).with_offset(30.0);

        let transcript =
            stitch([chunk], &vocab, &specials, config(ReturnTimestamps::Chunk)).unwrap();

        let (start, end) = transcript.chunks()[0].timestamp.unwrap();
        assert!(close(start, 30.0) && close(end, 31.0));
    }

    #[test]
    fn interpolates_word_times_without_token_timestamps() {
        let (vocab, specials) = (vocab(), specials());
        let chunk = Chunk::new(vec![ts(0.0), 1, 2, ts(2.0)]);

        let transcript =
            stitch([chunk], &vocab, &specials, config(ReturnTimestamps::Word)).unwrap();
        let words: Vec<_> = transcript.words().collect();

        match &words[..] {
            [hello, world] => {
                assert!(close(hello.start, 0.0) && close(hello.end, 1.0));
                assert!(close(world.start, 1.0) && close(world.end, 2.0));
            }
            _ => panic!("unexpected words: {words:?}"),
        }
    }

    #[test]
    fn uses_token_timestamps_for_words() {
        let (vocab, specials) = (vocab(), specials());
        let chunk = Chunk::new(vec![ts(0.0), 1, 3, 2, ts(2.0)])
            .with_token_timestamps(vec![0.0, 0.1, 0.5, 0.7, 1.6]);

        let transcript =
            stitch([chunk], &vocab, &specials, config(ReturnTimestamps::Word)).unwrap();
        let words: Vec<_> = transcript.words().collect();

        match &words[..] {
            [hello, world] => {
                assert_eq!(hello.text, "Hello,");
                assert_eq!(hello.tokens, [1, 3]);
                assert!(close(hello.start, 0.1) && close(hello.end, 0.7));
                assert_eq!(world.text, " world");
                assert!(close(world.start, 0.7) && close(world.end, 1.6));
            }
            _ => panic!("unexpected words: {words:?}"),
        }
    }

    #[test]
    fn segments_unspaced_language_per_character() {
        let (vocab, specials) = (vocab(), specials());
        let chunk = Chunk::new(vec![ZH, ts(0.0), 10, 11, ts(1.0)]);

        let transcript =
            stitch([chunk], &vocab, &specials, config(ReturnTimestamps::Word)).unwrap();
        let words: Vec<_> = transcript.words().map(|w| w.text.as_str()).collect();

        assert_eq!(words, ["你", "好"]);
    }

    #[test]
    fn groups_text_by_language() {
        let (vocab, specials) = (vocab(), specials());
        let chunks = [
            Chunk::new(vec![EN, 1]),
            Chunk::new(vec![2]),
            Chunk::new(vec![ZH, 10, 11]),
        ];
        let config = StitchConfig::default().with_return_language(true);

        let transcript = stitch(&chunks, &vocab, &specials, config).unwrap();

        match transcript.chunks() {
            [english, chinese] => {
                assert_eq!(english.text, "Hello world");
                assert_eq!(english.language.map(Language::code), Some("en"));
                assert_eq!(chinese.text, "你好");
                assert_eq!(chinese.language.map(Language::code), Some("zh"));
            }
            other => panic!("unexpected chunks: {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_configured_language() {
        let (vocab, specials) = (vocab(), specials());
        let config = config(ReturnTimestamps::Word)
            .with_language("chinese")
            .with_return_language(true);

        let chunk = Chunk::new(vec![ts(0.0), 10, 11, ts(1.0)]);

        let transcript = stitch([chunk], &vocab, &specials, config).unwrap();

        assert_eq!(transcript.words().count(), 2);
        assert!(
            transcript
                .words()
                .all(|w| w.language.map(Language::code) == Some("zh"))
        );
    }

    #[test]
    fn unknown_language_uses_whitespace() {
        let (vocab, specials) = (vocab(), specials());
        let config = config(ReturnTimestamps::Word).with_language("klingon");

        let chunk = Chunk::new(vec![ts(0.0), 10, 11, ts(1.0)]);

        let transcript = stitch([chunk], &vocab, &specials, config).unwrap();

        assert_eq!(transcript.words().count(), 1);
    }

    #[test]
    fn clamps_overlapping_times() {
        let (vocab, specials) = (vocab(), specials());
        let chunks = [
            Chunk::new(vec![ts(0.0), 1, ts(2.0)]),
            Chunk::new(vec![ts(0.0), 2, ts(1.0)]).with_offset(1.5),
        ];

        let transcript =
            stitch(&chunks, &vocab, &specials, config(ReturnTimestamps::Chunk)).unwrap();
        let (start, end) = transcript.chunks()[1].timestamp.unwrap();

        assert!(close(start, 2.0));
        assert!(close(end, 2.5));
    }

    #[test]
    fn rejected_chunk_leaves_state_untouched() {
        let (vocab, specials) = (vocab(), specials());
        let mut stitcher = Stitcher::new(&vocab, &specials, StitchConfig::default()).unwrap();

        stitcher.push(&Chunk::new(vec![1])).unwrap();
        let bad = Chunk::new(vec![2]).with_stride(Stride::new(1, 2, 0));

        assert!(stitcher.push(&bad).is_err());
        assert_eq!(stitcher.chunks(), 1);
        assert_eq!(stitcher.snapshot().text(), "Hello");
    }

    #[test]
    fn interpolation_needs_both_bounds() {
        assert_eq!(interpolate(Some(0.0), None, 0, 2), (None, None));
        assert_eq!(interpolate(Some(1.0), Some(2.0), 0, 0), (None, None));

        let (start, end) = interpolate(Some(1.0), Some(2.0), 1, 2);
        assert!(close(start, 1.5) && close(end, 2.0));
    }
}
