//! Caller configuration for transcript stitching.

use crate::align::AlignConfig;
use crate::error::ConfigError;
use crate::punctuation::Punctuation;
use crate::timestamps::{DEFAULT_TIME_PRECISION, Extraction};
use clap::ArgAction;
use serde::Deserialize;

/// Timing detail of the stitched transcript.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnTimestamps {
    /// Plain text
    #[default]
    None,
    /// Timestamped segments
    Chunk,
    /// Timestamped segments with their words
    Word,
}

/// Configuration for stitching decoded chunks into a transcript.
#[derive(clap::Args, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Timing detail of the output
    #[arg(long, value_enum, default_value_t = ReturnTimestamps::None)]
    pub return_timestamps: ReturnTimestamps,

    /// Tag output entries with the detected language
    #[arg(long)]
    pub return_language: bool,

    /// Seconds per timestamp token unit
    #[arg(long, default_value_t = DEFAULT_TIME_PRECISION)]
    pub time_precision: f32,

    /// Keep trailing segments that have no closing timestamp
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub force_full_sequences: bool,

    /// Language code or name used when a chunk carries no language token
    #[arg(long)]
    pub language: Option<String>,

    #[command(flatten)]
    pub align: AlignConfig,

    #[command(flatten)]
    pub punctuation: Punctuation,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            return_timestamps: ReturnTimestamps::None,
            return_language: false,
            time_precision: DEFAULT_TIME_PRECISION,
            force_full_sequences: true,
            language: None,
            align: AlignConfig::default(),
            punctuation: Punctuation::default(),
        }
    }
}

impl StitchConfig {
    pub fn with_timestamps(mut self, mode: ReturnTimestamps) -> Self {
        self.return_timestamps = mode;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_return_language(mut self, enabled: bool) -> Self {
        self.return_language = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.time_precision.is_finite() || self.time_precision <= 0.0 {
            return Err(ConfigError::InvalidTimePrecision(self.time_precision));
        }

        self.align.validate()
    }

    /// Timestamp extraction options implied by this configuration.
    pub fn extraction(&self) -> Extraction {
        Extraction {
            time_precision: self.time_precision,
            timestamps: self.return_timestamps != ReturnTimestamps::None,
            force_full_sequences: self.force_full_sequences,
        }
    }

    pub fn word_timestamps(&self) -> bool {
        self.return_timestamps == ReturnTimestamps::Word
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::punctuation::{DEFAULT_APPENDED, DEFAULT_PREPENDED};
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        config: StitchConfig,
    }

    #[test]
    fn parses_defaults() {
        let cli = TestCli::parse_from(["stitch"]);

        assert_eq!(cli.config, StitchConfig::default());
        assert!((cli.config.time_precision - 0.02).abs() < 0.001);
        assert!(cli.config.force_full_sequences);
        assert_eq!(cli.config.punctuation.prepended, DEFAULT_PREPENDED);
        assert_eq!(cli.config.punctuation.appended, DEFAULT_APPENDED);
    }

    #[test]
    fn parses_overrides() {
        let cli = TestCli::parse_from([
            "stitch",
            "--return-timestamps",
            "word",
            "--return-language",
            "--force-full-sequences",
            "false",
            "--language",
            "ja",
            "--min-match",
            "3",
            "--min-ratio",
            "0.5",
        ]);

        match cli.config {
            StitchConfig {
                return_timestamps: ReturnTimestamps::Word,
                return_language: true,
                force_full_sequences: false,
                language: Some(ref language),
                align: AlignConfig { min_match: 3, .. },
                ..
            } if language == "ja" => {
                assert!((cli.config.align.min_ratio - 0.5).abs() < 0.001);
            }
            _ => panic!("unexpected config: {:?}", cli.config),
        }
    }

    #[test]
    fn deserializes_partial_json() {
        let config: StitchConfig = serde_json::from_str(
            r#"{"return_timestamps":"chunk","align":{"min_match":2}}"#,
        )
        .unwrap();

        assert_eq!(config.return_timestamps, ReturnTimestamps::Chunk);
        assert_eq!(config.align.min_match, 2);
        assert_eq!(config.align.min_ratio, 0.0);
        assert!(config.force_full_sequences);
    }

    #[test]
    fn rejects_invalid_time_precision() {
        for precision in [0.0, -0.02, f32::INFINITY, f32::NAN] {
            let config = StitchConfig {
                time_precision: precision,
                ..Default::default()
            };

            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidTimePrecision(_))
            ));
        }
    }

    #[test]
    fn extraction_follows_output_mode() {
        let plain = StitchConfig::default().extraction();
        let timed = StitchConfig::default()
            .with_timestamps(ReturnTimestamps::Chunk)
            .extraction();

        assert!(!plain.timestamps);
        assert!(timed.timestamps);
        assert!(timed.force_full_sequences);
    }
}
