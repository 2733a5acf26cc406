//! Stitch a JSON file of decoded Whisper chunks into one transcript.
//!
//! ```text
//! RUST_LOG=melops_stitch=debug cargo run --example stitch -- chunks.json --return-timestamps word
//! ```
//!
//! The input is a JSON array of chunks:
//!
//! ```text
//! [{"tokens": [50364, 2425, 50414], "stride": {"length": 3, "left": 0, "right": 1}},
//!  {"tokens": [2425, 1002, 50464], "stride": {"length": 3, "left": 1, "right": 0}, "offset": 28.0}]
//! ```

use clap::Parser;
use eyre::{Context, Result, eyre};
use hf_hub::api::sync::Api;
use melops_stitch::chunk::Chunk;
use melops_stitch::config::StitchConfig;
use melops_stitch::stitch;
use melops_stitch::vocab::SpecialTokens;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;
use tracing_subscriber::EnvFilter;

const MODEL_ID: &str = "openai/whisper-tiny";

#[derive(Parser, Debug)]
#[command(name = "stitch")]
#[command(about = "Stitch overlapping Whisper chunk decodes into one transcript")]
struct Args {
    /// Path to a JSON array of decoded chunks
    path: PathBuf,

    /// Local tokenizer.json (default: download from --model)
    #[arg(short, long)]
    tokenizer: Option<PathBuf>,

    /// Hugging Face model to fetch the tokenizer from
    #[arg(short, long, default_value = MODEL_ID)]
    model: String,

    #[command(flatten)]
    config: StitchConfig,
}

fn load_tokenizer(args: &Args) -> Result<Tokenizer> {
    let path = match &args.tokenizer {
        Some(path) => path.clone(),
        None => Api::new()?
            .model(args.model.clone())
            .get("tokenizer.json")
            .wrap_err_with(|| format!("failed to fetch tokenizer for {}", args.model))?,
    };

    tracing::info!(path = ?path.display(), "load tokenizer");

    Tokenizer::from_file(&path).map_err(|e| eyre!("failed to load {:?}: {e}", path.display()))
}

fn read_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let json = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read chunks: {:?}", path.display()))?;

    serde_json::from_str(&json).wrap_err("invalid chunk json")
}

fn main() -> Result<()> {
    let (non_blocking, _guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let tokenizer = load_tokenizer(&args)?;
    let specials = SpecialTokens::from_tokenizer(&tokenizer)?;
    let chunks = read_chunks(&args.path)?;

    tracing::info!(chunks = chunks.len(), "stitching");

    let transcript = stitch(&chunks, &tokenizer, &specials, args.config)?;

    println!("{}", serde_json::to_string_pretty(&transcript)?);

    Ok(())
}
