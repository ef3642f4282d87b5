//! Command line CTC decoder.
//!
//! Reads a JSON decode request (symbol table plus emission matrix), optionally
//! builds a character bigram model from a corpus, and prints the decoded text.
//!
//! ```bash
//! ctc-decode --input request.json
//! ctc-decode --input request.json --corpus corpus.txt --beam-width 50 --nbest 5
//! ctc-decode --input request.json --greedy
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use ctc_beam_decoder::{
    config::DecoderConfig,
    decoder::{best_path, BeamSearchDecoder},
    input::DecodeRequest,
    lm::CharBigramModel,
    observability::{init_tracing, LoggingConfig},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON decode request with `symbols` and `matrix`.
    #[arg(long)]
    input: PathBuf,

    /// Text corpus for the character bigram language model.
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// TOML or YAML configuration file. Defaults to ctc_decoder.{toml,yaml} if present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the beam width.
    #[arg(long)]
    beam_width: Option<usize>,

    /// Override the language model damping exponent.
    #[arg(long)]
    lm_damping: Option<f64>,

    /// Worker threads for expanding each timestep.
    #[arg(long)]
    threads: Option<usize>,

    /// Print the N best hypotheses with scores.
    #[arg(long)]
    nbest: Option<usize>,

    /// Use best-path decoding instead of beam search.
    #[arg(long)]
    greedy: bool,

    /// Log level (overridden by RUST_LOG).
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

fn load_config(args: &Args) -> Result<DecoderConfig> {
    let mut config = match &args.config {
        Some(path) => DecoderConfig::load_from(path)?,
        None => DecoderConfig::load()?,
    };
    if let Some(width) = args.beam_width {
        config.beam_width = width;
    }
    if let Some(damping) = args.lm_damping {
        config.lm_damping = damping;
    }
    if let Some(threads) = args.threads {
        config.worker_threads = threads;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(LoggingConfig {
        log_level: args.log_level.clone(),
        json: args.json_logs,
        thread_ids: args.threads.is_some_and(|n| n > 1),
    })
    .map_err(anyhow::Error::msg)
    .context("initializing tracing")?;

    let input = DecodeRequest::load_from_file(&args.input)?.into_input()?;
    info!(
        timesteps = input.matrix.timesteps(),
        symbols = input.symbols.len(),
        "Loaded emission matrix from {:?}",
        args.input
    );

    if args.greedy {
        println!("{}", best_path(&input.matrix, &input.symbols)?);
        return Ok(());
    }

    let config = load_config(&args)?;
    let mut decoder = BeamSearchDecoder::new(&config)?;

    if let Some(corpus) = &args.corpus {
        let model = CharBigramModel::from_file(corpus, &input.symbols, config.lm_context)
            .with_context(|| format!("loading corpus {:?}", corpus))?;
        info!("Loaded character bigram model from {:?}", corpus);
        decoder = decoder.with_language_model(Arc::new(model));
    }

    match args.nbest {
        Some(n) => {
            for hypothesis in decoder.decode_nbest(&input.matrix, &input.symbols, n)? {
                println!("{:.6}\t{}", hypothesis.score, hypothesis.text);
            }
        }
        None => println!("{}", decoder.decode(&input.matrix, &input.symbols)?),
    }

    Ok(())
}
