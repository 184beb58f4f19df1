//! Passage Quiz - Entry Point
//!
//! Loads configuration and the passage corpus, wires the LLM client into the
//! quiz engine, and serves the quiz over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::runtime::Runtime;

use passage_quiz::core::{QuizConfig, Result};
use passage_quiz::corpus::CorpusLoader;
use passage_quiz::llm::{LlmClient, Synthesizer};
use passage_quiz::session::QuizEngine;
use passage_quiz::web::QuizServer;

/// Quiz server that builds four-choice questions from CSV passages
#[derive(Parser, Debug)]
#[command(name = "passage-quiz")]
#[command(about = "Serve an LLM-generated four-choice quiz over passages from a CSV file")]
struct Args {
    /// TOML configuration file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// CSV corpus (overrides corpus_path from the config)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8501
    #[arg(long)]
    bind: Option<String>,

    /// Seed for passage selection, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(args: &Args) -> Result<QuizConfig> {
    let mut config = match &args.config {
        Some(path) => QuizConfig::load(path)?,
        None => QuizConfig::default(),
    };
    config.apply_env();
    if let Some(corpus) = &args.corpus {
        config.corpus_path = corpus.clone();
    }
    if let Some(bind) = &args.bind {
        config.bind_addr = bind.clone();
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // A missing .env file is fine; the key may come from the real environment
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("passage_quiz=info,tower_http=info")),
        )
        .init();

    let config = load_config(&args)?;
    tracing::info!(corpus = ?config.corpus_path, model = %config.llm.model, "Passage Quiz starting...");

    let corpus = match CorpusLoader::new().load(config.corpus_path.as_path()) {
        Ok(corpus) => corpus,
        Err(e) => {
            tracing::error!(error = %e, "Cannot load the passage corpus");
            return Err(e.into());
        }
    };
    if corpus.is_empty() {
        tracing::warn!("Corpus has no rows - every question request will fail");
    }

    let client = LlmClient::from_config(&config.llm);
    let synthesizer = Synthesizer::new(client);
    let corpus = Arc::new(corpus);
    let engine = match args.seed {
        Some(seed) => QuizEngine::with_seed(corpus, synthesizer, seed),
        None => QuizEngine::new(corpus, synthesizer),
    };

    let rt = Runtime::new()?;
    rt.block_on(QuizServer::new(engine, &config).start())
}
