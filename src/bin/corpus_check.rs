//! Corpus check
//!
//! Loads a corpus file (or stdin) and reports every decoding step: byte
//! count, stripped null bytes, rejected and accepted encodings, and the
//! parsed explanations. No LLM calls are made.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use passage_quiz::corpus::{CorpusLoader, CorpusSource, DecodePolicy, DecodeReport};

/// Corpus check - verify CSV decoding and parsing
#[derive(Parser, Debug)]
#[command(name = "corpus_check")]
#[command(about = "Decode and parse a passage CSV and report what happened")]
struct Args {
    /// CSV file to inspect; `-` reads from stdin
    #[arg(default_value = "Book1.csv")]
    path: String,

    /// Also try Latin-1 before falling back to lossy UTF-8
    #[arg(long)]
    strict: bool,

    /// Number of explanations to print
    #[arg(long, default_value_t = 5)]
    limit: usize,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

/// JSON output structure
#[derive(Serialize)]
struct CheckResult<'a> {
    source: &'a str,
    report: &'a DecodeReport,
    rows: usize,
    sample: &'a [String],
}

fn read_source(path: &str) -> std::io::Result<CorpusSource> {
    if path == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        Ok(CorpusSource::Bytes(bytes))
    } else {
        Ok(CorpusSource::Path(PathBuf::from(path)))
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::DEBUG.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let policy = if args.strict {
        DecodePolicy::Strict
    } else {
        DecodePolicy::Standard
    };

    let source = match read_source(&args.path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: cannot read stdin: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (corpus, report) = match CorpusLoader::with_policy(policy).load_with_report(source) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let sample_len = args.limit.min(corpus.len());
    let sample = &corpus.as_slice()[..sample_len];

    if args.format == "json" {
        let result = CheckResult {
            source: &args.path,
            report: &report,
            rows: corpus.len(),
            sample,
        };
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("Source:          {}", args.path);
    println!("Policy:          {:?}", policy);
    println!("Bytes read:      {}", report.byte_len);
    println!("Null bytes:      {} stripped", report.nulls_stripped);
    for rejected in &report.rejected {
        println!("Rejected:        {}", rejected);
    }
    println!("Decoded as:      {}", report.encoding);
    if report.used_lossy_fallback() {
        println!("Warning:         undecodable bytes were replaced with U+FFFD");
    }
    println!("Rows:            {}", corpus.len());
    println!();
    for (index, explanation) in sample.iter().enumerate() {
        println!("[{}] {}", index, explanation);
    }
    if corpus.len() > sample_len {
        println!("... {} more", corpus.len() - sample_len);
    }

    ExitCode::SUCCESS
}
