//! Load explanation passages from CSV files
//!
//! This module provides `CorpusLoader`, which turns a CSV resource (a path on
//! disk or an uploaded byte buffer) into a `Corpus`: the first field of every
//! non-empty row, in file order.

use rand::Rng;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::corpus::decode::{decode, DecodePolicy, DecodeReport};

/// Errors that can occur when loading a corpus
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The source file could not be read
    #[error("Cannot read corpus file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// CSV record parsing failed
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
}

/// Where corpus bytes come from
#[derive(Debug, Clone)]
pub enum CorpusSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for CorpusSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for CorpusSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for CorpusSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for CorpusSource {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

/// Ordered, read-only collection of explanation passages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    explanations: Vec<String>,
}

impl Corpus {
    pub fn new(explanations: Vec<String>) -> Self {
        Self { explanations }
    }

    pub fn len(&self) -> usize {
        self.explanations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.explanations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.explanations.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.explanations
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.explanations.iter().map(String::as_str)
    }

    /// Pick one explanation uniformly at random
    ///
    /// Returns the chosen index alongside the text; `None` for an empty corpus.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(usize, &str)> {
        let index = select_index(self.len(), rng)?;
        self.get(index).map(|text| (index, text))
    }
}

impl From<Vec<String>> for Corpus {
    fn from(explanations: Vec<String>) -> Self {
        Self::new(explanations)
    }
}

/// Uniform index over `[0, len - 1]`, or `None` when `len == 0`
pub fn select_index<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(rng.gen_range(0..len))
    }
}

/// Split decoded text into records and keep the first field of each non-empty row
pub fn parse_explanations(text: &str) -> Result<Vec<String>, CorpusError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut explanations = Vec::new();
    for result in reader.records() {
        let record = result?;
        let is_blank = record.is_empty() || (record.len() == 1 && record[0].is_empty());
        if is_blank {
            continue;
        }
        explanations.push(record[0].to_string());
    }
    Ok(explanations)
}

/// Loader that reads, decodes and parses corpus resources
#[derive(Debug, Clone, Copy, Default)]
pub struct CorpusLoader {
    policy: DecodePolicy,
}

impl CorpusLoader {
    /// Loader with the standard UTF-8 → CP932 ladder
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader that also tries Latin-1 before the lossy fallback
    pub fn strict() -> Self {
        Self::with_policy(DecodePolicy::Strict)
    }

    pub fn with_policy(policy: DecodePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    /// Load a corpus from a path or a byte buffer
    pub fn load(&self, source: impl Into<CorpusSource>) -> Result<Corpus, CorpusError> {
        self.load_with_report(source).map(|(corpus, _)| corpus)
    }

    /// Load a corpus and return what the decoding ladder did
    pub fn load_with_report(
        &self,
        source: impl Into<CorpusSource>,
    ) -> Result<(Corpus, DecodeReport), CorpusError> {
        let bytes = match source.into() {
            CorpusSource::Path(path) => {
                std::fs::read(&path).map_err(|source| CorpusError::Io { path, source })?
            }
            CorpusSource::Bytes(bytes) => bytes,
        };

        let (text, report) = decode(&bytes, self.policy);
        if report.used_lossy_fallback() {
            tracing::warn!(
                bytes = report.byte_len,
                "No candidate encoding accepted the corpus; decoded with replacement characters"
            );
        }

        let explanations = parse_explanations(&text)?;
        tracing::info!(
            encoding = %report.encoding,
            nulls_stripped = report.nulls_stripped,
            rows = explanations.len(),
            "Corpus loaded"
        );

        Ok((Corpus::new(explanations), report))
    }
}

/// Load a corpus with the standard decoding ladder
pub fn load(source: impl Into<CorpusSource>) -> Result<Corpus, CorpusError> {
    CorpusLoader::new().load(source)
}
