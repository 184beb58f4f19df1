//! Corpus loading - CSV passages to an ordered list of explanations
//!
//! Bytes go through a null-byte strip and a decoding ladder (see `decode`)
//! before CSV parsing (see `loader`).

pub mod decode;
pub mod loader;

pub use decode::{DecodePolicy, DecodeReport, TextEncoding};
pub use loader::{load, select_index, Corpus, CorpusError, CorpusLoader, CorpusSource};
