//! Question synthesis through a hosted LLM
//!
//! `client` talks to the provider; `parser` owns the question schema, the
//! JSON extraction and the validation contract.

pub mod client;
pub mod parser;

pub use client::{ApiFormat, Completion, LlmClient, ResponseSchema};
pub use parser::{extract_json, parse_question, question_schema, QuestionRecord, SynthesisError, Synthesizer};
