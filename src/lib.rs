//! Passage Quiz - four-choice questions generated from CSV passages
//!
//! A corpus of explanation passages is loaded once at startup. For every
//! round a passage is picked at random, an LLM turns it into a four-choice
//! question, and the user's answer is scored against the model's key. Wrong
//! answers reveal the passage as the explanation.

pub mod core;
pub mod corpus;
pub mod llm;
pub mod session;
pub mod web;

pub use crate::core::{QuizConfig, QuizError, Result};
pub use corpus::{Corpus, CorpusLoader};
pub use llm::{LlmClient, QuestionRecord, Synthesizer};
pub use session::{QuizEngine, QuizSession};
