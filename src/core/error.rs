use thiserror::Error;

use crate::corpus::CorpusError;
use crate::llm::SynthesisError;
use crate::session::SessionError;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Corpus is empty, nothing to ask about")]
    EmptyCorpus,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QuizError>;
