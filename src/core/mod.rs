pub mod config;
pub mod error;

pub use config::{LlmConfig, QuizConfig};
pub use error::{QuizError, Result};
