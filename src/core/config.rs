//! Service configuration loaded from TOML
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration. Environment variables override the provider
//! settings after the file is read.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{QuizError, Result};

/// Provider settings for question synthesis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Chat endpoint; the wire format is picked from this URL
    pub api_url: String,
    /// Model name sent with every request
    pub model: String,
    /// Sampling temperature (0.0 asks the provider for greedy decoding)
    pub temperature: f32,
    /// Name of the environment variable that holds the API key
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4.1".to_string(),
            temperature: 0.0,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Page title shown above every question
    pub title: String,
    /// Line shown between the title and the question
    pub prompt: String,
    /// CSV file holding one explanation per row (first column)
    pub corpus_path: PathBuf,
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Provider settings
    pub llm: LlmConfig,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            title: "Passage Quiz".to_string(),
            prompt: "Answer the following question:".to_string(),
            corpus_path: PathBuf::from("Book1.csv"),
            bind_addr: "127.0.0.1:8501".to_string(),
            llm: LlmConfig::default(),
        }
    }
}

impl QuizConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| QuizError::Config(format!("Failed to parse config TOML: {}", e)))
    }

    /// Load a configuration file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            QuizError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply `LLM_API_URL` / `LLM_MODEL` overrides from the environment
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("LLM_API_URL") {
            self.llm.api_url = url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.llm.model = model;
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_url.trim().is_empty() {
            return Err(QuizError::Config("llm.api_url must not be empty".into()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(QuizError::Config("llm.model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(QuizError::Config(format!(
                "llm.temperature ({}) must be within 0.0..=2.0",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = QuizConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = QuizConfig::from_toml_str("").unwrap();
        assert_eq!(config.corpus_path, PathBuf::from("Book1.csv"));
        assert_eq!(config.llm.model, "gpt-4.1");
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml_str = r#"
            title = "History drill"
            corpus_path = "data/passages.csv"

            [llm]
            model = "gpt-4o-mini"
        "#;
        let config = QuizConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.title, "History drill");
        assert_eq!(config.corpus_path, PathBuf::from("data/passages.csv"));
        assert_eq!(config.llm.model, "gpt-4o-mini");
        // Untouched fields keep their defaults
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.bind_addr, "127.0.0.1:8501");
    }

    #[test]
    fn test_invalid_temperature_rejected() {
        let mut config = QuizConfig::default();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = QuizConfig::from_toml_str("title = [");
        assert!(matches!(result, Err(QuizError::Config(_))));
    }
}
