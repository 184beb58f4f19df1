//! Async LLM client for question synthesis
//!
//! This is a model-agnostic HTTP client for calling LLM APIs.
//! Supports both Anthropic and OpenAI-compatible APIs. OpenAI-compatible
//! endpoints get the response schema as a strict `json_schema` response
//! format; Anthropic gets it appended to the system prompt.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

use crate::core::config::LlmConfig;
use crate::llm::parser::SynthesisError;

/// API format type
#[derive(Debug, Clone, PartialEq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

/// A named JSON schema the reply has to follow
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

/// One round trip to a text-generation provider
///
/// Implemented by [`LlmClient`] for real traffic; tests implement it with
/// canned replies.
pub trait Completion: Send + Sync {
    fn complete(
        &self,
        system: &str,
        user: &str,
        schema: &ResponseSchema,
    ) -> impl Future<Output = Result<String, SynthesisError>> + Send;
}

/// Async LLM client for making API calls
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
    temperature: f32,
    api_format: ApiFormat,
}

impl LlmClient {
    /// Create a new LLM client with explicit configuration
    ///
    /// A client without a key can be constructed; every call then fails.
    pub fn new(api_key: Option<String>, api_url: String, model: String) -> Self {
        let api_format = Self::detect_api_format(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            temperature: 0.0,
            api_format,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            ApiFormat::OpenAI
        }
    }

    /// Create a client from configuration, reading the key from `config.api_key_env`
    pub fn from_config(config: &LlmConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(
                var = %config.api_key_env,
                "API key not set - every question request will fail"
            );
        }
        Self::new(api_key, config.api_url.clone(), config.model.clone())
            .with_temperature(config.temperature)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn api_format(&self) -> &ApiFormat {
        &self.api_format
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete_anthropic(
        &self,
        api_key: &str,
        system: &str,
        user: &str,
        schema: &ResponseSchema,
    ) -> Result<String, SynthesisError> {
        let schema_text = serde_json::to_string_pretty(&schema.schema)
            .map_err(|e| SynthesisError::Provider(e.to_string()))?;
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: 1024,
            temperature: self.temperature,
            system: format!(
                "{}\n\nRespond with a single JSON object that follows this schema ({}):\n{}",
                system, schema.name, schema_text
            ),
            messages: vec![Message {
                role: "user".into(),
                content: user.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| SynthesisError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Provider(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::Provider(e.to_string()))?;

        completion
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| SynthesisError::Provider("Empty response".into()))
    }

    async fn complete_openai(
        &self,
        api_key: &str,
        system: &str,
        user: &str,
        schema: &ResponseSchema,
    ) -> Result<String, SynthesisError> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: schema.name.clone(),
                    schema: schema.schema.clone(),
                    strict: true,
                },
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| SynthesisError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Provider(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let completion: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::Provider(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SynthesisError::Provider("Empty response".into()))
    }
}

impl Completion for LlmClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        schema: &ResponseSchema,
    ) -> Result<String, SynthesisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SynthesisError::Provider("API key not set".into()))?;

        match self.api_format {
            ApiFormat::Anthropic => self.complete_anthropic(api_key, system, user, schema).await,
            ApiFormat::OpenAI => self.complete_openai(api_key, system, user, schema).await,
        }
    }
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    temperature: f32,
    messages: Vec<Message>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: Value,
    strict: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = LlmClient::new(
            Some("test-key".into()),
            "https://api.example.com".into(),
            "test-model".into(),
        );
        assert_eq!(client.api_key.as_deref(), Some("test-key"));
        assert_eq!(client.api_url, "https://api.example.com");
        assert_eq!(client.model(), "test-model");
        assert_eq!(client.temperature, 0.0);
        assert_eq!(client.api_format(), &ApiFormat::OpenAI);
    }

    #[test]
    fn test_anthropic_format_detected() {
        let client = LlmClient::new(
            None,
            "https://api.anthropic.com/v1/messages".into(),
            "claude-3-haiku-20240307".into(),
        );
        assert_eq!(client.api_format(), &ApiFormat::Anthropic);
    }

    #[test]
    fn test_from_config_missing_key() {
        let config = LlmConfig {
            api_key_env: "PASSAGE_QUIZ_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..LlmConfig::default()
        };
        let client = LlmClient::from_config(&config);
        assert!(!client.has_api_key());
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = LlmClient::new(None, "http://127.0.0.1:9".into(), "m".into());
        let schema = ResponseSchema {
            name: "QuestionData".into(),
            schema: json!({"type": "object"}),
        };
        let result = client.complete("system", "user", &schema).await;
        assert!(matches!(result, Err(SynthesisError::Provider(msg)) if msg.contains("API key")));
    }

    #[test]
    fn test_openai_request_carries_strict_schema() {
        let request = OpenAIRequest {
            model: "gpt-4.1".into(),
            temperature: 0.0,
            messages: vec![],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: "QuestionData".into(),
                    schema: json!({"type": "object"}),
                    strict: true,
                },
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["temperature"], json!(0.0));
        assert_eq!(value["response_format"]["type"], "json_schema");
        assert_eq!(value["response_format"]["json_schema"]["strict"], true);
    }

    #[test]
    fn test_openai_null_content_deserializes() {
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        let parsed: OpenAIResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
