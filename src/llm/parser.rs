//! Turn provider replies into validated quiz questions
//!
//! The provider is asked for a strict JSON object, but replies are still
//! treated as free text: the first `{ ... }` span is cut out of the reply and
//! only that span is parsed. A record is handed back only when every required
//! field is present and the answer key points at one of the four choices.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::llm::client::{Completion, ResponseSchema};

/// Why a synthesis attempt produced no question
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SynthesisError {
    /// The reply contained no `{ ... }` span
    #[error("No JSON object found in the response")]
    NoJsonFound,
    /// A span was found but it is not a valid question record
    #[error("Response does not match the question schema: {0}")]
    SchemaMismatch(String),
    /// The provider call itself failed (network, auth, quota, empty reply)
    #[error("Provider request failed: {0}")]
    Provider(String),
}

/// A four-choice question with its answer key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(rename = "Question")]
    pub question: String,
    #[serde(rename = "Choice1")]
    pub choice1: String,
    #[serde(rename = "Choice2")]
    pub choice2: String,
    #[serde(rename = "Choice3")]
    pub choice3: String,
    #[serde(rename = "Choice4")]
    pub choice4: String,
    /// 1-based index of the correct choice
    #[serde(rename = "CorrectAnswer")]
    pub correct_answer: u8,
}

impl QuestionRecord {
    pub fn choices(&self) -> [&str; 4] {
        [&self.choice1, &self.choice2, &self.choice3, &self.choice4]
    }

    /// Choice text by 1-based index
    pub fn choice(&self, index: u8) -> Option<&str> {
        match index {
            1..=4 => Some(self.choices()[usize::from(index) - 1]),
            _ => None,
        }
    }

    pub fn is_correct(&self, index: u8) -> bool {
        index == self.correct_answer
    }

    /// Validate a parsed JSON value against the question schema
    pub fn from_json_value(value: &Value) -> Result<Self, SynthesisError> {
        let object = value
            .as_object()
            .ok_or_else(|| SynthesisError::SchemaMismatch("expected a JSON object".into()))?;

        Ok(Self {
            question: text_field(object, "Question")?,
            choice1: text_field(object, "Choice1")?,
            choice2: text_field(object, "Choice2")?,
            choice3: text_field(object, "Choice3")?,
            choice4: text_field(object, "Choice4")?,
            correct_answer: answer_field(object)?,
        })
    }
}

fn text_field(object: &Map<String, Value>, field: &str) -> Result<String, SynthesisError> {
    match object.get(field) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(SynthesisError::SchemaMismatch(format!(
            "field {} is not a string",
            field
        ))),
        None => Err(SynthesisError::SchemaMismatch(format!(
            "missing field {}",
            field
        ))),
    }
}

fn answer_field(object: &Map<String, Value>) -> Result<u8, SynthesisError> {
    let value = object
        .get("CorrectAnswer")
        .ok_or_else(|| SynthesisError::SchemaMismatch("missing field CorrectAnswer".into()))?;

    let number = value
        .as_f64()
        .ok_or_else(|| SynthesisError::SchemaMismatch("CorrectAnswer is not numeric".into()))?;

    // Schemas declare the key as "number", so 2.0 is an acceptable spelling of 2
    if number.fract() != 0.0 || !(1.0..=4.0).contains(&number) {
        return Err(SynthesisError::SchemaMismatch(format!(
            "CorrectAnswer {} does not reference one of the four choices",
            value
        )));
    }
    Ok(number as u8)
}

/// Extract the JSON object span from a reply (handles surrounding text)
///
/// The span runs from the first `{` to the last `}` anywhere in the reply,
/// across line breaks.
pub fn extract_json(response: &str) -> Result<&str, SynthesisError> {
    let start = response.find('{').ok_or(SynthesisError::NoJsonFound)?;
    let end = response.rfind('}').ok_or(SynthesisError::NoJsonFound)?;
    if end < start {
        return Err(SynthesisError::NoJsonFound);
    }
    Ok(&response[start..=end])
}

/// Extract, parse and validate a question from a raw reply
pub fn parse_question(response: &str) -> Result<QuestionRecord, SynthesisError> {
    let json_str = extract_json(response)?;
    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| SynthesisError::SchemaMismatch(format!("invalid JSON: {}", e)))?;
    QuestionRecord::from_json_value(&value)
}

/// Schema sent with every request: six required fields, nothing else
pub fn question_schema() -> ResponseSchema {
    ResponseSchema {
        name: "QuestionData".into(),
        schema: json!({
            "type": "object",
            "properties": {
                "Question": {"type": "string"},
                "Choice1": {"type": "string"},
                "Choice2": {"type": "string"},
                "Choice3": {"type": "string"},
                "Choice4": {"type": "string"},
                "CorrectAnswer": {"type": "number"}
            },
            "required": ["Question", "Choice1", "Choice2", "Choice3", "Choice4", "CorrectAnswer"],
            "additionalProperties": false
        }),
    }
}

/// Generates one question per explanation through a [`Completion`] provider
pub struct Synthesizer<C> {
    completion: C,
    schema: ResponseSchema,
}

impl<C: Completion> Synthesizer<C> {
    pub fn new(completion: C) -> Self {
        Self {
            completion,
            schema: question_schema(),
        }
    }

    pub fn completion(&self) -> &C {
        &self.completion
    }

    /// Ask the provider for a question grounded in `explanation`
    ///
    /// Exactly one request is made; failures are returned, never retried.
    pub async fn synthesize(&self, explanation: &str) -> Result<QuestionRecord, SynthesisError> {
        let response = self
            .completion
            .complete(QUIZ_SYSTEM_PROMPT, explanation, &self.schema)
            .await?;

        parse_question(&response).map_err(|e| {
            tracing::warn!(error = %e, response = %response, "Unusable question reply");
            e
        })
    }
}

/// System prompt for question synthesis
const QUIZ_SYSTEM_PROMPT: &str = "You are a quiz master. Create one four-choice question from the \
passage below. The question and every choice must be grounded in the content of the passage. \
Return the output as JSON.";
