//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use passage_quiz::llm::{Completion, ResponseSchema, SynthesisError};

/// Provider stand-in that replays queued replies and records every request
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, SynthesisError>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn fail(self, err: SynthesisError) -> Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    /// User contents sent so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Completion for ScriptedCompletion {
    async fn complete(
        &self,
        _system: &str,
        user: &str,
        _schema: &ResponseSchema,
    ) -> Result<String, SynthesisError> {
        self.requests.lock().unwrap().push(user.to_string());
        // Once the script runs out, echo a valid question about the passage
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(question_json(&format!("About: {}", user), 1)))
    }
}

pub fn question_json(question: &str, correct: u8) -> String {
    serde_json::json!({
        "Question": question,
        "Choice1": "Paris",
        "Choice2": "Rome",
        "Choice3": "Berlin",
        "Choice4": "Madrid",
        "CorrectAnswer": correct,
    })
    .to_string()
}
