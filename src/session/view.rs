//! Read-only projection of a session for rendering
//!
//! Built fresh on every request; never carries the answer key.

use serde::Serialize;

use crate::session::state::{Phase, QuizSession};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceView {
    /// 1-based index submitted back by the client
    pub index: u8,
    /// Display label, e.g. "2. Rome"
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeView {
    pub correct: bool,
    pub choice: u8,
    /// Passage shown as rationale after an incorrect answer
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub title: String,
    pub prompt: String,
    pub phase: Phase,
    pub question: Option<String>,
    pub choices: Vec<ChoiceView>,
    /// False while a replacement question is pending
    pub can_answer: bool,
    pub outcome: Option<OutcomeView>,
    pub error: Option<String>,
}

impl SessionView {
    pub fn render(session: &QuizSession, title: &str, prompt: &str) -> Self {
        let phase = session.phase();
        let (question, choices) = match session.question() {
            Some(record) => (
                Some(record.question.clone()),
                record
                    .choices()
                    .iter()
                    .zip(1u8..)
                    .map(|(text, index)| ChoiceView {
                        index,
                        label: format!("{}. {}", index, text),
                    })
                    .collect(),
            ),
            None => (None, Vec::new()),
        };

        Self {
            title: title.to_string(),
            prompt: prompt.to_string(),
            phase,
            question,
            choices,
            can_answer: matches!(phase, Phase::AwaitingAnswer | Phase::Answered),
            outcome: session.outcome().map(|outcome| OutcomeView {
                correct: outcome.is_correct(),
                choice: outcome.choice(),
                explanation: outcome.explanation().map(str::to_string),
            }),
            error: session.last_error().map(str::to_string),
        }
    }
}
