//! Per-user quiz session state
//!
//! A session holds at most one active question. It moves between phases only
//! through named events (`Submit`, `AdvanceRequested`) and through
//! [`QuizSession::apply_synthesis`], which the engine calls after a provider
//! round trip.

use serde::Serialize;
use thiserror::Error;

use crate::llm::{QuestionRecord, SynthesisError};

/// Where a session is in the question/answer cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Fresh session, nothing attempted yet
    Uninitialized,
    /// A new question is needed (first attempt failed, or the user asked for the next one)
    AwaitingQuestion,
    /// A question is shown and no answer has been submitted
    AwaitingAnswer,
    /// The current question has been answered
    Answered,
}

/// Result of scoring one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AnswerOutcome {
    Correct { choice: u8 },
    /// Carries the passage the question was built from, shown as the rationale
    Incorrect { choice: u8, explanation: String },
}

impl AnswerOutcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerOutcome::Correct { .. })
    }

    pub fn choice(&self) -> u8 {
        match self {
            AnswerOutcome::Correct { choice } | AnswerOutcome::Incorrect { choice, .. } => *choice,
        }
    }

    /// Rationale to reveal; only present for incorrect answers
    pub fn explanation(&self) -> Option<&str> {
        match self {
            AnswerOutcome::Correct { .. } => None,
            AnswerOutcome::Incorrect { explanation, .. } => Some(explanation),
        }
    }
}

/// User-driven events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Submit the 1-based choice index
    Submit(u8),
    /// Ask for the next question
    AdvanceRequested,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No question is available to answer")]
    NoActiveQuestion,

    #[error("Choice {0} is not one of 1-4")]
    InvalidChoice(u8),
}

/// State owned by one interactive session
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    explanation: String,
    question: Option<QuestionRecord>,
    advance_requested: bool,
    outcome: Option<AnswerOutcome>,
    last_error: Option<String>,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        match (&self.question, &self.outcome) {
            (None, _) if self.last_error.is_none() => Phase::Uninitialized,
            (None, _) => Phase::AwaitingQuestion,
            (Some(_), _) if self.advance_requested => Phase::AwaitingQuestion,
            (Some(_), None) => Phase::AwaitingAnswer,
            (Some(_), Some(_)) => Phase::Answered,
        }
    }

    /// True when the next refresh must run a synthesis attempt
    pub fn needs_question(&self) -> bool {
        self.question.is_none() || self.advance_requested
    }

    pub fn question(&self) -> Option<&QuestionRecord> {
        self.question.as_ref()
    }

    /// Passage the current question was built from
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn advance_requested(&self) -> bool {
        self.advance_requested
    }

    pub fn outcome(&self) -> Option<&AnswerOutcome> {
        self.outcome.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Apply a user event and return the resulting phase
    pub fn handle(&mut self, event: SessionEvent) -> Result<Phase, SessionError> {
        match event {
            SessionEvent::Submit(choice) => {
                self.submit(choice)?;
            }
            SessionEvent::AdvanceRequested => self.request_advance(),
        }
        Ok(self.phase())
    }

    /// Score a 1-based choice against the answer key
    ///
    /// Submitting again after an answer re-scores the new choice.
    pub fn submit(&mut self, choice: u8) -> Result<&AnswerOutcome, SessionError> {
        let question = match &self.question {
            Some(question) if !self.advance_requested => question,
            _ => return Err(SessionError::NoActiveQuestion),
        };
        if question.choice(choice).is_none() {
            return Err(SessionError::InvalidChoice(choice));
        }

        let outcome = if question.is_correct(choice) {
            AnswerOutcome::Correct { choice }
        } else {
            AnswerOutcome::Incorrect {
                choice,
                explanation: self.explanation.clone(),
            }
        };
        tracing::debug!(choice, correct = outcome.is_correct(), "Answer submitted");
        Ok(self.outcome.insert(outcome))
    }

    /// Mark the session so the next refresh synthesizes a fresh question
    pub fn request_advance(&mut self) {
        self.advance_requested = true;
        self.outcome = None;
    }

    /// Promote a synthesis result into the session
    ///
    /// On success the record and its explanation replace the previous ones and
    /// the advance flag clears. On failure nothing but the error message
    /// changes, and the error is handed back to the caller.
    pub fn apply_synthesis(
        &mut self,
        explanation: String,
        result: Result<QuestionRecord, SynthesisError>,
    ) -> Result<(), SynthesisError> {
        match result {
            Ok(record) => {
                self.explanation = explanation;
                self.question = Some(record);
                self.advance_requested = false;
                self.outcome = None;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Remember a failure that happened before a synthesis could start
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capitals() -> QuestionRecord {
        QuestionRecord {
            question: "What is the capital of France?".into(),
            choice1: "Paris".into(),
            choice2: "Rome".into(),
            choice3: "Berlin".into(),
            choice4: "Madrid".into(),
            correct_answer: 1,
        }
    }

    fn answering_session() -> QuizSession {
        let mut session = QuizSession::new();
        session
            .apply_synthesis("Paris is the capital of France.".into(), Ok(capitals()))
            .unwrap();
        session
    }

    #[test]
    fn test_new_session_is_uninitialized() {
        let session = QuizSession::new();
        assert_eq!(session.phase(), Phase::Uninitialized);
        assert!(session.needs_question());
        assert!(session.question().is_none());
    }

    #[test]
    fn test_successful_synthesis_awaits_answer() {
        let session = answering_session();
        assert_eq!(session.phase(), Phase::AwaitingAnswer);
        assert!(!session.needs_question());
        assert_eq!(session.explanation(), "Paris is the capital of France.");
    }

    #[test]
    fn test_correct_choice_hides_explanation() {
        let mut session = answering_session();
        let outcome = session.submit(1).unwrap().clone();
        assert_eq!(outcome, AnswerOutcome::Correct { choice: 1 });
        assert_eq!(outcome.explanation(), None);
        assert_eq!(session.phase(), Phase::Answered);
    }

    #[test]
    fn test_incorrect_choice_reveals_explanation_verbatim() {
        let mut session = answering_session();
        let outcome = session.submit(3).unwrap();
        assert!(!outcome.is_correct());
        assert_eq!(outcome.explanation(), Some("Paris is the capital of France."));
    }

    #[test]
    fn test_resubmit_rescores() {
        let mut session = answering_session();
        session.submit(2).unwrap();
        let outcome = session.submit(1).unwrap();
        assert!(outcome.is_correct());
    }

    #[test]
    fn test_invalid_choice_rejected() {
        let mut session = answering_session();
        assert_eq!(session.submit(0), Err(SessionError::InvalidChoice(0)));
        assert_eq!(session.submit(5), Err(SessionError::InvalidChoice(5)));
        assert!(session.outcome().is_none());
    }

    #[test]
    fn test_submit_without_question_rejected() {
        let mut session = QuizSession::new();
        assert_eq!(session.submit(1), Err(SessionError::NoActiveQuestion));
    }

    #[test]
    fn test_advance_requires_new_question() {
        let mut session = answering_session();
        session.submit(3).unwrap();
        let phase = session.handle(SessionEvent::AdvanceRequested).unwrap();
        assert_eq!(phase, Phase::AwaitingQuestion);
        assert!(session.needs_question());
        assert!(session.outcome().is_none());
        // The old question is still visible but cannot be answered
        assert!(session.question().is_some());
        assert_eq!(session.submit(1), Err(SessionError::NoActiveQuestion));
    }

    #[test]
    fn test_failed_synthesis_leaves_state_untouched() {
        let mut session = answering_session();
        session.request_advance();
        let err = session
            .apply_synthesis("Other passage".into(), Err(SynthesisError::NoJsonFound))
            .unwrap_err();
        assert_eq!(err, SynthesisError::NoJsonFound);
        assert_eq!(session.question(), Some(&capitals()));
        assert_eq!(session.explanation(), "Paris is the capital of France.");
        assert!(session.advance_requested());
        assert!(session.last_error().is_some());
    }

    #[test]
    fn test_first_synthesis_failure_awaits_question() {
        let mut session = QuizSession::new();
        let _ = session.apply_synthesis(
            "passage".into(),
            Err(SynthesisError::SchemaMismatch("missing field Choice2".into())),
        );
        assert_eq!(session.phase(), Phase::AwaitingQuestion);
        assert!(session.question().is_none());
    }

    #[test]
    fn test_success_clears_previous_error() {
        let mut session = QuizSession::new();
        let _ = session.apply_synthesis("p".into(), Err(SynthesisError::NoJsonFound));
        session.apply_synthesis("p".into(), Ok(capitals())).unwrap();
        assert!(session.last_error().is_none());
        assert_eq!(session.phase(), Phase::AwaitingAnswer);
    }
}
