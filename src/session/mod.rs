//! Quiz session state machine
//!
//! | Module   | Purpose |
//! |----------|---------|
//! | `state`  | `QuizSession`, phases, events and answer scoring |
//! | `engine` | Passage selection and synthesis against a session |
//! | `view`   | Pure projection of a session for rendering |

pub mod engine;
pub mod state;
pub mod view;

pub use engine::QuizEngine;
pub use state::{AnswerOutcome, Phase, QuizSession, SessionError, SessionEvent};
pub use view::{ChoiceView, OutcomeView, SessionView};
