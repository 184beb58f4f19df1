//! Drives sessions through question synthesis
//!
//! The engine owns everything sessions share: the read-only corpus, the
//! synthesizer and the random source used to pick passages.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, PoisonError};

use crate::core::error::{QuizError, Result};
use crate::corpus::Corpus;
use crate::llm::{Completion, Synthesizer};
use crate::session::state::{Phase, QuizSession, SessionEvent};

pub struct QuizEngine<C> {
    corpus: Arc<Corpus>,
    synthesizer: Synthesizer<C>,
    rng: Mutex<StdRng>,
}

impl<C: Completion> QuizEngine<C> {
    pub fn new(corpus: Arc<Corpus>, synthesizer: Synthesizer<C>) -> Self {
        Self::with_rng(corpus, synthesizer, StdRng::from_entropy())
    }

    /// Engine with a reproducible passage order
    pub fn with_seed(corpus: Arc<Corpus>, synthesizer: Synthesizer<C>, seed: u64) -> Self {
        Self::with_rng(corpus, synthesizer, StdRng::seed_from_u64(seed))
    }

    fn with_rng(corpus: Arc<Corpus>, synthesizer: Synthesizer<C>, rng: StdRng) -> Self {
        Self {
            corpus,
            synthesizer,
            rng: Mutex::new(rng),
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn synthesizer(&self) -> &Synthesizer<C> {
        &self.synthesizer
    }

    fn pick(&self) -> Option<(usize, String)> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.corpus
            .pick(&mut *rng)
            .map(|(index, text)| (index, text.to_string()))
    }

    /// Pick a passage and run one synthesis attempt for `session`
    ///
    /// Always makes a fresh provider request, even if the same passage comes
    /// up again. On failure the session keeps its previous question.
    pub async fn next_question(&self, session: &mut QuizSession) -> Result<()> {
        let Some((index, explanation)) = self.pick() else {
            session.record_error(QuizError::EmptyCorpus.to_string());
            return Err(QuizError::EmptyCorpus);
        };
        tracing::debug!(index, corpus_len = self.corpus.len(), "Selected explanation");

        let result = self.synthesizer.synthesize(&explanation).await;
        if let Err(e) = &result {
            tracing::warn!(index, error = %e, "Question synthesis failed");
        }
        session.apply_synthesis(explanation, result)?;
        Ok(())
    }

    /// Synthesize a question only if the session needs one
    ///
    /// Returns whether a synthesis attempt succeeded.
    pub async fn refresh(&self, session: &mut QuizSession) -> Result<bool> {
        if !session.needs_question() {
            return Ok(false);
        }
        self.next_question(session).await?;
        Ok(true)
    }

    /// Apply a user event, then refresh if the event asked for a new question
    pub async fn handle(&self, session: &mut QuizSession, event: SessionEvent) -> Result<Phase> {
        session.handle(event)?;
        if event == SessionEvent::AdvanceRequested {
            self.refresh(session).await?;
        }
        Ok(session.phase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ResponseSchema, SynthesisError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        reply: Option<String>,
    }

    impl Completion for Counting {
        async fn complete(
            &self,
            _system: &str,
            user: &str,
            _schema: &ResponseSchema,
        ) -> std::result::Result<String, SynthesisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.clone().unwrap_or_else(|| {
                format!(
                    r#"{{"Question":"About {}","Choice1":"a","Choice2":"b","Choice3":"c","Choice4":"d","CorrectAnswer":1}}"#,
                    user
                )
            });
            Ok(reply)
        }
    }

    fn engine(explanations: &[&str], reply: Option<&str>) -> QuizEngine<Counting> {
        let corpus = Corpus::new(explanations.iter().map(|s| s.to_string()).collect());
        let synth = Synthesizer::new(Counting {
            calls: AtomicUsize::new(0),
            reply: reply.map(str::to_string),
        });
        QuizEngine::with_seed(Arc::new(corpus), synth, 11)
    }

    fn calls(engine: &QuizEngine<Counting>) -> usize {
        engine.synthesizer().completion().calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_refresh_synthesizes_once() {
        let engine = engine(&["only passage"], None);
        let mut session = QuizSession::new();

        assert!(engine.refresh(&mut session).await.unwrap());
        assert!(!engine.refresh(&mut session).await.unwrap());
        assert_eq!(calls(&engine), 1);
        assert_eq!(session.explanation(), "only passage");
        assert_eq!(session.question().unwrap().question, "About only passage");
    }

    #[tokio::test]
    async fn test_advance_always_calls_provider_again() {
        let engine = engine(&["only passage"], None);
        let mut session = QuizSession::new();
        engine.refresh(&mut session).await.unwrap();

        let phase = engine
            .handle(&mut session, SessionEvent::AdvanceRequested)
            .await
            .unwrap();
        assert_eq!(phase, Phase::AwaitingAnswer);
        assert_eq!(calls(&engine), 2);
        assert_eq!(session.explanation(), "only passage");
    }

    #[tokio::test]
    async fn test_empty_corpus_reported() {
        let engine = engine(&[], None);
        let mut session = QuizSession::new();
        let err = engine.refresh(&mut session).await.unwrap_err();
        assert!(matches!(err, QuizError::EmptyCorpus));
        assert_eq!(calls(&engine), 0);
        assert!(session.last_error().is_some());
    }

    #[tokio::test]
    async fn test_unusable_reply_keeps_session() {
        let engine = engine(&["p"], Some("no json here"));
        let mut session = QuizSession::new();
        let err = engine.refresh(&mut session).await.unwrap_err();
        assert!(matches!(
            err,
            QuizError::Synthesis(SynthesisError::NoJsonFound)
        ));
        assert!(session.question().is_none());
        assert_eq!(session.phase(), Phase::AwaitingQuestion);
    }

    #[tokio::test]
    async fn test_submit_through_engine() {
        let engine = engine(&["p"], None);
        let mut session = QuizSession::new();
        engine.refresh(&mut session).await.unwrap();
        let phase = engine
            .handle(&mut session, SessionEvent::Submit(1))
            .await
            .unwrap();
        assert_eq!(phase, Phase::Answered);
        assert_eq!(calls(&engine), 1);
    }
}
