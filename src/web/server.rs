//! # HTTP Server
//!
//! Serves the quiz page and JSON API on one listener.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::core::config::QuizConfig;
use crate::core::error::{QuizError, Result};
use crate::llm::Completion;
use crate::session::QuizEngine;
use crate::web::routes::{quiz_routes, AppState};

/// HTTP server for the quiz
pub struct QuizServer {
    bind_addr: String,
    router: Router,
}

impl QuizServer {
    /// Build the server around an engine, taking title, prompt and address from config
    pub fn new<C: Completion + 'static>(engine: QuizEngine<C>, config: &QuizConfig) -> Self {
        let state = Arc::new(AppState::new(engine, &config.title, &config.prompt));
        Self {
            bind_addr: config.bind_addr.clone(),
            router: Self::build_router(state),
        }
    }

    fn build_router<C: Completion + 'static>(state: Arc<AppState<C>>) -> Router {
        quiz_routes(state).layer(TraceLayer::new_for_http())
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> &str {
        &self.bind_addr
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self.bind_addr.parse().map_err(|e| {
            QuizError::Config(format!("Invalid bind address {:?}: {}", self.bind_addr, e))
        })?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Quiz available at http://{}", addr);
        tracing::info!("JSON API: http://{}/api/question", addr);

        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use crate::llm::{LlmClient, Synthesizer};

    fn engine() -> QuizEngine<LlmClient> {
        let client = LlmClient::new(None, "http://127.0.0.1:9".into(), "test".into());
        QuizEngine::new(Arc::new(Corpus::new(vec!["p".into()])), Synthesizer::new(client))
    }

    #[test]
    fn test_server_creation() {
        let server = QuizServer::new(engine(), &QuizConfig::default());
        assert_eq!(server.socket_addr(), "127.0.0.1:8501");
    }

    #[test]
    fn test_server_with_custom_addr() {
        let config = QuizConfig {
            bind_addr: "0.0.0.0:8080".into(),
            ..QuizConfig::default()
        };
        let server = QuizServer::new(engine(), &config);
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_invalid_bind_addr_is_config_error() {
        let config = QuizConfig {
            bind_addr: "not an address".into(),
            ..QuizConfig::default()
        };
        let result = QuizServer::new(engine(), &config).start().await;
        assert!(matches!(result, Err(QuizError::Config(_))));
    }
}
