//! HTTP handlers for the quiz page and JSON API

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::core::error::QuizError;
use crate::llm::Completion;
use crate::session::{QuizEngine, QuizSession, SessionError, SessionEvent, SessionView};
use crate::web::page::render_page;
use crate::web::sessions::{session_id_from_headers, SessionLease, SessionRegistry, SESSION_COOKIE};

/// Everything the handlers share
pub struct AppState<C> {
    pub engine: QuizEngine<C>,
    pub sessions: SessionRegistry,
    pub title: String,
    pub prompt: String,
}

impl<C: Completion> AppState<C> {
    pub fn new(engine: QuizEngine<C>, title: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            engine,
            sessions: SessionRegistry::default(),
            title: title.into(),
            prompt: prompt.into(),
        }
    }

    fn view(&self, session: &QuizSession) -> SessionView {
        SessionView::render(session, &self.title, &self.prompt)
    }
}

pub type SharedState<C> = Arc<AppState<C>>;

/// Body of `POST /answer` (form) and `POST /api/answer` (JSON)
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub choice: u8,
}

/// Error body returned by the JSON API
pub struct ApiError(pub QuizError);

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        Self(err)
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self(QuizError::Session(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            QuizError::Session(SessionError::InvalidChoice(_)) => StatusCode::BAD_REQUEST,
            QuizError::Session(SessionError::NoActiveQuestion) => StatusCode::CONFLICT,
            QuizError::Synthesis(_) => StatusCode::BAD_GATEWAY,
            QuizError::EmptyCorpus => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Attach the session cookie to a response when the session was just created
fn with_cookie(lease: &SessionLease, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if let Some(cookie) = lease.set_cookie() {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    response
}

// ---------------------------------------------------------------------------
// HTML page
// ---------------------------------------------------------------------------

/// GET / - synthesize if needed, then render
async fn index<C: Completion + 'static>(
    State(state): State<SharedState<C>>,
    headers: HeaderMap,
) -> Response {
    let lease = state.sessions.resolve(&headers);
    let mut session = lease.session.lock().await;

    // Failures are stored on the session and rendered as a banner
    if let Err(e) = state.engine.refresh(&mut session).await {
        tracing::warn!(session = %lease.id, error = %e, "Could not prepare a question");
    }

    let html = render_page(&state.view(&session));
    drop(session);
    with_cookie(&lease, Html(html))
}

/// POST /answer - score the selected choice, then show the page again
async fn answer_form<C: Completion + 'static>(
    State(state): State<SharedState<C>>,
    headers: HeaderMap,
    Form(form): Form<AnswerRequest>,
) -> Response {
    let lease = state.sessions.resolve(&headers);
    {
        let mut session = lease.session.lock().await;
        if let Err(e) = session.handle(SessionEvent::Submit(form.choice)) {
            tracing::info!(session = %lease.id, error = %e, "Answer rejected");
        }
    }
    with_cookie(&lease, Redirect::to("/"))
}

/// POST /next - request a new question; the page load that follows synthesizes it
async fn next_form<C: Completion + 'static>(
    State(state): State<SharedState<C>>,
    headers: HeaderMap,
) -> Response {
    let lease = state.sessions.resolve(&headers);
    {
        let mut session = lease.session.lock().await;
        session.request_advance();
    }
    with_cookie(&lease, Redirect::to("/"))
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

/// GET /api/question
async fn api_question<C: Completion + 'static>(
    State(state): State<SharedState<C>>,
    headers: HeaderMap,
) -> Response {
    let lease = state.sessions.resolve(&headers);
    let mut session = lease.session.lock().await;
    let result = state
        .engine
        .refresh(&mut session)
        .await
        .map(|_| Json(state.view(&session)))
        .map_err(ApiError::from);
    drop(session);
    with_cookie(&lease, result)
}

/// POST /api/answer   body: { "choice": 1..=4 }
async fn api_answer<C: Completion + 'static>(
    State(state): State<SharedState<C>>,
    headers: HeaderMap,
    Json(body): Json<AnswerRequest>,
) -> Response {
    let lease = state.sessions.resolve(&headers);
    let mut session = lease.session.lock().await;
    let result = session
        .handle(SessionEvent::Submit(body.choice))
        .map(|_| Json(state.view(&session)))
        .map_err(ApiError::from);
    drop(session);
    with_cookie(&lease, result)
}

/// POST /api/next - request a new question and synthesize it right away
async fn api_next<C: Completion + 'static>(
    State(state): State<SharedState<C>>,
    headers: HeaderMap,
) -> Response {
    let lease = state.sessions.resolve(&headers);
    let mut session = lease.session.lock().await;
    let result = state
        .engine
        .handle(&mut session, SessionEvent::AdvanceRequested)
        .await
        .map(|_| Json(state.view(&session)))
        .map_err(ApiError::from);
    drop(session);
    with_cookie(&lease, result)
}

/// POST /api/session/end - forget the caller's session
async fn end_session<C: Completion + 'static>(
    State(state): State<SharedState<C>>,
    headers: HeaderMap,
) -> Response {
    if let Some(id) = session_id_from_headers(&headers) {
        if state.sessions.remove(&id) {
            tracing::debug!(%id, "Session ended");
        }
    }
    let expired = format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE);
    let mut response = StatusCode::NO_CONTENT.into_response();
    if let Ok(value) = HeaderValue::from_str(&expired) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

/// GET /health
async fn health<C: Completion + 'static>(State(state): State<SharedState<C>>) -> Response {
    Json(json!({
        "status": "ok",
        "corpus_size": state.engine.corpus().len(),
        "sessions": state.sessions.len(),
    }))
    .into_response()
}

pub fn quiz_routes<C: Completion + 'static>(state: SharedState<C>) -> Router {
    Router::new()
        .route("/", get(index::<C>))
        .route("/answer", post(answer_form::<C>))
        .route("/next", post(next_form::<C>))
        .route("/api/question", get(api_question::<C>))
        .route("/api/answer", post(api_answer::<C>))
        .route("/api/next", post(api_next::<C>))
        .route("/api/session/end", post(end_session::<C>))
        .route("/health", get(health::<C>))
        .with_state(state)
}
