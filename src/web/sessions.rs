//! Cookie-scoped session registry
//!
//! Every browser gets its own `QuizSession`, looked up by the UUID stored in
//! the `quiz_session` cookie. Each session sits behind its own async mutex so
//! a slow provider call only blocks the session that made it.

use axum::http::{header::COOKIE, HeaderMap};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::session::QuizSession;

pub const SESSION_COOKIE: &str = "quiz_session";

/// Default cap on live sessions before old ones are evicted
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

pub type SessionHandle = Arc<Mutex<QuizSession>>;

/// A session resolved for one request
pub struct SessionLease {
    pub id: Uuid,
    pub session: SessionHandle,
    /// True when the request carried no usable cookie and a session was created
    pub created: bool,
}

impl SessionLease {
    /// `Set-Cookie` value to send when the session is new
    pub fn set_cookie(&self) -> Option<String> {
        self.created.then(|| {
            format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                SESSION_COOKIE, self.id
            )
        })
    }
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Find the caller's session from request headers, creating one if needed
    pub fn resolve(&self, headers: &HeaderMap) -> SessionLease {
        if let Some(id) = session_id_from_headers(headers) {
            if let Some(session) = self.get(&id) {
                return SessionLease {
                    id,
                    session,
                    created: false,
                };
            }
        }
        let (id, session) = self.create();
        SessionLease {
            id,
            session,
            created: true,
        }
    }

    /// Start a new, empty session
    pub fn create(&self) -> (Uuid, SessionHandle) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(QuizSession::new()));

        let mut map = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if map.len() >= self.max_sessions {
            if let Some(evicted) = map.keys().next().copied() {
                map.remove(&evicted);
                tracing::debug!(%evicted, "Session registry full, evicted a session");
            }
        }
        map.insert(id, session.clone());
        tracing::debug!(%id, live = map.len(), "Session created");
        (id, session)
    }

    /// Drop a session; returns whether it existed
    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }
}

/// Read the session id from any `Cookie` header
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE).then_some(value)
        })
        .find_map(|value| Uuid::parse_str(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_cookie_parsing_among_others() {
        let id = Uuid::new_v4();
        let headers = headers_with_cookie(&format!("theme=dark; {}={}; lang=ja", SESSION_COOKIE, id));
        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn test_garbage_cookie_ignored() {
        let headers = headers_with_cookie("quiz_session=not-a-uuid");
        assert_eq!(session_id_from_headers(&headers), None);
    }

    #[test]
    fn test_resolve_creates_then_reuses() {
        let registry = SessionRegistry::default();
        let first = registry.resolve(&HeaderMap::new());
        assert!(first.created);
        assert!(first.set_cookie().unwrap().starts_with("quiz_session="));

        let headers = headers_with_cookie(&format!("{}={}", SESSION_COOKIE, first.id));
        let second = registry.resolve(&headers);
        assert!(!second.created);
        assert_eq!(second.id, first.id);
        assert!(Arc::ptr_eq(&first.session, &second.session));
        assert!(second.set_cookie().is_none());
    }

    #[test]
    fn test_unknown_id_gets_fresh_session() {
        let registry = SessionRegistry::default();
        let headers = headers_with_cookie(&format!("{}={}", SESSION_COOKIE, Uuid::new_v4()));
        let lease = registry.resolve(&headers);
        assert!(lease.created);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_caps_live_sessions() {
        let registry = SessionRegistry::new(2);
        for _ in 0..5 {
            registry.create();
        }
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove_session() {
        let registry = SessionRegistry::default();
        let (id, _) = registry.create();
        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(registry.is_empty());
    }
}
