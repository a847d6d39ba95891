//! Session manager implementation
//!
//! Shared, lock-protected session handle. Cloning the manager clones the
//! handle, not the session.

use super::store::{cache_key, SessionStore};
use super::types::{parse_set_cookie, Session};
use crate::error::{Error, Result};
use crate::types::{header_values, StringMap};
use rand::RngCore as _;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Shared session handle
#[derive(Debug, Clone)]
pub struct SessionManager {
    /// Current session
    session: Arc<RwLock<Session>>,
    /// Value of the `referer` header
    referer: String,
}

impl SessionManager {
    /// Create a manager with an empty session
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self::with_session(base_url, Session::new())
    }

    /// Create a manager around an existing session
    pub fn with_session(base_url: impl AsRef<str>, session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            referer: format!("{}/", base_url.as_ref().trim_end_matches('/')),
        }
    }

    /// Ingest response headers into the session
    ///
    /// Only bootstraps: once the session holds cookies it is left untouched
    /// and `false` is returned.
    pub async fn ingest(&self, headers: &[(String, String)]) -> bool {
        let mut session = self.session.write().await;
        if session.has_cookies() {
            return false;
        }

        let parsed: Vec<_> = header_values(headers, "set-cookie")
            .filter_map(parse_set_cookie)
            .collect();
        if parsed.is_empty() {
            return false;
        }

        debug!("Bootstrapping session from {} cookie(s)", parsed.len());
        session.merge_cookies(parsed);
        true
    }

    /// Headers for the next outgoing request
    ///
    /// Keys in `extra` override the generated ones.
    pub async fn headers(&self, extra: &StringMap) -> StringMap {
        let session = self.session.read().await;

        let mut headers = StringMap::new();
        headers.insert("cookie".to_string(), session.cookie_header());
        headers.insert("referer".to_string(), self.referer.clone());
        headers.insert(
            "x-csrftoken".to_string(),
            session
                .csrf_token
                .clone()
                .unwrap_or_else(generate_csrf_token),
        );
        if let Some(agent) = &session.user_agent {
            headers.insert("user-agent".to_string(), agent.clone());
        }

        for (key, value) in extra {
            headers.insert(key.clone(), value.clone());
        }
        headers
    }

    /// Replace the session with previously obtained credentials
    pub async fn restore(&self, session_id: &str, csrf_token: &str, cookie_header: &str) {
        let mut session = self.session.write().await;
        let user_agent = session.user_agent.take();
        *session = Session::with_credentials(session_id, csrf_token, cookie_header);
        session.user_agent = user_agent;
    }

    /// Replace the whole session value
    pub async fn replace(&self, replacement: Session) {
        *self.session.write().await = replacement;
    }

    /// Copy of the current session
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Set the user agent for subsequent requests
    pub async fn set_user_agent(&self, user_agent: impl Into<String>) {
        self.session.write().await.user_agent = Some(user_agent.into());
    }

    /// Stop sending a user agent
    pub async fn reset_user_agent(&self) {
        self.session.write().await.user_agent = None;
    }

    /// Current session id, if any
    pub async fn session_id(&self) -> Option<String> {
        self.session.read().await.session_id.clone()
    }

    /// Persist the session blob under the hash of its session id
    pub async fn save_to(&self, store: &dyn SessionStore) -> Result<String> {
        let session = self.snapshot().await;
        let id = session
            .session_id
            .as_deref()
            .ok_or_else(|| Error::session("Cannot save a session without a session id"))?;
        let key = cache_key(id);
        store.save(&key, &session.to_blob()?).await?;
        debug!("Saved session under key {key}");
        Ok(key)
    }

    /// Load a session saved for `session_id`
    ///
    /// Returns `false` when nothing was stored for it.
    pub async fn load_from(&self, store: &dyn SessionStore, session_id: &str) -> Result<bool> {
        let key = cache_key(session_id);
        match store.load(&key).await? {
            Some(blob) => {
                self.replace(Session::from_blob(&blob)?).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Random 32-character hex token
fn generate_csrf_token() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
