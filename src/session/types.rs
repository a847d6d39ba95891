//! Session types
//!
//! The session value and the cookie parsing helpers it is built from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cookie name carrying the session identifier
pub const SESSION_ID_COOKIE: &str = "sessionid";

/// Cookie name carrying the CSRF token
pub const CSRF_TOKEN_COOKIE: &str = "csrftoken";

/// Authentication state threaded through every request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Cookie name to value
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    /// Session identifier (mirrors the `sessionid` cookie)
    #[serde(default)]
    pub session_id: Option<String>,
    /// CSRF token (mirrors the `csrftoken` cookie)
    #[serde(default)]
    pub csrf_token: Option<String>,
    /// User agent sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session from previously obtained credentials
    ///
    /// `cookie_header` uses the request `cookie` header form (`a=1; b=2`).
    pub fn with_credentials(
        session_id: impl Into<String>,
        csrf_token: impl Into<String>,
        cookie_header: &str,
    ) -> Self {
        Self {
            cookies: parse_cookie_header(cookie_header),
            session_id: Some(session_id.into()),
            csrf_token: Some(csrf_token.into()),
            user_agent: None,
        }
    }

    /// Set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Whether any cookies are held
    pub fn has_cookies(&self) -> bool {
        !self.cookies.is_empty()
    }

    /// Serialize the cookie set for the request `cookie` header
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Merge parsed `Set-Cookie` values, secure cookies winning per name
    pub fn merge_cookies(&mut self, parsed: impl IntoIterator<Item = SetCookie>) {
        let mut secure = BTreeMap::new();
        let mut plain = BTreeMap::new();
        for cookie in parsed {
            if cookie.secure {
                secure.insert(cookie.name, cookie.value);
            } else {
                plain.insert(cookie.name, cookie.value);
            }
        }

        for (name, value) in plain {
            if !secure.contains_key(&name) {
                self.cookies.insert(name, value);
            }
        }
        self.cookies.extend(secure);

        if let Some(id) = self.cookies.get(SESSION_ID_COOKIE) {
            self.session_id = Some(id.clone());
        }
        if let Some(token) = self.cookies.get(CSRF_TOKEN_COOKIE) {
            self.csrf_token = Some(token.clone());
        }
    }

    /// Encode the session as an opaque blob
    pub fn to_blob(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a blob produced by [`Session::to_blob`]
    pub fn from_blob(blob: &str) -> crate::Result<Self> {
        serde_json::from_str(blob)
            .map_err(|e| crate::Error::session(format!("Failed to decode session blob: {e}")))
    }
}

/// One parsed `Set-Cookie` header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    /// Cookie name
    pub name: String,
    /// Cookie value (attributes stripped)
    pub value: String,
    /// Whether the `Secure` attribute was present
    pub secure: bool,
}

/// Parse a single `Set-Cookie` header value
///
/// Returns `None` when the leading pair has no `=`.
pub fn parse_set_cookie(raw: &str) -> Option<SetCookie> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let secure = parts.any(|attr| attr.trim().eq_ignore_ascii_case("secure"));

    Some(SetCookie {
        name: name.to_string(),
        value: value.trim().to_string(),
        secure,
    })
}

/// Parse a request `cookie` header (`a=1; b=2`) into a cookie map
pub fn parse_cookie_header(header: &str) -> BTreeMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}
