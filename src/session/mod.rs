//! Session state module
//!
//! Holds cookie and credential material for one client instance.
//!
//! # Overview
//!
//! The session module provides:
//! - `Session` - Cookie set plus session id, CSRF token and user agent
//! - `SessionManager` - Shared handle that ingests `Set-Cookie` headers and
//!   produces outgoing request headers
//! - `SessionStore` - Save/load of the opaque session blob

mod manager;
mod store;
mod types;

pub use manager::SessionManager;
pub use store::{cache_key, FileSessionStore, MemorySessionStore, SessionStore};
pub use types::{parse_cookie_header, parse_set_cookie, SetCookie, Session};
