// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # edgewalk
//!
//! Cursor-paginated collection client for GraphQL-style social feeds.
//!
//! ## Features
//!
//! - **One Walk Loop**: Followers, media feeds, comments, likes and inbox
//!   threads all run through the same pagination engine
//! - **Partial Results**: Interrupted walks keep what they gathered plus a
//!   resume cursor
//! - **Session Cookies**: `Set-Cookie` bootstrap with secure-cookie precedence,
//!   CSRF header generation and save/load through a pluggable store
//! - **Pacing**: Randomized inter-page delay, per-walk time limit,
//!   cancellation token and a token-bucket request ceiling
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use edgewalk::{Client, ClientConfig, Cursor, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::with_credentials(
//!         ClientConfig::default(),
//!         "session-id",
//!         "csrf-token",
//!         "sessionid=session-id; csrftoken=csrf-token",
//!     )?;
//!
//!     // First 100 followers, 50 per request, with browser-like pauses
//!     let followers = client.get_followers("42", 100, 50, true).await?;
//!
//!     // Resumable walk over a hashtag feed
//!     let page = client.get_paginate_medias_by_tag("rust", Cursor::start()).await?;
//!     println!("{} of {:?}", page.items.len(), page.count);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            Client                               │
//! │  get_followers  get_medias_by_tag  get_threads  save_session ...│
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │ Session  │ Transport │  Pagination   │ Classify  │  Endpoints  │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Cookies  │ reqwest   │ Walk loop     │ 404       │ GraphQL     │
//! │ CSRF     │ Retry     │ Page shapes   │ non-200   │ Explore     │
//! │ Store    │ Rate Limit│ Dedup/cutoff  │ status ok │ Inbox       │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP transport with retry and rate limiting
pub mod http;

/// Session cookies, headers and persistence
pub mod session;

/// Response outcome classification
pub mod classify;

/// Inter-page delay and walk budget
pub mod pacing;

/// Cursor pagination engine
pub mod pagination;

/// Domain models and mapper
pub mod models;

/// Resource URLs and payload shapes
pub mod endpoints;

/// Client configuration
pub mod config;

/// Client facade
pub mod client;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result, ResultExt};
pub use types::*;

// Re-export commonly used types
pub use client::Client;
pub use config::ClientConfig;
pub use endpoints::Resource;
pub use models::{Account, Comment, Media, Thread};
pub use pagination::{
    AccumulatedResult, AvailablePage, CollectionRequest, Cursor, PageInfo, PagedCollection,
    PaginationEngine,
};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
