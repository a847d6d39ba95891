//! Pagination types and traits
//!
//! Defines the core pagination abstractions shared by the engine, the
//! page shapes and the resource-specific collaborators.

use crate::error::{Error, Result};
use crate::http::RawResponse;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// Cursor
// ============================================================================

/// Opaque continuation token; empty means "from the beginning"
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// The start-of-collection cursor
    pub fn start() -> Self {
        Self::default()
    }

    /// Whether this is the start-of-collection cursor
    pub fn is_start(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<Option<String>> for Cursor {
    fn from(value: Option<String>) -> Self {
        Self(value.unwrap_or_default())
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Pages
// ============================================================================

/// Page descriptor returned with every page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Whether the server has more pages
    pub has_next_page: bool,
    /// Cursor for the next page (ignored when `has_next_page` is false)
    pub end_cursor: Option<String>,
    /// Server-reported size of the whole collection
    pub total_count: Option<u64>,
}

impl PageInfo {
    /// Descriptor for a final page
    pub fn last() -> Self {
        Self::default()
    }

    /// Descriptor pointing at a following page
    pub fn next(end_cursor: impl Into<String>) -> Self {
        Self {
            has_next_page: true,
            end_cursor: Some(end_cursor.into()),
            total_count: None,
        }
    }

    /// Set the reported total
    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total_count = Some(total);
        self
    }

    /// Cursor to follow, only when another page exists
    pub fn next_cursor(&self) -> Option<Cursor> {
        if self.has_next_page {
            self.end_cursor.clone().map(Cursor::from)
        } else {
            None
        }
    }
}

/// Undecoded nodes plus page descriptor, as read by a [`PageShape`]
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage {
    /// Raw JSON nodes in server order
    pub nodes: Vec<Value>,
    /// Page descriptor
    pub page_info: PageInfo,
}

/// One mapped page
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    /// Items in server order
    pub items: Vec<T>,
    /// Page descriptor
    pub page_info: PageInfo,
}

// ============================================================================
// Requests and Results
// ============================================================================

/// Caller request for a multi-page walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRequest {
    /// Number of items wanted
    pub count: usize,
    /// Items asked for per round-trip
    pub page_size: usize,
    /// Where to start
    pub start_cursor: Cursor,
    /// Pause between pages
    pub delayed: bool,
    /// Stop at the first item created before this instant (time-ordered feeds)
    pub min_timestamp: Option<DateTime<Utc>>,
    /// Reject `count < page_size`
    pub strict_page_size: bool,
    /// Fetch one page and ignore `has_next_page`
    pub single_page: bool,
}

impl CollectionRequest {
    /// Request `count` items, `page_size` at a time
    pub fn new(count: usize, page_size: usize) -> Self {
        Self {
            count,
            page_size,
            start_cursor: Cursor::start(),
            delayed: false,
            min_timestamp: None,
            strict_page_size: false,
            single_page: false,
        }
    }

    /// Degenerate one-page request ("top N")
    pub fn single_page(page_size: usize) -> Self {
        Self {
            single_page: true,
            ..Self::new(page_size, page_size)
        }
    }

    /// Start from a cursor
    #[must_use]
    pub fn starting_at(mut self, cursor: impl Into<Cursor>) -> Self {
        self.start_cursor = cursor.into();
        self
    }

    /// Enable or disable the inter-page pause
    #[must_use]
    pub fn delayed(mut self, delayed: bool) -> Self {
        self.delayed = delayed;
        self
    }

    /// Set the minimum creation time
    #[must_use]
    pub fn min_timestamp(mut self, min_timestamp: Option<DateTime<Utc>>) -> Self {
        self.min_timestamp = min_timestamp;
        self
    }

    /// Require `count >= page_size`
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict_page_size = true;
        self
    }

    /// Check the request for caller errors
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::validation("Page size must be greater than zero."));
        }
        if self.strict_page_size && self.count < self.page_size {
            return Err(Error::validation(
                "Count must be greater than or equal to page size.",
            ));
        }
        Ok(())
    }
}

/// Terminal result of a successful walk
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatedResult<T> {
    /// Items in server order across pages
    pub items: Vec<T>,
    /// Cursor to resume from, when the server has more
    pub final_cursor: Option<Cursor>,
    /// Whether the server reported more pages
    pub final_has_next_page: bool,
    /// Last server-reported collection size
    pub total_count: Option<u64>,
    /// Round-trips performed
    pub pages_fetched: usize,
}

/// Walk result with resumption metadata
///
/// A failure mid-walk does not discard accumulated items; it is reported
/// in `interrupted` instead.
#[derive(Debug)]
pub struct PagedCollection<T> {
    /// Items accumulated so far
    pub items: Vec<T>,
    /// Cursor to resume from, when more is available
    pub next_cursor: Option<Cursor>,
    /// Whether more items can be requested
    pub has_next_page: bool,
    /// Last server-reported collection size
    pub total_count: Option<u64>,
    /// Error that cut the walk short
    pub interrupted: Option<Error>,
}

impl<T> PagedCollection<T> {
    /// Whether the walk ended on an error
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.is_some()
    }

    /// Turn an interruption that produced nothing into an error
    pub fn require_progress(mut self) -> Result<Self> {
        if self.items.is_empty() {
            if let Some(err) = self.interrupted.take() {
                return Err(err);
            }
        }
        Ok(self)
    }
}

/// Single-page result with the server-reported total
#[derive(Debug, Clone, PartialEq)]
pub struct AvailablePage<T> {
    /// Items on the page
    pub items: Vec<T>,
    /// Server-reported collection size
    pub count: Option<u64>,
    /// Whether the server has more pages
    pub has_next_page: bool,
    /// Cursor for the next page
    pub next_cursor: Option<Cursor>,
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Identity-bearing unit produced by a [`ModelMapper`]
pub trait Item {
    /// Stable identifier used for duplicate detection
    fn id(&self) -> String;

    /// Creation time, for time-ordered feeds
    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// What to do with a page that has no edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyPagePolicy {
    /// End the walk
    #[default]
    Terminate,
    /// Report `Forbidden` if the server claims a nonzero total and nothing
    /// was accumulated yet (private relational feeds)
    ForbiddenWhenCounted,
}

/// Reads nodes and page info out of a decoded payload
pub trait PageShape: Send + Sync {
    /// Strictly decode a payload; missing or mistyped fields are a protocol error
    fn decode(&self, payload: &Value) -> Result<RawPage>;

    /// Whether the payload must carry `status: "ok"`
    fn expects_status_ok(&self) -> bool {
        false
    }

    /// Whether the minimum-timestamp cutoff applies to this feed
    fn applies_cutoff(&self) -> bool {
        false
    }

    /// Handling of pages with no edges
    fn empty_page(&self) -> EmptyPagePolicy {
        EmptyPagePolicy::Terminate
    }
}

/// Performs one round-trip for a cursor
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page at `cursor` holding at most `page_size` items
    async fn fetch(&self, cursor: &Cursor, page_size: usize) -> Result<RawResponse>;

    /// Human-readable name of the collection, for errors and logs
    fn describe(&self) -> String;
}

/// Maps one raw node to an item
pub trait ModelMapper<T>: Send + Sync {
    /// Map a node; failures are protocol errors
    fn map(&self, node: &Value) -> Result<T>;
}
