//! Page shape implementations
//!
//! Each shape knows where one family of payloads keeps its nodes and
//! paging metadata.

use super::types::{EmptyPagePolicy, PageInfo, PageShape, RawPage};
use crate::error::{Error, Result};
use crate::types::OptionStringExt;
use serde_json::{Map, Value};

// ============================================================================
// Connection Shape
// ============================================================================

/// Relay-style connection: `{count, edges: [{node}], page_info}`
///
/// Common layouts:
/// - `data.user.edge_followed_by`
/// - `graphql.hashtag.edge_hashtag_to_media`
#[derive(Debug, Clone)]
pub struct ConnectionShape {
    /// JSON pointer to the connection object
    pub pointer: String,
    /// Key wrapping each node inside an edge (`None` = the edge is the node)
    pub node_key: Option<String>,
    /// Fail when `count` is absent
    pub require_count: bool,
    /// Fail when `page_info` is absent
    pub require_page_info: bool,
    /// Payload must carry `status: "ok"`
    pub status_ok: bool,
    /// Apply the minimum-timestamp cutoff
    pub cutoff: bool,
    /// Empty page handling
    pub empty_page: EmptyPagePolicy,
}

impl ConnectionShape {
    /// Create a shape for the connection at `pointer`
    pub fn new(pointer: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            node_key: Some("node".to_string()),
            require_count: false,
            require_page_info: true,
            status_ok: false,
            cutoff: false,
            empty_page: EmptyPagePolicy::Terminate,
        }
    }

    /// Require the `count` field
    #[must_use]
    pub fn with_required_count(mut self) -> Self {
        self.require_count = true;
        self
    }

    /// Accept connections without `page_info` (single-page lists)
    #[must_use]
    pub fn without_page_info(mut self) -> Self {
        self.require_page_info = false;
        self
    }

    /// Apply the minimum-timestamp cutoff (time-ordered feeds)
    #[must_use]
    pub fn time_ordered(mut self) -> Self {
        self.cutoff = true;
        self
    }

    /// Treat empty edges with a nonzero count as a private collection
    #[must_use]
    pub fn private_when_empty(mut self) -> Self {
        self.empty_page = EmptyPagePolicy::ForbiddenWhenCounted;
        self
    }

    fn connection<'a>(&self, payload: &'a Value) -> Result<&'a Map<String, Value>> {
        payload
            .pointer(&self.pointer)
            .and_then(Value::as_object)
            .ok_or_else(|| Error::protocol(format!("missing connection at '{}'", self.pointer)))
    }
}

impl PageShape for ConnectionShape {
    fn decode(&self, payload: &Value) -> Result<RawPage> {
        let connection = self.connection(payload)?;

        let edges = connection
            .get("edges")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::protocol(format!("missing edges at '{}'", self.pointer)))?;

        let nodes = edges
            .iter()
            .map(|edge| match &self.node_key {
                Some(key) => edge
                    .get(key)
                    .cloned()
                    .ok_or_else(|| Error::protocol(format!("edge without '{key}'"))),
                None => Ok(edge.clone()),
            })
            .collect::<Result<Vec<_>>>()?;

        let total_count = match connection.get("count") {
            None | Some(Value::Null) if self.require_count => {
                return Err(Error::protocol(format!(
                    "missing count at '{}'",
                    self.pointer
                )))
            }
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_u64()
                    .ok_or_else(|| Error::protocol(format!("count is not a number: {value}")))?,
            ),
        };

        let mut page_info = match connection.get("page_info") {
            Some(Value::Object(info)) => parse_page_info(info)?,
            None if !self.require_page_info => PageInfo::last(),
            _ => {
                return Err(Error::protocol(format!(
                    "missing page_info at '{}'",
                    self.pointer
                )))
            }
        };
        page_info.total_count = total_count;

        Ok(RawPage { nodes, page_info })
    }

    fn expects_status_ok(&self) -> bool {
        self.status_ok
    }

    fn applies_cutoff(&self) -> bool {
        self.cutoff
    }

    fn empty_page(&self) -> EmptyPagePolicy {
        self.empty_page
    }
}

fn parse_page_info(info: &Map<String, Value>) -> Result<PageInfo> {
    let has_next_page = info
        .get("has_next_page")
        .and_then(Value::as_bool)
        .ok_or_else(|| Error::protocol("page_info.has_next_page is missing or not a bool"))?;

    Ok(PageInfo {
        has_next_page,
        end_cursor: cursor_value(info.get("end_cursor"))?,
        total_count: None,
    })
}

/// Cursor fields may be strings, numbers or null
fn cursor_value(value: Option<&Value>) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(s.clone().none_if_empty()),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(Error::protocol(format!("cursor has unexpected type: {other}"))),
    }
}

// ============================================================================
// List Shape
// ============================================================================

/// Plain list with optional "more" flag and cursor fields
///
/// Used for inbox-style payloads (`inbox.threads`, `inbox.has_older`,
/// `inbox.oldest_cursor`), location top posts (`location.top_posts.nodes`)
/// and account search results (`users[].user`).
#[derive(Debug, Clone)]
pub struct ListShape {
    /// JSON pointer to the object holding the list (`""` = payload root)
    pub pointer: String,
    /// Key of the list inside that object
    pub items_key: String,
    /// Key wrapping each node inside a list entry
    pub node_key: Option<String>,
    /// Key of the "more pages" flag
    pub has_more_key: Option<String>,
    /// Key of the next cursor
    pub cursor_key: Option<String>,
    /// Payload must carry `status: "ok"`
    pub status_ok: bool,
}

impl ListShape {
    /// Create a shape for the list `items_key` under `pointer`
    pub fn new(pointer: impl Into<String>, items_key: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            items_key: items_key.into(),
            node_key: None,
            has_more_key: None,
            cursor_key: None,
            status_ok: false,
        }
    }

    /// Unwrap each entry through `key`
    #[must_use]
    pub fn with_node_key(mut self, key: impl Into<String>) -> Self {
        self.node_key = Some(key.into());
        self
    }

    /// Read paging from `has_more_key` and `cursor_key`
    #[must_use]
    pub fn with_paging(mut self, has_more_key: impl Into<String>, cursor_key: impl Into<String>) -> Self {
        self.has_more_key = Some(has_more_key.into());
        self.cursor_key = Some(cursor_key.into());
        self
    }

    /// Require `status: "ok"`
    #[must_use]
    pub fn expect_status_ok(mut self) -> Self {
        self.status_ok = true;
        self
    }
}

impl PageShape for ListShape {
    fn decode(&self, payload: &Value) -> Result<RawPage> {
        let container = payload
            .pointer(&self.pointer)
            .and_then(Value::as_object)
            .ok_or_else(|| Error::protocol(format!("missing object at '{}'", self.pointer)))?;

        // An absent list means an empty page
        let entries = match container.get(&self.items_key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries.clone(),
            Some(other) => {
                return Err(Error::protocol(format!(
                    "'{}' is not a list: {other}",
                    self.items_key
                )))
            }
        };

        let nodes = entries
            .into_iter()
            .map(|entry| match &self.node_key {
                Some(key) => entry
                    .get(key)
                    .cloned()
                    .ok_or_else(|| Error::protocol(format!("entry without '{key}'"))),
                None => Ok(entry),
            })
            .collect::<Result<Vec<_>>>()?;

        let has_next_page = match &self.has_more_key {
            Some(key) => match container.get(key) {
                None | Some(Value::Null) => false,
                Some(Value::Bool(flag)) => *flag,
                Some(other) => {
                    return Err(Error::protocol(format!("'{key}' is not a bool: {other}")))
                }
            },
            None => false,
        };
        let end_cursor = match &self.cursor_key {
            Some(key) => cursor_value(container.get(key))?,
            None => None,
        };

        Ok(RawPage {
            nodes,
            page_info: PageInfo {
                // a "more" flag without a cursor cannot be followed
                has_next_page: has_next_page && end_cursor.is_some(),
                end_cursor,
                total_count: None,
            },
        })
    }

    fn expects_status_ok(&self) -> bool {
        self.status_ok
    }
}
