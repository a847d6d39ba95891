//! Transport seam
//!
//! The engine only needs "send this request, give me status, headers and
//! body". Anything that can do that (the retrying [`super::HttpClient`], a
//! recorded fixture, a test double) plugs in through [`Transport`].

use crate::error::Result;
use crate::types::{header_values, HeaderPairs, Method, StringMap};
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// One outgoing request
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Fully built URL, query included
    pub url: Url,
    /// Request headers
    pub headers: StringMap,
    /// JSON body
    pub body: Option<Value>,
}

impl TransportRequest {
    /// Create a GET request
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: StringMap::new(),
            body: None,
        }
    }

    /// Create a POST request with a JSON body
    pub fn post(url: Url, body: Value) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: StringMap::new(),
            body: Some(body),
        }
    }

    /// Replace the headers
    #[must_use]
    pub fn with_headers(mut self, headers: StringMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Status, headers and body of one round-trip
///
/// Non-2xx responses are still responses; turning them into outcomes is
/// the classifier's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Header pairs; repeated names (`Set-Cookie`) stay separate
    pub headers: HeaderPairs,
    /// Response body as text
    pub body: String,
}

impl RawResponse {
    /// Create a response without headers
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderPairs::new(),
            body: body.into(),
        }
    }

    /// Create a response with a serialized JSON body
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// Append a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Every value sent for `name`, case-insensitively
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        header_values(&self.headers, name)
    }
}

/// Sends requests and returns raw responses
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request
    ///
    /// Errors are reserved for failures where no response exists
    /// (connection, timeout, exhausted retries).
    async fn send(&self, request: TransportRequest) -> Result<RawResponse>;
}
