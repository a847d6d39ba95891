//! HTTP transport module
//!
//! Provides the transport seam and a reqwest-backed client with retry,
//! rate limiting, and backoff strategies.
//!
//! # Features
//!
//! - **Transport Trait**: Anything that returns status, headers and body
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Raw Responses**: 4xx/5xx are returned, not raised, so the caller
//!   can classify them

mod client;
mod rate_limit;
mod transport;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use transport::{RawResponse, Transport, TransportRequest};
