//! Outcome type

use crate::error::{Error, Result};
use serde_json::Value;

/// Classified result of one round-trip
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// HTTP 200 with a decodable payload
    Success(Value),
    /// HTTP 404
    NotFound,
    /// Collection exists but is not accessible
    Forbidden,
    /// HTTP 200 with an undecodable or unmarked payload
    Invalid(String),
    /// Any other status, with a flattened body
    ServerError {
        /// HTTP status code
        status: u16,
        /// Best-effort stringified body
        body: String,
    },
}

impl Outcome {
    /// Check if this is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Convert into the payload or the matching error kind
    ///
    /// `context` names the resource for the error message.
    pub fn into_result(self, context: &str) -> Result<Value> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::NotFound => Err(Error::not_found(format!("{context} does not exist"))),
            Self::Forbidden => Err(Error::forbidden(format!("{context} is not accessible"))),
            Self::Invalid(reason) => Err(Error::protocol(format!("{context}: {reason}"))),
            Self::ServerError { status, body } => Err(Error::http_status(status, body)),
        }
    }
}
