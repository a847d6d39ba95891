//! Outcome classification module
//!
//! Turns a raw `(status, body)` pair into a tagged [`Outcome`] before any
//! payload field is read.

mod classifier;
mod types;

pub use classifier::{classify, error_body};
pub use types::Outcome;
