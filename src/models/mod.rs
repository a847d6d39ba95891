//! Domain models
//!
//! Typed views over the raw nodes of each collection, plus the serde-backed
//! [`JsonModel`] mapper the engine uses to build them.

mod mapper;
mod types;

pub use mapper::JsonModel;
pub use types::{Account, Comment, Media, Owner, Thread};
