//! Pagination module
//!
//! Cursor-paginated collection walking over any connection shape.
//!
//! # Overview
//!
//! The pagination module provides:
//! - `PaginationEngine` - the walk loop (`fetch_page`, `collect`,
//!   `collect_with_handle`, `collect_all_available`)
//! - `PageShape` implementations that strictly decode payloads
//! - `StopPolicy` - duplicate and minimum-timestamp early exit
//! - Request/result types carrying cursors and page info

mod engine;
mod policy;
mod shapes;
mod types;

pub use engine::{Collection, PaginationEngine};
pub use policy::{StopPolicy, StopReason};
pub use shapes::{ConnectionShape, ListShape};
pub use types::{
    AccumulatedResult, AvailablePage, CollectionRequest, Cursor, EmptyPagePolicy, Item,
    ModelMapper, PageFetcher, PageInfo, PageResult, PageShape, PagedCollection, RawPage,
};
