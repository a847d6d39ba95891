//! Cursor pagination engine
//!
//! One walk loop serves every connection shape:
//!
//! ```text
//! Start ─► Fetching ─► Accumulating ─► Delaying ─► Fetching ...
//!              │             │
//!              ▼             ▼
//!           Failed         Done
//! ```
//!
//! `collect` surfaces any failure as an error; `collect_with_handle` runs
//! the same walk and hands back what was gathered plus resumption data.

use super::policy::{StopPolicy, StopReason};
use super::types::{
    AccumulatedResult, AvailablePage, CollectionRequest, Cursor, EmptyPagePolicy, Item,
    ModelMapper, PageFetcher, PageResult, PageShape, PagedCollection,
};
use crate::classify::{classify, Outcome};
use crate::error::{Error, Result};
use crate::pacing::{PagingDelay, WalkBudget};
use crate::session::SessionManager;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A collection as seen by the engine: fetcher, shape and mapper
pub struct Collection<'a, T> {
    /// Performs the round-trips
    pub fetcher: &'a dyn PageFetcher,
    /// Reads nodes and page info
    pub shape: &'a dyn PageShape,
    /// Turns nodes into items
    pub mapper: &'a dyn ModelMapper<T>,
}

impl<'a, T> Collection<'a, T> {
    /// Bundle the three collaborators
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        shape: &'a dyn PageShape,
        mapper: &'a dyn ModelMapper<T>,
    ) -> Self {
        Self {
            fetcher,
            shape,
            mapper,
        }
    }
}

/// State of one walk while it runs
struct Walk<T> {
    items: Vec<T>,
    cursor: Cursor,
    has_next_page: bool,
    total_count: Option<u64>,
    pages: usize,
    failure: Option<Error>,
}

impl<T> Walk<T> {
    fn new(start: Cursor) -> Self {
        Self {
            items: Vec::new(),
            cursor: start,
            has_next_page: true,
            total_count: None,
            pages: 0,
            failure: None,
        }
    }

    fn next_cursor(&self) -> Option<Cursor> {
        self.has_next_page.then(|| self.cursor.clone())
    }
}

/// Drives multi-page walks
#[derive(Debug, Clone, Default)]
pub struct PaginationEngine {
    delay: PagingDelay,
    budget: WalkBudget,
    session: Option<SessionManager>,
}

impl PaginationEngine {
    /// Create an engine with default pacing and budget
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inter-page delay range
    #[must_use]
    pub fn with_delay(mut self, delay: PagingDelay) -> Self {
        self.delay = delay;
        self
    }

    /// Set the time limit and cancellation token
    #[must_use]
    pub fn with_budget(mut self, budget: WalkBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Feed response headers of successful round-trips into a session
    #[must_use]
    pub fn with_session(mut self, session: SessionManager) -> Self {
        self.session = Some(session);
        self
    }

    /// Get the budget
    pub fn budget(&self) -> &WalkBudget {
        &self.budget
    }

    /// Fetch, classify, decode and map one page
    pub async fn fetch_page<T>(
        &self,
        collection: &Collection<'_, T>,
        cursor: &Cursor,
        page_size: usize,
    ) -> Result<PageResult<T>> {
        let raw = collection.fetcher.fetch(cursor, page_size).await?;

        let payload = classify(raw.status, &raw.body, collection.shape.expects_status_ok())
            .into_result(&collection.fetcher.describe())?;

        if let Some(session) = &self.session {
            session.ingest(&raw.headers).await;
        }

        let page = collection.shape.decode(&payload)?;
        let items = page
            .nodes
            .iter()
            .map(|node| collection.mapper.map(node))
            .collect::<Result<Vec<_>>>()?;

        Ok(PageResult {
            items,
            page_info: page.page_info,
        })
    }

    /// Collect items, failing on any error (accumulated items are dropped)
    pub async fn collect<T: Item>(
        &self,
        collection: &Collection<'_, T>,
        request: &CollectionRequest,
    ) -> Result<AccumulatedResult<T>> {
        request.validate()?;
        let walk = self.walk(collection, request).await;

        if let Some(err) = walk.failure {
            return Err(err);
        }
        Ok(AccumulatedResult {
            final_cursor: walk.has_next_page.then_some(walk.cursor),
            final_has_next_page: walk.has_next_page,
            total_count: walk.total_count,
            pages_fetched: walk.pages,
            items: walk.items,
        })
    }

    /// Collect items, keeping partial results and the resume cursor on error
    pub async fn collect_with_handle<T: Item>(
        &self,
        collection: &Collection<'_, T>,
        request: &CollectionRequest,
    ) -> Result<PagedCollection<T>> {
        request.validate()?;
        let walk = self.walk(collection, request).await;

        if let Some(err) = &walk.failure {
            warn!(
                "Walk over {} interrupted after {} item(s): {err}",
                collection.fetcher.describe(),
                walk.items.len()
            );
        }
        Ok(PagedCollection {
            next_cursor: walk.next_cursor(),
            has_next_page: walk.has_next_page,
            total_count: walk.total_count,
            interrupted: walk.failure,
            items: walk.items,
        })
    }

    /// Fetch one page with the server-reported total
    pub async fn collect_all_available<T>(
        &self,
        collection: &Collection<'_, T>,
        page_size: usize,
        cursor: &Cursor,
    ) -> Result<AvailablePage<T>> {
        if page_size == 0 {
            return Err(Error::validation("Page size must be greater than zero."));
        }
        self.budget.check(Instant::now(), 0)?;

        let page = self.fetch_page(collection, cursor, page_size).await?;
        let info = page.page_info;

        if page.items.is_empty() {
            if is_private(collection.shape, info.total_count) {
                Outcome::Forbidden.into_result(&collection.fetcher.describe())?;
            }
            return Ok(AvailablePage {
                items: Vec::new(),
                count: info.total_count,
                has_next_page: false,
                next_cursor: None,
            });
        }

        Ok(AvailablePage {
            next_cursor: info.next_cursor(),
            has_next_page: info.has_next_page,
            count: info.total_count,
            items: page.items,
        })
    }

    async fn walk<T: Item>(
        &self,
        collection: &Collection<'_, T>,
        request: &CollectionRequest,
    ) -> Walk<T> {
        let started = Instant::now();
        let context = collection.fetcher.describe();
        let min_timestamp = if collection.shape.applies_cutoff() {
            request.min_timestamp
        } else {
            None
        };
        let mut policy = StopPolicy::new(min_timestamp);
        let mut walk = Walk::new(request.start_cursor.clone());
        let mut target = request.count;

        info!("Collecting up to {target} item(s) from {context}");

        while walk.items.len() < target {
            if let Err(err) = self.budget.check(started, walk.pages) {
                walk.failure = Some(err);
                break;
            }

            let page_size = request.page_size.min(target - walk.items.len());
            let page = match self.fetch_page(collection, &walk.cursor, page_size).await {
                Ok(page) => page,
                Err(err) => {
                    walk.failure = Some(err);
                    break;
                }
            };
            walk.pages += 1;
            let info = page.page_info;

            if let Some(total) = info.total_count {
                walk.total_count = Some(total);
                let total = usize::try_from(total).unwrap_or(usize::MAX);
                if total < target {
                    debug!("{context} reports {total} item(s); lowering target from {target}");
                    target = total;
                }
            }

            if page.items.is_empty() {
                if walk.items.is_empty() && is_private(collection.shape, info.total_count) {
                    warn!("{context} returned no edges despite a nonzero count; treating as private");
                    walk.failure = Outcome::Forbidden.into_result(&context).err();
                } else {
                    debug!("Empty page {} from {context}; ending walk", walk.pages);
                    walk.has_next_page = false;
                }
                break;
            }

            // a page that cannot be continued contributes nothing
            let next = match (info.has_next_page, info.end_cursor) {
                (true, Some(cursor)) => Some(Cursor::from(cursor)),
                (true, None) => {
                    walk.failure = Some(Error::protocol(format!(
                        "{context} reported a next page without an end cursor"
                    )));
                    break;
                }
                (false, _) => None,
            };

            let fetched = page.items.len();
            let mut stopped = false;
            for item in page.items {
                if walk.items.len() >= target {
                    stopped = true;
                    break;
                }
                if let Some(reason) = policy.check(&item) {
                    match reason {
                        StopReason::Duplicate(id) => {
                            debug!("{context} re-served id {id}; ending walk");
                        }
                        StopReason::BeforeCutoff(created) => {
                            debug!("{context} reached items created at {created}; ending walk");
                        }
                    }
                    stopped = true;
                    break;
                }
                walk.items.push(item);
            }

            debug!(
                "Page {} from {context}: {fetched} fetched, {} accumulated",
                walk.pages,
                walk.items.len()
            );

            walk.has_next_page = info.has_next_page;
            if let Some(cursor) = next {
                walk.cursor = cursor;
            }

            // the whole collection is in hand
            if target < request.count && walk.items.len() >= target {
                walk.has_next_page = false;
            }

            if stopped
                || !walk.has_next_page
                || request.single_page
                || walk.items.len() >= target
            {
                break;
            }

            if request.delayed {
                if let Err(Error::Cancelled { .. }) = self.delay.pause(&self.budget.cancel).await
                {
                    walk.failure = Some(Error::Cancelled { pages: walk.pages });
                    break;
                }
            }
        }

        info!(
            "Collected {} item(s) from {context} in {} page(s)",
            walk.items.len(),
            walk.pages
        );
        walk
    }
}

fn is_private(shape: &dyn PageShape, total_count: Option<u64>) -> bool {
    shape.empty_page() == EmptyPagePolicy::ForbiddenWhenCounted
        && total_count.is_some_and(|total| total > 0)
}
