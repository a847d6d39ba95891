//! Client facade
//!
//! Owns the transport, the session, the endpoint catalogue and the
//! cancellation token, and exposes one method per collection. Every method
//! is a thin binding of a [`Resource`] to the pagination engine.
//!
//! Methods returning `Vec<T>` fail on any error. `get_paginate_*` methods
//! return a [`PagedCollection`] that keeps partial results and reports the
//! interruption instead; they still fail when nothing was collected.

use crate::config::ClientConfig;
use crate::endpoints::{Endpoints, Resource};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RawResponse, Transport, TransportRequest};
use crate::models::{Account, Comment, JsonModel, Media, Thread};
use crate::pagination::{
    AccumulatedResult, AvailablePage, Collection, CollectionRequest, Cursor, Item, PageFetcher,
    PageResult, PagedCollection, PaginationEngine,
};
use crate::session::{Session, SessionManager, SessionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Items per request on feeds whose page size the caller does not choose
pub const DEFAULT_MEDIA_PAGE_SIZE: usize = 50;

// ============================================================================
// Client
// ============================================================================

/// Paginated-collection client
pub struct Client {
    transport: Arc<dyn Transport>,
    session: SessionManager,
    endpoints: Endpoints,
    config: ClientConfig,
    cancel: CancellationToken,
    store: Option<Arc<dyn SessionStore>>,
}

impl Client {
    /// Create a client backed by [`HttpClient`]
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpClient::with_config(config.http_client_config())?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over any transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let endpoints = Endpoints::new(&config.base_url, config.query_hashes.clone())?;

        let mut session = Session::new();
        session.user_agent.clone_from(&config.user_agent);

        Ok(Self {
            transport,
            session: SessionManager::with_session(&config.base_url, session),
            endpoints,
            config,
            cancel: CancellationToken::new(),
            store: None,
        })
    }

    /// Create a client from previously obtained credentials
    ///
    /// `cookie_header` uses the request `cookie` header form (`a=1; b=2`).
    pub fn with_credentials(
        config: ClientConfig,
        session_id: &str,
        csrf_token: &str,
        cookie_header: &str,
    ) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.adopt(Session::with_credentials(session_id, csrf_token, cookie_header));
        Ok(client)
    }

    /// Attach a store for [`Client::save_session`] and [`Client::load_session`]
    #[must_use]
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared session handle
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Token that aborts every walk of this client when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Abort running and future walks
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn adopt(&mut self, mut session: Session) {
        session.user_agent.clone_from(&self.config.user_agent);
        self.session = SessionManager::with_session(&self.config.base_url, session);
    }

    // ========================================================================
    // Session persistence
    // ========================================================================

    /// Persist the current session; returns the store key
    pub async fn save_session(&self) -> Result<String> {
        let store = self.store()?;
        self.session.save_to(store.as_ref()).await
    }

    /// Replace the session with the one saved for `session_id`
    ///
    /// Returns `false` when nothing was saved for it.
    pub async fn load_session(&self, session_id: &str) -> Result<bool> {
        let store = self.store()?;
        let loaded = self.session.load_from(store.as_ref(), session_id).await?;
        if loaded {
            if let Some(agent) = &self.config.user_agent {
                self.session.set_user_agent(agent.clone()).await;
            }
        }
        Ok(loaded)
    }

    fn store(&self) -> Result<&Arc<dyn SessionStore>> {
        self.store
            .as_ref()
            .ok_or_else(|| Error::session("No session store configured"))
    }

    // ========================================================================
    // Followers / following
    // ========================================================================

    /// Up to `count` followers of `account_id`
    pub async fn get_followers(
        &self,
        account_id: &str,
        count: usize,
        page_size: usize,
        delayed: bool,
    ) -> Result<Vec<Account>> {
        let request = CollectionRequest::new(count, page_size).strict().delayed(delayed);
        let result = self.collect(followers(account_id), &request).await?;
        Ok(result.items)
    }

    /// Up to `count` followers starting at `next_page`, with resumption data
    pub async fn get_paginate_followers(
        &self,
        account_id: &str,
        count: usize,
        page_size: usize,
        delayed: bool,
        next_page: impl Into<Cursor>,
    ) -> Result<PagedCollection<Account>> {
        let request = CollectionRequest::new(count, page_size)
            .strict()
            .delayed(delayed)
            .starting_at(next_page);
        self.collect_with_handle(followers(account_id), &request).await
    }

    /// One page of followers with the total follower count
    pub async fn get_paginate_all_followers(
        &self,
        account_id: &str,
        page_size: usize,
        next_page: impl Into<Cursor>,
    ) -> Result<AvailablePage<Account>> {
        self.available(followers(account_id), page_size, &next_page.into())
            .await
    }

    /// Up to `count` accounts followed by `account_id`
    pub async fn get_following(
        &self,
        account_id: &str,
        count: usize,
        page_size: usize,
        delayed: bool,
    ) -> Result<Vec<Account>> {
        let request = CollectionRequest::new(count, page_size).strict().delayed(delayed);
        let result = self.collect(following(account_id), &request).await?;
        Ok(result.items)
    }

    /// Up to `count` followed accounts starting at `next_page`, with resumption data
    pub async fn get_paginate_following(
        &self,
        account_id: &str,
        count: usize,
        page_size: usize,
        delayed: bool,
        next_page: impl Into<Cursor>,
    ) -> Result<PagedCollection<Account>> {
        let request = CollectionRequest::new(count, page_size)
            .strict()
            .delayed(delayed)
            .starting_at(next_page);
        self.collect_with_handle(following(account_id), &request)
            .await
    }

    /// One page of followed accounts with the total count
    pub async fn get_paginate_all_following(
        &self,
        account_id: &str,
        page_size: usize,
        next_page: impl Into<Cursor>,
    ) -> Result<AvailablePage<Account>> {
        self.available(following(account_id), page_size, &next_page.into())
            .await
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Up to `count` accounts whose username matches `username`
    pub async fn search_accounts_by_username(
        &self,
        username: &str,
        count: usize,
    ) -> Result<Vec<Account>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let resource = Resource::AccountSearch {
            query: username.to_string(),
        };
        let mut page = self
            .page::<Account>(&resource, &Cursor::start(), count)
            .await?;
        page.items.truncate(count);
        Ok(page.items)
    }

    // ========================================================================
    // Media feeds
    // ========================================================================

    /// Up to `count` timeline media of `account_id`, starting at `max_id`
    pub async fn get_medias_by_user_id(
        &self,
        account_id: &str,
        count: usize,
        max_id: impl Into<Cursor>,
    ) -> Result<Vec<Media>> {
        let request = CollectionRequest::new(count, media_page_size(count)).starting_at(max_id);
        let resource = Resource::AccountMedia {
            account_id: account_id.to_string(),
        };
        Ok(self.collect(resource, &request).await?.items)
    }

    /// One page of `count` timeline media with resumption data
    pub async fn get_paginate_medias_by_user_id(
        &self,
        account_id: &str,
        count: usize,
        max_id: impl Into<Cursor>,
    ) -> Result<PagedCollection<Media>> {
        let max_id = max_id.into();
        if count == 0 {
            return Ok(PagedCollection {
                items: Vec::new(),
                next_cursor: Some(max_id),
                has_next_page: true,
                total_count: None,
                interrupted: None,
            });
        }
        let request = CollectionRequest::single_page(count).starting_at(max_id);
        let resource = Resource::AccountMedia {
            account_id: account_id.to_string(),
        };
        self.collect_with_handle(resource, &request).await
    }

    /// Up to `count` recent media under `tag`
    ///
    /// Stops early at a re-served media id or at the first media taken
    /// before `min_timestamp`.
    pub async fn get_medias_by_tag(
        &self,
        tag: &str,
        count: usize,
        max_id: impl Into<Cursor>,
        min_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Vec<Media>> {
        let request = CollectionRequest::new(count, media_page_size(count))
            .starting_at(max_id)
            .min_timestamp(min_timestamp);
        Ok(self.collect(hashtag(tag), &request).await?.items)
    }

    /// One page of recent media under `tag` with the total count
    pub async fn get_paginate_medias_by_tag(
        &self,
        tag: &str,
        max_id: impl Into<Cursor>,
    ) -> Result<AvailablePage<Media>> {
        self.available(hashtag(tag), DEFAULT_MEDIA_PAGE_SIZE, &max_id.into())
            .await
    }

    /// Current top posts under `tag`
    pub async fn get_current_top_medias_by_tag(&self, tag: &str) -> Result<Vec<Media>> {
        let resource = Resource::HashtagTop {
            tag: tag.to_string(),
        };
        let page = self
            .page::<Media>(&resource, &Cursor::start(), DEFAULT_MEDIA_PAGE_SIZE)
            .await?;
        Ok(page.items)
    }

    /// Up to `count` recent media at a location, starting at `offset`
    pub async fn get_medias_by_location_id(
        &self,
        location_id: &str,
        count: usize,
        offset: impl Into<Cursor>,
    ) -> Result<Vec<Media>> {
        let request = CollectionRequest::new(count, media_page_size(count)).starting_at(offset);
        Ok(self.collect(location(location_id), &request).await?.items)
    }

    /// Current top posts at a location
    pub async fn get_current_top_medias_by_location_id(
        &self,
        location_id: &str,
    ) -> Result<Vec<Media>> {
        let resource = Resource::LocationTop {
            location_id: location_id.to_string(),
        };
        let page = self
            .page::<Media>(&resource, &Cursor::start(), DEFAULT_MEDIA_PAGE_SIZE)
            .await?;
        Ok(page.items)
    }

    /// One page of recent media at a location with the total count
    pub async fn get_paginate_medias_by_location_id(
        &self,
        location_id: &str,
        max_id: impl Into<Cursor>,
    ) -> Result<AvailablePage<Media>> {
        self.available(
            location(location_id),
            DEFAULT_MEDIA_PAGE_SIZE,
            &max_id.into(),
        )
        .await
    }

    // ========================================================================
    // Comments / likes
    // ========================================================================

    /// Up to `count` comments on the media with `code`
    pub async fn get_media_comments_by_code(
        &self,
        code: &str,
        count: usize,
        max_id: impl Into<Cursor>,
    ) -> Result<Vec<Comment>> {
        let resource = Resource::Comments {
            shortcode: code.to_string(),
        };
        let request = CollectionRequest::new(count, capped_page_size(&resource, count))
            .starting_at(max_id);
        Ok(self.collect(resource, &request).await?.items)
    }

    /// Up to `count` accounts that liked the media with `code`
    pub async fn get_media_likes_by_code(
        &self,
        code: &str,
        count: usize,
        max_id: impl Into<Cursor>,
    ) -> Result<Vec<Account>> {
        let resource = Resource::Likes {
            shortcode: code.to_string(),
        };
        let request = CollectionRequest::new(count, capped_page_size(&resource, count))
            .starting_at(max_id);
        Ok(self.collect(resource, &request).await?.items)
    }

    // ========================================================================
    // Direct threads
    // ========================================================================

    /// One page of inbox threads
    ///
    /// `page_info.has_next_page` mirrors `has_older`; the next cursor is
    /// `oldest_cursor`.
    pub async fn get_paginate_threads(
        &self,
        limit: usize,
        message_limit: usize,
        cursor: impl Into<Cursor>,
    ) -> Result<PageResult<Thread>> {
        if limit == 0 {
            return Err(Error::validation("Page size must be greater than zero."));
        }
        let resource = Resource::Threads { message_limit };
        self.page(&resource, &cursor.into(), limit).await
    }

    /// Up to `count` inbox threads, `limit` per request
    pub async fn get_threads(
        &self,
        count: usize,
        limit: usize,
        message_limit: usize,
    ) -> Result<Vec<Thread>> {
        let request = CollectionRequest::new(count, limit);
        let resource = Resource::Threads { message_limit };
        Ok(self.collect(resource, &request).await?.items)
    }

    // ========================================================================
    // Engine bindings
    // ========================================================================

    fn engine(&self) -> PaginationEngine {
        PaginationEngine::new()
            .with_delay(self.config.paging_delay())
            .with_budget(self.config.walk_budget(self.cancel.clone()))
            .with_session(self.session.clone())
    }

    async fn collect<T>(
        &self,
        resource: Resource,
        request: &CollectionRequest,
    ) -> Result<AccumulatedResult<T>>
    where
        T: Item + DeserializeOwned,
    {
        let shape = resource.shape();
        let fetcher = ResourceFetcher::new(self, &resource);
        let mapper = JsonModel::<T>::new();
        let collection = Collection::new(&fetcher, shape.as_ref(), &mapper);

        let result = self.engine().collect(&collection, request).await?;
        info!(
            "{}: {} item(s), more available: {}",
            resource.describe(),
            result.items.len(),
            result.final_has_next_page
        );
        Ok(result)
    }

    async fn collect_with_handle<T>(
        &self,
        resource: Resource,
        request: &CollectionRequest,
    ) -> Result<PagedCollection<T>>
    where
        T: Item + DeserializeOwned,
    {
        let shape = resource.shape();
        let fetcher = ResourceFetcher::new(self, &resource);
        let mapper = JsonModel::<T>::new();
        let collection = Collection::new(&fetcher, shape.as_ref(), &mapper);

        self.engine()
            .collect_with_handle(&collection, request)
            .await?
            .require_progress()
    }

    async fn available<T>(
        &self,
        resource: Resource,
        page_size: usize,
        cursor: &Cursor,
    ) -> Result<AvailablePage<T>>
    where
        T: DeserializeOwned,
    {
        let shape = resource.shape();
        let fetcher = ResourceFetcher::new(self, &resource);
        let mapper = JsonModel::<T>::new();
        let collection = Collection::new(&fetcher, shape.as_ref(), &mapper);

        self.engine()
            .collect_all_available(&collection, page_size, cursor)
            .await
    }

    async fn page<T>(
        &self,
        resource: &Resource,
        cursor: &Cursor,
        page_size: usize,
    ) -> Result<PageResult<T>>
    where
        T: DeserializeOwned,
    {
        let shape = resource.shape();
        let fetcher = ResourceFetcher::new(self, resource);
        let mapper = JsonModel::<T>::new();
        let collection = Collection::new(&fetcher, shape.as_ref(), &mapper);

        self.engine().fetch_page(&collection, cursor, page_size).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url)
            .field("has_session_store", &self.store.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Resource Fetcher
// ============================================================================

/// Sends the request for one page of a resource through the client
struct ResourceFetcher<'a> {
    client: &'a Client,
    resource: &'a Resource,
}

impl<'a> ResourceFetcher<'a> {
    fn new(client: &'a Client, resource: &'a Resource) -> Self {
        Self { client, resource }
    }
}

#[async_trait]
impl PageFetcher for ResourceFetcher<'_> {
    async fn fetch(&self, cursor: &Cursor, page_size: usize) -> Result<RawResponse> {
        let url = self
            .client
            .endpoints
            .page_url(self.resource, cursor, page_size)?;
        let headers = self
            .client
            .session
            .headers(&self.resource.extra_headers())
            .await;

        self.client
            .transport
            .send(TransportRequest::get(url).with_headers(headers))
            .await
    }

    fn describe(&self) -> String {
        self.resource.describe()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn followers(account_id: &str) -> Resource {
    Resource::Followers {
        account_id: account_id.to_string(),
    }
}

fn following(account_id: &str) -> Resource {
    Resource::Following {
        account_id: account_id.to_string(),
    }
}

fn hashtag(tag: &str) -> Resource {
    Resource::Hashtag {
        tag: tag.to_string(),
    }
}

fn location(location_id: &str) -> Resource {
    Resource::Location {
        location_id: location_id.to_string(),
    }
}

fn media_page_size(count: usize) -> usize {
    count.clamp(1, DEFAULT_MEDIA_PAGE_SIZE)
}

fn capped_page_size(resource: &Resource, count: usize) -> usize {
    let size = count.max(1);
    resource.max_page_size().map_or(size, |cap| size.min(cap))
}
