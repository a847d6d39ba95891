//! Endpoint catalogue
//!
//! Maps each paginated resource to its URL and the shape of its payload.
//! GraphQL resources are addressed by `query_hash` plus a JSON `variables`
//! parameter; the explore feeds and the direct inbox use plain query strings.

use crate::error::{Error, Result};
use crate::pagination::{ConnectionShape, Cursor, ListShape, PageShape};
use crate::types::StringMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use url::Url;

/// Default site root
pub const DEFAULT_BASE_URL: &str = "https://www.instagram.com";

/// App id the web client sends to private API paths
pub const X_IG_APP_ID: &str = "936619743392459";

/// Server-side ceiling on comments per request
pub const MAX_COMMENTS_PER_REQUEST: usize = 300;

/// Server-side ceiling on likes per request
pub const MAX_LIKES_PER_REQUEST: usize = 300;

// ============================================================================
// Query Hashes
// ============================================================================

/// Persisted GraphQL query identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHashes {
    /// Accounts following a user
    #[serde(default = "default_followers_hash")]
    pub followers: String,

    /// Accounts a user follows
    #[serde(default = "default_following_hash")]
    pub following: String,

    /// A user's timeline media
    #[serde(default = "default_account_media_hash")]
    pub account_media: String,

    /// Comments on a media item
    #[serde(default = "default_comments_hash")]
    pub comments: String,

    /// Accounts that liked a media item
    #[serde(default = "default_likes_hash")]
    pub likes: String,
}

impl Default for QueryHashes {
    fn default() -> Self {
        Self {
            followers: default_followers_hash(),
            following: default_following_hash(),
            account_media: default_account_media_hash(),
            comments: default_comments_hash(),
            likes: default_likes_hash(),
        }
    }
}

fn default_followers_hash() -> String {
    "c76146de99bb02f6415203be841dd25a".to_string()
}

fn default_following_hash() -> String {
    "d04b0a864b4b54837c0d870b0e77e076".to_string()
}

fn default_account_media_hash() -> String {
    "42323d64886122307be10013ad2dcc44".to_string()
}

fn default_comments_hash() -> String {
    "33ba35852cb50da46f5b5e889df7d159".to_string()
}

fn default_likes_hash() -> String {
    "d5d763b1e2acf209d62d22d184488e57".to_string()
}

// ============================================================================
// Resources
// ============================================================================

/// A paginated collection on the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// Accounts following `account_id`
    Followers { account_id: String },
    /// Accounts `account_id` follows
    Following { account_id: String },
    /// Timeline media of `account_id`
    AccountMedia { account_id: String },
    /// Recent media under a hashtag
    Hashtag { tag: String },
    /// Current top posts under a hashtag
    HashtagTop { tag: String },
    /// Recent media at a location
    Location { location_id: String },
    /// Current top posts at a location
    LocationTop { location_id: String },
    /// Comments on the media with `shortcode`
    Comments { shortcode: String },
    /// Accounts that liked the media with `shortcode`
    Likes { shortcode: String },
    /// Direct inbox threads, each with up to `message_limit` messages
    Threads { message_limit: usize },
    /// Accounts whose username matches `query`
    AccountSearch { query: String },
}

impl Resource {
    /// Payload shape of this resource
    pub fn shape(&self) -> Box<dyn PageShape> {
        match self {
            Self::Followers { .. } => Box::new(
                ConnectionShape::new("/data/user/edge_followed_by")
                    .with_required_count()
                    .private_when_empty(),
            ),
            Self::Following { .. } => Box::new(
                ConnectionShape::new("/data/user/edge_follow")
                    .with_required_count()
                    .private_when_empty(),
            ),
            Self::AccountMedia { .. } => Box::new(ConnectionShape::new(
                "/data/user/edge_owner_to_timeline_media",
            )),
            Self::Hashtag { .. } => Box::new(
                ConnectionShape::new("/graphql/hashtag/edge_hashtag_to_media").time_ordered(),
            ),
            Self::HashtagTop { .. } => Box::new(
                ConnectionShape::new("/graphql/hashtag/edge_hashtag_to_top_posts")
                    .without_page_info(),
            ),
            Self::Location { .. } => Box::new(ConnectionShape::new(
                "/graphql/location/edge_location_to_media",
            )),
            Self::LocationTop { .. } => Box::new(ListShape::new("/location/top_posts", "nodes")),
            Self::Comments { .. } => Box::new(
                ConnectionShape::new("/data/shortcode_media/edge_media_to_comment")
                    .with_required_count(),
            ),
            Self::Likes { .. } => Box::new(ConnectionShape::new(
                "/data/shortcode_media/edge_liked_by",
            )),
            Self::Threads { .. } => Box::new(
                ListShape::new("/inbox", "threads")
                    .with_paging("has_older", "oldest_cursor")
                    .expect_status_ok(),
            ),
            Self::AccountSearch { .. } => Box::new(
                ListShape::new("", "users")
                    .with_node_key("user")
                    .expect_status_ok(),
            ),
        }
    }

    /// Human-readable name, used in errors and logs
    pub fn describe(&self) -> String {
        match self {
            Self::Followers { account_id } => format!("Followers of account {account_id}"),
            Self::Following { account_id } => format!("Following of account {account_id}"),
            Self::AccountMedia { account_id } => format!("Media of account {account_id}"),
            Self::Hashtag { tag } | Self::HashtagTop { tag } => format!("Tag #{tag}"),
            Self::Location { location_id } | Self::LocationTop { location_id } => {
                format!("Location {location_id}")
            }
            Self::Comments { shortcode } => format!("Comments of media {shortcode}"),
            Self::Likes { shortcode } => format!("Likes of media {shortcode}"),
            Self::Threads { .. } => "Direct inbox".to_string(),
            Self::AccountSearch { query } => format!("Account search '{query}'"),
        }
    }

    /// Per-request ceiling imposed by the server, if any
    pub fn max_page_size(&self) -> Option<usize> {
        match self {
            Self::Comments { .. } => Some(MAX_COMMENTS_PER_REQUEST),
            Self::Likes { .. } => Some(MAX_LIKES_PER_REQUEST),
            _ => None,
        }
    }

    /// Headers this resource needs on top of the session headers
    pub fn extra_headers(&self) -> StringMap {
        let mut headers = StringMap::new();
        if let Self::Threads { .. } = self {
            headers.insert("x-ig-app-id".to_string(), X_IG_APP_ID.to_string());
        }
        headers
    }
}

// ============================================================================
// URL Builder
// ============================================================================

/// Builds request URLs for resources
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
    hashes: QueryHashes,
}

impl Endpoints {
    /// Create a builder rooted at `base_url`
    pub fn new(base_url: &str, hashes: QueryHashes) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(Error::invalid_config(
                "base_url",
                format!("'{base_url}' is not an http(s) URL"),
            ));
        }
        Ok(Self { base, hashes })
    }

    /// Site root, used as the `referer`
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL of the page at `cursor` holding at most `page_size` items
    pub fn page_url(&self, resource: &Resource, cursor: &Cursor, page_size: usize) -> Result<Url> {
        match resource {
            Resource::Followers { account_id } => self.graphql(
                &self.hashes.followers,
                relational_variables(account_id, page_size, cursor),
            ),
            Resource::Following { account_id } => self.graphql(
                &self.hashes.following,
                relational_variables(account_id, page_size, cursor),
            ),
            Resource::AccountMedia { account_id } => self.graphql(
                &self.hashes.account_media,
                connection_variables("id", account_id, page_size, cursor),
            ),
            Resource::Comments { shortcode } => self.graphql(
                &self.hashes.comments,
                connection_variables("shortcode", shortcode, page_size, cursor),
            ),
            Resource::Likes { shortcode } => {
                let mut variables = connection_variables("shortcode", shortcode, page_size, cursor);
                variables.insert("include_reel".to_string(), json!(true));
                self.graphql(&self.hashes.likes, variables)
            }
            Resource::Hashtag { tag } => self.explore(&["explore", "tags", tag], cursor),
            Resource::HashtagTop { tag } => {
                self.explore(&["explore", "tags", tag], &Cursor::start())
            }
            Resource::Location { location_id } => {
                self.explore(&["explore", "locations", location_id], cursor)
            }
            Resource::LocationTop { location_id } => {
                self.explore(&["explore", "locations", location_id], &Cursor::start())
            }
            Resource::AccountSearch { query } => {
                let mut url = self.path(&["web", "search", "topsearch"])?;
                url.query_pairs_mut()
                    .append_pair("query", query)
                    .append_pair("count", &page_size.to_string());
                Ok(url)
            }
            Resource::Threads { message_limit } => {
                let mut url = self.path(&["api", "v1", "direct_v2", "inbox"])?;
                {
                    let mut query = url.query_pairs_mut();
                    query
                        .append_pair("limit", &page_size.to_string())
                        .append_pair("thread_message_limit", &message_limit.to_string());
                    if !cursor.is_start() {
                        query.append_pair("cursor", cursor.as_str());
                    }
                }
                Ok(url)
            }
        }
    }

    fn graphql(&self, query_hash: &str, variables: Map<String, Value>) -> Result<Url> {
        let mut url = self.path(&["graphql", "query"])?;
        url.query_pairs_mut()
            .append_pair("query_hash", query_hash)
            .append_pair("variables", &Value::Object(variables).to_string());
        Ok(url)
    }

    fn explore(&self, segments: &[&str], cursor: &Cursor) -> Result<Url> {
        let mut url = self.path(segments)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("__a", "1");
            if !cursor.is_start() {
                query.append_pair("max_id", cursor.as_str());
            }
        }
        Ok(url)
    }

    /// Base URL plus percent-encoded segments and a trailing slash
    fn path(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|()| Error::config(format!("'{}' cannot carry a path", self.base)))?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }
}

fn connection_variables(
    key: &str,
    value: &str,
    page_size: usize,
    cursor: &Cursor,
) -> Map<String, Value> {
    let mut variables = Map::new();
    variables.insert(key.to_string(), json!(value));
    variables.insert("first".to_string(), json!(page_size));
    if !cursor.is_start() {
        variables.insert("after".to_string(), json!(cursor.as_str()));
    }
    variables
}

fn relational_variables(account_id: &str, page_size: usize, cursor: &Cursor) -> Map<String, Value> {
    let mut variables = connection_variables("id", account_id, page_size, cursor);
    variables.insert("include_reel".to_string(), json!(true));
    variables.insert("fetch_mutual".to_string(), json!(false));
    variables
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn endpoints() -> Endpoints {
        Endpoints::new("https://www.instagram.com", QueryHashes::default()).unwrap()
    }

    fn variables(url: &Url) -> Value {
        let (_, raw) = url
            .query_pairs()
            .find(|(key, _)| key == "variables")
            .unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_followers_url() {
        let resource = Resource::Followers {
            account_id: "42".to_string(),
        };
        let url = endpoints()
            .page_url(&resource, &Cursor::from("QVFE"), 20)
            .unwrap();

        assert_eq!(url.path(), "/graphql/query/");
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "query_hash" && v == "c76146de99bb02f6415203be841dd25a"));
        let vars = variables(&url);
        assert_eq!(vars["id"], "42");
        assert_eq!(vars["first"], 20);
        assert_eq!(vars["after"], "QVFE");
    }

    #[test]
    fn test_first_page_has_no_after() {
        let resource = Resource::Comments {
            shortcode: "BxYz".to_string(),
        };
        let url = endpoints()
            .page_url(&resource, &Cursor::start(), 300)
            .unwrap();

        let vars = variables(&url);
        assert_eq!(vars["shortcode"], "BxYz");
        assert!(vars.get("after").is_none());
    }

    #[test]
    fn test_hashtag_url_encodes_tag() {
        let resource = Resource::Hashtag {
            tag: "café".to_string(),
        };
        let url = endpoints()
            .page_url(&resource, &Cursor::from("abc"), 12)
            .unwrap();

        assert_eq!(url.path(), "/explore/tags/caf%C3%A9/");
        assert_eq!(url.query(), Some("__a=1&max_id=abc"));
    }

    #[test]
    fn test_threads_url() {
        let resource = Resource::Threads { message_limit: 5 };
        let url = endpoints()
            .page_url(&resource, &Cursor::from("oc"), 10)
            .unwrap();

        assert_eq!(url.path(), "/api/v1/direct_v2/inbox/");
        assert_eq!(
            url.query(),
            Some("limit=10&thread_message_limit=5&cursor=oc")
        );
        assert_eq!(
            resource.extra_headers().get("x-ig-app-id").map(String::as_str),
            Some(X_IG_APP_ID)
        );
    }

    #[test]
    fn test_account_search_url() {
        let resource = Resource::AccountSearch {
            query: "jane doe".to_string(),
        };
        let url = endpoints()
            .page_url(&resource, &Cursor::start(), 10)
            .unwrap();

        assert_eq!(url.path(), "/web/search/topsearch/");
        assert_eq!(url.query(), Some("query=jane+doe&count=10"));
        assert!(resource.shape().expects_status_ok());
    }

    #[test]
    fn test_location_top_ignores_cursor() {
        let resource = Resource::LocationTop {
            location_id: "123".to_string(),
        };
        let url = endpoints()
            .page_url(&resource, &Cursor::from("ignored"), 50)
            .unwrap();

        assert_eq!(url.path(), "/explore/locations/123/");
        assert_eq!(url.query(), Some("__a=1"));
    }

    #[test]
    fn test_base_url_with_port_and_path() {
        let endpoints =
            Endpoints::new("http://127.0.0.1:8080/mock/", QueryHashes::default()).unwrap();
        let resource = Resource::Location {
            location_id: "123".to_string(),
        };
        let url = endpoints
            .page_url(&resource, &Cursor::start(), 24)
            .unwrap();

        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/mock/explore/locations/123/?__a=1"
        );
    }

    #[test_case("ftp://example.com" ; "wrong scheme")]
    #[test_case("mailto:someone@example.com" ; "cannot be a base")]
    #[test_case("not a url" ; "unparseable")]
    fn test_invalid_base_url(base: &str) {
        assert!(Endpoints::new(base, QueryHashes::default()).is_err());
    }

    #[test_case(Resource::Comments { shortcode: "x".into() }, Some(300))]
    #[test_case(Resource::Likes { shortcode: "x".into() }, Some(300))]
    #[test_case(Resource::Followers { account_id: "1".into() }, None)]
    fn test_max_page_size(resource: Resource, expected: Option<usize>) {
        assert_eq!(resource.max_page_size(), expected);
    }

    #[test]
    fn test_shapes_flags() {
        let followers = Resource::Followers {
            account_id: "1".to_string(),
        }
        .shape();
        assert_eq!(
            followers.empty_page(),
            crate::pagination::EmptyPagePolicy::ForbiddenWhenCounted
        );

        let tag = Resource::Hashtag {
            tag: "rust".to_string(),
        }
        .shape();
        assert!(tag.applies_cutoff());

        let threads = Resource::Threads { message_limit: 10 }.shape();
        assert!(threads.expects_status_ok());
    }
}
