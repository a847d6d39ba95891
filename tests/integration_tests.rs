//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: Client → Endpoints → HttpClient →
//! classifier → pagination engine → models, against wiremock.

use chrono::DateTime;
use edgewalk::{Client, ClientConfig, Cursor, Error, FileSessionStore};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .base_url(server.uri())
        .user_agent("edgewalk-it")
        .max_retries(0)
        .no_rate_limit()
        .paging_delay(Duration::ZERO, Duration::ZERO)
        .build()
        .unwrap()
}

/// Matches GraphQL requests by the `after` field of `variables`
fn graphql_after(cursor: Option<&'static str>) -> impl Fn(&Request) -> bool + Send + Sync {
    move |request: &Request| {
        let variables = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "variables")
            .and_then(|(_, raw)| serde_json::from_str::<Value>(&raw).ok());
        let after = variables
            .as_ref()
            .and_then(|v| v.get("after"))
            .and_then(Value::as_str);
        after == cursor
    }
}

/// Matches requests by a plain query parameter, `None` meaning absent
fn query_is(name: &'static str, value: Option<&'static str>) -> impl Fn(&Request) -> bool + Send + Sync {
    move |request: &Request| {
        let found = request
            .url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, v)| v.into_owned());
        found.as_deref() == value
    }
}

fn users(edge: &str, ids: &[&str], has_next: bool, cursor: Option<&str>, count: u64) -> Value {
    let edges: Vec<Value> = ids
        .iter()
        .map(|id| json!({"node": {"id": id, "username": format!("user{id}")}}))
        .collect();
    json!({"data": {"user": {edge: {
        "count": count,
        "edges": edges,
        "page_info": {"has_next_page": has_next, "end_cursor": cursor}
    }}}})
}

fn tag_feed(media: &[(&str, i64)], has_next: bool, cursor: Option<&str>) -> Value {
    let edges: Vec<Value> = media
        .iter()
        .map(|(id, ts)| json!({"node": {"id": id, "taken_at_timestamp": ts}}))
        .collect();
    json!({"graphql": {"hashtag": {
        "edge_hashtag_to_media": {
            "count": 1000,
            "edges": edges,
            "page_info": {"has_next_page": has_next, "end_cursor": cursor}
        },
        "edge_hashtag_to_top_posts": {
            "edges": [{"node": {"id": "top1"}}, {"node": {"id": "top2"}}]
        }
    }}})
}

// ============================================================================
// Followers
// ============================================================================

#[tokio::test]
async fn test_followers_walk_bootstraps_session_cookies() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graphql/query/"))
        .and(graphql_after(None))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(users("edge_followed_by", &["1", "2"], true, Some("c1"), 5))
                .append_header("set-cookie", "csrftoken=t1; Path=/")
                .append_header("set-cookie", "sessionid=s1; Secure; HttpOnly"),
        )
        .expect(1)
        .mount(&server)
        .await;

    // second page only answers when the bootstrapped cookies come back
    Mock::given(method("GET"))
        .and(path("/graphql/query/"))
        .and(graphql_after(Some("c1")))
        .and(header("cookie", "csrftoken=t1; sessionid=s1"))
        .and(header("x-csrftoken", "t1"))
        .and(header("user-agent", "edgewalk-it"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(users("edge_followed_by", &["3", "4"], true, Some("c2"), 5))
                .append_header("set-cookie", "sessionid=ignored"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let followers = client.get_followers("42", 4, 2, true).await.unwrap();

    let ids: Vec<_> = followers.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
    assert_eq!(followers[0].username, "user1");
    assert_eq!(client.session().session_id().await.as_deref(), Some("s1"));
}

#[tokio::test]
async fn test_followers_count_below_page_size_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let err = client.get_followers("42", 10, 20, false).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Invalid request: Count must be greater than or equal to page size."
    );
}

#[tokio::test]
async fn test_private_account_following_is_forbidden() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graphql/query/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(users("edge_follow", &[], false, None, 120)),
        )
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let err = client.get_following("42", 20, 20, false).await.unwrap_err();

    assert!(matches!(err, Error::Forbidden { .. }));
}

#[tokio::test]
async fn test_paginate_followers_keeps_partial_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graphql/query/"))
        .and(graphql_after(None))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(users("edge_followed_by", &["1", "2"], true, Some("c1"), 10)),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/graphql/query/"))
        .and(graphql_after(Some("c1")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let page = client
        .get_paginate_followers("42", 10, 2, false, Cursor::start())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert!(page.has_next_page);
    assert_eq!(page.next_cursor, Some(Cursor::from("c1")));
    match page.interrupted {
        Some(Error::HttpStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, " message => boom;");
        }
        other => panic!("Expected HttpStatus interruption, got {other:?}"),
    }
}

#[tokio::test]
async fn test_paginate_all_followers_reports_total() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graphql/query/"))
        .and(graphql_after(Some("start")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(users("edge_followed_by", &["e1", "e2", "e3"], true, Some("X"), 5)),
        )
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let page = client
        .get_paginate_all_followers("42", 3, "start")
        .await
        .unwrap();

    assert_eq!(page.items.len(), 3);
    assert_eq!(page.count, Some(5));
    assert!(page.has_next_page);
    assert_eq!(page.next_cursor, Some(Cursor::from("X")));
}

// ============================================================================
// Media feeds
// ============================================================================

#[tokio::test]
async fn test_tag_feed_stops_at_duplicate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/explore/tags/rust/"))
        .and(query_param("__a", "1"))
        .and(query_is("max_id", None))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(tag_feed(&[("m1", 900), ("m2", 800)], true, Some("t1"))),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/explore/tags/rust/"))
        .and(query_is("max_id", Some("t1")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(tag_feed(&[("m3", 700), ("m1", 900)], true, Some("t2"))),
        )
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let media = client
        .get_medias_by_tag("rust", 50, Cursor::start(), None)
        .await
        .unwrap();

    let ids: Vec<_> = media.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2", "m3"]);
}

#[tokio::test]
async fn test_tag_feed_stops_at_min_timestamp() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/explore/tags/rust/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tag_feed(
            &[("m1", 900), ("m2", 800), ("m3", 100)],
            true,
            Some("t1"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let media = client
        .get_medias_by_tag("rust", 50, Cursor::start(), DateTime::from_timestamp(500, 0))
        .await
        .unwrap();

    assert_eq!(media.len(), 2);
}

#[tokio::test]
async fn test_current_top_medias_by_tag() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/explore/tags/rust/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tag_feed(&[], false, None)))
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let top = client.get_current_top_medias_by_tag("rust").await.unwrap();

    let ids: Vec<_> = top.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["top1", "top2"]);
}

#[tokio::test]
async fn test_current_top_medias_by_location() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/explore/locations/213385402/"))
        .and(query_param("__a", "1"))
        .and(query_is("max_id", None))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "location": {
                "id": "213385402",
                "top_posts": {"nodes": [
                    {"id": "lt1", "code": "Q1", "taken_at_timestamp": 10},
                    {"id": "lt2", "code": "Q2", "taken_at_timestamp": 20}
                ]}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let top = client
        .get_current_top_medias_by_location_id("213385402")
        .await
        .unwrap();

    let ids: Vec<_> = top.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["lt1", "lt2"]);
    assert_eq!(top[1].shortcode.as_deref(), Some("Q2"));
}

#[tokio::test]
async fn test_unknown_location_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/explore/locations/999/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let err = client
        .get_medias_by_location_id("999", 24, Cursor::start())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Not found: Location 999 does not exist");
}

#[tokio::test]
async fn test_account_media_single_page() {
    let server = MockServer::start().await;

    let body = json!({"data": {"user": {"edge_owner_to_timeline_media": {
        "count": 40,
        "edges": [
            {"node": {"id": "p1", "shortcode": "A", "taken_at_timestamp": 1}},
            {"node": {"id": "p2", "shortcode": "B", "taken_at_timestamp": 2}}
        ],
        "page_info": {"has_next_page": true, "end_cursor": "m2"}
    }}}});
    Mock::given(method("GET"))
        .and(path("/graphql/query/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let page = client
        .get_paginate_medias_by_user_id("42", 2, Cursor::start())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.next_cursor, Some(Cursor::from("m2")));
    assert_eq!(page.total_count, Some(40));
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_accounts_by_username() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/web/search/topsearch/"))
        .and(query_param("query", "jane"))
        .and(query_param("count", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "users": [
                {"position": 0, "user": {"pk": 11, "username": "jane"}},
                {"position": 1, "user": {"pk": "12", "username": "jane_doe"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let accounts = client.search_accounts_by_username("jane", 2).await.unwrap();

    let found: Vec<_> = accounts
        .iter()
        .map(|a| (a.id.as_str(), a.username.as_str()))
        .collect();
    assert_eq!(found, vec![("11", "jane"), ("12", "jane_doe")]);
}

#[tokio::test]
async fn test_search_without_users_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/web/search/topsearch/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let accounts = client.search_accounts_by_username("nobody", 10).await.unwrap();

    assert!(accounts.is_empty());
}

#[tokio::test]
async fn test_search_requires_status_ok() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/web/search/topsearch/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "fail"})))
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let err = client
        .search_accounts_by_username("jane", 10)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol { .. }));
}

// ============================================================================
// Threads
// ============================================================================

#[tokio::test]
async fn test_threads_follow_oldest_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/direct_v2/inbox/"))
        .and(header("x-ig-app-id", "936619743392459"))
        .and(query_is("cursor", None))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "inbox": {
                "threads": [{"thread_id": "t1"}, {"thread_id": "t2"}],
                "has_older": true,
                "oldest_cursor": "older"
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/direct_v2/inbox/"))
        .and(query_is("cursor", Some("older")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "inbox": {"threads": [{"thread_id": "t3"}], "has_older": false}
        })))
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    let threads = client.get_threads(10, 2, 5).await.unwrap();

    let ids: Vec<_> = threads.iter().map(|t| t.thread_id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);

    let first = client
        .get_paginate_threads(2, 5, Cursor::start())
        .await
        .unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.page_info.next_cursor(), Some(Cursor::from("older")));
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_credentials_are_sent_and_persisted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graphql/query/"))
        .and(header("cookie", "csrftoken=tok; sessionid=sid"))
        .and(header("x-csrftoken", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"shortcode_media": {"edge_liked_by": {
                "count": 1,
                "edges": [{"node": {"id": "7", "username": "liker"}}],
                "page_info": {"has_next_page": false, "end_cursor": null}
            }}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileSessionStore::new(dir.path()));

    let client = Client::with_credentials(
        config(&server),
        "sid",
        "tok",
        "sessionid=sid; csrftoken=tok",
    )
    .unwrap()
    .with_session_store(store.clone());

    let likes = client
        .get_media_likes_by_code("BxYz", 10, Cursor::start())
        .await
        .unwrap();
    assert_eq!(likes[0].username, "liker");

    client.save_session().await.unwrap();

    let restored = Client::new(config(&server))
        .unwrap()
        .with_session_store(store);
    assert!(restored.load_session("sid").await.unwrap());
    let session = restored.session().snapshot().await;
    assert_eq!(session.csrf_token.as_deref(), Some("tok"));
    assert_eq!(session.user_agent.as_deref(), Some("edgewalk-it"));
}

#[tokio::test]
async fn test_cancelled_client_stops_before_sending() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    client.cancellation_token().cancel();

    let err = client
        .get_media_comments_by_code("BxYz", 10, Cursor::start())
        .await
        .unwrap_err();

    assert!(err.is_interruption());
}
