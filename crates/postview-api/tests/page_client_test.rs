#![allow(clippy::unwrap_used)]
// Integration tests for `PageClient` using wiremock.

use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use postview_api::{Error, PageClient, ResourceQuery, SortField, SortOrder};

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Post {
    id: u64,
    user_id: u64,
    title: String,
}

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PageClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = PageClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn posts_body() -> serde_json::Value {
    json!([
        { "id": 1, "userId": 1, "title": "sunt aut facere", "body": "quia et suscipit" },
        { "id": 2, "userId": 1, "title": "qui est esse", "body": "est rerum tempore" },
        { "id": 3, "userId": 1, "title": "ea molestias", "body": "et iusto sed quo" },
    ])
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_first_page_with_next_link() {
    let (server, client) = setup().await;
    let next = format!("{}/posts?_page=2&_limit=3", server.uri());
    let last = format!("{}/posts?_page=34&_limit=3", server.uri());

    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("_page", "1"))
        .and(query_param("_limit", "3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(posts_body())
                .insert_header("Link", format!("<{next}>; rel=\"next\", <{last}>; rel=\"last\"")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let page = client
        .list::<Post>("/posts", &ResourceQuery::page(1, 3))
        .await
        .unwrap();

    assert_eq!(page.items.len(), 3);
    assert_eq!(page.items[0].title, "sunt aut facere");
    assert_eq!(page.next().unwrap().as_str(), next);
    assert_eq!(page.links.get("last").unwrap().as_str(), last);
}

#[tokio::test]
async fn test_last_page_has_no_cursor() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts_body()))
        .mount(&server)
        .await;

    let page = client
        .list::<Post>("/posts", &ResourceQuery::page(34, 3))
        .await
        .unwrap();

    let (items, next) = page.into_parts();
    assert_eq!(items.len(), 3);
    assert!(next.is_none());
}

#[tokio::test]
async fn test_sort_and_filter_parameters_are_sent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("_sort", "title"))
        .and(query_param("_order", "asc"))
        .and(query_param("userId", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let query = ResourceQuery::page(1, 3)
        .sorted(SortField::Title, SortOrder::Asc)
        .for_user(Some(7));
    let page = client.list::<Post>("/posts", &query).await.unwrap();
    assert!(page.items.is_empty());
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_non_success_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = client
        .list::<Post>("/posts", &ResourceQuery::default())
        .await;

    assert!(
        matches!(result, Err(Error::Status { status: 500, .. })),
        "expected Status error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\": \"an array\"}"))
        .mount(&server)
        .await;

    let result = client
        .list::<Post>("/posts", &ResourceQuery::default())
        .await;

    match result {
        Err(Error::Deserialization { body, .. }) => assert!(body.contains("not")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
