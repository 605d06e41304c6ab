#![allow(clippy::unwrap_used)]
// End-to-end behaviour of `PostsController`: stores, cursor and selector
// wiring against a wiremock server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use postview_core::{
    CachedFetcher, CoreError, DataCache, FeedConfig, MemoryCache, Post, PostsController,
    SortOrder,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PostsController) {
    let server = MockServer::start().await;
    let cache = Arc::new(MemoryCache::new());
    cache.init().await.unwrap();

    let controller = controller_on(&server, cache);
    (server, controller)
}

/// A controller for `server` reading through `cache`, which may be shared.
fn controller_on(server: &MockServer, cache: Arc<MemoryCache>) -> PostsController {
    let config = FeedConfig::with_base_url(Url::parse(&server.uri()).unwrap());
    let fetcher = CachedFetcher::new(config.page_client().unwrap(), cache).unwrap();
    PostsController::new(config, Arc::new(fetcher)).unwrap()
}

fn posts(ids: &[u64]) -> serde_json::Value {
    ids.iter()
        .map(|id| json!({ "id": id, "userId": 1, "title": format!("post {id}"), "body": "" }))
        .collect()
}

fn ids(controller: &PostsController) -> Vec<u64> {
    controller.posts().get().iter().map(|p| p.id).collect()
}

fn next_header(server: &MockServer, page: u32) -> String {
    format!("<{}/posts?_page={page}&_limit=3>; rel=\"next\"", server.uri())
}

/// Unsorted, unfiltered page `n`.
async fn mount_default_page(server: &MockServer, n: u32, body: serde_json::Value, next: bool) {
    let mut response = ResponseTemplate::new(200).set_body_json(body);
    if next {
        response = response.insert_header("Link", next_header(server, n + 1));
    }
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("_page", n.to_string()))
        .and(query_param("_limit", "3"))
        .and(query_param_is_missing("_sort"))
        .and(query_param_is_missing("userId"))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Count how many fetches start, via the `loading` store.
fn count_loads(controller: &PostsController) -> Arc<AtomicUsize> {
    let loads = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&loads);
    let _ = controller.loading().subscribe(move |loading, _| {
        if *loading {
            sink.fetch_add(1, Ordering::SeqCst);
        }
    });
    loads
}

// ── Loading and pagination ──────────────────────────────────────────

#[tokio::test]
async fn test_start_loads_first_page() {
    let (server, controller) = setup().await;
    mount_default_page(&server, 1, posts(&[1, 2, 3]), true).await;

    assert_eq!(
        controller.next_link().get().unwrap().query(),
        Some("_page=1&_limit=3")
    );

    controller.start().await.unwrap();

    assert_eq!(ids(&controller), vec![1, 2, 3]);
    assert!(!controller.loading().get());
    assert_eq!(controller.error().get(), None);
    assert_eq!(
        controller.next_link().get().unwrap().query(),
        Some("_page=2&_limit=3")
    );

    controller.stop().await;
}

#[tokio::test]
async fn test_fetch_next_appends_until_cursor_ends() {
    let (server, controller) = setup().await;
    mount_default_page(&server, 1, posts(&[1, 2, 3]), true).await;
    mount_default_page(&server, 2, posts(&[4, 5]), false).await;

    controller.start().await.unwrap();
    controller.fetch_next_posts().await.unwrap();

    assert_eq!(ids(&controller), vec![1, 2, 3, 4, 5]);
    assert_eq!(controller.next_link().get(), None);

    // Cursor exhausted: no further request, list unchanged.
    controller.fetch_next_posts().await.unwrap();
    assert_eq!(ids(&controller), vec![1, 2, 3, 4, 5]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    controller.stop().await;
}

#[tokio::test]
async fn test_loading_brackets_each_fetch() {
    let (server, controller) = setup().await;
    mount_default_page(&server, 1, posts(&[1]), false).await;

    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = controller
        .loading()
        .subscribe(move |loading, _| sink.lock().push(*loading));

    controller.start().await.unwrap();
    assert_eq!(*seen.lock(), vec![true, false]);

    controller.stop().await;
}

#[tokio::test]
async fn test_cached_first_page_ends_pagination_without_duplicates() {
    let server = MockServer::start().await;
    mount_default_page(&server, 1, posts(&[1, 2, 3]), true).await;
    mount_default_page(&server, 2, posts(&[4, 5]), false).await;

    let cache = Arc::new(MemoryCache::new());
    cache.init().await.unwrap();

    let warm = controller_on(&server, Arc::clone(&cache));
    warm.start().await.unwrap();
    warm.fetch_next_posts().await.unwrap();
    assert_eq!(ids(&warm), vec![1, 2, 3, 4, 5]);
    warm.stop().await;

    // Page 1 is cached now; its stored cursor is not followed, and the
    // initial one has been spent on the load.
    let controller = controller_on(&server, cache);
    controller.start().await.unwrap();
    assert_eq!(ids(&controller), vec![1, 2, 3]);
    assert_eq!(controller.next_link().get(), None);

    controller.fetch_next_posts().await.unwrap();
    assert_eq!(ids(&controller), vec![1, 2, 3]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    controller.stop().await;
}

#[tokio::test]
async fn test_cached_next_page_is_appended_once() {
    let server = MockServer::start().await;
    mount_default_page(&server, 1, posts(&[1, 2, 3]), true).await;
    mount_default_page(&server, 2, posts(&[4, 5]), true).await;

    let cache = Arc::new(MemoryCache::new());
    cache.init().await.unwrap();

    // Warm page 2 only.
    let config = FeedConfig::with_base_url(Url::parse(&server.uri()).unwrap());
    let fetcher = CachedFetcher::new(config.page_client().unwrap(), Arc::<MemoryCache>::clone(&cache)).unwrap();
    let page_two = Url::parse(&format!("{}/posts?_page=2&_limit=3", server.uri())).unwrap();
    fetcher.fetch_page::<Post>(&page_two).await;

    let controller = controller_on(&server, cache);
    controller.start().await.unwrap();
    controller.fetch_next_posts().await.unwrap();
    controller.fetch_next_posts().await.unwrap();

    assert_eq!(ids(&controller), vec![1, 2, 3, 4, 5]);
    assert_eq!(controller.next_link().get(), None);

    controller.stop().await;
}

// ── Selectors ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_sort_replaces_list_and_reset_restores_defaults() {
    let (server, controller) = setup().await;
    mount_default_page(&server, 1, posts(&[1, 2, 3]), true).await;

    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("_page", "1"))
        .and(query_param("_limit", "3"))
        .and(query_param("_sort", "title"))
        .and(query_param("_order", "asc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(posts(&[50, 8, 31]))
                .insert_header(
                    "Link",
                    format!(
                        "<{}/posts?_page=2&_limit=3&_sort=title&_order=asc>; rel=\"next\"",
                        server.uri()
                    ),
                ),
        )
        .expect(1)
        .mount(&server)
        .await;

    controller.start().await.unwrap();
    controller.sort_by_title(Some(SortOrder::Asc)).await.unwrap();

    assert_eq!(ids(&controller), vec![50, 8, 31]);
    assert_eq!(
        controller.next_link().get().unwrap().query(),
        Some("_page=2&_limit=3&_sort=title&_order=asc")
    );

    controller.reset_filters().await.unwrap();

    assert_eq!(controller.order().get(), None);
    assert_eq!(ids(&controller), vec![1, 2, 3]);
    // The default page came from the cache, which leaves the cleared cursor alone.
    assert_eq!(controller.next_link().get(), None);

    controller.stop().await;
}

#[tokio::test]
async fn test_filter_keeps_current_sort() {
    let (server, controller) = setup().await;
    mount_default_page(&server, 1, posts(&[1, 2, 3]), true).await;

    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("_sort", "title"))
        .and(query_param("_order", "desc"))
        .and(query_param_is_missing("userId"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts(&[9, 8, 7])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("_sort", "title"))
        .and(query_param("_order", "desc"))
        .and(query_param("userId", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 12, "userId": 2, "title": "z", "body": "" },
            { "id": 11, "userId": 2, "title": "a", "body": "" },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    controller.start().await.unwrap();
    controller.sort_by_title(Some(SortOrder::Desc)).await.unwrap();
    controller.filter_by_user(Some(2)).await.unwrap();

    assert_eq!(ids(&controller), vec![12, 11]);
    assert_eq!(controller.order().get(), Some(SortOrder::Desc));
    assert_eq!(controller.user().get(), Some(2));

    controller.stop().await;
}

#[tokio::test]
async fn test_clearing_one_selector_clears_both_with_one_reset() {
    let (server, controller) = setup().await;
    mount_default_page(&server, 1, posts(&[1, 2, 3]), true).await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("_sort", "title"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts(&[4])))
        .mount(&server)
        .await;

    controller.start().await.unwrap();
    controller.sort_by_title(Some(SortOrder::Asc)).await.unwrap();
    controller.filter_by_user(Some(3)).await.unwrap();

    let loads = count_loads(&controller);
    controller.sort_by_title(None).await.unwrap();

    assert_eq!(controller.order().get(), None);
    assert_eq!(controller.user().get(), None);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(ids(&controller), vec![1, 2, 3]);

    controller.stop().await;
}

#[tokio::test]
async fn test_reset_with_nothing_selected_still_fetches_once() {
    let (server, controller) = setup().await;
    mount_default_page(&server, 1, posts(&[1, 2, 3]), true).await;

    controller.start().await.unwrap();
    let loads = count_loads(&controller);

    controller.reset_filters().await.unwrap();

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(ids(&controller), vec![1, 2, 3]);

    controller.stop().await;
}

#[tokio::test]
async fn test_selecting_the_same_order_twice_fetches_once() {
    let (server, controller) = setup().await;
    mount_default_page(&server, 1, posts(&[1]), false).await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("_sort", "title"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts(&[2])))
        .expect(1)
        .mount(&server)
        .await;

    controller.start().await.unwrap();
    let loads = count_loads(&controller);

    controller.sort_by_title(Some(SortOrder::Asc)).await.unwrap();
    controller.sort_by_title(Some(SortOrder::Asc)).await.unwrap();

    assert_eq!(loads.load(Ordering::SeqCst), 1);

    controller.stop().await;
}

// ── Failures and lifecycle ──────────────────────────────────────────

#[tokio::test]
async fn test_failure_sets_error_and_keeps_cursor() {
    let (server, controller) = setup().await;

    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_default_page(&server, 1, posts(&[1, 2, 3]), false).await;

    controller.start().await.unwrap();

    assert!(controller.posts().get().is_empty());
    assert!(controller.error().get().is_some());
    assert_eq!(
        controller.next_link().get().unwrap().query(),
        Some("_page=1&_limit=3")
    );

    // The cursor still points at page 1, so "load more" retries it.
    controller.fetch_next_posts().await.unwrap();

    assert_eq!(ids(&controller), vec![1, 2, 3]);
    assert_eq!(controller.error().get(), None);
    assert_eq!(controller.next_link().get(), None);

    controller.stop().await;
}

#[tokio::test]
async fn test_actions_after_stop_are_rejected() {
    let (server, controller) = setup().await;
    mount_default_page(&server, 1, posts(&[1]), false).await;

    controller.start().await.unwrap();
    controller.stop().await;

    assert!(!controller.is_running());
    assert!(matches!(
        controller.fetch_next_posts().await,
        Err(CoreError::ControllerStopped)
    ));
    assert!(matches!(
        controller.sort_by_title(Some(SortOrder::Asc)).await,
        Err(CoreError::ControllerStopped)
    ));
    assert_eq!(controller.order().subscriber_count(), 0);
}

#[tokio::test]
async fn test_start_twice_is_an_error() {
    let (server, controller) = setup().await;
    mount_default_page(&server, 1, posts(&[1]), false).await;

    controller.start().await.unwrap();
    assert!(controller.start().await.is_err());

    controller.stop().await;
}
