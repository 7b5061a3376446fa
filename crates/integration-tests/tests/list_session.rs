//! List sessions end to end: debounced search, paging and stale responses.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use pocketshop_core::ViewMode;
use pocketshop_integration_tests::{FakeCatalog, within};
use pocketshop_storefront::error::FetchErrorKind;
use pocketshop_storefront::listing::{ListCommand, Notice};
use pocketshop_storefront::state::AppState;

#[tokio::test]
async fn test_phone_search_then_list_mode() {
    let fake = FakeCatalog::start().await;
    let state = AppState::new(fake.config()).unwrap();
    let list = state.list_session();
    within(list.settled()).await.unwrap();

    list.search("phone").await.unwrap();
    let grid = within(list.wait_for(|s| s.search_term == "phone" && !s.loading))
        .await
        .unwrap();
    assert_eq!(grid.products.len(), 5);
    assert_eq!(grid.total, Some(5));
    assert!(!grid.shows_pagination());
    assert_eq!(
        fake.searches_for("phone"),
        vec!["/products/search?q=phone&limit=20&skip=0"]
    );

    list.set_view_mode(ViewMode::List).await.unwrap();
    let listed = within(list.wait_for(|s| {
        s.view_mode == ViewMode::List && !s.loading && s.total.is_some()
    }))
    .await
    .unwrap();
    assert_eq!(listed.page, 1);
    assert_eq!(listed.products.len(), 5);
    assert_eq!(fake.searches_for("phone").len(), 2);

    list.near_end().await.unwrap();
    within(list.wait_for(|s| s.notice == Some(Notice::NoMoreItems)))
        .await
        .unwrap();
    assert_eq!(fake.searches_for("phone").len(), 2);

    within(list.wait_for(|s| s.notice.is_none())).await.unwrap();
    list.shutdown().await;
}

#[tokio::test]
async fn test_typing_burst_sends_one_search() {
    let fake = FakeCatalog::start().await;
    let state = AppState::new(fake.config()).unwrap();
    let list = state.list_session();
    within(list.settled()).await.unwrap();

    for text in ["l", "la", "lam", "lamp"] {
        list.search(text).await.unwrap();
    }
    within(list.wait_for(|s| s.search_term == "lamp" && !s.loading))
        .await
        .unwrap();

    let searches: Vec<String> = fake
        .requests()
        .into_iter()
        .filter(|r| r.starts_with("/products/search?q=l"))
        .collect();
    assert_eq!(searches, vec!["/products/search?q=lamp&limit=20&skip=0"]);
}

#[tokio::test]
async fn test_slow_response_for_old_term_is_ignored() {
    let fake = FakeCatalog::start().await;
    fake.delay_term("phone", Duration::from_millis(600));
    let state = AppState::new(fake.config()).unwrap();
    let list = state.list_session();
    within(list.settled()).await.unwrap();

    list.search("phone").await.unwrap();
    within(async {
        while fake.searches_for("phone").is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    list.search("lamp").await.unwrap();
    within(list.wait_for(|s| s.search_term == "lamp" && !s.loading))
        .await
        .unwrap();

    // Give the slow "phone" response time to arrive.
    tokio::time::sleep(Duration::from_millis(800)).await;
    let snapshot = list.snapshot();
    assert_eq!(snapshot.search_term, "lamp");
    assert_eq!(snapshot.total, Some(40));
    assert!(snapshot.products.iter().all(|p| p.title.starts_with("Desk Lamp")));
}

#[tokio::test]
async fn test_grid_pages_replace_list_pages_accumulate() {
    let fake = FakeCatalog::start().await;
    let state = AppState::new(fake.config()).unwrap();
    let list = state.list_session();
    within(list.settled()).await.unwrap();

    list.search("lamp").await.unwrap();
    let first = within(list.wait_for(|s| s.search_term == "lamp" && !s.loading))
        .await
        .unwrap();
    assert!(first.shows_pagination());
    assert_eq!(first.page_count(), 2);

    list.go_to_page(2).await.unwrap();
    let second = within(list.wait_for(|s| s.page == 2 && !s.loading))
        .await
        .unwrap();
    assert_eq!(second.products.len(), 20);
    assert_eq!(second.products[0].id.as_u32(), 26);

    list.set_view_mode(ViewMode::List).await.unwrap();
    within(list.wait_for(|s| s.view_mode == ViewMode::List && s.page == 1 && !s.loading))
        .await
        .unwrap();
    list.near_end().await.unwrap();
    let accumulated = within(list.wait_for(|s| s.page == 2 && !s.loading))
        .await
        .unwrap();
    assert_eq!(accumulated.products.len(), 40);
    assert!(!accumulated.shows_pagination());

    list.near_end().await.unwrap();
    let done = within(list.wait_for(|s| s.notice.is_some())).await.unwrap();
    assert_eq!(done.products.len(), 40);
}

#[tokio::test]
async fn test_rate_limit_is_shown_and_retry_recovers() {
    let fake = FakeCatalog::start().await;
    let state = AppState::new(fake.config()).unwrap();
    let list = state.list_session();
    within(list.settled()).await.unwrap();

    fake.set_throttled(true);
    list.search("phone").await.unwrap();
    let failed = within(list.wait_for(|s| s.search_term == "phone" && !s.loading))
        .await
        .unwrap();
    let error = failed.error.as_ref().unwrap();
    assert_eq!(error.kind, FetchErrorKind::RateLimited);
    assert!(failed.products.is_empty());
    assert!(failed.is_empty());

    fake.set_throttled(false);
    list.send(ListCommand::Retry).await.unwrap();
    let recovered = within(list.wait_for(|s| s.products.len() == 5 && !s.loading))
        .await
        .unwrap();
    assert!(recovered.error.is_none());
}

#[tokio::test]
async fn test_list_mode_retry_after_failed_page_reloads_from_start() {
    let fake = FakeCatalog::start().await;
    let state = AppState::new(fake.config()).unwrap();
    let list = state.list_session();
    within(list.settled()).await.unwrap();

    list.search("lamp").await.unwrap();
    within(list.wait_for(|s| s.search_term == "lamp" && !s.loading))
        .await
        .unwrap();
    list.set_view_mode(ViewMode::List).await.unwrap();
    within(list.wait_for(|s| s.view_mode == ViewMode::List && !s.loading))
        .await
        .unwrap();

    fake.set_throttled(true);
    list.near_end().await.unwrap();
    let failed = within(list.wait_for(|s| s.page == 2 && !s.loading))
        .await
        .unwrap();
    assert_eq!(failed.error.unwrap().kind, FetchErrorKind::RateLimited);
    assert!(failed.products.is_empty());

    fake.set_throttled(false);
    list.send(ListCommand::Retry).await.unwrap();
    let restarted = within(list.wait_for(|s| s.error.is_none() && !s.loading))
        .await
        .unwrap();
    assert_eq!(restarted.page, 1);
    assert_eq!(restarted.products.len(), 20);

    list.near_end().await.unwrap();
    let accumulated = within(list.wait_for(|s| s.page == 2 && !s.loading))
        .await
        .unwrap();
    assert_eq!(accumulated.products.len(), 40);
    assert_eq!(accumulated.products[0].id.as_u32(), 6);
    assert_eq!(accumulated.products[39].id.as_u32(), 45);

    list.near_end().await.unwrap();
    let done = within(list.wait_for(|s| s.notice.is_some())).await.unwrap();
    assert_eq!(done.products.len(), 40);
}

#[tokio::test]
async fn test_page_navigation_while_search_loads_is_ignored() {
    let fake = FakeCatalog::start().await;
    fake.delay_term("phone", Duration::from_millis(300));
    let state = AppState::new(fake.config()).unwrap();
    let list = state.list_session();
    let browse = within(list.settled()).await.unwrap();
    assert_eq!(browse.page_count(), 3);

    list.search("phone").await.unwrap();
    let pending = within(list.wait_for(|s| s.search_term == "phone" && s.loading))
        .await
        .unwrap();
    assert_eq!(pending.total, None);
    list.go_to_page(3).await.unwrap();

    let done = within(list.wait_for(|s| s.search_term == "phone" && !s.loading))
        .await
        .unwrap();
    assert_eq!(done.page, 1);
    assert_eq!(done.products.len(), 5);
    assert_eq!(
        fake.searches_for("phone"),
        vec!["/products/search?q=phone&limit=20&skip=0"]
    );
}
