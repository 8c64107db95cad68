mod common;

use common::{page_of, store_with, wait_for_store, ScriptedSource};
use popular_repos::actors::{view_stats, ListView, ListViewArgs, ListViewMessage, ViewStats};
use popular_repos::trigger::ObserverOptions;
use std::sync::Arc;
use std::time::Duration;

const VIEWPORT_ROWS: u32 = 24;
const ROWS_PER_ITEM: u32 = 3;

fn args(
    store: Arc<popular_repos::store::RepositoryStore<Arc<ScriptedSource>>>,
) -> ListViewArgs<Arc<ScriptedSource>> {
    ListViewArgs {
        store,
        viewport_rows: VIEWPORT_ROWS,
        rows_per_item: ROWS_PER_ITEM,
        observer: ObserverOptions::default(),
    }
}

#[test]
fn test_visible_end() {
    let stats = ViewStats {
        offset: 24,
        viewport_rows: 24,
        rows_per_item: 3,
        content_rows: 120,
        repositories: 40,
        page: 3,
        loading: false,
        sentinel_visible: false,
        demands_fired: 2,
    };
    assert_eq!(stats.visible_end(), 16);

    let partial = ViewStats {
        offset: 1,
        ..stats.clone()
    };
    // Row 24 belongs to the 9th item
    assert_eq!(partial.visible_end(), 9);

    let short = ViewStats {
        offset: 0,
        repositories: 4,
        ..stats
    };
    assert_eq!(short.visible_end(), 4);
}

#[tokio::test]
async fn test_empty_list_requests_first_page() {
    let (store, source) = store_with(ScriptedSource::new().with_page(page_of(1, 20)));

    let (view, handle) = ListView::spawn(args(Arc::clone(&store)))
        .await
        .expect("Failed to spawn list view");

    wait_for_store(&store, |s| s.page == 2 && !s.loading).await;

    assert_eq!(store.len(), 20);
    assert_eq!(source.requested(), vec![1]);

    let stats = view_stats(&view).await.expect("Failed to get stats");
    assert_eq!(stats.repositories, 20);
    assert_eq!(stats.content_rows, 60);
    assert_eq!(stats.demands_fired, 1);

    view.stop(None);
    handle.await.expect("List view failed");
}

#[tokio::test]
async fn test_scrolling_to_sentinel_loads_next_page() {
    let (store, source) = store_with(
        ScriptedSource::new()
            .with_page(page_of(1, 20))
            .with_page(page_of(21, 20)),
    );

    // Page one is loaded before the view attaches
    store.fetch_next().await;

    let (view, handle) = ListView::spawn(args(Arc::clone(&store)))
        .await
        .expect("Failed to spawn list view");

    let stats = view_stats(&view).await.expect("Failed to get stats");
    assert!(!stats.sentinel_visible);
    assert_eq!(stats.demands_fired, 0);

    view.send_message(ListViewMessage::ScrollBy(i64::from(VIEWPORT_ROWS)))
        .expect("Failed to scroll");

    wait_for_store(&store, |s| s.page == 3 && !s.loading).await;
    assert_eq!(store.len(), 40);
    assert_eq!(source.requested(), vec![1, 2]);

    let stats = view_stats(&view).await.expect("Failed to get stats");
    assert_eq!(stats.offset, VIEWPORT_ROWS);
    assert_eq!(stats.content_rows, 120);
    assert_eq!(stats.demands_fired, 1);

    view.stop(None);
    handle.await.expect("List view failed");
}

#[tokio::test]
async fn test_scroll_is_clamped() {
    let (store, _source) = store_with(ScriptedSource::new().with_page(page_of(1, 2)));
    store.fetch_next().await;

    let (view, handle) = ListView::spawn(args(Arc::clone(&store)))
        .await
        .expect("Failed to spawn list view");

    view.send_message(ListViewMessage::ScrollBy(-100)).expect("Failed to scroll");
    let stats = view_stats(&view).await.expect("Failed to get stats");
    assert_eq!(stats.offset, 0);

    view.send_message(ListViewMessage::ScrollBy(1000)).expect("Failed to scroll");
    let stats = view_stats(&view).await.expect("Failed to get stats");
    assert_eq!(stats.offset, stats.content_rows);

    view.stop(None);
    handle.await.expect("List view failed");
}

#[tokio::test]
async fn test_explicit_demand_retries_failed_page() {
    let (store, source) = store_with(
        ScriptedSource::new()
            .with_failure("network unreachable")
            .with_page(page_of(1, 20)),
    );

    store.fetch_next().await;
    assert_eq!(store.page(), 1);

    // Sentinel of the empty list is visible on attach, so the view retries at once
    let (view, handle) = ListView::spawn(args(Arc::clone(&store)))
        .await
        .expect("Failed to spawn list view");
    wait_for_store(&store, |s| s.page == 2 && !s.loading).await;
    assert_eq!(source.requested(), vec![1, 1]);

    view.send_message(ListViewMessage::Demand).expect("Failed to send demand");
    wait_for_store(&store, |s| s.page == 3 && !s.loading).await;
    assert_eq!(source.requested(), vec![1, 1, 2]);
    assert_eq!(store.len(), 20);

    view.stop(None);
    handle.await.expect("List view failed");
}

#[tokio::test]
async fn test_empty_page_does_not_loop() {
    let (store, source) = store_with(ScriptedSource::new());

    let (view, handle) = ListView::spawn(args(Arc::clone(&store)))
        .await
        .expect("Failed to spawn list view");

    wait_for_store(&store, |s| s.page == 2 && !s.loading).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The sentinel never left the viewport, so nothing else was requested
    assert_eq!(source.requested(), vec![1]);
    let stats = view_stats(&view).await.expect("Failed to get stats");
    assert!(stats.sentinel_visible);

    view.stop(None);
    handle.await.expect("List view failed");
}

#[tokio::test]
async fn test_invalid_viewport_fails_to_start() {
    let (store, _source) = store_with(ScriptedSource::new());
    let result = ListView::spawn(ListViewArgs {
        viewport_rows: 0,
        ..args(store)
    })
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_stopping_view_releases_store_subscription() {
    let (store, _source) = store_with(ScriptedSource::new().with_page(page_of(1, 20)));
    store.fetch_next().await;
    assert_eq!(store.subscriber_count(), 0);

    let (view, handle) = ListView::spawn(args(Arc::clone(&store)))
        .await
        .expect("Failed to spawn list view");
    assert_eq!(store.subscriber_count(), 1);

    view.stop(None);
    handle.await.expect("List view failed");

    // No store change happens, the forwarder must still go away
    tokio::time::timeout(Duration::from_secs(5), async {
        while store.subscriber_count() > 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("store subscription outlived the view");
}
