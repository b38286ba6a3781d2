//! Fetch-and-reconcile pipeline tests using mock sources

use std::sync::Arc;
use std::time::Duration;

use tokio_test::assert_ok;
use widget_panel::{
    LoadOutcome, MockCatalogSource, MockStatusSource, PanelPhase, ShopContext, ViewState, Widget,
    WidgetAction, WidgetPanel,
};

fn widget(id: &str, kind: &str) -> Widget {
    Widget {
        id: id.to_string(),
        external_block_id: format!("block-{}", id),
        name: format!("Widget {}", id),
        description: String::new(),
        kind: kind.to_string(),
        placement_target: "mainSection".to_string(),
        image_url: String::new(),
    }
}

fn shop() -> ShopContext {
    ShopContext::new("store.myshopify.com")
}

#[tokio::test]
async fn test_status_map_keys_match_widget_ids() {
    let catalogs = vec![
        vec![widget("w1", "banner")],
        vec![widget("a", "banner"), widget("b", "banner"), widget("c", "popup")],
        (0..25).map(|i| widget(&format!("w{}", i), "carousel")).collect(),
    ];

    for widgets in catalogs {
        let expected: Vec<String> = widgets.iter().map(|w| w.id.clone()).collect();
        let catalog = Arc::new(MockCatalogSource::new(widgets));
        let status = Arc::new(MockStatusSource::new().with_failure("popup"));
        let panel = WidgetPanel::new(catalog, status, shop());

        assert_ok!(panel.mount().await);
        let state = panel.wait_settled().await;

        let mut keys: Vec<String> = state.statuses().iter().map(|(id, _)| id.to_string()).collect();
        let mut ids = expected.clone();
        keys.sort();
        ids.sort();
        assert_eq!(keys, ids);
        assert!(state.statuses().covers(state.widgets()));

        panel.unmount().await;
    }
}

#[tokio::test]
async fn test_newer_widget_set_wins_over_slow_batch() {
    let catalog = Arc::new(MockCatalogSource::new(vec![widget("w1", "banner")]));
    let status = Arc::new(
        MockStatusSource::new()
            .with_active("banner")
            .with_delay("banner", Duration::from_millis(150)),
    );
    let panel = WidgetPanel::new(catalog.clone(), status, shop());

    assert_eq!(
        panel.mount().await.unwrap(),
        LoadOutcome::Replaced { version: 1, count: 1 }
    );

    // Supersede the first set while its batch is still waiting on "banner"
    catalog
        .set_widgets(vec![widget("w2", "popup"), widget("w3", "carousel")])
        .await;
    assert_eq!(
        panel.refresh().await.unwrap(),
        LoadOutcome::Replaced { version: 2, count: 2 }
    );

    let state = panel.wait_settled().await;
    assert_eq!(state.widgets_version(), 2);
    assert_eq!(state.statuses().get("w2"), Some(false));
    assert_eq!(state.statuses().get("w3"), Some(false));

    // Let the slow batch for the first set land; it must be ignored
    tokio::time::sleep(Duration::from_millis(250)).await;
    let state = panel.state();
    assert_eq!(state.phase(), PanelPhase::Reconciled);
    assert_eq!(state.statuses().get("w1"), None);
    assert_eq!(state.statuses().len(), 2);

    panel.unmount().await;
}

#[tokio::test]
async fn test_identical_catalog_does_not_reconcile_again() {
    let catalog = Arc::new(MockCatalogSource::new(vec![
        widget("w1", "banner"),
        widget("w2", "popup"),
    ]));
    let status = Arc::new(MockStatusSource::new());
    let panel = WidgetPanel::new(catalog.clone(), status.clone(), shop());

    panel.mount().await.unwrap();
    panel.wait_settled().await;
    assert_eq!(status.call_count(), 2);

    let outcome = panel.refresh().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(outcome, LoadOutcome::Unchanged { version: 1 });
    assert_eq!(catalog.call_count(), 2);
    assert_eq!(status.call_count(), 2);
    assert_eq!(panel.state().widgets_version(), 1);

    panel.unmount().await;
}

#[tokio::test]
async fn test_failed_status_query_isolated() {
    let catalog = Arc::new(MockCatalogSource::new(vec![
        widget("w1", "banner"),
        widget("w2", "popup"),
        widget("w3", "carousel"),
    ]));
    let status = Arc::new(
        MockStatusSource::new()
            .with_active("banner")
            .with_active("carousel")
            .with_failure("popup"),
    );
    let panel = WidgetPanel::new(catalog, status, shop());

    panel.mount().await.unwrap();
    let state = panel.wait_settled().await;

    assert_eq!(state.statuses().get("w1"), Some(true));
    assert_eq!(state.statuses().get("w2"), Some(false));
    assert_eq!(state.statuses().get("w3"), Some(true));

    let rows = state.rows();
    assert_eq!(rows[0].action, WidgetAction::Active);
    assert!(matches!(rows[1].action, WidgetAction::AddWidget { .. }));
    assert_eq!(rows[2].action, WidgetAction::Active);

    panel.unmount().await;
}

#[tokio::test]
async fn test_rows_pending_while_statuses_in_flight() {
    let catalog = Arc::new(MockCatalogSource::new(vec![
        widget("w1", "banner"),
        widget("w2", "popup"),
    ]));
    let status = Arc::new(
        MockStatusSource::new()
            .with_active("banner")
            .with_delay("popup", Duration::from_millis(100)),
    );
    let panel = WidgetPanel::new(catalog, status, shop());

    panel.mount().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    // "banner" has answered but "popup" has not: nothing is final yet
    let state = panel.state();
    assert_eq!(state.phase(), PanelPhase::StatusPending);
    assert!(state.rows().iter().all(|r| r.action == WidgetAction::Pending));

    let state = panel.wait_settled().await;
    assert_eq!(state.phase(), PanelPhase::Reconciled);

    panel.unmount().await;
}

#[tokio::test]
async fn test_every_query_uses_supplied_shop() {
    let catalog = Arc::new(MockCatalogSource::new(vec![
        widget("w1", "banner"),
        widget("w2", "popup"),
    ]));
    let status = Arc::new(MockStatusSource::new());
    let panel = WidgetPanel::new(catalog, status.clone(), shop());

    panel.mount().await.unwrap();
    panel.wait_settled().await;

    let shops = status.shops().await;
    assert_eq!(shops.len(), 2);
    assert!(shops.iter().all(|s| *s == shop()));

    panel.unmount().await;
}

#[tokio::test]
async fn test_subscribers_observe_phases() {
    let catalog = Arc::new(
        MockCatalogSource::new(vec![widget("w1", "banner")]).with_delay(Duration::from_millis(20)),
    );
    let status = Arc::new(MockStatusSource::new().with_delay("banner", Duration::from_millis(20)));
    let panel = WidgetPanel::new(catalog, status, shop());
    let mut rx = panel.store().subscribe();
    let initial = rx.borrow_and_update().phase();

    let collector = tokio::spawn(async move {
        let mut phases = vec![initial];
        while rx.changed().await.is_ok() {
            let phase = rx.borrow_and_update().phase();
            if phases.last() != Some(&phase) {
                phases.push(phase);
            }
            if phase == PanelPhase::Reconciled {
                break;
            }
        }
        phases
    });

    panel.mount().await.unwrap();
    let state: ViewState = panel.wait_settled().await;
    assert!(state.is_reconciled());

    let phases = collector.await.unwrap();
    assert_eq!(
        phases,
        vec![
            PanelPhase::Empty,
            PanelPhase::LoadingCatalog,
            PanelPhase::StatusPending,
            PanelPhase::Reconciled,
        ]
    );

    panel.unmount().await;
}
