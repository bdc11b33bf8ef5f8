use std::sync::Arc;

use gavagai_api::{HttpInsightsClient, HttpInsightsClientConfig, InsightsPayload};
use gavagai_panel::{
    BufferedNotifier, CacheKey, FetchErrorKind, FetchPhase, FilterClause, InsightsPanel,
    InsightsStore, MemoryInsightsStore, ResultSource,
};
use gavagai_proxy::{build_insights_proxy_router, InsightsProxyConfig};
use httpmock::prelude::*;
use serde_json::json;
use tokio::net::TcpListener;

async fn spawn_proxy(upstream: &MockServer) -> String {
    let router = build_insights_proxy_router(&InsightsProxyConfig {
        bind: "127.0.0.1:0".to_string(),
        upstream_base_url: upstream.base_url(),
        access_token: "upstream-token".to_string(),
        request_timeout_ms: 5_000,
    })
    .expect("proxy router");
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind proxy listener");
    let addr = listener.local_addr().expect("proxy addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("proxy serve");
    });
    format!("http://{addr}")
}

fn panel_for(proxy_base: String, store: Arc<MemoryInsightsStore>) -> InsightsPanel {
    let client = HttpInsightsClient::new(HttpInsightsClientConfig {
        api_base: proxy_base,
        request_timeout_ms: 5_000,
        auth_token: None,
    })
    .expect("insights client");
    InsightsPanel::new(
        InsightsPayload::new("p1", "t1", "pos"),
        vec![
            FilterClause::new("groups", ["A"]),
            FilterClause::new("topicSentiment", ["positive"]),
        ],
        Arc::new(client),
        store,
    )
}

#[tokio::test]
async fn panel_loads_through_proxy_and_serves_repeat_from_cache() {
    let upstream = MockServer::start_async().await;
    let project = upstream.mock(|when, then| {
        when.method(GET)
            .path("/projects/p1")
            .header("authorization", "Bearer upstream-token");
        then.status(200).json_body(json!({"score": 0.8}));
    });
    let proxy_base = spawn_proxy(&upstream).await;
    let store = Arc::new(MemoryInsightsStore::new());
    let panel = panel_for(proxy_base, store.clone());

    let first = panel.fetch().await.expect("first fetch");
    assert_eq!(first.source, ResultSource::Network);
    assert_eq!(first.result, json!({"score": 0.8}));
    assert_eq!(panel.phase(), FetchPhase::Loaded);
    assert_eq!(
        store.get(&CacheKey::derive(&InsightsPayload::new("p1", "t1", "pos"))),
        Some(json!({"score": 0.8}))
    );

    let second = panel.fetch().await.expect("second fetch");
    assert_eq!(second.source, ResultSource::Cache);
    assert_eq!(panel.render_state().result, Some(json!({"score": 0.8})));
    project.assert_hits(1);
}

#[tokio::test]
async fn panel_surfaces_upstream_failure_as_notification() {
    let upstream = MockServer::start_async().await;
    upstream.mock(|when, then| {
        when.method(GET).path("/projects/p1");
        then.status(500);
    });
    let proxy_base = spawn_proxy(&upstream).await;
    let store = Arc::new(MemoryInsightsStore::new());
    let panel = panel_for(proxy_base, store.clone());
    let notifier = BufferedNotifier::new();

    let error = panel
        .fetch_and_notify(&notifier)
        .await
        .expect_err("upstream failure");

    assert_eq!(error.kind, FetchErrorKind::NetworkFailure);
    assert_eq!(
        notifier.drain(),
        vec!["Gavagai API returned 500 Internal Server Error".to_string()]
    );
    assert_eq!(panel.phase(), FetchPhase::Failed);
    assert!(panel.render_state().result.is_none());
    assert!(store.is_empty());
}
