mod common;

use std::sync::Arc;

use axum::{http::StatusCode, routing::get as get_route, Router};
use common::{app, dashboard, get, FakeClient};

#[tokio::test]
async fn index_bootstraps_client_config() {
    let app = app(Arc::new(FakeClient::default()));

    let res = get(&app, "/microscope").await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.content_type().starts_with("text/html"));
    let html = res.text();
    assert!(html.contains("<title>Microscope</title>"));
    assert!(html.contains(r#"href="/static/app.css""#));
    assert!(html.contains(r#"src="/static/app.js""#));
    assert!(html.contains(r#""apiPath":"/microscope/api/""#));
    assert!(html.contains(r#""path":"/microscope""#));
    assert!(html.contains(r#""recording":false"#));
    assert!(!html.contains("{{"));
}

#[tokio::test]
async fn index_served_with_trailing_slash() {
    let app = app(Arc::new(FakeClient::default()));

    let res = get(&app, "/microscope/").await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.text().contains("window.Microscope"));
}

#[tokio::test]
async fn static_assets_are_served() {
    let app = app(Arc::new(FakeClient::default()));

    let css = get(&app, "/static/app.css").await;
    let js = get(&app, "/static/app.js").await;
    let missing = get(&app, "/static/nope.js").await;

    assert_eq!(css.status, StatusCode::OK);
    assert!(css.content_type().starts_with("text/css"));
    assert_eq!(js.status, StatusCode::OK);
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_prefix_mounts_at_root() {
    let fake = Arc::new(FakeClient::default());
    let app = microscope::router(dashboard(fake.clone(), ""));

    let index = get(&app, "/").await;
    let queues = get(&app, "/api/queues").await;

    assert_eq!(index.status, StatusCode::OK);
    assert!(index.text().contains(r#""apiPath":"/api/""#));
    assert_eq!(queues.status, StatusCode::OK);
    assert_eq!(fake.calls(), vec!["queues"]);
}

#[derive(Clone)]
struct HostState {
    greeting: &'static str,
}

#[tokio::test]
async fn mounts_into_host_application() {
    let fake = Arc::new(FakeClient::default());
    let host = Router::new()
        .route(
            "/hello",
            get_route(|axum::extract::State(s): axum::extract::State<HostState>| async move {
                s.greeting
            }),
        );
    let app = microscope::mount(host, dashboard(fake.clone(), "admin/jobs"))
        .with_state(HostState { greeting: "hi" });

    assert_eq!(get(&app, "/hello").await.text(), "hi");
    assert_eq!(get(&app, "/admin/jobs").await.status, StatusCode::OK);

    let busy = get(&app, "/admin/jobs/api/busy_workers").await;
    assert_eq!(busy.status, StatusCode::OK);
    assert_eq!(fake.calls(), vec!["worker_observations"]);
}
