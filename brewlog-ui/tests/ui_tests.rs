//! End-to-end tests: brewlog-ui → brewlog-api → SQLite document store
//!
//! The API is served on an ephemeral local port; UI requests go through
//! `oneshot` on the UI router.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use brewlog_common::config::StoreConfig;
use brewlog_common::RecordStore;
use brewlog_ui::{build_router, BackendClient, UiState};
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const LOTE_ID: &str = "65f1a2b3c4d5e6f708091a2b";

/// Test helper: serve brewlog-api on 127.0.0.1:<ephemeral>, return its base URL
async fn spawn_api() -> (TempDir, String) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let config = StoreConfig {
        uri: format!("sqlite://{}", dir.path().join("records.db").display()),
        timeout: Duration::from_secs(5),
        ..Default::default()
    };
    let store = RecordStore::connect(&config).await.expect("Should build store");
    let app = brewlog_api::build_router(brewlog_api::AppState::new(store));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (dir, format!("http://{}", addr))
}

fn ui(backend_url: &str) -> Router {
    build_router(UiState {
        backend: BackendClient::new(backend_url),
    })
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn page(app: &Router) -> String {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_add_list_delete_round_trip() {
    let (_dir, api_url) = spawn_api().await;
    let app = ui(&api_url);

    assert!(page(&app).await.contains("No hay registros disponibles"));

    let form = format!("litros=15&estado=curing&notas=barrica&lote={}", LOTE_ID);
    let response = app.clone().oneshot(post_form("/add", &form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let html = page(&app).await;
    assert!(html.contains("barrica"));
    assert!(html.contains(LOTE_ID));

    let records: Vec<Value> = reqwest::get(format!("{}/api/records", api_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = records[0]["_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(post_form("/delete", &format!("id={}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(page(&app).await.contains("No hay registros disponibles"));
}

#[tokio::test]
async fn test_rejected_submission_is_bad_gateway() {
    let (_dir, api_url) = spawn_api().await;
    let app = ui(&api_url);

    let response = app
        .oneshot(post_form("/add", "litros=abc&estado=curing&lote=x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_backend_down_still_renders_page() {
    let app = ui("http://127.0.0.1:1");
    let html = page(&app).await;
    assert!(html.contains("No hay registros disponibles"));
    assert!(html.contains("class=\"error\""));
}
