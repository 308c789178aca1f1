use std::net::SocketAddr;
use std::sync::Arc;

use contracts::{GET_PLAYER_PATH, SAVE_PLAYER_PATH};
use hub_core::PlayerService;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tokio::net::TcpListener;

async fn spawn_hub() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(hub_api::serve_on(
        listener,
        Arc::new(PlayerService::unconfigured()),
    ));
    addr
}

fn assert_no_cache(response: &Response) {
    let headers = response.headers();
    assert_eq!(
        headers.get("cache-control").and_then(|v| v.to_str().ok()),
        Some("no-cache, no-store, must-revalidate")
    );
    assert_eq!(
        headers.get("x-content-type-options").and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
}

#[tokio::test]
async fn malformed_save_body_is_json_bad_request() {
    let addr = spawn_hub().await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}{SAVE_PLAYER_PATH}"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_no_cache(&response);
    let body: Value = response.json().await.expect("json error body");
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "INVALID_REQUEST");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn repeated_query_key_is_json_bad_request() {
    let addr = spawn_hub().await;

    let response = reqwest::get(format!(
        "http://{addr}{GET_PLAYER_PATH}?code=FG-TEST01&code=FG-8V501Y"
    ))
    .await
    .expect("request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("json error body");
    assert_eq!(body["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn wrong_method_is_not_allowed() {
    let addr = spawn_hub().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}{GET_PLAYER_PATH}"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_no_cache(&response);

    let response = client
        .get(format!("http://{addr}{SAVE_PLAYER_PATH}"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
