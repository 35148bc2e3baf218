//! Common test utilities for integration tests.
//!
//! Builds the router over a fixed in-memory snapshot so tests never touch
//! the filesystem.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use app_usage_api::{app::create_app, config::Config, services::SnapshotSource};
use domain::services::UsageSnapshot;

/// Foreground spans (ms): social 2,000,000, game and news 1,000,000 each,
/// and 500,000 for a package that is no longer installed.
pub const FIXTURE_SNAPSHOT: &str = r#"{
    "apps": [
        {"package_id": "com.example.social", "uid": 10001, "display_name": "Social", "icon": "icons/social.png", "category_code": 4},
        {"package_id": "com.example.game", "uid": 10002, "display_name": "Game", "category_code": 0},
        {"package_id": "com.example.news", "uid": 10003, "display_name": "News", "category_code": 5}
    ],
    "foreground": [
        {"package_id": "com.example.social", "start_ms": 0, "end_ms": 2000000},
        {"package_id": "com.example.game", "start_ms": 2000000, "end_ms": 3000000},
        {"package_id": "com.example.news", "start_ms": 3000000, "end_ms": 4000000},
        {"package_id": "com.example.removed", "start_ms": 4000000, "end_ms": 4500000}
    ],
    "network": [
        {"uid": 10001, "transport": "wifi", "start_ms": 0, "end_ms": 1000, "sent": 1024, "received": 2048},
        {"uid": 10001, "transport": "mobile", "start_ms": 0, "end_ms": 1000, "sent": 10, "received": 20}
    ],
    "events": [
        {"package_id": "com.example.social", "timestamp_ms": 100, "kind": "resumed"},
        {"package_id": "com.example.social", "timestamp_ms": 150, "kind": "paused"},
        {"package_id": "com.example.social", "timestamp_ms": 200, "kind": "resumed"}
    ]
}"#;

pub fn test_config() -> Config {
    Config::load_for_test(&[]).expect("Failed to load test config")
}

pub fn fixture_snapshot() -> UsageSnapshot {
    UsageSnapshot::from_json_str(FIXTURE_SNAPSHOT).expect("Fixture snapshot must parse")
}

pub fn create_test_app() -> Router {
    create_app(test_config(), SnapshotSource::fixed(fixture_snapshot()))
}

pub fn create_test_app_with(snapshot: SnapshotSource) -> Router {
    create_app(test_config(), snapshot)
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "Failed to parse response body: {:?}",
            String::from_utf8_lossy(&body)
        )
    })
}
