use super::models::{HealthCheck, UIConfiguration};
use crate::config::Config;
use crate::config::test_helpers::setup_test_app;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

#[test]
fn test_ui_configuration_from_config() {
    let config = Config::for_tests();
    let ui = UIConfiguration::from_config(&config);

    assert_eq!(ui.client_id, "test-ui");
    assert_eq!(ui.realm, "test-realm");
    assert_eq!(ui.url, "http://localhost:8080");
    assert_eq!(ui.deployment, "test");
}

#[test]
fn test_ui_configuration_serializes_client_id_in_camel_case() {
    let ui = UIConfiguration {
        client_id: "smartlab-ui".to_string(),
        ..UIConfiguration::default()
    };

    let json = serde_json::to_string(&ui).unwrap();
    assert!(json.contains(r#""clientId":"smartlab-ui""#));
    assert!(!json.contains("client_id"));
}

#[test]
fn test_health_check_round_trip() {
    let health: HealthCheck = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_healthz_reports_ok_with_live_database() {
    let app = setup_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ui_config_endpoint_uses_app_configuration() {
    let app = setup_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/config")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["clientId"], "test-ui");
    assert_eq!(body["deployment"], "test");
}
