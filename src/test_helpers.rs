/// Shared test helper functions for creating test objects across the test suite
///
/// This module provides standardized builders for creating test entities that follow
/// the object hierarchy: Products → ProductParameters ← Parameters
/// and Products → AnalysisSessions → AnalysisResults
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

/// Extract response body as JSON for testing
pub async fn extract_response_body(response: axum::response::Response) -> (StatusCode, Value) {
    use axum::body::to_bytes;

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body: Value =
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!({"error": "Invalid JSON response"}));

    if status.is_server_error() || status.is_client_error() {
        eprintln!("HTTP Error - Status: {status}, Body: {body:?}");
    }

    (status, body)
}

/// Send a request with an optional JSON body and decode the JSON response
pub async fn send_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json_body) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json_body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    extract_response_body(response).await
}

/// Create a test product with default parameters
pub async fn create_test_product(
    app: &axum::Router,
    stage: &str,
) -> Result<(String, Value), String> {
    create_test_product_with_params(
        app,
        &format!("Test Product {}", Uuid::new_v4()),
        stage,
        true,
    )
    .await
}

/// Create a test product with customizable parameters
pub async fn create_test_product_with_params(
    app: &axum::Router,
    name: &str,
    stage: &str,
    active: bool,
) -> Result<(String, Value), String> {
    let product_data = json!({
        "name": name,
        "code": format!("P-{}", &Uuid::new_v4().simple().to_string()[..6]),
        "stage": stage,
        "category": "Carbonated Soft Drink",
        "line": "Line 1",
        "active": active
    });

    let (status, body) = send_json(app, "POST", "/api/products", Some(product_data)).await;

    if status == StatusCode::CREATED {
        let product_id = body["id"].as_str().unwrap().to_string();
        Ok((product_id, body))
    } else {
        Err(format!("Failed to create product: Status {status}, Body: {body}"))
    }
}

/// Create a test parameter
pub async fn create_test_parameter(
    app: &axum::Router,
    name: &str,
    unit: &str,
    input_kind: &str,
) -> Result<(String, Value), String> {
    let parameter_data = json!({
        "name": name,
        "unit": unit,
        "input_kind": input_kind
    });

    let (status, body) = send_json(app, "POST", "/api/parameters", Some(parameter_data)).await;

    if status == StatusCode::CREATED {
        let parameter_id = body["id"].as_str().unwrap().to_string();
        Ok((parameter_id, body))
    } else {
        Err(format!("Failed to create parameter: Status {status}, Body: {body}"))
    }
}

/// Link a parameter to a product with a spec window
pub async fn link_test_parameter(
    app: &axum::Router,
    product_id: &str,
    parameter_id: &str,
    window: (Option<f64>, Option<f64>, Option<f64>),
    order_index: i32,
) -> Result<(String, Value), String> {
    let (min_value, target_value, max_value) = window;
    let link_data = json!({
        "product_id": product_id,
        "parameter_id": parameter_id,
        "min_value": min_value,
        "target_value": target_value,
        "max_value": max_value,
        "order_index": order_index,
        "required": true
    });

    let (status, body) =
        send_json(app, "POST", "/api/product_parameters", Some(link_data)).await;

    if status == StatusCode::CREATED {
        let link_id = body["id"].as_str().unwrap().to_string();
        Ok((link_id, body))
    } else {
        Err(format!(
            "Failed to link parameter to product: Status {status}, Body: {body}"
        ))
    }
}
