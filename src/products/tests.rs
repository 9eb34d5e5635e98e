use crate::config::test_helpers::setup_test_app;
use crate::test_helpers::{
    create_test_parameter, create_test_product, create_test_product_with_params,
    link_test_parameter, send_json,
};
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_product_crud_operations() {
    let app = setup_test_app().await;

    let (product_id, body) = create_test_product_with_params(&app, "Cola Syrup", "intermediate", true)
        .await
        .expect("Failed to create product");
    assert_eq!(body["name"], "Cola Syrup");
    assert_eq!(body["stage"], "intermediate");
    assert_eq!(body["active"], true);

    let (status, body) = send_json(&app, "GET", &format!("/api/products/{product_id}"), None).await;
    assert_eq!(status, StatusCode::OK, "Failed to get product");
    assert_eq!(body["id"], product_id.as_str());

    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/api/products/{product_id}"),
        Some(json!({"line": "Line 4", "active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Failed to update product");
    assert_eq!(body["line"], "Line 4");
    assert_eq!(body["active"], false);
    assert_eq!(body["name"], "Cola Syrup");

    let (status, body) = send_json(&app, "GET", "/api/products", None).await;
    assert_eq!(status, StatusCode::OK, "Failed to list products");
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send_json(&app, "DELETE", &format!("/api/products/{product_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(&app, "GET", &format!("/api/products/{product_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_final_is_accepted_as_finished_stage() {
    let app = setup_test_app().await;

    let (_, body) = create_test_product_with_params(&app, "Cola 330ml Can", "final", true)
        .await
        .expect("Failed to create product");

    assert_eq!(body["stage"], "finished");
}

#[tokio::test]
async fn test_product_validation() {
    let app = setup_test_app().await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/products",
        Some(json!({
            "name": "X",
            "code": "P-1",
            "stage": "intermediate",
            "category": "Syrup",
            "line": "Line 1",
            "active": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("'name'")
    );

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/products",
        Some(json!({
            "name": "Orange Base",
            "code": "P-2",
            "stage": "raw_material",
            "category": "Syrup",
            "line": "Line 1",
            "active": true
        })),
    )
    .await;
    assert_eq!(
        status,
        StatusCode::UNPROCESSABLE_ENTITY,
        "Unknown stages must be rejected"
    );
}

#[tokio::test]
async fn test_product_names_are_unique() {
    let app = setup_test_app().await;

    create_test_product_with_params(&app, "Lemon Soda", "finished", true)
        .await
        .expect("Failed to create product");
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/products",
        Some(json!({
            "name": "Lemon Soda",
            "code": "LS-2",
            "stage": "finished",
            "category": "Soda",
            "line": "Line 2",
            "active": true
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["error"]["code"], "DUPLICATE_RESOURCE");
}

#[tokio::test]
async fn test_product_options_filter_by_stage_and_activity() {
    let app = setup_test_app().await;

    let (syrup_id, _) = create_test_product_with_params(&app, "B Syrup", "intermediate", true)
        .await
        .unwrap();
    let (base_id, _) = create_test_product_with_params(&app, "A Base", "intermediate", true)
        .await
        .unwrap();
    create_test_product_with_params(&app, "Retired Syrup", "intermediate", false)
        .await
        .unwrap();
    let (can_id, _) = create_test_product_with_params(&app, "Cola Can", "finished", true)
        .await
        .unwrap();

    let (status, body) =
        send_json(&app, "GET", "/api/products/options?stage=intermediate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": base_id, "name": "A Base"},
            {"id": syrup_id, "name": "B Syrup"}
        ])
    );

    let (status, body) = send_json(&app, "GET", "/api/products/options?stage=final", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": can_id, "name": "Cola Can"}]));

    let (status, body) = send_json(&app, "GET", "/api/products/options", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_product_specifications_are_ordered() {
    let app = setup_test_app().await;
    let (product_id, _) = create_test_product(&app, "finished").await.unwrap();
    let (co2_id, _) = create_test_parameter(&app, "CO2", "vol", "numeric")
        .await
        .unwrap();
    let (seal_id, _) = create_test_parameter(&app, "Seal", "Seal intact", "boolean")
        .await
        .unwrap();
    let (brix_id, _) = create_test_parameter(&app, "Brix", "°Bx", "number")
        .await
        .unwrap();

    link_test_parameter(&app, &product_id, &seal_id, (None, None, None), 5)
        .await
        .unwrap();
    link_test_parameter(&app, &product_id, &co2_id, (Some(3.6), Some(3.8), Some(4.0)), 1)
        .await
        .unwrap();
    link_test_parameter(&app, &product_id, &brix_id, (Some(10.0), None, Some(10.5)), 0)
        .await
        .unwrap();

    let (status, body) = send_json(
        &app,
        "GET",
        &format!("/api/products/{product_id}/specifications"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let specs = body.as_array().unwrap();
    let names: Vec<&str> = specs
        .iter()
        .map(|spec| spec["parameter"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Brix", "CO2", "Seal"]);
    assert_eq!(specs[0]["parameter"]["input_kind"], "numeric");
    assert_eq!(specs[1]["target_value"], 3.8);
    assert_eq!(specs[2]["parameter"]["input_kind"], "boolean");
}

#[tokio::test]
async fn test_specifications_of_unknown_product() {
    let app = setup_test_app().await;

    let (status, body) = send_json(
        &app,
        "GET",
        &format!("/api/products/{}/specifications", Uuid::new_v4()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
}
