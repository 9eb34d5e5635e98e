use super::models::{ParameterSpec, ParameterSummary};
use super::services::{
    DatabaseSpecificationSource, SpecificationSource, fetch_specs_for_product, order_specs,
};
use crate::config::test_helpers::{setup_test_app_with_db, setup_test_db};
use crate::parameters::models::InputKind;
use crate::test_helpers::{
    create_test_parameter, create_test_product, link_test_parameter, send_json,
};
use axum::http::StatusCode;
use sea_orm::ConnectionTrait;
use serde_json::json;
use uuid::Uuid;

fn spec_at(order_index: i32, name: &str) -> ParameterSpec {
    let parameter_id = Uuid::new_v4();
    ParameterSpec {
        id: Uuid::new_v4(),
        product_id: Uuid::nil(),
        parameter_id,
        min_value: None,
        target_value: None,
        max_value: None,
        order_index,
        required: false,
        parameter: ParameterSummary {
            id: parameter_id,
            name: name.to_string(),
            unit: "mg/L".to_string(),
            input_kind: InputKind::Numeric,
        },
    }
}

#[test]
fn test_order_specs_is_stable() {
    let ordered = order_specs(vec![
        spec_at(3, "d"),
        spec_at(1, "b1"),
        spec_at(0, "a"),
        spec_at(1, "b2"),
    ]);

    let names: Vec<&str> = ordered.iter().map(|s| s.parameter.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b1", "b2", "d"]);
}

fn assert_rejected_field(status: StatusCode, body: &serde_json::Value, field: &str) {
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let message = body["error"]["message"].as_str().unwrap_or_default();
    assert!(message.contains(&format!("'{field}'")), "{message}");
}

#[tokio::test]
async fn test_link_crud_and_window_validation() {
    let db = setup_test_db().await;
    let app = setup_test_app_with_db(&db);
    let (product_id, _) = create_test_product(&app, "intermediate").await.unwrap();
    let (parameter_id, _) = create_test_parameter(&app, "pH", "pH", "numeric")
        .await
        .unwrap();

    for (window, order_index, field) in [
        (json!({"min_value": 3.4, "max_value": 3.0}), 0, "min_value"),
        (
            json!({"min_value": 3.0, "target_value": 3.5, "max_value": 3.4}),
            0,
            "target_value",
        ),
        (json!({}), -1, "order_index"),
    ] {
        let mut link = json!({
            "product_id": product_id,
            "parameter_id": parameter_id,
            "order_index": order_index,
            "required": true
        });
        for (key, value) in window.as_object().unwrap() {
            link[key] = value.clone();
        }

        let (status, body) =
            send_json(&app, "POST", "/api/product_parameters", Some(link)).await;
        assert_rejected_field(status, &body, field);
    }

    let (link_id, body) = link_test_parameter(
        &app,
        &product_id,
        &parameter_id,
        (Some(3.0), Some(3.2), Some(3.4)),
        2,
    )
    .await
    .expect("Failed to link parameter");
    assert_eq!(body["min_value"], 3.0);
    assert_eq!(body["required"], true);

    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/api/product_parameters/{link_id}"),
        Some(json!({"max_value": 3.6, "order_index": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Failed to update link");
    assert_eq!(body["max_value"], 3.6);
    assert_eq!(body["order_index"], 0);

    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/api/product_parameters/{link_id}"),
        Some(json!({"min_value": 4.0})),
    )
    .await;
    assert_rejected_field(status, &body, "min_value");

    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/api/product_parameters/{}", Uuid::new_v4()),
        Some(json!({"min_value": 3.1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

    let specs = fetch_specs_for_product(&db, Uuid::parse_str(&product_id).unwrap())
        .await
        .unwrap();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].min_value, Some(3.0));
    assert_eq!(specs[0].max_value, Some(3.6));

    let (status, _) = send_json(
        &app,
        "DELETE",
        &format!("/api/product_parameters/{link_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_database_source_orders_and_joins_parameters() {
    let db = setup_test_db().await;
    let app = setup_test_app_with_db(&db);
    let (product_id, _) = create_test_product(&app, "finished").await.unwrap();
    let (other_product, _) = create_test_product(&app, "finished").await.unwrap();
    let (co2_id, _) = create_test_parameter(&app, "CO2", "vol", "numeric")
        .await
        .unwrap();
    let (appearance_id, _) = create_test_parameter(&app, "Appearance", "visual", "enumerated")
        .await
        .unwrap();

    link_test_parameter(&app, &product_id, &appearance_id, (None, None, None), 4)
        .await
        .unwrap();
    link_test_parameter(&app, &product_id, &co2_id, (Some(3.6), None, Some(4.0)), 1)
        .await
        .unwrap();
    link_test_parameter(&app, &other_product, &co2_id, (None, None, None), 0)
        .await
        .unwrap();

    let source = DatabaseSpecificationSource::new(db.clone());
    let specs = source
        .specs_for_product(Some(Uuid::parse_str(&product_id).unwrap()))
        .await;

    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0].parameter.name, "CO2");
    assert_eq!(specs[0].parameter.unit, "vol");
    assert_eq!(specs[1].parameter.input_kind, InputKind::Enumerated);

    assert!(source.specs_for_product(None).await.is_empty());
    assert!(
        source
            .specs_for_product(Some(Uuid::new_v4()))
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_database_source_load_failure_yields_empty_list() {
    let db = setup_test_db().await;
    let app = setup_test_app_with_db(&db);
    let (product_id, _) = create_test_product(&app, "intermediate").await.unwrap();
    let (parameter_id, _) = create_test_parameter(&app, "Brix", "°Bx", "numeric")
        .await
        .unwrap();
    link_test_parameter(&app, &product_id, &parameter_id, (None, None, None), 0)
        .await
        .unwrap();

    db.execute_unprepared("DROP TABLE product_parameters")
        .await
        .unwrap();

    let source = DatabaseSpecificationSource::new(db.clone());
    let specs = source
        .specs_for_product(Some(Uuid::parse_str(&product_id).unwrap()))
        .await;

    assert!(specs.is_empty());
}
