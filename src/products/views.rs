use super::models::{Column, Entity, Product, ProductCreate, ProductUpdate, StageKind};
use crate::common::auth::protect_router;
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::common::state::AppState;
use crate::specifications::models::ParameterSpec;
use crate::specifications::services::fetch_specs_for_product;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use crudcrate::CRUDResource;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

/// Minimal product shape consumed by the capture form's product picker
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProductOption {
    pub id: Uuid,
    pub name: String,
}

#[derive(Deserialize, IntoParams, Debug, Default)]
pub struct ProductOptionsQuery {
    /// Restrict the options to one stage
    pub stage: Option<StageKind>,
}

#[allow(dead_code)]
mod generated {
    use crate::products::models::{Product, ProductCreate, ProductList, ProductUpdate};
    use crudcrate::{CRUDResource, crud_handlers};
    use sea_orm::ConnectionTrait;

    crud_handlers!(Product, ProductUpdate, ProductCreate, ProductList);
}

crate::validated_write_handlers!(Product, ProductUpdate, ProductCreate);

pub fn router(state: &AppState) -> OpenApiRouter
where
    Product: CRUDResource,
{
    let capture_router = OpenApiRouter::new()
        .routes(routes!(get_product_options))
        .routes(routes!(get_product_specifications))
        .with_state(state.clone());

    let mutating_router = OpenApiRouter::new()
        .routes(routes!(generated::get_one_handler))
        .routes(routes!(generated::get_all_handler))
        .routes(routes!(create_one_handler))
        .routes(routes!(update_one_handler))
        .routes(routes!(generated::delete_one_handler))
        .routes(routes!(generated::delete_many_handler))
        .with_state(state.db.clone())
        .merge(capture_router);

    protect_router(mutating_router, state, Product::RESOURCE_NAME_PLURAL)
}

/// List selectable products for the capture form
#[utoipa::path(
    get,
    path = "/options",
    params(ProductOptionsQuery),
    responses(
        (status = 200, description = "Active products as id/name pairs", body = Vec<ProductOption>),
        (status = 500, description = "Internal server error")
    ),
    tag = "products",
    summary = "Product picker options",
    description = "Active products, optionally restricted to intermediate or finished stage, sorted by name"
)]
pub async fn get_product_options(
    Query(query): Query<ProductOptionsQuery>,
    State(app_state): State<AppState>,
) -> BusinessResult<Json<Vec<ProductOption>>> {
    let mut select = Entity::find().filter(Column::Active.eq(true));
    if let Some(stage) = query.stage {
        select = select.filter(Column::Stage.eq(stage));
    }

    let products = select
        .order_by_asc(Column::Name)
        .all(&app_state.db)
        .await
        .map_err(|e| e.to_business_error("product"))?;

    Ok(Json(
        products
            .into_iter()
            .map(|product| ProductOption {
                id: product.id,
                name: product.name,
            })
            .collect(),
    ))
}

/// Ordered parameter specifications of one product
#[utoipa::path(
    get,
    path = "/{id}/specifications",
    params(
        ("id" = Uuid, Path, description = "Product ID to fetch specifications for")
    ),
    responses(
        (status = 200, description = "Specifications ordered by order_index", body = Vec<ParameterSpec>),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "products",
    summary = "Get product specifications",
    description = "Parameter links of a product joined with their parameter name, unit and input kind"
)]
pub async fn get_product_specifications(
    Path(product_id): Path<Uuid>,
    State(app_state): State<AppState>,
) -> BusinessResult<Json<Vec<ParameterSpec>>> {
    let db = &app_state.db;

    if Entity::find_by_id(product_id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("product"))?
        .is_none()
    {
        return Err(crate::not_found!("product", product_id));
    }

    let specs = fetch_specs_for_product(db, product_id)
        .await
        .map_err(|e| e.to_business_error("product_parameter"))?;

    Ok(Json(specs))
}
