use super::models::{Column, Entity, ParameterSpec};
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

/// Sort specifications by `order_index`, keeping the incoming order for ties.
/// Order indexes can change independently of when a list was fetched, so
/// every consumer re-sorts instead of trusting the source.
pub fn order_specs(mut specs: Vec<ParameterSpec>) -> Vec<ParameterSpec> {
    specs.sort_by_key(|spec| spec.order_index);
    specs
}

/// Load the specification links of one product joined with their parameters
pub async fn fetch_specs_for_product(
    db: &DatabaseConnection,
    product_id: Uuid,
) -> Result<Vec<ParameterSpec>, DbErr> {
    let rows = Entity::find()
        .filter(Column::ProductId.eq(product_id))
        .order_by_asc(Column::OrderIndex)
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .find_also_related(crate::parameters::models::Entity)
        .all(db)
        .await?;

    let specs = rows
        .into_iter()
        .filter_map(|(link, parameter)| match parameter {
            Some(parameter) => Some(ParameterSpec::from_models(link, parameter)),
            None => {
                tracing::warn!(
                    "Dropping specification {} of product {product_id}: parameter {} is missing",
                    link.id,
                    link.parameter_id
                );
                None
            }
        })
        .collect();

    Ok(order_specs(specs))
}

/// Where the capture engine reads specifications from
#[async_trait]
pub trait SpecificationSource: Send + Sync {
    /// Ordered specifications for a product. No product means no request
    /// and an empty list; a failed load is logged and also yields an empty list.
    async fn specs_for_product(&self, product_id: Option<Uuid>) -> Vec<ParameterSpec>;
}

/// Specification source backed by the application database
#[derive(Clone)]
pub struct DatabaseSpecificationSource {
    db: DatabaseConnection,
}

impl DatabaseSpecificationSource {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SpecificationSource for DatabaseSpecificationSource {
    async fn specs_for_product(&self, product_id: Option<Uuid>) -> Vec<ParameterSpec> {
        let Some(product_id) = product_id else {
            return Vec::new();
        };

        match fetch_specs_for_product(&self.db, product_id).await {
            Ok(specs) => specs,
            Err(err) => {
                tracing::error!("Failed to load specifications for product {product_id}: {err}");
                Vec::new()
            }
        }
    }
}
