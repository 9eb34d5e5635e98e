use crate::common::errors::validation_db_error;
use crate::common::models::active_value;
use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels, traits::MergeIntoActiveModel};
use sea_orm::{IntoActiveModel, entity::prelude::*};
use uuid::Uuid;

/// Whether a product (and any capture made against it) is an in-process
/// intermediate or a finished good
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    serde::Serialize,
    serde::Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    #[sea_orm(string_value = "intermediate")]
    Intermediate,
    #[sea_orm(string_value = "finished")]
    #[serde(alias = "final")]
    Finished,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "products")]
#[crudcrate(
    api_struct = "Product",
    name_singular = "product",
    name_plural = "products",
    description = "Products are the intermediate and finished beverages analysed by the lab. Each product carries an ordered set of parameter specifications.",
    fn_create = create_product,
    fn_update = update_product,
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[sea_orm(unique)]
    #[crudcrate(sortable, filterable, fulltext)]
    pub name: String,
    #[crudcrate(sortable, filterable, fulltext)]
    pub code: String,
    #[crudcrate(sortable, filterable, enum_field)]
    pub stage: StageKind,
    #[crudcrate(sortable, filterable)]
    pub category: String,
    #[crudcrate(sortable, filterable)]
    pub line: String,
    #[crudcrate(sortable, filterable)]
    pub active: bool,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable, list_model=false)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::specifications::models::Entity")]
    ProductParameters,
    #[sea_orm(has_many = "crate::analyses::models::Entity")]
    AnalysisSessions,
}

impl Related<crate::specifications::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductParameters.def()
    }
}

impl Related<crate::analyses::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnalysisSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Field rules shared by create and update
fn validate_product_fields(name: &str, code: &str, category: &str, line: &str) -> Result<(), DbErr> {
    if name.trim().chars().count() < 2 {
        return Err(validation_db_error("name", "must be at least 2 characters"));
    }
    if code.trim().chars().count() < 2 {
        return Err(validation_db_error("code", "must be at least 2 characters"));
    }
    if category.trim().is_empty() {
        return Err(validation_db_error("category", "is required"));
    }
    if line.trim().is_empty() {
        return Err(validation_db_error("line", "is required"));
    }
    Ok(())
}

async fn create_product(db: &DatabaseConnection, create_data: ProductCreate) -> Result<Product, DbErr> {
    validate_product_fields(
        &create_data.name,
        &create_data.code,
        &create_data.category,
        &create_data.line,
    )?;

    let active_model: ActiveModel = create_data.into();
    let inserted = active_model.insert(db).await?;
    tracing::info!("Created product {} ({})", inserted.name, inserted.id);

    Product::get_one(db, inserted.id).await
}

async fn update_product(
    db: &DatabaseConnection,
    id: Uuid,
    update_data: ProductUpdate,
) -> Result<Product, DbErr> {
    let existing = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Product with id '{id}' not found")))?;

    let merged = update_data.merge_into_activemodel(existing.into_active_model())?;
    validate_product_fields(
        &active_value(&merged.name).unwrap_or_default(),
        &active_value(&merged.code).unwrap_or_default(),
        &active_value(&merged.category).unwrap_or_default(),
        &active_value(&merged.line).unwrap_or_default(),
    )?;
    merged.update(db).await?;

    Product::get_one(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_kind_accepts_legacy_final_spelling() {
        let stage: StageKind = serde_json::from_str(r#""final""#).unwrap();
        assert_eq!(stage, StageKind::Finished);
        assert_eq!(serde_json::to_string(&stage).unwrap(), r#""finished""#);
    }

    #[test]
    fn test_product_field_validation() {
        assert!(validate_product_fields("Cola Syrup", "CS-01", "Syrups", "Line 1").is_ok());
        assert!(validate_product_fields("C", "CS-01", "Syrups", "Line 1").is_err());
        assert!(validate_product_fields("Cola Syrup", "C", "Syrups", "Line 1").is_err());
        assert!(validate_product_fields("Cola Syrup", "CS-01", " ", "Line 1").is_err());
        assert!(validate_product_fields("Cola Syrup", "CS-01", "Syrups", "").is_err());
    }
}
