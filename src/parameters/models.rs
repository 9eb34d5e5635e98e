use crate::common::errors::validation_db_error;
use crate::common::models::active_value;
use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels, traits::MergeIntoActiveModel};
use sea_orm::{IntoActiveModel, entity::prelude::*};
use uuid::Uuid;

/// How a parameter is captured. Legacy spellings from the first schema
/// (`number`, `text`, `select`) are still accepted on input.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    serde::Serialize,
    serde::Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[default]
    #[sea_orm(string_value = "numeric")]
    #[serde(alias = "number")]
    Numeric,
    #[sea_orm(string_value = "free_text")]
    #[serde(alias = "text")]
    FreeText,
    #[sea_orm(string_value = "enumerated")]
    #[serde(alias = "select")]
    Enumerated,
    #[sea_orm(string_value = "boolean")]
    Boolean,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "parameters")]
#[crudcrate(
    api_struct = "Parameter",
    name_singular = "parameter",
    name_plural = "parameters",
    description = "Parameters are named, unit-bearing quality characteristics (pH, Brix, CO2 volumes) with a declared input kind.",
    fn_create = create_parameter,
    fn_update = update_parameter,
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable, fulltext)]
    pub name: String,
    #[crudcrate(sortable, filterable)]
    pub unit: String,
    #[crudcrate(sortable, filterable, enum_field)]
    pub input_kind: InputKind,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable, list_model=false)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::specifications::models::Entity")]
    ProductParameters,
}

impl Related<crate::specifications::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductParameters.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn validate_parameter_fields(name: &str, unit: &str) -> Result<(), DbErr> {
    if name.trim().chars().count() < 2 {
        return Err(validation_db_error("name", "must be at least 2 characters"));
    }
    if unit.trim().is_empty() {
        return Err(validation_db_error("unit", "is required"));
    }
    Ok(())
}

async fn create_parameter(
    db: &DatabaseConnection,
    create_data: ParameterCreate,
) -> Result<Parameter, DbErr> {
    validate_parameter_fields(&create_data.name, &create_data.unit)?;

    let active_model: ActiveModel = create_data.into();
    let inserted = active_model.insert(db).await?;

    Parameter::get_one(db, inserted.id).await
}

async fn update_parameter(
    db: &DatabaseConnection,
    id: Uuid,
    update_data: ParameterUpdate,
) -> Result<Parameter, DbErr> {
    let existing = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Parameter with id '{id}' not found")))?;

    let merged = update_data.merge_into_activemodel(existing.into_active_model())?;
    validate_parameter_fields(
        &active_value(&merged.name).unwrap_or_default(),
        &active_value(&merged.unit).unwrap_or_default(),
    )?;
    merged.update(db).await?;

    Parameter::get_one(db, id).await
}
