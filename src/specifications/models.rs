use crate::common::errors::validation_db_error;
use crate::common::models::active_value;
use crate::parameters::models::InputKind;
use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels, traits::MergeIntoActiveModel};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sea_orm::{IntoActiveModel, entity::prelude::*};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "product_parameters")]
#[crudcrate(
    api_struct = "ProductParameter",
    name_singular = "product_parameter",
    name_plural = "product_parameters",
    description = "Binds a parameter to a product with its min/target/max spec window, display order and required flag.",
    fn_create = create_product_parameter,
    fn_update = update_product_parameter,
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable, update_model = false)]
    pub product_id: Uuid,
    #[crudcrate(sortable, filterable, update_model = false)]
    pub parameter_id: Uuid,
    #[crudcrate(sortable)]
    pub min_value: Option<Decimal>,
    #[crudcrate(sortable)]
    pub target_value: Option<Decimal>,
    #[crudcrate(sortable)]
    pub max_value: Option<Decimal>,
    #[crudcrate(sortable, filterable)]
    pub order_index: i32,
    #[crudcrate(sortable, filterable)]
    pub required: bool,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable, list_model=false)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::products::models::Entity",
        from = "Column::ProductId",
        to = "crate::products::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Products,
    #[sea_orm(
        belongs_to = "crate::parameters::models::Entity",
        from = "Column::ParameterId",
        to = "crate::parameters::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Parameters,
}

impl Related<crate::products::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<crate::parameters::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parameters.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Parameter metadata joined onto a specification link
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ParameterSummary {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub input_kind: InputKind,
}

/// A specification link as the capture engine reads it
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ParameterSpec {
    pub id: Uuid,
    pub product_id: Uuid,
    pub parameter_id: Uuid,
    pub min_value: Option<f64>,
    pub target_value: Option<f64>,
    pub max_value: Option<f64>,
    pub order_index: i32,
    pub required: bool,
    pub parameter: ParameterSummary,
}

impl ParameterSpec {
    pub fn from_models(link: Model, parameter: crate::parameters::models::Model) -> Self {
        Self {
            id: link.id,
            product_id: link.product_id,
            parameter_id: link.parameter_id,
            min_value: link.min_value.and_then(|v| v.to_f64()),
            target_value: link.target_value.and_then(|v| v.to_f64()),
            max_value: link.max_value.and_then(|v| v.to_f64()),
            order_index: link.order_index,
            required: link.required,
            parameter: ParameterSummary {
                id: parameter.id,
                name: parameter.name,
                unit: parameter.unit,
                input_kind: parameter.input_kind,
            },
        }
    }
}

/// Write-side rules for a spec window: a non-negative order index and
/// `min <= target <= max` for whichever bounds are present.
pub fn validate_spec_window(
    min_value: Option<Decimal>,
    target_value: Option<Decimal>,
    max_value: Option<Decimal>,
    order_index: i32,
) -> Result<(), DbErr> {
    if order_index < 0 {
        return Err(validation_db_error("order_index", "must be zero or greater"));
    }
    if let (Some(min), Some(max)) = (min_value, max_value) {
        if min > max {
            return Err(validation_db_error("min_value", "must not exceed max_value"));
        }
    }
    if let (Some(min), Some(target)) = (min_value, target_value) {
        if target < min {
            return Err(validation_db_error("target_value", "must not be below min_value"));
        }
    }
    if let (Some(target), Some(max)) = (target_value, max_value) {
        if target > max {
            return Err(validation_db_error("target_value", "must not exceed max_value"));
        }
    }
    Ok(())
}

async fn create_product_parameter(
    db: &DatabaseConnection,
    create_data: ProductParameterCreate,
) -> Result<ProductParameter, DbErr> {
    validate_spec_window(
        create_data.min_value,
        create_data.target_value,
        create_data.max_value,
        create_data.order_index,
    )?;

    let active_model: ActiveModel = create_data.into();
    let inserted = active_model.insert(db).await?;
    tracing::debug!(
        "Linked parameter {} to product {} at position {}",
        inserted.parameter_id,
        inserted.product_id,
        inserted.order_index
    );

    ProductParameter::get_one(db, inserted.id).await
}

async fn update_product_parameter(
    db: &DatabaseConnection,
    id: Uuid,
    update_data: ProductParameterUpdate,
) -> Result<ProductParameter, DbErr> {
    let existing = Entity::find_by_id(id).one(db).await?.ok_or_else(|| {
        DbErr::RecordNotFound(format!("Product parameter with id '{id}' not found"))
    })?;

    let merged = update_data.merge_into_activemodel(existing.into_active_model())?;
    validate_spec_window(
        active_value(&merged.min_value).flatten(),
        active_value(&merged.target_value).flatten(),
        active_value(&merged.max_value).flatten(),
        active_value(&merged.order_index).unwrap_or_default(),
    )?;
    merged.update(db).await?;

    ProductParameter::get_one(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn bound(value: Option<f64>) -> Option<Decimal> {
        value.and_then(|v| Decimal::try_from(v).ok())
    }

    #[rstest]
    #[case(Some(10.0), Some(10.2), Some(10.5), 0)]
    #[case(Some(10.0), None, Some(10.0), 3)]
    #[case(None, None, None, 0)]
    #[case(None, Some(4.0), None, 1)]
    #[case(Some(3.0), Some(3.0), None, 2)]
    fn test_valid_spec_windows(
        #[case] min: Option<f64>,
        #[case] target: Option<f64>,
        #[case] max: Option<f64>,
        #[case] order_index: i32,
    ) {
        assert!(validate_spec_window(bound(min), bound(target), bound(max), order_index).is_ok());
    }

    #[rstest]
    #[case(Some(11.0), None, Some(10.0), 0, "min_value")]
    #[case(Some(10.0), Some(9.0), None, 0, "target_value")]
    #[case(None, Some(12.0), Some(10.5), 0, "target_value")]
    #[case(None, None, None, -1, "order_index")]
    fn test_invalid_spec_windows(
        #[case] min: Option<f64>,
        #[case] target: Option<f64>,
        #[case] max: Option<f64>,
        #[case] order_index: i32,
        #[case] field: &str,
    ) {
        match validate_spec_window(bound(min), bound(target), bound(max), order_index) {
            Err(DbErr::Custom(msg)) => assert!(msg.contains(field), "{msg}"),
            other => panic!("Expected validation failure on {field}, got {other:?}"),
        }
    }

    #[test]
    fn test_parameter_spec_reads_bounds_as_numbers() {
        let link = Model {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            parameter_id: Uuid::new_v4(),
            min_value: Some(Decimal::new(100, 1)),
            target_value: None,
            max_value: Some(Decimal::new(105, 1)),
            order_index: 2,
            required: true,
            created_at: Utc::now(),
            last_updated: Utc::now(),
        };
        let parameter = crate::parameters::models::Model {
            id: link.parameter_id,
            name: "Brix".to_string(),
            unit: "°Bx".to_string(),
            input_kind: InputKind::Numeric,
            created_at: Utc::now(),
            last_updated: Utc::now(),
        };

        let spec = ParameterSpec::from_models(link, parameter);
        assert_eq!(spec.min_value, Some(10.0));
        assert_eq!(spec.target_value, None);
        assert_eq!(spec.max_value, Some(10.5));
        assert_eq!(spec.parameter.name, "Brix");
    }
}
