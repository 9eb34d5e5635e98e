use super::results::models::AnalysisResult;
use crate::products::models::StageKind;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-parameter verdict derived from a captured value and its spec window
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
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ParameterStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_spec")]
    InSpec,
    #[sea_orm(string_value = "out_of_spec")]
    OutOfSpec,
}

/// Session-level verdict: out of spec as soon as one parameter is
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
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    #[default]
    #[sea_orm(string_value = "in_spec")]
    InSpec,
    #[sea_orm(string_value = "out_of_spec")]
    OutOfSpec,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "analysis_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub stage_kind: StageKind,
    pub product_id: Uuid,
    pub overall_status: Disposition,
    pub captured_at: DateTime<Utc>,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::products::models::Entity",
        from = "Column::ProductId",
        to = "crate::products::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Products,
    #[sea_orm(has_many = "super::results::models::Entity")]
    AnalysisResults,
}

impl Related<crate::products::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::results::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnalysisResults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A persisted analysis session. Results are only attached on the detail view.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnalysisSession {
    pub id: Uuid,
    pub stage_kind: StageKind,
    pub product_id: Uuid,
    pub overall_status: Disposition,
    pub captured_at: DateTime<Utc>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<AnalysisResult>>,
}

impl From<Model> for AnalysisSession {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            stage_kind: model.stage_kind,
            product_id: model.product_id,
            overall_status: model.overall_status,
            captured_at: model.captured_at,
            note: model.note,
            created_at: model.created_at,
            results: None,
        }
    }
}

impl AnalysisSession {
    #[must_use]
    pub fn with_results(mut self, results: Vec<AnalysisResult>) -> Self {
        self.results = Some(results);
        self
    }
}
