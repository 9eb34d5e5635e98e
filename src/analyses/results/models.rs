use crate::analyses::models::ParameterStatus;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "analysis_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub session_id: Uuid,
    pub parameter_id: Uuid,
    pub measured_value: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub measured_text: Option<String>,
    pub unit: String,
    pub spec_min: Option<f64>,
    pub spec_target: Option<f64>,
    pub spec_max: Option<f64>,
    pub status: ParameterStatus,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::analyses::models::Entity",
        from = "Column::SessionId",
        to = "crate::analyses::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    AnalysisSessions,
}

impl Related<crate::analyses::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnalysisSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// One captured parameter of a session, with the spec window echoed as it
/// stood at capture time
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub session_id: Uuid,
    pub parameter_id: Uuid,
    pub measured_value: Option<f64>,
    pub measured_text: Option<String>,
    pub unit: String,
    pub spec_min: Option<f64>,
    pub spec_target: Option<f64>,
    pub spec_max: Option<f64>,
    pub status: ParameterStatus,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Model> for AnalysisResult {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            session_id: model.session_id,
            parameter_id: model.parameter_id,
            measured_value: model.measured_value,
            measured_text: model.measured_text,
            unit: model.unit,
            spec_min: model.spec_min,
            spec_target: model.spec_target,
            spec_max: model.spec_max,
            status: model.status,
            order_index: model.order_index,
            created_at: model.created_at,
        }
    }
}
