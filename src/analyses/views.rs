use super::capture::{CaptureError, CaptureField, CaptureSession, CapturedValue, SubmissionState};
use super::models::{AnalysisSession, Column, Disposition, Entity};
use super::results::models::{
    AnalysisResult, Column as ResultColumn, Entity as ResultEntity,
};
use super::submission::{DatabaseAnalysisStore, SubmissionOutcome};
use crate::common::auth::protect_router;
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::common::state::AppState;
use crate::products::models::{Entity as ProductEntity, StageKind};
use crate::specifications::services::DatabaseSpecificationSource;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub const RESOURCE_NAME_PLURAL: &str = "analyses";

#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct EvaluateRequest {
    pub product_id: Uuid,
    /// Captured values keyed by parameter id; `null` leaves a value unset
    #[serde(default)]
    #[schema(value_type = HashMap<String, serde_json::Value>)]
    pub values: HashMap<Uuid, Option<CapturedValue>>,
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct EvaluationResponse {
    pub product_id: Uuid,
    pub stage_kind: StageKind,
    pub fields: Vec<CaptureField>,
    pub overall_status: Disposition,
    pub can_submit: bool,
}

#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct SubmitAnalysisRequest {
    pub stage_kind: StageKind,
    pub product_id: Uuid,
    #[serde(default)]
    pub lot_reference: Option<String>,
    /// Captured values keyed by parameter id: a string, number, boolean or `null`
    #[serde(default)]
    #[schema(value_type = HashMap<String, serde_json::Value>)]
    pub values: HashMap<Uuid, Option<CapturedValue>>,
}

/// Body returned when either write of a submission fails
#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
pub struct SubmissionFailure {
    pub outcome: String,
    pub state: SubmissionState,
    pub action: String,
    pub session_id: Option<Uuid>,
    pub message: String,
}

impl SubmissionFailure {
    fn from_outcome(outcome: &SubmissionOutcome) -> Self {
        let message = match outcome {
            SubmissionOutcome::ParentCreateFailure { reason }
            | SubmissionOutcome::ParentOnlyPartialFailure { reason, .. } => reason.clone(),
            SubmissionOutcome::Success { .. } => String::new(),
        };
        Self {
            outcome: outcome.tag().to_string(),
            state: SubmissionState::Error,
            action: SubmissionState::Error.action_label().to_string(),
            session_id: outcome.session_id(),
            message,
        }
    }
}

#[derive(Deserialize, IntoParams, Debug, Default)]
pub struct AnalysisListQuery {
    /// Only sessions captured against this product
    pub product_id: Option<Uuid>,
}

pub fn router(state: &AppState) -> OpenApiRouter {
    let analyses_router = OpenApiRouter::new()
        .routes(routes!(list_analyses, create_analysis))
        .routes(routes!(get_analysis))
        .routes(routes!(evaluate_analysis))
        .with_state(state.clone());

    protect_router(analyses_router, state, RESOURCE_NAME_PLURAL)
}

fn capture_error(err: CaptureError) -> crate::common::errors::BusinessError {
    match err {
        CaptureError::UnknownParameter(_) => crate::validation_error!("values", err),
        CaptureError::Locked(_) | CaptureError::NotSubmittable(_) => {
            crate::business_rule_violation!("capture_submittable", err)
        }
    }
}

/// Build a capture for an existing product with its specifications loaded
/// and the given values applied
async fn load_capture(
    db: &DatabaseConnection,
    stage: Option<StageKind>,
    product_id: Uuid,
    values: HashMap<Uuid, Option<CapturedValue>>,
) -> BusinessResult<CaptureSession> {
    let product = ProductEntity::find_by_id(product_id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("product"))?
        .ok_or_else(|| crate::not_found!("product", product_id))?;

    let mut capture = CaptureSession::new(stage.unwrap_or(product.stage));
    capture
        .select_product(Some(product_id), &DatabaseSpecificationSource::new(db.clone()))
        .await;

    for (parameter_id, value) in values {
        capture
            .set_value(parameter_id, value)
            .map_err(capture_error)?;
    }

    Ok(capture)
}

async fn load_session_detail(
    db: &DatabaseConnection,
    session_id: Uuid,
) -> BusinessResult<AnalysisSession> {
    let session = Entity::find_by_id(session_id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("analysis_session"))?
        .ok_or_else(|| crate::not_found!("analysis session", session_id))?;

    let results = ResultEntity::find()
        .filter(ResultColumn::SessionId.eq(session_id))
        .order_by_asc(ResultColumn::OrderIndex)
        .order_by_asc(ResultColumn::ParameterId)
        .all(db)
        .await
        .map_err(|e| e.to_business_error("analysis_result"))?;

    Ok(AnalysisSession::from(session)
        .with_results(results.into_iter().map(AnalysisResult::from).collect()))
}

/// Evaluate captured values without persisting anything
#[utoipa::path(
    post,
    path = "/evaluate",
    request_body = EvaluateRequest,
    responses(
        (status = 200, description = "Per-parameter controls and statuses", body = EvaluationResponse),
        (status = 400, description = "A value references a parameter the product does not specify"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "analyses",
    summary = "Evaluate a capture",
    description = "Loads the product's specifications, applies the values and returns each field's entry control, status and the overall verdict"
)]
pub async fn evaluate_analysis(
    State(app_state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> BusinessResult<Json<EvaluationResponse>> {
    let capture = load_capture(&app_state.db, None, request.product_id, request.values).await?;

    Ok(Json(EvaluationResponse {
        product_id: request.product_id,
        stage_kind: capture.stage(),
        fields: capture.fields(),
        overall_status: capture.overall_status(),
        can_submit: capture.can_submit(),
    }))
}

/// Submit a capture as a new analysis session
#[utoipa::path(
    post,
    path = "/",
    request_body = SubmitAnalysisRequest,
    responses(
        (status = 201, description = "Session and results recorded", body = AnalysisSession),
        (status = 400, description = "A value references a parameter the product does not specify"),
        (status = 404, description = "Product not found"),
        (status = 422, description = "The product has no specifications to capture"),
        (status = 502, description = "The session or its results could not be written", body = SubmissionFailure)
    ),
    tag = "analyses",
    summary = "Record an analysis",
    description = "Writes the session first and then one result per specification. When the second write fails the session remains and its id is returned with the failure."
)]
pub async fn create_analysis(
    State(app_state): State<AppState>,
    Json(request): Json<SubmitAnalysisRequest>,
) -> BusinessResult<Response> {
    let db = &app_state.db;
    let mut capture = load_capture(
        db,
        Some(request.stage_kind),
        request.product_id,
        request.values,
    )
    .await?;
    if let Some(lot_reference) = request.lot_reference {
        capture.set_lot_reference(lot_reference);
    }

    if !capture.can_submit() {
        return Err(crate::business_rule_violation!(
            "specifications_loaded",
            format!(
                "product {} has no parameter specifications to capture",
                request.product_id
            )
        ));
    }

    let store = DatabaseAnalysisStore::new(db.clone());
    let outcome = capture
        .submit(&store, &app_state.config.submission_fallback_note)
        .await
        .map_err(capture_error)?;

    match outcome {
        SubmissionOutcome::Success { session_id } => {
            let detail = load_session_detail(db, session_id).await?;
            Ok((StatusCode::CREATED, Json(detail)).into_response())
        }
        failed => Ok((
            StatusCode::BAD_GATEWAY,
            Json(SubmissionFailure::from_outcome(&failed)),
        )
            .into_response()),
    }
}

/// List analysis sessions, newest capture first
#[utoipa::path(
    get,
    path = "/",
    params(AnalysisListQuery),
    responses(
        (status = 200, description = "Analysis sessions without their results", body = Vec<AnalysisSession>),
        (status = 500, description = "Internal server error")
    ),
    tag = "analyses",
    summary = "List analyses"
)]
pub async fn list_analyses(
    Query(query): Query<AnalysisListQuery>,
    State(app_state): State<AppState>,
) -> BusinessResult<Json<Vec<AnalysisSession>>> {
    let mut select = Entity::find();
    if let Some(product_id) = query.product_id {
        select = select.filter(Column::ProductId.eq(product_id));
    }

    let sessions = select
        .order_by_desc(Column::CapturedAt)
        .order_by_desc(Column::CreatedAt)
        .all(&app_state.db)
        .await
        .map_err(|e| e.to_business_error("analysis_session"))?;

    Ok(Json(sessions.into_iter().map(AnalysisSession::from).collect()))
}

/// One analysis session with its results in display order
#[utoipa::path(
    get,
    path = "/{id}",
    params(
        ("id" = Uuid, Path, description = "Analysis session ID")
    ),
    responses(
        (status = 200, description = "Session with results", body = AnalysisSession),
        (status = 404, description = "Analysis session not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "analyses",
    summary = "Get an analysis"
)]
pub async fn get_analysis(
    Path(session_id): Path<Uuid>,
    State(app_state): State<AppState>,
) -> BusinessResult<Json<AnalysisSession>> {
    load_session_detail(&app_state.db, session_id).await.map(Json)
}
