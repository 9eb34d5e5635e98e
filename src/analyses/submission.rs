use super::capture::{CapturedValue, parse_number};
use super::models::{ActiveModel as SessionActiveModel, Disposition, ParameterStatus};
use super::results::models::{ActiveModel as ResultActiveModel, Entity as ResultEntity};
use crate::parameters::models::InputKind;
use crate::products::models::StageKind;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

/// Parent row of a submission
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysisSession {
    pub stage_kind: StageKind,
    pub product_id: Uuid,
    pub overall_status: Disposition,
    pub captured_at: DateTime<Utc>,
    pub note: String,
}

/// Child row of a submission, one per loaded specification
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysisResult {
    pub parameter_id: Uuid,
    pub measured_value: Option<f64>,
    pub measured_text: Option<String>,
    pub unit: String,
    pub spec_min: Option<f64>,
    pub spec_target: Option<f64>,
    pub spec_max: Option<f64>,
    pub status: ParameterStatus,
    pub order_index: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSubmission {
    pub session: NewAnalysisSession,
    pub results: Vec<NewAnalysisResult>,
}

/// The persistent store behind a submission. The two writes are issued
/// separately and are not wrapped in a transaction.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Write the parent session and return its generated id
    async fn create_session(&self, session: &NewAnalysisSession) -> anyhow::Result<Uuid>;

    /// Batch-write every child row referencing `session_id`
    async fn create_results(
        &self,
        session_id: Uuid,
        results: &[NewAnalysisResult],
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Both writes succeeded
    Success { session_id: Uuid },
    /// The session exists but its results could not be written
    ParentOnlyPartialFailure { session_id: Uuid, reason: String },
    /// Nothing was written
    ParentCreateFailure { reason: String },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success { .. })
    }

    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            SubmissionOutcome::Success { session_id }
            | SubmissionOutcome::ParentOnlyPartialFailure { session_id, .. } => Some(*session_id),
            SubmissionOutcome::ParentCreateFailure { .. } => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            SubmissionOutcome::Success { .. } => "success",
            SubmissionOutcome::ParentOnlyPartialFailure { .. } => "parent_only_partial_failure",
            SubmissionOutcome::ParentCreateFailure { .. } => "parent_create_failure",
        }
    }
}

/// Numeric and textual forms stored for a captured value. Unset values are
/// coerced to zero; flags become 0/1; text that parses keeps its number and,
/// outside numeric parameters, its raw form as well.
pub fn coerce_measurement(
    kind: InputKind,
    value: Option<&CapturedValue>,
) -> (Option<f64>, Option<String>) {
    match value {
        None => (Some(0.0), None),
        Some(CapturedValue::Flag(flag)) => (Some(if *flag { 1.0 } else { 0.0 }), None),
        Some(CapturedValue::Number(number)) => (Some(*number), None),
        Some(CapturedValue::Text(raw)) if raw.trim().is_empty() => (Some(0.0), None),
        Some(CapturedValue::Text(raw)) => match (kind, parse_number(raw)) {
            (InputKind::Numeric, Some(number)) => (Some(number), None),
            (_, parsed) => (parsed, Some(raw.clone())),
        },
    }
}

/// Run the two-step write: the session first, then all of its results.
/// A failed first step skips the second.
pub async fn submit_analysis<S>(store: &S, submission: &AnalysisSubmission) -> SubmissionOutcome
where
    S: AnalysisStore + ?Sized,
{
    let session_id = match store.create_session(&submission.session).await {
        Ok(id) => id,
        Err(err) => {
            tracing::error!(
                "Failed to create analysis session for product {}: {err:#}",
                submission.session.product_id
            );
            return SubmissionOutcome::ParentCreateFailure {
                reason: format!("{err:#}"),
            };
        }
    };

    match store.create_results(session_id, &submission.results).await {
        Ok(()) => {
            tracing::info!(
                "Recorded analysis session {session_id} with {} results ({:?})",
                submission.results.len(),
                submission.session.overall_status
            );
            SubmissionOutcome::Success { session_id }
        }
        Err(err) => {
            tracing::error!(
                "Analysis session {session_id} was created but its results were not: {err:#}"
            );
            SubmissionOutcome::ParentOnlyPartialFailure {
                session_id,
                reason: format!("{err:#}"),
            }
        }
    }
}

/// Analysis store backed by the application database
#[derive(Clone)]
pub struct DatabaseAnalysisStore {
    db: DatabaseConnection,
}

impl DatabaseAnalysisStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AnalysisStore for DatabaseAnalysisStore {
    async fn create_session(&self, session: &NewAnalysisSession) -> anyhow::Result<Uuid> {
        let active_model = SessionActiveModel {
            id: Set(Uuid::new_v4()),
            stage_kind: Set(session.stage_kind),
            product_id: Set(session.product_id),
            overall_status: Set(session.overall_status),
            captured_at: Set(session.captured_at),
            note: Set(Some(session.note.clone())),
            created_at: Set(Utc::now()),
        };

        let inserted = active_model
            .insert(&self.db)
            .await
            .context("inserting analysis session")?;

        Ok(inserted.id)
    }

    async fn create_results(
        &self,
        session_id: Uuid,
        results: &[NewAnalysisResult],
    ) -> anyhow::Result<()> {
        if results.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let models = results.iter().map(|result| ResultActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(session_id),
            parameter_id: Set(result.parameter_id),
            measured_value: Set(result.measured_value),
            measured_text: Set(result.measured_text.clone()),
            unit: Set(result.unit.clone()),
            spec_min: Set(result.spec_min),
            spec_target: Set(result.spec_target),
            spec_max: Set(result.spec_max),
            status: Set(result.status),
            order_index: Set(result.order_index),
            created_at: Set(now),
        });

        ResultEntity::insert_many(models)
            .exec(&self.db)
            .await
            .with_context(|| format!("inserting {} results for session {session_id}", results.len()))?;

        Ok(())
    }
}
