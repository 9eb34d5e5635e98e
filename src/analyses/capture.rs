//! Capture engine: turns a product's specifications into an entry form,
//! evaluates every captured value against its window as it changes and
//! hands a complete draft to the submission pipeline.

use super::models::{Disposition, ParameterStatus};
use super::submission::{
    AnalysisStore, AnalysisSubmission, NewAnalysisResult, NewAnalysisSession, SubmissionOutcome,
    coerce_measurement, submit_analysis,
};
use crate::parameters::models::InputKind;
use crate::products::models::StageKind;
use crate::specifications::models::ParameterSpec;
use crate::specifications::services::{SpecificationSource, order_specs};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Choices offered for enumerated parameters as (value, label)
pub const ENUMERATED_CHOICES: [(&str, &str); 3] = [
    ("in_control", "In Control"),
    ("deviation", "Deviation"),
    ("critical_failure", "Critical Failure"),
];

/// Caption of a boolean toggle whose parameter has no unit
pub const DEFAULT_TOGGLE_CAPTION: &str = "OK";

/// A raw value as entered on the form. An unset value is the absence of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CapturedValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<&str> for CapturedValue {
    fn from(raw: &str) -> Self {
        CapturedValue::Text(raw.to_string())
    }
}

impl From<bool> for CapturedValue {
    fn from(flag: bool) -> Self {
        CapturedValue::Flag(flag)
    }
}

/// Parse entered text as a decimal number. Surrounding whitespace is ignored
/// and NaN never counts as a number.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| !value.is_nan())
}

/// Status of one parameter given its current value.
///
/// Unset and blank values are pending. Boolean parameters, flags and text
/// that does not parse are in spec. Any other value that reads as a number is
/// compared against the inclusive window, lower bound first, whatever the
/// parameter's input kind.
pub fn evaluate(spec: &ParameterSpec, value: Option<&CapturedValue>) -> ParameterStatus {
    let number = match value {
        None => return ParameterStatus::Pending,
        Some(CapturedValue::Text(raw)) if raw.trim().is_empty() => {
            return ParameterStatus::Pending;
        }
        Some(_) if spec.parameter.input_kind == InputKind::Boolean => {
            return ParameterStatus::InSpec;
        }
        Some(CapturedValue::Flag(_)) => return ParameterStatus::InSpec,
        Some(CapturedValue::Number(number)) => Some(*number).filter(|n| !n.is_nan()),
        Some(CapturedValue::Text(raw)) => parse_number(raw),
    };

    match number {
        Some(number) => check_window(number, spec.min_value, spec.max_value),
        None => ParameterStatus::InSpec,
    }
}

fn check_window(number: f64, min: Option<f64>, max: Option<f64>) -> ParameterStatus {
    if min.is_some_and(|min| number < min) || max.is_some_and(|max| number > max) {
        ParameterStatus::OutOfSpec
    } else {
        ParameterStatus::InSpec
    }
}

/// Out of spec as soon as any status is; pending never degrades the verdict
pub fn overall<I>(statuses: I) -> Disposition
where
    I: IntoIterator<Item = ParameterStatus>,
{
    if statuses
        .into_iter()
        .any(|status| status == ParameterStatus::OutOfSpec)
    {
        Disposition::OutOfSpec
    } else {
        Disposition::InSpec
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

/// Entry control rendered for a parameter
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum ControlDescriptor {
    /// Free decimal entry with no step constraint
    NumberEntry { step: String },
    TextEntry,
    Choice { options: Vec<ChoiceOption> },
    Toggle { caption: String },
}

pub fn control_for(kind: InputKind, unit: &str) -> ControlDescriptor {
    match kind {
        InputKind::Numeric => ControlDescriptor::NumberEntry {
            step: "any".to_string(),
        },
        InputKind::FreeText => ControlDescriptor::TextEntry,
        InputKind::Enumerated => ControlDescriptor::Choice {
            options: ENUMERATED_CHOICES
                .iter()
                .map(|(value, label)| ChoiceOption {
                    value: (*value).to_string(),
                    label: (*label).to_string(),
                })
                .collect(),
        },
        InputKind::Boolean => ControlDescriptor::Toggle {
            caption: if unit.trim().is_empty() {
                DEFAULT_TOGGLE_CAPTION.to_string()
            } else {
                unit.to_string()
            },
        },
    }
}

/// One row of the rendered form
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CaptureField {
    pub spec: ParameterSpec,
    pub control: ControlDescriptor,
    pub value: Option<CapturedValue>,
    pub status: ParameterStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

impl SubmissionState {
    /// Caption of the submit action in this state
    pub fn action_label(self) -> &'static str {
        match self {
            SubmissionState::Idle => "Save Analysis",
            SubmissionState::Saving => "Saving...",
            SubmissionState::Saved => "Saved",
            SubmissionState::Error => "Retry",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    UnknownParameter(Uuid),
    Locked(SubmissionState),
    NotSubmittable(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::UnknownParameter(id) => {
                write!(f, "parameter {id} is not specified for the selected product")
            }
            CaptureError::Locked(state) => {
                write!(f, "the capture can no longer be edited ({state:?})")
            }
            CaptureError::NotSubmittable(reason) => write!(f, "nothing to submit: {reason}"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Lot annotation stored on the session, or the fallback note when no lot
/// reference was entered
pub fn session_note(lot_reference: &str, fallback: &str) -> String {
    let lot = lot_reference.trim();
    if lot.is_empty() {
        fallback.to_string()
    } else {
        format!("Lot {lot}")
    }
}

/// In-progress capture for one stage. Values are keyed by parameter id and
/// only ever hold entries for the currently loaded specifications.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    stage: StageKind,
    product_id: Option<Uuid>,
    lot_reference: String,
    specs: Vec<ParameterSpec>,
    values: HashMap<Uuid, CapturedValue>,
    state: SubmissionState,
}

impl CaptureSession {
    pub fn new(stage: StageKind) -> Self {
        Self {
            stage,
            product_id: None,
            lot_reference: String::new(),
            specs: Vec::new(),
            values: HashMap::new(),
            state: SubmissionState::Idle,
        }
    }

    pub fn stage(&self) -> StageKind {
        self.stage
    }

    pub fn product_id(&self) -> Option<Uuid> {
        self.product_id
    }

    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn lot_reference(&self) -> &str {
        &self.lot_reference
    }

    /// Switch to another product (or none). Every captured value is dropped
    /// and the new product's specifications replace the old ones.
    pub async fn select_product<S>(&mut self, product_id: Option<Uuid>, source: &S)
    where
        S: SpecificationSource + ?Sized,
    {
        self.values.clear();
        self.specs.clear();
        self.product_id = product_id;
        self.state = SubmissionState::Idle;

        self.specs = order_specs(source.specs_for_product(product_id).await);
        tracing::debug!(
            "Loaded {} specifications for product {product_id:?}",
            self.specs.len()
        );
    }

    /// Record or clear (`None`) the value of one loaded parameter
    pub fn set_value(
        &mut self,
        parameter_id: Uuid,
        value: Option<CapturedValue>,
    ) -> Result<(), CaptureError> {
        if matches!(self.state, SubmissionState::Saving | SubmissionState::Saved) {
            return Err(CaptureError::Locked(self.state));
        }
        if !self.specs.iter().any(|spec| spec.parameter_id == parameter_id) {
            return Err(CaptureError::UnknownParameter(parameter_id));
        }

        match value {
            Some(value) => {
                self.values.insert(parameter_id, value);
            }
            None => {
                self.values.remove(&parameter_id);
            }
        }
        Ok(())
    }

    pub fn set_lot_reference(&mut self, lot_reference: impl Into<String>) {
        self.lot_reference = lot_reference.into();
    }

    pub fn value(&self, parameter_id: Uuid) -> Option<&CapturedValue> {
        self.values.get(&parameter_id)
    }

    /// Status of every loaded parameter, in display order
    pub fn statuses(&self) -> Vec<(Uuid, ParameterStatus)> {
        self.specs
            .iter()
            .map(|spec| (spec.parameter_id, evaluate(spec, self.value(spec.parameter_id))))
            .collect()
    }

    pub fn overall_status(&self) -> Disposition {
        overall(self.statuses().into_iter().map(|(_, status)| status))
    }

    pub fn fields(&self) -> Vec<CaptureField> {
        self.specs
            .iter()
            .map(|spec| {
                let value = self.value(spec.parameter_id).cloned();
                CaptureField {
                    control: control_for(spec.parameter.input_kind, &spec.parameter.unit),
                    status: evaluate(spec, value.as_ref()),
                    value,
                    spec: spec.clone(),
                }
            })
            .collect()
    }

    /// A product is selected, at least one specification is loaded and no
    /// submission is in flight or already done
    pub fn can_submit(&self) -> bool {
        self.product_id.is_some()
            && !self.specs.is_empty()
            && !matches!(self.state, SubmissionState::Saving | SubmissionState::Saved)
    }

    fn submit_blocker(&self) -> Option<String> {
        if self.product_id.is_none() {
            Some("no product selected".to_string())
        } else if self.specs.is_empty() {
            Some("the selected product has no specifications".to_string())
        } else if matches!(self.state, SubmissionState::Saving | SubmissionState::Saved) {
            Some(format!("submission is {:?}", self.state).to_lowercase())
        } else {
            None
        }
    }

    /// Records a submission would write right now
    pub fn build_submission(
        &self,
        captured_at: DateTime<Utc>,
        fallback_note: &str,
    ) -> Result<AnalysisSubmission, CaptureError> {
        let product_id = self
            .product_id
            .ok_or_else(|| CaptureError::NotSubmittable("no product selected".to_string()))?;

        let results: Vec<NewAnalysisResult> = self
            .specs
            .iter()
            .map(|spec| {
                let value = self.value(spec.parameter_id);
                let (measured_value, measured_text) =
                    coerce_measurement(spec.parameter.input_kind, value);
                NewAnalysisResult {
                    parameter_id: spec.parameter_id,
                    measured_value,
                    measured_text,
                    unit: spec.parameter.unit.clone(),
                    spec_min: spec.min_value,
                    spec_target: spec.target_value,
                    spec_max: spec.max_value,
                    status: evaluate(spec, value),
                    order_index: spec.order_index,
                }
            })
            .collect();

        Ok(AnalysisSubmission {
            session: NewAnalysisSession {
                stage_kind: self.stage,
                product_id,
                overall_status: overall(results.iter().map(|result| result.status)),
                captured_at,
                note: session_note(&self.lot_reference, fallback_note),
            },
            results,
        })
    }

    /// Persist the capture. A failed attempt leaves the values in place so
    /// the same capture can be retried; a successful one discards them.
    pub async fn submit<S>(
        &mut self,
        store: &S,
        fallback_note: &str,
    ) -> Result<SubmissionOutcome, CaptureError>
    where
        S: AnalysisStore + ?Sized,
    {
        if let Some(reason) = self.submit_blocker() {
            return Err(CaptureError::NotSubmittable(reason));
        }

        let submission = self.build_submission(Utc::now(), fallback_note)?;
        self.state = SubmissionState::Saving;

        let outcome = submit_analysis(store, &submission).await;
        if outcome.is_success() {
            self.state = SubmissionState::Saved;
            self.values.clear();
        } else {
            self.state = SubmissionState::Error;
        }

        Ok(outcome)
    }
}
