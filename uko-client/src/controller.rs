//! Submission controller
//!
//! Owns one form instance: the raw field values, their validation messages,
//! the tribe catalog and the submission status. All mutation goes through the
//! methods here; front ends only read snapshots.
//!
//! # Lifecycle
//! 1. `new()` builds an empty form (catalog marked loading)
//! 2. `init()` loads the tribe catalog, once
//! 3. `set_field()` per edit, `submit()` on demand
//! 4. `reset()` after the result has been shown

use crate::api::PredictorBackend;
use crate::catalog::{TribeCatalog, TribeCatalogLoader};
use crate::error::{SubmissionError, SubmitError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use uko_common::validation::{normalize_dob_to_iso, validate_field, validate_form};
use uko_common::{FieldErrorMap, FormField, FormState, PredictionRequest, PredictionResult};

/// Where the form is in the submit cycle
///
/// Result and error share this enum, so at most one of them exists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    InFlight,
    Succeeded(PredictionResult),
    Failed(SubmissionError),
}

impl SubmissionStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionStatus::InFlight)
    }
}

#[derive(Debug, Default)]
struct FormInstance {
    form: FormState,
    field_errors: FieldErrorMap,
    status: SubmissionStatus,
    catalog: TribeCatalog,
    initialized: bool,
}

impl FormInstance {
    fn can_submit(&self) -> bool {
        !self.status.is_in_flight()
            && !self.catalog.loading
            && self.field_errors.is_clear()
            && !self.form.missing_required()
    }
}

/// Build the wire payload from a form that passed validation
pub fn build_request(form: &FormState) -> uko_common::Result<PredictionRequest> {
    Ok(PredictionRequest {
        name: form.name.trim().to_string(),
        dob: normalize_dob_to_iso(&form.dob)?,
        tribe: form.tribe.clone(),
        gender: form.gender,
    })
}

/// Form state owner and prediction request orchestrator
pub struct SubmissionController {
    backend: Arc<dyn PredictorBackend>,
    state: RwLock<FormInstance>,
}

impl SubmissionController {
    pub fn new(backend: Arc<dyn PredictorBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(FormInstance::default()),
        }
    }

    /// Load the tribe catalog
    ///
    /// Runs the request only on the first call for this form instance;
    /// returns `false` for later calls.
    pub async fn init(&self) -> bool {
        {
            let mut state = self.state.write().await;
            if state.initialized {
                debug!("Form already initialized, skipping catalog load");
                return false;
            }
            state.initialized = true;
        }

        let outcome = TribeCatalogLoader::load(self.backend.as_ref()).await;
        self.state.write().await.catalog.finish(outcome);
        true
    }

    /// Apply one edit
    ///
    /// Recomputes the field's error and clears any stored submission error,
    /// whether or not the new value is valid. Returns `false` when the edit is
    /// ignored: inputs are locked during a request, and the tribe selector is
    /// locked while the catalog loads. A tribe that is not in the catalog is
    /// stored as no selection; an unknown gender as unset.
    pub async fn set_field(&self, field: FormField, value: &str) -> bool {
        let mut state = self.state.write().await;

        if state.status.is_in_flight() {
            debug!(field = %field, "Edit ignored while request in flight");
            return false;
        }

        match field {
            FormField::Name => state.form.name = value.to_string(),
            FormField::Dob => state.form.dob = value.to_string(),
            FormField::Tribe => {
                if !state.catalog.selectable() {
                    debug!("Tribe edit ignored while catalog loading");
                    return false;
                }
                let selected = state
                    .catalog
                    .find(value)
                    .map(|option| option.value.clone())
                    .unwrap_or_default();
                state.form.tribe = selected;
            }
            FormField::Gender => state.form.gender = value.parse().ok(),
        }

        if field.is_required() {
            let message = validate_field(field, state.form.value(field));
            state.field_errors.set(field, message);
        }

        if matches!(state.status, SubmissionStatus::Failed(_)) {
            state.status = SubmissionStatus::Idle;
        }
        true
    }

    /// Whether a submit would currently go out (derived fresh on every call)
    pub async fn can_submit(&self) -> bool {
        self.state.read().await.can_submit()
    }

    /// Validate and submit the form
    ///
    /// At most one request is outstanding: the `Idle → InFlight` transition
    /// happens under the write lock, and calls made while in flight (or while
    /// the catalog loads) return `SubmitError::Busy` without a request.
    pub async fn submit(&self) -> Result<PredictionResult, SubmitError> {
        let request = {
            let mut state = self.state.write().await;

            if state.status.is_in_flight() || state.catalog.loading {
                debug!(
                    in_flight = state.status.is_in_flight(),
                    catalog_loading = state.catalog.loading,
                    "Submit ignored"
                );
                return Err(SubmitError::Busy);
            }

            state.status = SubmissionStatus::Idle;
            let errors = validate_form(&state.form);
            state.field_errors = errors.clone();
            if !errors.is_clear() {
                debug!(failing = errors.failing().count(), "Submit blocked by field errors");
                return Err(SubmitError::Invalid(errors));
            }

            let request = build_request(&state.form).map_err(|_| SubmitError::Invalid(errors))?;
            state.status = SubmissionStatus::InFlight;
            request
        };

        info!(tribe = %request.tribe, "Submitting prediction");
        let outcome = self
            .backend
            .predict(&request)
            .await
            .and_then(|body| PredictionResult::from_response(&body).map_err(SubmissionError::from));

        let mut state = self.state.write().await;
        match outcome {
            Ok(result) => {
                info!(
                    result_id = %result.id,
                    percentage = result.percentage,
                    "Prediction received"
                );
                state.status = SubmissionStatus::Succeeded(result.clone());
                Ok(result)
            }
            Err(err) => {
                error!(error = %err, detail = ?err.detail(), "Prediction request failed");
                state.status = SubmissionStatus::Failed(err.clone());
                Err(SubmitError::Failed(err))
            }
        }
    }

    /// Dismiss the result and clear the form
    ///
    /// Ignored while a request is in flight; there is no way to cancel it.
    pub async fn reset(&self) -> bool {
        let mut state = self.state.write().await;
        if state.status.is_in_flight() {
            debug!("Reset ignored while request in flight");
            return false;
        }
        state.form = FormState::default();
        state.field_errors = FieldErrorMap::default();
        state.status = SubmissionStatus::Idle;
        true
    }

    pub async fn form(&self) -> FormState {
        self.state.read().await.form.clone()
    }

    pub async fn field_errors(&self) -> FieldErrorMap {
        self.state.read().await.field_errors.clone()
    }

    pub async fn status(&self) -> SubmissionStatus {
        self.state.read().await.status.clone()
    }

    pub async fn result(&self) -> Option<PredictionResult> {
        match &self.state.read().await.status {
            SubmissionStatus::Succeeded(result) => Some(result.clone()),
            _ => None,
        }
    }

    pub async fn submission_error(&self) -> Option<SubmissionError> {
        match &self.state.read().await.status {
            SubmissionStatus::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    pub async fn catalog(&self) -> TribeCatalog {
        self.state.read().await.catalog.clone()
    }

    pub async fn tribe_placeholder(&self) -> &'static str {
        self.state.read().await.catalog.placeholder()
    }
}
