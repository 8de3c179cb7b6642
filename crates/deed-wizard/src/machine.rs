//! WizardStateMachine: the only writer of a [`WizardSession`]
//!
//! ```text
//! SelectingDocumentType -> InStep(1..=N) -> Generating -> Succeeded
//!                                  ^             |
//!                                  +-- failed ---+
//! ```
//!
//! A failed generation lands back on the last step with every entered value
//! intact.

use std::collections::BTreeMap;
use std::sync::Arc;

use deed_assistant::{fallback, SuggestionClient, SuggestionContext, Telemetry, TelemetryEvent};
use serde::Serialize;
use serde_json::Value;
use shared_types::{
    is_blank, DocumentSuggestion, DocumentType, EnrichmentOutcome, FieldSuggestion, FieldValues,
    StepConfig, TransferTax, ValidationError, ValidationReport,
};
use tracing::{debug, info, warn};
use validation_engine::rules::step::parse_currency;
use validation_engine::{PropertyData, SessionSnapshot, SuggestionData, ValidationEngine};

use crate::error::WizardError;
use crate::generation::{assemble_generation_request, DocumentGenerator, GeneratedDocument};
use crate::registry::{DocumentTypeConfig, DocumentTypeRegistry};
use crate::session::{WizardPhase, WizardSession};

/// Result of a successful `advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "to", content = "step", rename_all = "snake_case")]
pub enum Advance {
    Step(usize),
    Generating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current_step: usize,
    pub total_steps: usize,
    pub completed_steps: usize,
    pub percent: u8,
}

pub struct WizardStateMachine {
    pub(crate) session: WizardSession,
    pub(crate) registry: Arc<DocumentTypeRegistry>,
    pub(crate) engine: ValidationEngine,
    pub(crate) telemetry: Arc<dyn Telemetry>,
}

impl WizardStateMachine {
    pub fn new(registry: Arc<DocumentTypeRegistry>, telemetry: Arc<dyn Telemetry>) -> Self {
        Self {
            session: WizardSession::new(),
            registry,
            engine: ValidationEngine::new(),
            telemetry,
        }
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn into_session(self) -> WizardSession {
        self.session
    }

    pub fn registry(&self) -> &DocumentTypeRegistry {
        &self.registry
    }

    fn config(&self) -> Result<&DocumentTypeConfig, WizardError> {
        let document_type = self.session.document_type.ok_or(WizardError::NoDocumentType)?;
        self.registry
            .get(document_type)
            .ok_or(WizardError::UnsupportedDocumentType(document_type))
    }

    fn step(&self, step_id: &str) -> Result<&StepConfig, WizardError> {
        self.config()?
            .step(step_id)
            .ok_or_else(|| WizardError::UnknownStep(step_id.to_string()))
    }

    /// Config of the step the user is on
    pub fn current_step(&self) -> Option<&StepConfig> {
        let config = self.config().ok()?;
        config.steps.get(self.session.current_step_index.checked_sub(1)?)
    }

    fn position_label(&self) -> String {
        match self.session.phase {
            WizardPhase::InStep => match self.current_step() {
                Some(step) => format!("step:{}", step.id),
                None => "step".to_string(),
            },
            other => other.as_str().to_string(),
        }
    }

    fn transition(&mut self, phase: WizardPhase, index: usize) {
        let from = self.position_label();
        self.session.phase = phase;
        self.session.current_step_index = index;
        let to = self.position_label();
        debug!(%from, %to, "Wizard transition");
        self.telemetry
            .record(TelemetryEvent::StepTransition { from, to });
    }

    fn require_phase(&self, expected: WizardPhase, operation: &'static str) -> Result<(), WizardError> {
        if self.session.phase == expected {
            Ok(())
        } else {
            Err(WizardError::InvalidPhase {
                operation,
                phase: self.session.phase.as_str(),
            })
        }
    }

    /// Choose the document type and enter its first step
    pub fn select_document_type(&mut self, document_type: DocumentType) -> Result<(), WizardError> {
        self.require_phase(WizardPhase::SelectingDocumentType, "select a document type")?;
        if !self.registry.contains(document_type) {
            return Err(WizardError::UnsupportedDocumentType(document_type));
        }
        self.session.document_type = Some(document_type);
        info!(%document_type, "Document type selected");
        self.transition(WizardPhase::InStep, 1);
        Ok(())
    }

    /// Switch to another document type from any step.
    ///
    /// Values, findings and suggestions survive only for field names the new
    /// type also has; they move to whichever step holds that field now.
    pub fn change_document_type(&mut self, document_type: DocumentType) -> Result<(), WizardError> {
        self.require_phase(WizardPhase::InStep, "change the document type")?;
        let new_config = self
            .registry
            .get(document_type)
            .ok_or(WizardError::UnsupportedDocumentType(document_type))?
            .clone();

        let old_values: FieldValues = std::mem::take(&mut self.session.step_data)
            .into_values()
            .flatten()
            .collect();
        let old_suggestions: Vec<FieldSuggestion> = std::mem::take(&mut self.session.ai_suggestions)
            .into_values()
            .flatten()
            .collect();
        self.session.validation_errors.clear();

        for step in &new_config.steps {
            let kept: FieldValues = step
                .fields
                .iter()
                .filter_map(|f| old_values.get(&f.name).map(|v| (f.name.clone(), v.clone())))
                .collect();
            if !kept.is_empty() {
                let report = self.engine.check_step(step, &kept);
                self.session
                    .validation_errors
                    .insert(step.id.clone(), report.findings().cloned().collect());
                self.session.step_data.insert(step.id.clone(), kept);
            }

            let suggestions: Vec<_> = old_suggestions
                .iter()
                .filter(|s| step.has_field(&s.field))
                .cloned()
                .collect();
            if !suggestions.is_empty() {
                self.session.ai_suggestions.insert(step.id.clone(), suggestions);
            }
        }

        info!(from = ?self.session.document_type, to = %document_type, "Document type changed");
        self.transition(WizardPhase::SelectingDocumentType, 0);
        self.session.document_type = Some(document_type);
        self.transition(WizardPhase::InStep, 1);
        Ok(())
    }

    fn revalidate(&mut self, step_id: &str) -> Result<ValidationReport, WizardError> {
        let step = self.step(step_id)?;
        let empty = FieldValues::new();
        let values = self.session.step_data.get(step_id).unwrap_or(&empty);
        let report = self.engine.check_step(step, values);
        self.session
            .validation_errors
            .insert(step_id.to_string(), report.findings().cloned().collect());
        Ok(report)
    }

    pub fn update_field(
        &mut self,
        step_id: &str,
        field: &str,
        value: Value,
    ) -> Result<ValidationReport, WizardError> {
        let mut fields = FieldValues::new();
        fields.insert(field.to_string(), value);
        self.update_fields(step_id, fields)
    }

    /// Write several values into one step, then re-check that step only
    pub fn update_fields(
        &mut self,
        step_id: &str,
        fields: FieldValues,
    ) -> Result<ValidationReport, WizardError> {
        if self.session.phase != WizardPhase::InStep {
            return Err(WizardError::InvalidPhase {
                operation: "edit fields",
                phase: self.session.phase.as_str(),
            });
        }
        let step = self.step(step_id)?;
        if let Some(unknown) = fields.keys().find(|f| !step.has_field(f)) {
            return Err(WizardError::UnknownField {
                step_id: step_id.to_string(),
                field: unknown.clone(),
            });
        }

        self.session
            .step_data
            .entry(step_id.to_string())
            .or_default()
            .extend(fields);
        self.revalidate(step_id)
    }

    /// Everything preventing the step from completing
    pub fn blocking_errors(&self, step_id: &str) -> Result<Vec<ValidationError>, WizardError> {
        let step = self.step(step_id)?;
        let values = self.session.values(step_id);

        let mut blocking: Vec<ValidationError> = step
            .fields
            .iter()
            .filter(|f| f.required)
            .filter(|f| values.and_then(|v| v.get(&f.name)).map_or(true, is_blank))
            .map(|f| ValidationError::error(f.name.as_str(), format!("{} is required", f.label)))
            .collect();
        blocking.extend(
            self.session
                .errors(step_id)
                .iter()
                .filter(|e| e.severity.is_blocking())
                .cloned(),
        );
        Ok(blocking)
    }

    /// Every required field filled and no error-severity finding
    pub fn can_advance(&self, step_id: &str) -> bool {
        self.blocking_errors(step_id)
            .map(|errors| errors.is_empty())
            .unwrap_or(false)
    }

    pub fn advance(&mut self) -> Result<Advance, WizardError> {
        self.require_phase(WizardPhase::InStep, "advance")?;
        let total = self.config()?.steps.len();
        let step_id = self
            .current_step()
            .map(|s| s.id.clone())
            .ok_or(WizardError::NoDocumentType)?;

        let errors = self.blocking_errors(&step_id)?;
        if !errors.is_empty() {
            debug!(step_id = %step_id, blocking = errors.len(), "Advance blocked");
            return Err(WizardError::StepBlocked { step_id, errors });
        }
        self.require_property()?;

        let index = self.session.current_step_index;
        if index >= total {
            self.transition(WizardPhase::Generating, total);
            Ok(Advance::Generating)
        } else {
            self.transition(WizardPhase::InStep, index + 1);
            Ok(Advance::Step(index + 1))
        }
    }

    /// A pending multi-match or a missing lookup keeps the wizard in place
    fn require_property(&self) -> Result<(), WizardError> {
        if self.has_property() {
            return Ok(());
        }
        let reason = match self.session.enrichment {
            Some(EnrichmentOutcome::MultiMatch { .. }) => "choose one of the matching parcels",
            _ => "look up the property first",
        };
        debug!(reason, "Advance blocked on property");
        Err(WizardError::PropertyUnresolved(reason))
    }

    /// Step back one; never validated
    pub fn go_back(&mut self) -> Result<usize, WizardError> {
        self.require_phase(WizardPhase::InStep, "go back")?;
        let index = self.session.current_step_index;
        if index > 1 {
            self.transition(WizardPhase::InStep, index - 1);
        }
        Ok(self.session.current_step_index)
    }

    /// Copy a suggestion's value into the field it names.
    ///
    /// The suggestion stays in the list.
    pub fn apply_ai_suggestion(
        &mut self,
        suggestion: &FieldSuggestion,
    ) -> Result<ValidationReport, WizardError> {
        let step_id = self
            .config()?
            .step_for_field(&suggestion.field)
            .map(|s| s.id.clone())
            .ok_or_else(|| WizardError::UnknownField {
                step_id: self
                    .current_step()
                    .map(|s| s.id.clone())
                    .unwrap_or_default(),
                field: suggestion.field.clone(),
            })?;
        self.update_field(&step_id, &suggestion.field, suggestion.value.clone())
    }

    /// Replace a step's suggestions with a fresh answer from the assistant
    pub async fn refresh_suggestions(
        &mut self,
        step_id: &str,
        client: &SuggestionClient,
    ) -> Result<&[FieldSuggestion], WizardError> {
        let document_type = self.session.document_type.ok_or(WizardError::NoDocumentType)?;
        self.step(step_id)?;
        let context = SuggestionContext {
            property: self.session.property_record.clone(),
            fields: self.session.values(step_id).cloned().unwrap_or_default(),
        };

        let answer = client
            .get_field_suggestions(document_type, step_id, &context)
            .await;
        if answer.is_fallback() {
            debug!(step_id, "Field suggestions came from offline fallback");
        }
        self.session
            .ai_suggestions
            .insert(step_id.to_string(), answer.value);
        Ok(self.session.suggestions(step_id))
    }

    /// Ask for a document-type recommendation for the current property
    pub async fn request_document_suggestion(
        &mut self,
        client: &SuggestionClient,
    ) -> Result<&DocumentSuggestion, WizardError> {
        let record = self
            .session
            .property_record
            .as_ref()
            .ok_or(WizardError::NoPropertyRecord)?;
        let answer = client.suggest_document_type(record).await;
        Ok(&*self.session.document_suggestion.insert(answer.value))
    }

    pub fn progress(&self) -> Progress {
        let total_steps = self.config().map(|c| c.steps.len()).unwrap_or(0);
        let (current_step, completed_steps) = match self.session.phase {
            WizardPhase::SelectingDocumentType => (0, 0),
            WizardPhase::InStep => (
                self.session.current_step_index,
                self.session.current_step_index.saturating_sub(1),
            ),
            WizardPhase::Generating | WizardPhase::Succeeded => (total_steps, total_steps),
        };
        let percent = if total_steps == 0 {
            0
        } else {
            (completed_steps * 100 / total_steps) as u8
        };
        Progress {
            current_step,
            total_steps,
            completed_steps,
            percent,
        }
    }

    /// Whole-document check: every step plus cross-field consistency
    pub fn document_report(&self) -> Result<ValidationReport, WizardError> {
        let config = self.config()?;
        let mut report = ValidationReport::valid();
        for step in &config.steps {
            for error in self.blocking_errors(&step.id)? {
                report.push(error);
            }
            for finding in self.session.errors(&step.id) {
                if !finding.severity.is_blocking() {
                    report.push(finding.clone());
                }
            }
        }

        let snapshot = SessionSnapshot {
            property_data: self.session.property_record.as_ref().map(PropertyData::from),
            document_suggestion: self.session.document_suggestion.as_ref().map(SuggestionData::from),
            search_request: None,
        };
        let consistency = self.engine.validate_session_consistency(&snapshot);
        Ok(report.merge(ValidationReport::from_findings(consistency.warnings)))
    }

    fn transfer_tax_input(&self) -> Option<(f64, String, Option<String>)> {
        let price = self.session.value("sale_price").and_then(parse_currency)?;
        let county = self
            .session
            .value("county")
            .and_then(shared_types::value_text)
            .or_else(|| self.session.property_record.as_ref().map(|r| r.county.clone()))
            .unwrap_or_default();
        let city = self
            .session
            .value("city")
            .and_then(shared_types::value_text)
            .filter(|c| !c.trim().is_empty());
        Some((price, county, city))
    }

    async fn transfer_tax(&self, client: &SuggestionClient) -> Option<TransferTax> {
        if self.session.document_type == Some(DocumentType::InterspousalTransfer) {
            return Some(fallback::interspousal_exemption());
        }
        let (price, county, city) = self.transfer_tax_input()?;
        Some(
            client
                .calculate_transfer_tax(price, &county, city.as_deref())
                .await
                .value,
        )
    }

    fn return_to_last_step(&mut self, detail: String) {
        let last = self.config().map(|c| c.steps.len()).unwrap_or(1);
        self.session.last_failure = Some(detail);
        self.transition(WizardPhase::InStep, last);
    }

    /// Generate the document.
    ///
    /// On any failure the session returns to the last step with step data
    /// untouched and the failure detail kept in `last_failure`.
    pub async fn generate(
        &mut self,
        generator: &dyn DocumentGenerator,
        client: &SuggestionClient,
    ) -> Result<&GeneratedDocument, WizardError> {
        self.require_phase(WizardPhase::Generating, "generate")?;

        if let Err(err) = self.require_property() {
            warn!("Generation refused without a property record");
            self.return_to_last_step(err.to_string());
            return Err(err);
        }

        let report = self.document_report()?;
        if !report.is_valid {
            warn!(errors = report.errors.len(), "Document failed whole-document validation");
            self.return_to_last_step("Document failed validation".to_string());
            return Err(WizardError::DocumentInvalid(report));
        }

        let tax = self.transfer_tax(client).await;
        let request = assemble_generation_request(&self.session, tax)?;

        match generator.generate(&request).await {
            Ok(document) => {
                info!(id = %document.id, "Document generated");
                self.session.last_failure = None;
                self.transition(WizardPhase::Succeeded, self.session.current_step_index);
                Ok(&*self.session.generated.insert(document))
            }
            Err(err) => {
                let detail = err.detail();
                warn!(%detail, "Document generation failed");
                self.telemetry.record(TelemetryEvent::GenerationFailed {
                    detail: detail.clone(),
                });
                self.return_to_last_step(detail);
                Err(err.into())
            }
        }
    }

    /// Findings currently stored per step
    pub fn findings(&self) -> &BTreeMap<String, Vec<ValidationError>> {
        &self.session.validation_errors
    }
}
