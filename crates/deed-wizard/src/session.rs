//! Wizard session aggregate

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{
    DocumentSuggestion, DocumentType, EnrichmentOutcome, FieldSuggestion, FieldValues,
    NormalizedAddress, PropertyRecord, ValidationError,
};

use crate::generation::GeneratedDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardPhase {
    SelectingDocumentType,
    InStep,
    Generating,
    Succeeded,
}

impl WizardPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardPhase::SelectingDocumentType => "selecting_document_type",
            WizardPhase::InStep => "in_step",
            WizardPhase::Generating => "generating",
            WizardPhase::Succeeded => "succeeded",
        }
    }
}

/// User edits to the enriched property record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAmendment {
    pub apn: Option<String>,
    pub legal_description: Option<String>,
}

impl PropertyAmendment {
    pub fn is_empty(&self) -> bool {
        self.apn.is_none() && self.legal_description.is_none()
    }

    pub fn apply(&self, record: &mut PropertyRecord) {
        if let Some(apn) = &self.apn {
            record.apn = apn.clone();
        }
        if let Some(legal) = &self.legal_description {
            record.legal_description = legal.clone();
        }
    }
}

/// Everything one wizard run has collected.
///
/// Only [`WizardStateMachine`](crate::WizardStateMachine) mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSession {
    pub phase: WizardPhase,
    pub document_type: Option<DocumentType>,
    /// 1-based; 0 until a document type is selected
    pub current_step_index: usize,
    pub step_data: BTreeMap<String, FieldValues>,
    pub validation_errors: BTreeMap<String, Vec<ValidationError>>,
    pub ai_suggestions: BTreeMap<String, Vec<FieldSuggestion>>,
    pub document_suggestion: Option<DocumentSuggestion>,
    pub selected_address: Option<NormalizedAddress>,
    pub enrichment: Option<EnrichmentOutcome>,
    pub property_record: Option<PropertyRecord>,
    pub amendments: PropertyAmendment,
    pub generated: Option<GeneratedDocument>,
    /// Detail of the last failed generation attempt
    pub last_failure: Option<String>,
    pub start_time: DateTime<Utc>,
}

impl WizardSession {
    pub fn new() -> Self {
        Self {
            phase: WizardPhase::SelectingDocumentType,
            document_type: None,
            current_step_index: 0,
            step_data: BTreeMap::new(),
            validation_errors: BTreeMap::new(),
            ai_suggestions: BTreeMap::new(),
            document_suggestion: None,
            selected_address: None,
            enrichment: None,
            property_record: None,
            amendments: PropertyAmendment::default(),
            generated: None,
            last_failure: None,
            start_time: Utc::now(),
        }
    }

    pub fn values(&self, step_id: &str) -> Option<&FieldValues> {
        self.step_data.get(step_id)
    }

    /// A field's value from whichever step holds it
    pub fn value(&self, field: &str) -> Option<&serde_json::Value> {
        self.step_data.values().find_map(|v| v.get(field))
    }

    pub fn errors(&self, step_id: &str) -> &[ValidationError] {
        self.validation_errors
            .get(step_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True while the most recent generation attempt has not been followed
    /// by a successful one
    pub fn last_generation_failed(&self) -> bool {
        self.last_failure.is_some()
    }

    /// Whether the session was started at least `ttl` before `now`
    pub fn expired(&self, ttl: std::time::Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now - self.start_time >= ttl,
            Err(_) => false,
        }
    }

    pub fn suggestions(&self, step_id: &str) -> &[FieldSuggestion] {
        self.ai_suggestions
            .get(step_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}
