pub mod input;
pub mod patterns;
pub mod rules;

pub use input::{AlternativeData, PropertyData, SearchRequest, SessionSnapshot, SuggestionData};
pub use patterns::indicates_spousal_relationship;

use shared_types::{FieldValues, StepConfig, ValidationReport};
use tracing::debug;

/// ValidationEngine entry point.
///
/// Every check returns its findings as data; nothing here fails.
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_property_data(&self, data: &PropertyData) -> ValidationReport {
        let report = rules::property::check_property_data(data);
        debug!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Validated property data"
        );
        report
    }

    pub fn validate_document_suggestion(&self, suggestion: &SuggestionData) -> ValidationReport {
        rules::suggestion::check_document_suggestion(suggestion)
    }

    pub fn validate_search_request(&self, request: &SearchRequest) -> ValidationReport {
        rules::search::check_search_request(request)
    }

    pub fn validate_session_consistency(&self, snapshot: &SessionSnapshot) -> ValidationReport {
        rules::consistency::check_session_consistency(snapshot)
    }

    /// Check the values of a single wizard step
    pub fn check_step(&self, step: &StepConfig, values: &FieldValues) -> ValidationReport {
        rules::step::check_step(step, values)
    }

    /// Offline document check: grantor and grantee must be present
    pub fn check_required_parties(&self, data: &FieldValues) -> ValidationReport {
        rules::document::check_required_parties(data)
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Owner, Severity};

    #[test]
    fn test_engine_flags_invalid_property_data() {
        let engine = ValidationEngine::new();
        let data = PropertyData {
            address: "123".into(),
            apn: Some("invalid-apn".into()),
            county: "Invalid County".into(),
            current_owners: vec![Owner::new("")],
            liens: Vec::new(),
        };
        let report = engine.validate_property_data(&data);

        assert!(!report.is_valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.field == "currentOwners[0].name"));
        assert!(report.warnings.iter().any(|w| w.field == "apn"));
        assert!(report.warnings.iter().any(|w| w.field == "county"));
    }

    #[test]
    fn test_engine_rejects_po_box_search() {
        let engine = ValidationEngine::new();
        let report = engine.validate_search_request(&SearchRequest::new("P.O. Box 42, Fresno, CA"));
        assert!(report
            .errors
            .iter()
            .any(|e| e.severity == Severity::Error && e.message.contains("PO Box")));
    }

    #[test]
    fn test_engine_accepts_clean_session() {
        let engine = ValidationEngine::new();
        let snapshot = SessionSnapshot {
            property_data: Some(PropertyData {
                address: "123 Main St, Los Angeles, CA 90210".into(),
                apn: Some("555-001-002".into()),
                county: "Los Angeles".into(),
                current_owners: vec![Owner::new("John Doe, a single man")],
                liens: Vec::new(),
            }),
            document_suggestion: Some(SuggestionData {
                recommended_type: "grant_deed".into(),
                confidence: 0.8,
                reasoning: "Standard transfer of ownership".into(),
                alternatives: Vec::new(),
            }),
            search_request: Some(SearchRequest::new("123 Main St, Los Angeles, CA 90210")),
        };
        let report = engine.validate_session_consistency(&snapshot);
        assert!(report.is_valid);
        assert!(report.warnings.is_empty());
    }
}
