//! Whole-session consistency checks.
//!
//! The cross-checks here are textual heuristics over owner names and lien
//! lists. They only ever produce warnings.

use crate::input::SessionSnapshot;
use crate::patterns::indicates_spousal_relationship;
use crate::rules::{property, search, suggestion};
use shared_types::{DocumentType, ValidationError, ValidationReport};

pub fn check_session_consistency(snapshot: &SessionSnapshot) -> ValidationReport {
    let mut report = ValidationReport::valid();

    if let Some(data) = &snapshot.property_data {
        report = report.merge(property::check_property_data(data));
    }
    if let Some(s) = &snapshot.document_suggestion {
        report = report.merge(suggestion::check_document_suggestion(s));
    }
    if let Some(req) = &snapshot.search_request {
        report = report.merge(search::check_search_request(req));
    }

    let (Some(data), Some(s)) = (&snapshot.property_data, &snapshot.document_suggestion) else {
        return report;
    };
    let recommended = s.recommended_type.parse::<DocumentType>().ok();

    let spousal = data
        .current_owners
        .iter()
        .any(|o| indicates_spousal_relationship(&o.name));
    if spousal && recommended != Some(DocumentType::InterspousalTransfer) {
        report.push(
            ValidationError::warning(
                "documentSuggestion.recommendedType",
                "Owner names suggest a spousal relationship but an interspousal transfer deed was not recommended",
            )
            .with_suggestion("Confirm whether this is a transfer between spouses")
            .with_legal_basis("Cal. Rev. & Tax. Code § 11927"),
        );
    }

    if !data.liens.is_empty() && recommended == Some(DocumentType::QuitclaimDeed) {
        report.push(
            ValidationError::warning(
                "documentSuggestion.recommendedType",
                format!(
                    "Property has {} recorded lien(s); a quitclaim deed conveys no title warranties",
                    data.liens.len()
                ),
            )
            .with_suggestion("Consider a grant deed or resolve the liens before transfer"),
        );
    }

    report
}
