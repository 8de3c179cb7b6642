// Offline whole-document checks: the two fixed party rules
use shared_types::{is_blank, FieldValues, ValidationError, ValidationReport};

/// Statute cited when a deed is missing a party
pub const PARTY_STATUTE: &str = "Cal. Civ. Code § 1091";

pub fn check_required_parties(data: &FieldValues) -> ValidationReport {
    let mut report = ValidationReport::valid();

    for (field, label) in [("grantor", "Grantor"), ("grantee", "Grantee")] {
        if data.get(field).map_or(true, is_blank) {
            report.push(
                ValidationError::error(field, format!("{} name is required", label))
                    .with_legal_basis(PARTY_STATUTE),
            );
        }
    }

    report
}
