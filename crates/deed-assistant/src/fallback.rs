//! Deterministic offline answers
//!
//! Used whenever the remote assistant is unavailable or exhausted its
//! retries. Pure functions of their inputs.

use serde_json::Value;
use shared_types::{
    ActionType, Alternative, DocumentSuggestion, DocumentType, FieldSuggestion, FieldValues,
    PromptAction, PromptIntent, PromptResponse, PropertyRecord, SuggestionSource, TransferTax,
    ValidationReport,
};
use validation_engine::{indicates_spousal_relationship, ValidationEngine};

use crate::backend::SuggestionContext;

/// County documentary transfer tax, $1.10 per $1,000
pub const COUNTY_RATE: f64 = 0.0011;
/// City transfer tax, $4.50 per $1,000
pub const CITY_RATE: f64 = 0.0045;

/// Statute exempting transfers between spouses
pub const INTERSPOUSAL_EXEMPTION: &str = "R&T 11927";

pub const ADDRESS_FIELD: &str = "property_address";
pub const GRANTOR_FIELD: &str = "grantor";

/// Offline document type recommendation.
///
/// A keyword match on owner names. Reliable enough for a first suggestion and
/// nothing more.
pub fn suggest_document_type(property: &PropertyRecord) -> DocumentSuggestion {
    let spousal = property
        .current_owners
        .iter()
        .any(|o| indicates_spousal_relationship(&o.name));

    if spousal {
        DocumentSuggestion {
            recommended_type: DocumentType::InterspousalTransfer,
            confidence: 0.7,
            reasoning: "Owner names indicate a spouse on title. Transfers between spouses \
                        usually use an interspousal transfer deed and are exempt from \
                        documentary transfer tax."
                .to_string(),
            alternatives: vec![Alternative {
                document_type: DocumentType::GrantDeed,
                confidence: 0.3,
                reasoning: "Use a grant deed if the transfer is not between spouses".to_string(),
                pros: vec!["Includes implied warranties".to_string()],
                cons: vec!["Transfer tax applies".to_string()],
            }],
            risk_factors: vec!["Marital status inferred from owner names only".to_string()],
            legal_considerations: vec![format!(
                "Confirm eligibility for the {} exemption",
                INTERSPOUSAL_EXEMPTION
            )],
        }
    } else {
        DocumentSuggestion {
            recommended_type: DocumentType::GrantDeed,
            confidence: 0.8,
            reasoning: "A grant deed is the standard instrument for transferring California \
                        real property."
                .to_string(),
            alternatives: vec![Alternative {
                document_type: DocumentType::QuitclaimDeed,
                confidence: 0.2,
                reasoning: "Use a quitclaim deed to release an interest without warranties"
                    .to_string(),
                pros: vec!["Simple to prepare".to_string()],
                cons: vec!["No warranty of title".to_string()],
            }],
            risk_factors: Vec::new(),
            legal_considerations: Vec::new(),
        }
    }
}

/// Offline field suggestions for one step
pub fn field_suggestions(step_id: &str, context: &SuggestionContext) -> Vec<FieldSuggestion> {
    let Some(property) = &context.property else {
        return Vec::new();
    };

    match step_id {
        "property" if !property.address.full_address.trim().is_empty() => vec![FieldSuggestion {
            field: ADDRESS_FIELD.to_string(),
            value: Value::String(property.address.full_address.clone()),
            confidence: 0.9,
            reasoning: "Address selected during property search".to_string(),
            source: SuggestionSource::User,
            requires_verification: false,
            legal_implications: None,
        }],
        "parties" if !property.current_owners.is_empty() => vec![FieldSuggestion {
            field: GRANTOR_FIELD.to_string(),
            value: Value::String(property.owner_names()),
            confidence: 0.8,
            reasoning: "Current owners of record".to_string(),
            source: SuggestionSource::Records,
            requires_verification: true,
            legal_implications: Some(
                "Grantor names must match the vesting on the current deed".to_string(),
            ),
        }],
        _ => Vec::new(),
    }
}

/// Offline document check: grantor and grantee only
pub fn validate_document(data: &FieldValues) -> ValidationReport {
    ValidationEngine::new().check_required_parties(data)
}

/// Offline prompt handling
pub fn process_prompt(prompt: &str) -> PromptResponse {
    let lower = prompt.to_lowercase();
    if lower.contains("fill") && lower.contains("name") {
        PromptResponse {
            intent: PromptIntent::FieldUpdate,
            actions: vec![PromptAction {
                action_type: ActionType::ManualInput,
                field: None,
                value: None,
                description: "Enter the names in the form fields".to_string(),
            }],
            response: "I can't fill in names automatically right now. Please enter them \
                       directly in the form."
                .to_string(),
            suggestions: Vec::new(),
        }
    } else {
        PromptResponse {
            intent: PromptIntent::InformationRequest,
            actions: Vec::new(),
            response: "Sorry, the assistant is unavailable right now. You can keep filling \
                       out the form manually."
                .to_string(),
            suggestions: Vec::new(),
        }
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Offline transfer tax at the standard county and city rates.
///
/// City tax applies only when a city is given. Negative or non-finite values
/// are taxed as zero.
pub fn transfer_tax(value: f64, county: &str, city: Option<&str>) -> TransferTax {
    let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
    let city = city.map(str::trim).filter(|c| !c.is_empty());

    let county_amount = round_cents(value * COUNTY_RATE);
    let city_amount = match city {
        Some(_) => round_cents(value * CITY_RATE),
        None => 0.0,
    };

    let mut basis = format!("{} County rate $1.10 per $1,000", county.trim());
    if let Some(city) = city {
        basis.push_str(&format!("; {} city rate $4.50 per $1,000", city));
    }

    TransferTax {
        county_amount,
        city_amount,
        total_amount: round_cents(county_amount + city_amount),
        basis,
        exemptions: Vec::new(),
    }
}

/// Zero tax for a transfer between spouses
pub fn interspousal_exemption() -> TransferTax {
    TransferTax {
        county_amount: 0.0,
        city_amount: 0.0,
        total_amount: 0.0,
        basis: format!(
            "Exempt from documentary transfer tax under {} (transfer between spouses)",
            INTERSPOUSAL_EXEMPTION
        ),
        exemptions: vec![INTERSPOUSAL_EXEMPTION.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use shared_types::{NormalizedAddress, Owner};

    fn record(owners: &[&str]) -> PropertyRecord {
        PropertyRecord {
            address: NormalizedAddress {
                full_address: "123 Main St, Los Angeles, CA 90210".into(),
                street: "123 Main St".into(),
                city: "Los Angeles".into(),
                state: "CA".into(),
                zip: "90210".into(),
                county: "Los Angeles".into(),
                external_place_id: "place-1".into(),
            },
            apn: "555-001-002".into(),
            legal_description: "LOT 1 OF TRACT 1234".into(),
            county: "Los Angeles".into(),
            current_owners: owners.iter().map(|n| Owner::new(*n)).collect(),
            liens: Vec::new(),
            encumbrances: Vec::new(),
            tax_info: None,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_spousal_owners_suggest_interspousal() {
        let s = suggest_document_type(&record(&["John Doe, husband", "Jane Doe, wife"]));
        assert_eq!(s.recommended_type, DocumentType::InterspousalTransfer);
        assert_eq!(s.confidence, 0.7);
        assert!(s.reasoning.contains("spouse"));
    }

    #[test]
    fn test_plain_owners_suggest_grant_deed() {
        let s = suggest_document_type(&record(&["Acme Holdings LLC"]));
        assert_eq!(s.recommended_type, DocumentType::GrantDeed);
        assert_eq!(s.confidence, 0.8);
    }

    #[test]
    fn test_fallback_suggestion_passes_validation() {
        let engine = ValidationEngine::new();
        for owners in [&["Jane Doe, a married woman"][..], &["Bob Smith"][..]] {
            let s = suggest_document_type(&record(owners));
            assert!(engine.validate_document_suggestion(&(&s).into()).is_valid);
        }
    }

    #[test]
    fn test_field_suggestions_per_step() {
        let context = SuggestionContext {
            property: Some(record(&["John Doe", "Jane Doe"])),
            fields: FieldValues::new(),
        };

        let property = field_suggestions("property", &context);
        assert_eq!(property.len(), 1);
        assert_eq!(property[0].value, json!("123 Main St, Los Angeles, CA 90210"));
        assert_eq!(property[0].source, SuggestionSource::User);

        let parties = field_suggestions("parties", &context);
        assert_eq!(parties[0].field, "grantor");
        assert_eq!(parties[0].value, json!("John Doe; Jane Doe"));
        assert!(parties[0].requires_verification);

        assert!(field_suggestions("recording", &context).is_empty());
        assert!(field_suggestions("property", &SuggestionContext::default()).is_empty());
    }

    #[test]
    fn test_offline_document_check_requires_parties() {
        let mut data = FieldValues::new();
        data.insert("grantor".into(), json!("John Doe"));
        let report = validate_document(&data);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.field == "grantee"));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_prompt_fallback_intents() {
        let fill = process_prompt("Please FILL in the grantee name");
        assert_eq!(fill.intent, PromptIntent::FieldUpdate);
        assert_eq!(fill.actions[0].action_type, ActionType::ManualInput);

        let other = process_prompt("What is a quitclaim deed?");
        assert_eq!(other.intent, PromptIntent::InformationRequest);
        assert!(other.actions.is_empty());
    }

    #[test]
    fn test_transfer_tax_with_city() {
        let tax = transfer_tax(500_000.0, "Los Angeles", Some("Los Angeles"));
        assert_eq!(tax.county_amount, 550.0);
        assert_eq!(tax.city_amount, 2250.0);
        assert_eq!(tax.total_amount, 2800.0);
        assert!(tax.basis.contains("$1.10"));
        assert!(tax.basis.contains("$4.50"));
    }

    #[test]
    fn test_transfer_tax_without_city() {
        let tax = transfer_tax(350_000.0, "Orange", None);
        assert_eq!(tax.county_amount, 385.0);
        assert_eq!(tax.city_amount, 0.0);
        assert_eq!(tax.total_amount, 385.0);
        assert_eq!(transfer_tax(100_000.0, "Orange", Some("  ")).city_amount, 0.0);
    }

    #[test]
    fn test_interspousal_exemption_is_zero() {
        let tax = interspousal_exemption();
        assert_eq!(tax.total_amount, 0.0);
        assert_eq!(tax.exemptions, vec!["R&T 11927".to_string()]);
    }
}
