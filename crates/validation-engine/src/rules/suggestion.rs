// Document-type recommendation checks
use crate::input::SuggestionData;
use shared_types::{DocumentType, ValidationError, ValidationReport};

pub const MIN_REASONING_LEN: usize = 10;
pub const LOW_CONFIDENCE: f64 = 0.5;
pub const HIGH_CONFIDENCE: f64 = 0.95;

fn is_unit_interval(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

pub fn check_document_suggestion(suggestion: &SuggestionData) -> ValidationReport {
    let mut report = ValidationReport::valid();

    if suggestion.recommended_type.parse::<DocumentType>().is_err() {
        report.push(ValidationError::error(
            "recommendedType",
            format!("Unknown document type '{}'", suggestion.recommended_type),
        ));
    }

    let confidence_ok = is_unit_interval(suggestion.confidence);
    if !confidence_ok {
        report.push(ValidationError::error("confidence", "Confidence must be between 0 and 1"));
    }

    if suggestion.reasoning.trim().chars().count() < MIN_REASONING_LEN {
        report.push(ValidationError::error(
            "reasoning",
            format!("Reasoning must be at least {} characters", MIN_REASONING_LEN),
        ));
    }

    if confidence_ok && suggestion.confidence < LOW_CONFIDENCE {
        report.push(
            ValidationError::warning(
                "confidence",
                "Low confidence recommendation, manual review recommended",
            )
            .with_suggestion("Have an attorney or title officer confirm the deed type"),
        );
    }
    if confidence_ok && suggestion.confidence > HIGH_CONFIDENCE {
        report.push(ValidationError::warning(
            "confidence",
            "Unusually high confidence, verify reasoning",
        ));
    }

    for (i, alt) in suggestion.alternatives.iter().enumerate() {
        if alt.document_type.parse::<DocumentType>().is_err() {
            report.push(ValidationError::error(
                format!("alternatives[{}].type", i),
                format!("Unknown document type '{}'", alt.document_type),
            ));
        }
        if !is_unit_interval(alt.confidence) {
            report.push(ValidationError::error(
                format!("alternatives[{}].confidence", i),
                "Confidence must be between 0 and 1",
            ));
        } else if confidence_ok && alt.confidence >= suggestion.confidence {
            report.push(ValidationError::warning(
                format!("alternatives[{}].confidence", i),
                format!(
                    "Alternative '{}' is at least as confident as the recommendation",
                    alt.document_type
                ),
            ));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::AlternativeData;

    fn suggestion(kind: &str, confidence: f64, reasoning: &str) -> SuggestionData {
        SuggestionData {
            recommended_type: kind.to_string(),
            confidence,
            reasoning: reasoning.to_string(),
            alternatives: Vec::new(),
        }
    }

    #[test]
    fn test_well_formed_suggestion_passes() {
        let report = check_document_suggestion(&suggestion(
            "grant_deed",
            0.8,
            "Standard sale between unrelated parties",
        ));
        assert!(report.is_valid);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_structural_errors() {
        let report = check_document_suggestion(&suggestion("living_trust", 1.4, "short"));
        assert!(!report.is_valid);
        let fields: Vec<_> = report.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"recommendedType"));
        assert!(fields.contains(&"confidence"));
        assert!(fields.contains(&"reasoning"));
        assert_eq!(report.errors[0].message, "Unknown document type 'living_trust'");
        assert_eq!(report.errors[2].message, "Reasoning must be at least 10 characters");
    }

    #[test]
    fn test_confidence_band_warnings() {
        let low = check_document_suggestion(&suggestion("grant_deed", 0.3, "Not much data here"));
        assert!(low.is_valid);
        assert!(low.warnings[0].message.contains("manual review recommended"));

        let high = check_document_suggestion(&suggestion("grant_deed", 0.99, "Clear-cut sale"));
        assert!(high.warnings[0].message.contains("verify reasoning"));
    }

    #[test]
    fn test_competing_alternative_warns() {
        let mut s = suggestion("grant_deed", 0.6, "Sale to an unrelated buyer");
        s.alternatives.push(AlternativeData {
            document_type: "quitclaim_deed".into(),
            confidence: 0.6,
        });
        let report = check_document_suggestion(&s);
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].field, "alternatives[0].confidence");
    }

    #[test]
    fn test_nan_confidence_is_error() {
        let report =
            check_document_suggestion(&suggestion("grant_deed", f64::NAN, "Some reasoning text"));
        assert!(!report.is_valid);
    }
}
