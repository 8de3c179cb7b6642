//! Property-based tests for the validation rules
//!
//! Covers the blocking/advisory split: errors must always appear for
//! structurally broken input, and advisory heuristics must never block.

use proptest::prelude::*;
use shared_types::Owner;
use validation_engine::{PropertyData, SearchRequest, SuggestionData, ValidationEngine};

fn po_box_prefix() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("PO Box".to_string()),
        Just("P.O. Box".to_string()),
        Just("po box".to_string()),
        Just("Post Office Box".to_string()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn po_box_searches_always_blocked(
        prefix in po_box_prefix(),
        number in 1u32..99999,
        city in "[A-Z][a-z]{3,10}"
    ) {
        let engine = ValidationEngine::new();
        let request = SearchRequest::new(format!("{} {}, {}, CA", prefix, number, city));
        let report = engine.validate_search_request(&request);
        prop_assert!(!report.is_valid);
        prop_assert!(report.errors.iter().any(|e| e.message.contains("PO Box")));
    }

    #[test]
    fn confidence_outside_unit_interval_is_error(confidence in prop_oneof![-10.0f64..-0.0001, 1.0001f64..10.0]) {
        let engine = ValidationEngine::new();
        let report = engine.validate_document_suggestion(&SuggestionData {
            recommended_type: "grant_deed".into(),
            confidence,
            reasoning: "A sufficiently long reasoning".into(),
            alternatives: Vec::new(),
        });
        prop_assert!(!report.is_valid);
    }

    #[test]
    fn confidence_heuristics_never_block(confidence in 0.0f64..=1.0) {
        let engine = ValidationEngine::new();
        let report = engine.validate_document_suggestion(&SuggestionData {
            recommended_type: "warranty_deed".into(),
            confidence,
            reasoning: "A sufficiently long reasoning".into(),
            alternatives: Vec::new(),
        });
        prop_assert!(report.is_valid);
    }

    #[test]
    fn any_empty_owner_name_blocks(
        names in prop::collection::vec("[A-Za-z ]{0,20}", 1..5)
    ) {
        let engine = ValidationEngine::new();
        let data = PropertyData {
            address: "123 Main St, Los Angeles, CA 90210".into(),
            apn: None,
            county: "Los Angeles".into(),
            current_owners: names.iter().map(|n| Owner::new(n.clone())).collect(),
            liens: Vec::new(),
        };
        let report = engine.validate_property_data(&data);
        let has_empty = names.iter().any(|n| n.trim().is_empty());
        prop_assert_eq!(report.is_valid, !has_empty);
    }
}
