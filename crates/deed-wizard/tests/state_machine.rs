mod common;

use std::sync::Arc;

use common::{address, complete_all_steps, fill_step, machine, machine_with, record};
use deed_assistant::{RecordingTelemetry, SuggestionClient, Telemetry, TelemetryEvent};
use deed_wizard::{
    Advance, DocumentTypeRegistry, GenerationError, MockGenerator, WizardError, WizardPhase,
    WizardStateMachine,
};
use pretty_assertions::assert_eq;
use property_search::mock::MockTitleSource;
use property_search::{PropertyEnrichmentClient, TitleMatch, TitleResponse};
use serde_json::json;
use shared_types::{DocumentType, FieldSuggestion, SuggestionSource};

#[test]
fn test_unregistered_type_is_rejected() {
    let mut m = WizardStateMachine::new(
        Arc::new(DocumentTypeRegistry::empty()),
        Arc::new(deed_assistant::NoopTelemetry),
    );
    assert_eq!(
        m.select_document_type(DocumentType::GrantDeed),
        Err(WizardError::UnsupportedDocumentType(DocumentType::GrantDeed))
    );
    assert_eq!(m.session().phase, WizardPhase::SelectingDocumentType);
}

#[test]
fn test_select_enters_first_step() {
    let mut m = machine();
    m.select_document_type(DocumentType::GrantDeed).unwrap();
    assert_eq!(m.session().phase, WizardPhase::InStep);
    assert_eq!(m.session().current_step_index, 1);
    assert_eq!(m.current_step().unwrap().id, "property");

    let progress = m.progress();
    assert_eq!(progress.total_steps, 4);
    assert_eq!(progress.completed_steps, 0);
    assert_eq!(progress.percent, 0);

    assert!(matches!(
        m.select_document_type(DocumentType::TaxDeed),
        Err(WizardError::InvalidPhase { .. })
    ));
}

#[test]
fn test_advance_blocked_until_required_fields_present() {
    let mut m = machine();
    m.select_document_type(DocumentType::GrantDeed).unwrap();
    m.update_field("property", "property_address", json!("123 Main St, Los Angeles, CA 90210"))
        .unwrap();

    let Err(WizardError::StepBlocked { step_id, errors }) = m.advance() else {
        panic!("expected blocked step");
    };
    assert_eq!(step_id, "property");
    let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["apn", "county", "legal_description"]);
    assert_eq!(m.session().current_step_index, 1);
}

#[test]
fn test_invalid_value_blocks_and_warning_does_not() {
    let mut m = machine();
    m.select_document_type(DocumentType::GrantDeed).unwrap();

    let report = m
        .update_field("consideration", "sale_price", json!("lots of money"))
        .unwrap();
    assert!(!report.is_valid);
    assert!(!m.can_advance("consideration"));

    m.update_field("consideration", "sale_price", json!("$500,000.00"))
        .unwrap();
    assert!(m.can_advance("consideration"));

    m.update_fields(
        "property",
        [
            ("property_address", json!("123 Main St, Los Angeles, CA 90210")),
            ("apn", json!("not-an-apn")),
            ("county", json!("Los Angeles")),
            ("legal_description", json!("LOT 1")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect(),
    )
    .unwrap();
    assert!(m.session().errors("property").iter().any(|e| e.field == "apn"));
    assert!(m.can_advance("property"));
}

#[test]
fn test_update_revalidates_only_that_step() {
    let mut m = machine();
    m.select_document_type(DocumentType::GrantDeed).unwrap();
    m.update_field("consideration", "sale_price", json!("abc")).unwrap();
    m.update_field("parties", "grantor", json!("John Doe")).unwrap();
    assert_eq!(m.session().errors("consideration").len(), 1);
    assert!(m.session().errors("parties").is_empty());
}

#[test]
fn test_unknown_step_and_field() {
    let mut m = machine();
    m.select_document_type(DocumentType::QuitclaimDeed).unwrap();
    assert_eq!(
        m.update_field("warranties", "warranty_scope", json!("general")),
        Err(WizardError::UnknownStep("warranties".into()))
    );
    assert!(matches!(
        m.update_field("parties", "sale_price", json!("1")),
        Err(WizardError::UnknownField { .. })
    ));
}

#[test]
fn test_go_back_never_validates() {
    let mut m = machine();
    m.attach_property(record(&["John Doe"]));
    m.select_document_type(DocumentType::GrantDeed).unwrap();
    assert_eq!(m.go_back().unwrap(), 1);

    complete_all_steps(&mut m);
    assert_eq!(m.session().phase, WizardPhase::Generating);
    assert!(matches!(m.go_back(), Err(WizardError::InvalidPhase { .. })));
}

#[test]
fn test_change_document_type_keeps_shared_fields() {
    let mut m = machine();
    m.attach_property(record(&["John Doe", "Jane Doe"]));
    m.select_document_type(DocumentType::GrantDeed).unwrap();
    m.update_field("parties", "grantor", json!("John Doe")).unwrap();
    m.update_field("consideration", "sale_price", json!("bogus")).unwrap();
    m.advance().ok();

    m.change_document_type(DocumentType::InterspousalTransfer)
        .unwrap();

    let session = m.session();
    assert_eq!(session.document_type, Some(DocumentType::InterspousalTransfer));
    assert_eq!(session.current_step_index, 1);
    assert_eq!(session.values("parties").unwrap()["grantor"], json!("John Doe"));
    assert!(session.values("consideration").is_none());
    assert!(session.errors("consideration").is_empty());
    assert!(session.property_record.is_some());
}

#[test]
fn test_apply_suggestion_keeps_it_listed() {
    let mut m = machine();
    m.select_document_type(DocumentType::GrantDeed).unwrap();
    let suggestion = FieldSuggestion {
        field: "grantee".into(),
        value: json!("Jane Roe"),
        confidence: 0.9,
        reasoning: "Buyer named in purchase agreement".into(),
        source: SuggestionSource::Inference,
        requires_verification: false,
        legal_implications: None,
    };
    m.apply_ai_suggestion(&suggestion).unwrap();
    assert_eq!(m.session().values("parties").unwrap()["grantee"], json!("Jane Roe"));
}

#[tokio::test]
async fn test_refresh_suggestions_replaces_list() {
    let mut m = machine();
    m.attach_property(record(&["John Doe", "Jane Doe"]));
    m.select_document_type(DocumentType::GrantDeed).unwrap();
    let client = SuggestionClient::offline();

    let list = m.refresh_suggestions("parties", &client).await.unwrap().to_vec();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].value, json!("John Doe; Jane Doe"));

    m.apply_ai_suggestion(&list[0]).unwrap();
    assert_eq!(m.session().suggestions("parties").len(), 1);

    let list = m.refresh_suggestions("recording", &client).await.unwrap();
    assert!(list.is_empty());
    assert_eq!(m.session().suggestions("parties").len(), 1);
}

#[tokio::test]
async fn test_successful_generation() {
    let recorder = Arc::new(RecordingTelemetry::new());
    recorder.start();
    let mut m = machine_with(recorder.clone());
    m.attach_property(record(&["John Doe, a single man"]));
    m.select_document_type(DocumentType::GrantDeed).unwrap();
    complete_all_steps(&mut m);
    assert_eq!(m.progress().percent, 100);

    let generator = MockGenerator::succeeding("doc-42");
    let client = SuggestionClient::offline();
    let doc = m.generate(&generator, &client).await.unwrap();
    assert_eq!(doc.id, "doc-42");
    assert_eq!(m.session().phase, WizardPhase::Succeeded);

    let request = generator.last_request().unwrap();
    let tax = request.tax.unwrap();
    assert_eq!(tax.county_amount, 550.0);
    assert_eq!(tax.city_amount, 2250.0);
    assert_eq!(tax.total_amount, 2800.0);

    let transitions = recorder
        .flush()
        .into_iter()
        .filter(|e| matches!(e, TelemetryEvent::StepTransition { .. }))
        .count();
    assert_eq!(transitions, 6);
}

#[tokio::test]
async fn test_interspousal_request_carries_exemption() {
    let mut m = machine();
    m.attach_property(record(&["John Smith and Mary Smith, husband and wife"]));
    m.select_document_type(DocumentType::InterspousalTransfer)
        .unwrap();
    complete_all_steps(&mut m);

    let generator = MockGenerator::succeeding("doc-7");
    m.generate(&generator, &SuggestionClient::offline())
        .await
        .unwrap();
    let tax = generator.last_request().unwrap().tax.unwrap();
    assert_eq!(tax.total_amount, 0.0);
    assert_eq!(tax.exemptions, vec!["R&T 11927".to_string()]);
}

#[tokio::test]
async fn test_failed_generation_returns_to_last_step() {
    let recorder = Arc::new(RecordingTelemetry::new());
    recorder.start();
    let mut m = machine_with(recorder.clone());
    m.attach_property(record(&["John Doe"]));
    m.select_document_type(DocumentType::QuitclaimDeed).unwrap();
    complete_all_steps(&mut m);
    let before = m.session().step_data.clone();

    let generator = MockGenerator::failing(GenerationError::Rejected {
        status: 422,
        detail: "Grantee vesting is required by the county recorder".into(),
    });
    let err = m
        .generate(&generator, &SuggestionClient::offline())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Grantee vesting is required by the county recorder");
    let session = m.session();
    assert_eq!(session.phase, WizardPhase::InStep);
    assert_eq!(session.current_step_index, 4);
    assert_eq!(session.step_data, before);
    assert_eq!(
        session.last_failure.as_deref(),
        Some("Grantee vesting is required by the county recorder")
    );
    assert!(recorder
        .events()
        .iter()
        .any(|e| matches!(e, TelemetryEvent::GenerationFailed { .. })));

    assert_eq!(m.advance().unwrap(), Advance::Generating);
}

#[tokio::test]
async fn test_generate_requires_generating_phase() {
    let mut m = machine();
    m.select_document_type(DocumentType::GrantDeed).unwrap();
    let generator = MockGenerator::succeeding("doc-1");
    let result = m.generate(&generator, &SuggestionClient::offline()).await;
    assert!(matches!(result, Err(WizardError::InvalidPhase { .. })));
    assert_eq!(generator.call_count(), 0);
}

fn parcel(apn: &str, owner: &str) -> TitleMatch {
    TitleMatch {
        apn: Some(apn.into()),
        county: Some("Los Angeles".into()),
        owner_name: Some(owner.into()),
        full_address: Some("123 Main St, Los Angeles, CA 90210".into()),
        ..TitleMatch::default()
    }
}

#[tokio::test]
async fn test_multi_match_blocks_advance_until_chosen() {
    let client = PropertyEnrichmentClient::new(Arc::new(MockTitleSource::responding(
        TitleResponse::multi(vec![
            parcel("111-111-111", "John Doe"),
            parcel("222-222-222", "Mary Major"),
        ]),
    )));
    let mut m = machine();
    m.enrich_with_progress(&client, address(), 1, |_, _| {})
        .await
        .unwrap();
    m.select_document_type(DocumentType::GrantDeed).unwrap();
    fill_step(&mut m, "property");

    assert!(m.can_advance("property"));
    assert_eq!(
        m.advance(),
        Err(WizardError::PropertyUnresolved("choose one of the matching parcels"))
    );
    assert_eq!(m.session().current_step_index, 1);

    m.choose_match(1).unwrap();
    assert_eq!(m.advance().unwrap(), Advance::Step(2));
    assert_eq!(m.session().property_record.as_ref().unwrap().apn, "222-222-222");
}

#[test]
fn test_steps_locked_without_property_lookup() {
    let mut m = machine();
    m.select_document_type(DocumentType::QuitclaimDeed).unwrap();
    fill_step(&mut m, "property");
    assert_eq!(
        m.advance(),
        Err(WizardError::PropertyUnresolved("look up the property first"))
    );
    assert_eq!(m.session().phase, WizardPhase::InStep);
}

#[tokio::test]
async fn test_generate_refused_when_record_cleared() {
    let client = PropertyEnrichmentClient::new(Arc::new(MockTitleSource::new(vec![
        Ok(TitleResponse::single(parcel("555-001-002", "John Doe"))),
        Ok(TitleResponse::not_found()),
    ])));
    let mut m = machine();
    m.enrich_with_progress(&client, address(), 1, |_, _| {})
        .await
        .unwrap();
    m.select_document_type(DocumentType::GrantDeed).unwrap();
    complete_all_steps(&mut m);
    assert_eq!(m.session().phase, WizardPhase::Generating);

    let mut moved = address();
    moved.full_address = "456 Oak Ave, Los Angeles, CA 90001".into();
    moved.street = "456 Oak Ave".into();
    m.enrich_with_progress(&client, moved, 1, |_, _| {})
        .await
        .unwrap();
    assert!(!m.has_property());

    let generator = MockGenerator::succeeding("doc-1");
    let result = m.generate(&generator, &SuggestionClient::offline()).await;
    assert!(matches!(result, Err(WizardError::PropertyUnresolved(_))));
    assert_eq!(generator.call_count(), 0);
    assert_eq!(m.session().phase, WizardPhase::InStep);
    assert!(m.session().last_generation_failed());
}
