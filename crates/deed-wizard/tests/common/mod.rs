#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use deed_assistant::{NoopTelemetry, Telemetry};
use deed_wizard::{Advance, DocumentTypeRegistry, WizardPhase, WizardStateMachine};
use serde_json::{json, Value};
use shared_types::{FieldKind, FieldSpec, FieldValues, NormalizedAddress, Owner, PropertyRecord};

pub fn machine() -> WizardStateMachine {
    machine_with(Arc::new(NoopTelemetry))
}

pub fn machine_with(telemetry: Arc<dyn Telemetry>) -> WizardStateMachine {
    WizardStateMachine::new(Arc::new(DocumentTypeRegistry::standard()), telemetry)
}

pub fn address() -> NormalizedAddress {
    NormalizedAddress {
        full_address: "123 Main St, Los Angeles, CA 90210".into(),
        street: "123 Main St".into(),
        city: "Los Angeles".into(),
        state: "CA".into(),
        zip: "90210".into(),
        county: "Los Angeles".into(),
        external_place_id: "place-1".into(),
    }
}

pub fn record(owners: &[&str]) -> PropertyRecord {
    PropertyRecord {
        address: address(),
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

/// A value that passes the field's checks
pub fn valid_value(spec: &FieldSpec) -> Value {
    match &spec.kind {
        FieldKind::Choice { options } => json!(options[0]),
        FieldKind::Date => json!("2024-03-01"),
        FieldKind::Currency => json!("500000"),
        FieldKind::Apn => json!("555-001-002"),
        FieldKind::LongText => json!("LOT 1 OF TRACT 1234, City of Los Angeles"),
        FieldKind::Text { .. } => match spec.name.as_str() {
            "property_address" => json!("123 Main St, Los Angeles, CA 90210"),
            "county" | "city" => json!("Los Angeles"),
            "grantor" => json!("John Doe"),
            _ => json!("Jane Roe"),
        },
    }
}

/// Fill every field of one step with a passing value
pub fn fill_step(m: &mut WizardStateMachine, step_id: &str) {
    let step = m
        .registry()
        .get(m.session().document_type.expect("document type"))
        .and_then(|c| c.step(step_id))
        .expect("step")
        .clone();
    let values: FieldValues = step
        .fields
        .iter()
        .map(|f| (f.name.clone(), valid_value(f)))
        .collect();
    m.update_fields(step_id, values).expect("update");
}

/// Fill and advance through every step until generation.
///
/// The machine must already hold a property record.
pub fn complete_all_steps(m: &mut WizardStateMachine) {
    while m.session().phase == WizardPhase::InStep {
        let step = m.current_step().expect("current step").clone();
        let values: FieldValues = step
            .fields
            .iter()
            .map(|f| (f.name.clone(), valid_value(f)))
            .collect();
        m.update_fields(&step.id, values).expect("update");
        if m.advance().expect("advance") == Advance::Generating {
            break;
        }
    }
}
