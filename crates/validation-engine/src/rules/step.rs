// Per-step field checks driven by each field's kind.
// Required-but-empty fields are gated by the wizard, not reported here.
use chrono::NaiveDate;
use serde_json::Value;
use shared_types::{
    is_blank, value_text, FieldKind, FieldSpec, FieldValues, StepConfig, ValidationError,
    ValidationReport,
};

use crate::patterns::is_valid_apn;

/// Parse "$1,250,000.00"-style amounts
pub fn parse_currency(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| *c != '$' && *c != ',')
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };
    amount.filter(|v| v.is_finite())
}

fn check_field(spec: &FieldSpec, value: &Value) -> Option<ValidationError> {
    let name = spec.name.as_str();
    match &spec.kind {
        FieldKind::Text { max_len } => match value_text(value) {
            Some(text) if text.chars().count() > *max_len => Some(ValidationError::error(
                name,
                format!("{} must be at most {} characters", spec.label, max_len),
            )),
            Some(_) => None,
            None => Some(ValidationError::error(
                name,
                format!("{} must be text", spec.label),
            )),
        },
        FieldKind::LongText => value_text(value).is_none().then(|| {
            ValidationError::error(name, format!("{} must be text", spec.label))
        }),
        FieldKind::Currency => match parse_currency(value) {
            Some(v) if v < 0.0 => Some(ValidationError::error(
                name,
                format!("{} cannot be negative", spec.label),
            )),
            Some(_) => None,
            None => Some(
                ValidationError::error(name, format!("{} must be a dollar amount", spec.label))
                    .with_suggestion("Enter a number such as 500000 or $500,000.00"),
            ),
        },
        FieldKind::Choice { options } => {
            let text = value_text(value).unwrap_or_default();
            (!options.iter().any(|o| o == &text)).then(|| {
                ValidationError::error(
                    name,
                    format!("{} must be one of: {}", spec.label, options.join(", ")),
                )
            })
        }
        FieldKind::Date => {
            let text = value_text(value).unwrap_or_default();
            NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .is_err()
                .then(|| {
                    ValidationError::error(name, format!("{} must be a date (YYYY-MM-DD)", spec.label))
                })
        }
        FieldKind::Apn => {
            let text = value_text(value).unwrap_or_default();
            (!is_valid_apn(&text)).then(|| {
                ValidationError::warning(
                    name,
                    format!("{} does not match the expected APN format", spec.label),
                )
                .with_suggestion("Use DDD-DDD-DDD or 8-12 digits")
            })
        }
    }
}

/// Validate the values present for one step. Cost is bounded by the
/// step's own field list.
pub fn check_step(step: &StepConfig, values: &FieldValues) -> ValidationReport {
    let findings = step.fields.iter().filter_map(|spec| {
        let value = values.get(&spec.name).filter(|v| !is_blank(v))?;
        check_field(spec, value)
    });
    ValidationReport::from_findings(findings.collect::<Vec<_>>())
}
