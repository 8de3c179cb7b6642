//! Severity-tagged validation findings

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks the operation being validated
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_basis: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity,
            suggestion: None,
            legal_basis: None,
        }
    }

    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, Severity::Error)
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, Severity::Warning)
    }

    pub fn info(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, Severity::Info)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_legal_basis(mut self, basis: impl Into<String>) -> Self {
        self.legal_basis = Some(basis.into());
        self
    }
}

/// Outcome of a validation pass: errors block, warnings advise
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    /// Warning and info findings
    pub warnings: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Partition findings by severity
    pub fn from_findings(findings: impl IntoIterator<Item = ValidationError>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = findings
            .into_iter()
            .partition(|f| f.severity.is_blocking());
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn merge(mut self, other: ValidationReport) -> Self {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.is_valid = self.errors.is_empty();
        self
    }

    pub fn push(&mut self, finding: ValidationError) {
        if finding.severity.is_blocking() {
            self.errors.push(finding);
            self.is_valid = false;
        } else {
            self.warnings.push(finding);
        }
    }

    pub fn findings(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_findings_partitions_by_severity() {
        let report = ValidationReport::from_findings(vec![
            ValidationError::warning("apn", "odd format"),
            ValidationError::error("county", "required"),
            ValidationError::info("address", "fyi"),
        ]);
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_warnings_alone_stay_valid() {
        let report = ValidationReport::from_findings(vec![ValidationError::warning("a", "b")]);
        assert!(report.is_valid);
    }

    #[test]
    fn test_merge_recomputes_validity() {
        let ok = ValidationReport::valid();
        let bad = ValidationReport::from_findings(vec![ValidationError::error("x", "y")]);
        let merged = ok.merge(bad);
        assert!(!merged.is_valid);
        assert_eq!(merged.findings().count(), 1);
    }

    #[test]
    fn test_builder_sets_optional_fields() {
        let e = ValidationError::error("grantor", "Grantor is required")
            .with_legal_basis("Cal. Civ. Code § 1092")
            .with_suggestion("Enter the current owner's name");
        assert_eq!(e.legal_basis.as_deref(), Some("Cal. Civ. Code § 1092"));
        assert!(e.suggestion.is_some());
    }
}
