//! Wizard and generation errors

use property_search::SelectionError;
use shared_types::{DocumentType, ValidationError, ValidationReport};
use thiserror::Error;

/// Failure from the document-generation endpoint.
///
/// `Rejected` displays the server's own detail unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    #[error("Document service unreachable: {0}")]
    Transport(String),

    #[error("Unreadable document service response: {0}")]
    Parse(String),
}

impl GenerationError {
    /// Text to show the user
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GenerationError::Parse(err.to_string())
        } else {
            GenerationError::Transport(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("Document type '{0}' is not available")]
    UnsupportedDocumentType(DocumentType),

    #[error("No document type selected")]
    NoDocumentType,

    #[error("Unknown step '{0}'")]
    UnknownStep(String),

    #[error("Step '{step_id}' has no field '{field}'")]
    UnknownField { step_id: String, field: String },

    #[error("Cannot {operation} while {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: &'static str,
    },

    #[error("Step '{step_id}' has {} blocking issue(s)", .errors.len())]
    StepBlocked {
        step_id: String,
        errors: Vec<ValidationError>,
    },

    #[error("Document failed validation")]
    DocumentInvalid(ValidationReport),

    #[error("Search rejected: {}", first_error(.0))]
    SearchRejected(ValidationReport),

    #[error("Property already enriched for this address")]
    AlreadyEnriched,

    #[error("No property record")]
    NoPropertyRecord,

    /// Steps stay locked until enrichment has produced a single record
    #[error("Property not resolved: {0}")]
    PropertyUnresolved(&'static str),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

fn first_error(report: &ValidationReport) -> &str {
    report
        .errors
        .first()
        .map(|e| e.message.as_str())
        .unwrap_or("invalid request")
}
