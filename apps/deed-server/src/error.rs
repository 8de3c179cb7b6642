//! Error types for the deed server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use deed_wizard::WizardError;
use property_search::LookupError;
use serde::Serialize;
use shared_types::ValidationReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Search rejected: {}", .0.errors.first().map(|e| e.message.as_str()).unwrap_or("invalid search"))]
    SearchRejected(ValidationReport),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Wizard(#[from] WizardError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

fn wizard_status(err: &WizardError) -> (StatusCode, &'static str, Option<serde_json::Value>) {
    match err {
        WizardError::InvalidPhase { .. } => (StatusCode::CONFLICT, "INVALID_PHASE", None),
        WizardError::AlreadyEnriched => (StatusCode::CONFLICT, "ALREADY_ENRICHED", None),
        WizardError::PropertyUnresolved(_) => (StatusCode::CONFLICT, "PROPERTY_UNRESOLVED", None),
        WizardError::StepBlocked { errors, .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "STEP_BLOCKED",
            serde_json::to_value(errors).ok(),
        ),
        WizardError::DocumentInvalid(report) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "DOCUMENT_INVALID",
            serde_json::to_value(report).ok(),
        ),
        WizardError::SearchRejected(report) => (
            StatusCode::BAD_REQUEST,
            "SEARCH_REJECTED",
            serde_json::to_value(report).ok(),
        ),
        WizardError::Generation(_) => (StatusCode::BAD_GATEWAY, "GENERATION_FAILED", None),
        WizardError::UnsupportedDocumentType(_)
        | WizardError::NoDocumentType
        | WizardError::UnknownStep(_)
        | WizardError::UnknownField { .. }
        | WizardError::NoPropertyRecord
        | WizardError::Selection(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", None),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            ServerError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", None),
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", None),
            ServerError::SearchRejected(report) => (
                StatusCode::BAD_REQUEST,
                "SEARCH_REJECTED",
                serde_json::to_value(report).ok(),
            ),
            ServerError::Lookup(LookupError::AddressLookupFailed(_)) => {
                (StatusCode::BAD_GATEWAY, "ADDRESS_LOOKUP_FAILED", None)
            }
            ServerError::Lookup(_) => (StatusCode::BAD_GATEWAY, "LOOKUP_FAILED", None),
            ServerError::Wizard(err) => wizard_status(err),
        };

        // Generation errors display the document service's own detail
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
