//! SuggestionClient: remote assistant with deterministic fallbacks

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use shared_types::{
    DocumentSuggestion, DocumentType, FieldSuggestion, FieldValues, PromptContext,
    PromptResponse, PropertyRecord, TransferTax, ValidationReport,
};
use tracing::warn;
use validation_engine::ValidationEngine;

use crate::backend::{
    AssistantBackend, DocumentCheckRequest, FieldSuggestionRequest, PromptRequest,
    SuggestionContext, TransferTaxRequest,
};
use crate::failure::FailureReason;
use crate::fallback;
use crate::retry::RetryPolicy;
use crate::telemetry::{NoopTelemetry, Telemetry, TelemetryEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    SuggestDocumentType,
    FieldSuggestions,
    ValidateDocument,
    ProcessPrompt,
    CalculateTransferTax,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::SuggestDocumentType => "suggest_document_type",
            Operation::FieldSuggestions => "field_suggestions",
            Operation::ValidateDocument => "validate_document",
            Operation::ProcessPrompt => "process_prompt",
            Operation::CalculateTransferTax => "calculate_transfer_tax",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an answer came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum Origin {
    Remote,
    Fallback { reason: FailureReason },
}

/// An answer plus its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggested<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Suggested<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, Origin::Fallback { .. })
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.origin {
            Origin::Remote => None,
            Origin::Fallback { reason } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Suggested<U> {
        Suggested {
            value: f(self.value),
            origin: self.origin,
        }
    }
}

/// Pick the remote answer or the fallback.
///
/// The only place that decides between the two, so every operation degrades
/// the same way.
pub fn settle<T>(
    outcome: Result<T, FailureReason>,
    fallback: impl FnOnce() -> T,
) -> Suggested<T> {
    match outcome {
        Ok(value) => Suggested {
            value,
            origin: Origin::Remote,
        },
        Err(reason) => Suggested {
            value: fallback(),
            origin: Origin::Fallback { reason },
        },
    }
}

/// AI suggestions that never fail.
///
/// Every operation tries the remote backend under the retry policy and
/// otherwise returns the deterministic offline answer.
pub struct SuggestionClient {
    backend: Option<Arc<dyn AssistantBackend>>,
    policy: RetryPolicy,
    telemetry: Arc<dyn Telemetry>,
    engine: ValidationEngine,
}

impl SuggestionClient {
    pub fn new(backend: Option<Arc<dyn AssistantBackend>>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            telemetry: Arc::new(NoopTelemetry),
            engine: ValidationEngine::new(),
        }
    }

    /// Client with no remote backend; every answer is a fallback
    pub fn offline() -> Self {
        Self::new(None, RetryPolicy::default())
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn attempt<T, F, Fut>(&self, operation: Operation, call: F) -> Result<T, FailureReason>
    where
        F: Fn(Arc<dyn AssistantBackend>) -> Fut,
        Fut: std::future::Future<Output = Result<T, FailureReason>>,
    {
        let Some(backend) = self.backend.clone() else {
            return Err(FailureReason::Unavailable);
        };
        self.policy
            .run(operation.as_str(), &self.telemetry, |_| call(backend.clone()))
            .await
    }

    fn resolve<T>(
        &self,
        operation: Operation,
        outcome: Result<T, FailureReason>,
        fallback: impl FnOnce() -> T,
    ) -> Suggested<T> {
        if let Err(reason) = &outcome {
            warn!(%operation, %reason, "Using offline fallback");
            self.telemetry.record(TelemetryEvent::FallbackUsed {
                operation: operation.to_string(),
                reason: reason.to_string(),
            });
        }
        settle(outcome, fallback)
    }

    /// First-pass offline recommendation; no network involved
    pub fn offline_document_type(&self, property: &PropertyRecord) -> DocumentSuggestion {
        fallback::suggest_document_type(property)
    }

    /// Recommend a deed type for a property.
    ///
    /// A remote answer that fails suggestion validation counts as a failed
    /// attempt.
    pub async fn suggest_document_type(
        &self,
        property: &PropertyRecord,
    ) -> Suggested<DocumentSuggestion> {
        let engine = &self.engine;
        let outcome = self
            .attempt(Operation::SuggestDocumentType, |backend| async move {
                let suggestion = backend.suggest_document_type(property).await?;
                let report = engine.validate_document_suggestion(&(&suggestion).into());
                if !report.is_valid {
                    let messages: Vec<_> = report.errors.iter().map(|e| e.message.as_str()).collect();
                    return Err(FailureReason::Rejected(messages.join("; ")));
                }
                Ok(suggestion)
            })
            .await;
        self.resolve(Operation::SuggestDocumentType, outcome, || {
            fallback::suggest_document_type(property)
        })
    }

    pub async fn get_field_suggestions(
        &self,
        document_type: DocumentType,
        step_id: &str,
        context: &SuggestionContext,
    ) -> Suggested<Vec<FieldSuggestion>> {
        let request = FieldSuggestionRequest {
            document_type,
            step_id: step_id.to_string(),
            context: context.clone(),
        };
        let outcome = self
            .attempt(Operation::FieldSuggestions, |backend| {
                let request = &request;
                async move { backend.field_suggestions(request).await }
            })
            .await;
        self.resolve(Operation::FieldSuggestions, outcome, || {
            fallback::field_suggestions(step_id, context)
        })
    }

    pub async fn validate_document(
        &self,
        document_type: DocumentType,
        data: &FieldValues,
    ) -> Suggested<ValidationReport> {
        let request = DocumentCheckRequest {
            document_type,
            data: data.clone(),
        };
        let outcome = self
            .attempt(Operation::ValidateDocument, |backend| {
                let request = &request;
                async move { backend.validate_document(request).await }
            })
            .await;
        self.resolve(Operation::ValidateDocument, outcome, || {
            fallback::validate_document(data)
        })
    }

    pub async fn process_natural_language_prompt(
        &self,
        prompt: &str,
        context: &PromptContext,
    ) -> Suggested<PromptResponse> {
        let request = PromptRequest {
            prompt: prompt.to_string(),
            context: context.clone(),
        };
        let outcome = self
            .attempt(Operation::ProcessPrompt, |backend| {
                let request = &request;
                async move { backend.process_prompt(request).await }
            })
            .await;
        self.resolve(Operation::ProcessPrompt, outcome, || {
            fallback::process_prompt(prompt)
        })
    }

    pub async fn calculate_transfer_tax(
        &self,
        value: f64,
        county: &str,
        city: Option<&str>,
    ) -> Suggested<TransferTax> {
        let request = TransferTaxRequest {
            value,
            county: county.to_string(),
            city: city.map(str::to_string),
        };
        let outcome = self
            .attempt(Operation::CalculateTransferTax, |backend| {
                let request = &request;
                async move { backend.transfer_tax(request).await }
            })
            .await;
        self.resolve(Operation::CalculateTransferTax, outcome, || {
            fallback::transfer_tax(value, county, city)
        })
    }
}
