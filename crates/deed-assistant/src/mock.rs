//! Scripted assistant backend for tests and demos

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use shared_types::{
    DocumentSuggestion, FieldSuggestion, PromptResponse, PropertyRecord, TransferTax,
    ValidationReport,
};

use crate::backend::{
    AssistantBackend, DocumentCheckRequest, FieldSuggestionRequest, PromptRequest,
    TransferTaxRequest,
};
use crate::failure::FailureReason;

/// Answers with canned values.
///
/// Operations without a canned value fail with `failure`. The first
/// `fail_first` calls fail regardless.
pub struct MockAssistant {
    document_suggestion: Option<DocumentSuggestion>,
    field_suggestions: Option<Vec<FieldSuggestion>>,
    report: Option<ValidationReport>,
    prompt_response: Option<PromptResponse>,
    transfer_tax: Option<TransferTax>,
    failure: FailureReason,
    fail_first: u32,
    calls: AtomicU32,
}

impl Default for MockAssistant {
    fn default() -> Self {
        Self {
            document_suggestion: None,
            field_suggestions: None,
            report: None,
            prompt_response: None,
            transfer_tax: None,
            failure: FailureReason::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            },
            fail_first: 0,
            calls: AtomicU32::new(0),
        }
    }
}

impl MockAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every call with `reason`
    pub fn failing(reason: FailureReason) -> Self {
        Self {
            failure: reason,
            ..Self::default()
        }
    }

    pub fn with_document_suggestion(mut self, suggestion: DocumentSuggestion) -> Self {
        self.document_suggestion = Some(suggestion);
        self
    }

    pub fn with_field_suggestions(mut self, suggestions: Vec<FieldSuggestion>) -> Self {
        self.field_suggestions = Some(suggestions);
        self
    }

    pub fn with_report(mut self, report: ValidationReport) -> Self {
        self.report = Some(report);
        self
    }

    pub fn with_prompt_response(mut self, response: PromptResponse) -> Self {
        self.prompt_response = Some(response);
        self
    }

    pub fn with_transfer_tax(mut self, tax: TransferTax) -> Self {
        self.transfer_tax = Some(tax);
        self
    }

    pub fn fail_first(mut self, n: u32) -> Self {
        self.fail_first = n;
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer<T: Clone>(&self, canned: &Option<T>) -> Result<T, FailureReason> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.fail_first {
            return Err(self.failure.clone());
        }
        canned.clone().ok_or_else(|| self.failure.clone())
    }
}

#[async_trait]
impl AssistantBackend for MockAssistant {
    async fn suggest_document_type(
        &self,
        _property: &PropertyRecord,
    ) -> Result<DocumentSuggestion, FailureReason> {
        self.answer(&self.document_suggestion)
    }

    async fn field_suggestions(
        &self,
        _request: &FieldSuggestionRequest,
    ) -> Result<Vec<FieldSuggestion>, FailureReason> {
        self.answer(&self.field_suggestions)
    }

    async fn validate_document(
        &self,
        _request: &DocumentCheckRequest,
    ) -> Result<ValidationReport, FailureReason> {
        self.answer(&self.report)
    }

    async fn process_prompt(
        &self,
        _request: &PromptRequest,
    ) -> Result<PromptResponse, FailureReason> {
        self.answer(&self.prompt_response)
    }

    async fn transfer_tax(
        &self,
        _request: &TransferTaxRequest,
    ) -> Result<TransferTax, FailureReason> {
        self.answer(&self.transfer_tax)
    }
}
