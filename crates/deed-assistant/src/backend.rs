//! Remote assistant backend abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{
    DocumentSuggestion, DocumentType, FieldSuggestion, FieldValues, PromptContext,
    PromptResponse, PropertyRecord, TransferTax, ValidationReport,
};

use crate::failure::FailureReason;

/// What the assistant knows when suggesting values for a step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyRecord>,
    #[serde(default)]
    pub fields: FieldValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSuggestionRequest {
    pub document_type: DocumentType,
    pub step_id: String,
    pub context: SuggestionContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCheckRequest {
    pub document_type: DocumentType,
    pub data: FieldValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    pub prompt: String,
    #[serde(default)]
    pub context: PromptContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTaxRequest {
    pub value: f64,
    pub county: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// A remote AI service. Every call may fail; callers decide what to do then.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn suggest_document_type(
        &self,
        property: &PropertyRecord,
    ) -> Result<DocumentSuggestion, FailureReason>;

    async fn field_suggestions(
        &self,
        request: &FieldSuggestionRequest,
    ) -> Result<Vec<FieldSuggestion>, FailureReason>;

    async fn validate_document(
        &self,
        request: &DocumentCheckRequest,
    ) -> Result<ValidationReport, FailureReason>;

    async fn process_prompt(&self, request: &PromptRequest)
        -> Result<PromptResponse, FailureReason>;

    async fn transfer_tax(&self, request: &TransferTaxRequest)
        -> Result<TransferTax, FailureReason>;
}
