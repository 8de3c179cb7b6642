//! Deed document types, step configuration and AI suggestion payloads

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field values for one wizard step, keyed by field name
pub type FieldValues = BTreeMap<String, serde_json::Value>;

/// True for null, whitespace-only strings and empty arrays/objects
pub fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        serde_json::Value::Array(a) => a.is_empty(),
        serde_json::Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Text form of a field value; numbers and booleans are stringified
pub fn value_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Recognized deed types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    GrantDeed,
    QuitclaimDeed,
    InterspousalTransfer,
    WarrantyDeed,
    TaxDeed,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::GrantDeed,
        DocumentType::QuitclaimDeed,
        DocumentType::InterspousalTransfer,
        DocumentType::WarrantyDeed,
        DocumentType::TaxDeed,
    ];

    /// Wire identifier (e.g. `grant_deed`)
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::GrantDeed => "grant_deed",
            DocumentType::QuitclaimDeed => "quitclaim_deed",
            DocumentType::InterspousalTransfer => "interspousal_transfer",
            DocumentType::WarrantyDeed => "warranty_deed",
            DocumentType::TaxDeed => "tax_deed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentType::GrantDeed => "Grant Deed",
            DocumentType::QuitclaimDeed => "Quitclaim Deed",
            DocumentType::InterspousalTransfer => "Interspousal Transfer Deed",
            DocumentType::WarrantyDeed => "Warranty Deed",
            DocumentType::TaxDeed => "Tax Deed",
        }
    }

    /// Whether the deed carries title warranties from the grantor
    pub fn carries_warranties(&self) -> bool {
        matches!(self, DocumentType::GrantDeed | DocumentType::WarrantyDeed)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown document type: {0}")]
pub struct UnknownDocumentType(pub String);

impl FromStr for DocumentType {
    type Err = UnknownDocumentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| UnknownDocumentType(s.to_string()))
    }
}

/// A runner-up recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
}

/// Document-type recommendation. Replaced wholesale on re-request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSuggestion {
    pub recommended_type: DocumentType,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub legal_considerations: Vec<String>,
}

/// Where a suggested field value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    Enrichment,
    Records,
    Inference,
    User,
}

/// A proposed value for one field. Never applied without user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSuggestion {
    pub field: String,
    pub value: serde_json::Value,
    pub confidence: f64,
    pub reasoning: String,
    pub source: SuggestionSource,
    #[serde(default)]
    pub requires_verification: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_implications: Option<String>,
}

/// AI features a step can offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiCapability {
    DocumentTypeRecommendation,
    FieldSuggestions,
    NaturalLanguage,
    DocumentValidation,
    TransferTax,
}

/// How a field's value is interpreted and checked.
///
/// Resolved once when the registry is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text { max_len: usize },
    LongText,
    Currency,
    Choice { options: Vec<String> },
    Date,
    Apn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
}

/// One wizard step for a document type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepConfig {
    pub id: String,
    pub title: String,
    pub help: String,
    pub fields: Vec<FieldSpec>,
    pub ai_capabilities: Vec<AiCapability>,
}

impl StepConfig {
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Parsed intent of a free-text prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptIntent {
    FieldUpdate,
    InformationRequest,
    Navigation,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    FillField,
    ManualInput,
    Navigate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub intent: PromptIntent,
    #[serde(default)]
    pub actions: Vec<PromptAction>,
    pub response: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Context sent alongside a free-text prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[serde(default)]
    pub fields: FieldValues,
}

/// Documentary transfer tax breakdown, in dollars rounded to cents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTax {
    pub county_amount: f64,
    pub city_amount: f64,
    pub total_amount: f64,
    pub basis: String,
    #[serde(default)]
    pub exemptions: Vec<String>,
}
