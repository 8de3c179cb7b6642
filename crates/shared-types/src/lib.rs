pub mod document;
pub mod types;
pub mod validation;

pub use document::{
    is_blank, value_text, ActionType, AiCapability, Alternative, DocumentSuggestion,
    DocumentType, FieldKind, FieldSpec, FieldSuggestion, FieldValues, PromptAction,
    PromptContext, PromptIntent, PromptResponse, StepConfig, SuggestionSource, TransferTax,
    UnknownDocumentType,
};
pub use types::{
    AddressCandidate, EnrichmentOutcome, Lien, NormalizedAddress, Owner, PropertyMatch,
    PropertyRecord, TaxInfo,
};
pub use validation::{Severity, ValidationError, ValidationReport};
