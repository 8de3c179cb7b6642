//! AI assistance for deed preparation
//!
//! [`SuggestionClient`] calls a remote [`AssistantBackend`] under a
//! [`RetryPolicy`] and falls back to the deterministic answers in
//! [`fallback`] when the backend is missing or keeps failing. Callers always
//! get a value.

pub mod backend;
pub mod client;
pub mod failure;
pub mod fallback;
pub mod http;
pub mod mock;
pub mod retry;
pub mod telemetry;

pub use backend::{
    AssistantBackend, DocumentCheckRequest, FieldSuggestionRequest, PromptRequest,
    SuggestionContext, TransferTaxRequest,
};
pub use client::{settle, Operation, Origin, Suggested, SuggestionClient};
pub use failure::FailureReason;
pub use http::HttpAssistantBackend;
pub use mock::MockAssistant;
pub use retry::RetryPolicy;
pub use telemetry::{
    NoopTelemetry, RecordingTelemetry, Telemetry, TelemetryEvent, TracingTelemetry,
};
