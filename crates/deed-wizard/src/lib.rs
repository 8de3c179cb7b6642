//! Deed preparation wizard
//!
//! [`DocumentTypeRegistry`] describes the steps of each deed type;
//! [`WizardStateMachine`] walks one [`WizardSession`] through them, from
//! property enrichment to document generation.

pub mod error;
pub mod generation;
pub mod machine;
pub mod mock;
pub mod property;
pub mod registry;
pub mod session;

pub use error::{GenerationError, WizardError};
pub use generation::{
    assemble_generation_request, DocumentGenerator, GeneratedDocument, GenerationRequest,
    HttpDocumentGenerator, PropertySection,
};
pub use machine::{Advance, Progress, WizardStateMachine};
pub use mock::MockGenerator;
pub use registry::{DocumentTypeConfig, DocumentTypeRegistry};
pub use session::{PropertyAmendment, WizardPhase, WizardSession};
