//! Property resolution pipeline
//!
//! Free-text address → [`AddressResolver`] candidates → chosen
//! [`NormalizedAddress`](shared_types::NormalizedAddress) →
//! [`PropertyEnrichmentClient`] outcome.

pub mod address;
pub mod enrichment;
pub mod error;
pub mod mock;
pub mod places;
pub mod title;

pub use address::{
    normalize_components, AddressComponent, AddressResolver, AutocompleteProvider,
    AutocompleteRequest, CandidateBatch, Prediction, SearchConfig,
};
pub use enrichment::{
    interpret_response, outcome_label, record_from_match, resolve_multi_match, NamedParty,
    PropertyEnrichmentClient, TitleMatch, TitleRequest, TitleResponse, TitleSource,
};
pub use error::{LookupError, SelectionError};
pub use places::{GooglePlacesProvider, DEFAULT_PLACES_URL};
pub use title::HttpTitleSource;
