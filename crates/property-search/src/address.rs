//! Address autocomplete and normalization
//!
//! [`AddressResolver`] wraps an [`AutocompleteProvider`] and adds the two
//! behaviors the UI depends on:
//!
//! - Debounce: a search waits `SearchConfig::debounce` before calling out.
//! - Supersession: every call takes a ticket; a response whose ticket is no
//!   longer current is dropped and reported as [`CandidateBatch::Superseded`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{AddressCandidate, NormalizedAddress};
use tracing::{debug, warn};

use crate::error::LookupError;

/// Autocomplete request as sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteRequest {
    pub input: String,
    pub types: Vec<String>,
    pub country_restriction: String,
}

/// One provider prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub place_id: String,
    pub description: String,
    pub main_text: String,
    pub secondary_text: String,
}

/// One structured component from a place-details lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    pub types: Vec<String>,
}

impl AddressComponent {
    pub fn new(long_name: &str, short_name: &str, kind: &str) -> Self {
        Self {
            long_name: long_name.to_string(),
            short_name: short_name.to_string(),
            types: vec![kind.to_string()],
        }
    }
}

/// Third-party address autocomplete service
#[async_trait]
pub trait AutocompleteProvider: Send + Sync {
    async fn predictions(&self, request: &AutocompleteRequest)
        -> Result<Vec<Prediction>, LookupError>;

    async fn place_details(&self, place_id: &str) -> Result<Vec<AddressComponent>, LookupError>;
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Shorter input never reaches the provider
    pub min_query_len: usize,
    pub debounce: Duration,
    pub country: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_len: 3,
            debounce: Duration::from_millis(300),
            country: "us".to_string(),
        }
    }
}

/// Result of one candidate search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateBatch {
    /// Input below the minimum length; nothing was requested
    TooShort,
    /// A newer search started before this one finished
    Superseded,
    Candidates(Vec<AddressCandidate>),
}

pub struct AddressResolver {
    provider: Arc<dyn AutocompleteProvider>,
    config: SearchConfig,
    generation: AtomicU64,
}

impl AddressResolver {
    pub fn new(provider: Arc<dyn AutocompleteProvider>, config: SearchConfig) -> Self {
        Self {
            provider,
            config,
            generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Search for address candidates matching partial input.
    ///
    /// Any call, including one rejected as too short, supersedes every
    /// earlier call still in flight.
    pub async fn search_candidates(&self, text: &str) -> Result<CandidateBatch, LookupError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let text = text.trim();

        if text.chars().count() < self.config.min_query_len {
            return Ok(CandidateBatch::TooShort);
        }

        tokio::time::sleep(self.config.debounce).await;
        if !self.is_current(ticket) {
            debug!(ticket, "Search superseded during debounce");
            return Ok(CandidateBatch::Superseded);
        }

        let request = AutocompleteRequest {
            input: text.to_string(),
            types: vec!["address".to_string()],
            country_restriction: self.config.country.clone(),
        };
        let predictions = self.provider.predictions(&request).await?;

        if !self.is_current(ticket) {
            debug!(ticket, "Dropping stale autocomplete response");
            return Ok(CandidateBatch::Superseded);
        }

        Ok(CandidateBatch::Candidates(
            predictions
                .into_iter()
                .map(|p| AddressCandidate {
                    id: p.place_id,
                    display_text: p.description,
                    main_text: p.main_text,
                    secondary_text: p.secondary_text,
                })
                .collect(),
        ))
    }

    /// Resolve a chosen candidate into a structured address.
    ///
    /// Never falls back to the raw candidate text.
    pub async fn resolve_candidate(&self, candidate_id: &str) -> Result<NormalizedAddress, LookupError> {
        let components = self
            .provider
            .place_details(candidate_id)
            .await
            .map_err(|e| {
                warn!(candidate_id, error = %e, "Place details lookup failed");
                LookupError::AddressLookupFailed(e.to_string())
            })?;

        normalize_components(candidate_id, &components).ok_or_else(|| {
            LookupError::AddressLookupFailed(format!(
                "No structured street address for place '{}'",
                candidate_id
            ))
        })
    }
}

fn component<'a>(components: &'a [AddressComponent], kind: &str) -> Option<&'a AddressComponent> {
    components.iter().find(|c| c.types.iter().any(|t| t == kind))
}

/// Build a [`NormalizedAddress`] from provider components.
///
/// Deterministic in its inputs. Returns `None` when there is no route.
pub fn normalize_components(
    place_id: &str,
    components: &[AddressComponent],
) -> Option<NormalizedAddress> {
    let route = component(components, "route")?.long_name.trim().to_string();
    if route.is_empty() {
        return None;
    }

    let long = |kind: &str| {
        component(components, kind)
            .map(|c| c.long_name.trim().to_string())
            .unwrap_or_default()
    };
    let short = |kind: &str| {
        component(components, kind)
            .map(|c| c.short_name.trim().to_string())
            .unwrap_or_default()
    };

    let number = long("street_number");
    let street = if number.is_empty() {
        route
    } else {
        format!("{} {}", number, route)
    };
    let city = long("locality");
    let state = short("administrative_area_level_1");
    let zip = long("postal_code");
    let county_raw = long("administrative_area_level_2");
    let county = county_raw
        .strip_suffix(" County")
        .unwrap_or(&county_raw)
        .to_string();

    let state_zip = [state.as_str(), zip.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let full_address = [street.as_str(), city.as_str(), state_zip.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

    Some(NormalizedAddress {
        full_address,
        street,
        city,
        state,
        zip,
        county,
        external_place_id: place_id.to_string(),
    })
}
