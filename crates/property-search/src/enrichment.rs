//! Title/ownership enrichment
//!
//! One request per [`PropertyEnrichmentClient::enrich`] call. Retries are the
//! caller's decision so progress can be shown per attempt.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{
    EnrichmentOutcome, Lien, NormalizedAddress, Owner, PropertyMatch, PropertyRecord, TaxInfo,
};
use tracing::{info, warn};

use crate::error::{LookupError, SelectionError};

/// Request body for the title endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleRequest {
    pub full_address: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub county: String,
}

impl From<&NormalizedAddress> for TitleRequest {
    fn from(a: &NormalizedAddress) -> Self {
        Self {
            full_address: a.full_address.clone(),
            street: a.street.clone(),
            city: a.city.clone(),
            state: a.state.clone(),
            zip: a.zip.clone(),
            county: a.county.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedParty {
    #[serde(default)]
    pub full_name: String,
}

/// One parcel as returned by the title endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleMatch {
    pub apn: Option<String>,
    pub county: Option<String>,
    pub legal_description: Option<String>,
    pub owner_name: Option<String>,
    pub primary_owner: Option<NamedParty>,
    pub secondary_owner: Option<NamedParty>,
    pub vesting: Option<String>,
    pub fips: Option<String>,
    pub full_address: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub liens: Vec<Lien>,
    pub encumbrances: Vec<String>,
    pub assessed_value: Option<f64>,
    pub annual_tax: Option<f64>,
    pub tax_year: Option<u32>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

impl TitleMatch {
    /// `owner_name` wins over `primary_owner.full_name`
    pub fn primary_owner_name(&self) -> Option<String> {
        non_empty(&self.owner_name).or_else(|| {
            self.primary_owner
                .as_ref()
                .map(|p| p.full_name.trim().to_string())
                .filter(|n| !n.is_empty())
        })
    }

    pub fn secondary_owner_name(&self) -> Option<String> {
        self.secondary_owner
            .as_ref()
            .map(|p| p.full_name.trim().to_string())
            .filter(|n| !n.is_empty())
    }

    fn owners(&self) -> Vec<Owner> {
        let mut owners = Vec::new();
        if let Some(name) = self.primary_owner_name() {
            owners.push(Owner {
                name,
                vesting_type: non_empty(&self.vesting),
            });
        }
        if let Some(name) = self.secondary_owner_name() {
            owners.push(Owner::new(name));
        }
        owners
    }

    fn tax_info(&self) -> Option<TaxInfo> {
        if self.assessed_value.is_none() && self.annual_tax.is_none() && self.tax_year.is_none() {
            return None;
        }
        Some(TaxInfo {
            assessed_value: self.assessed_value,
            annual_tax: self.annual_tax,
            tax_year: self.tax_year,
        })
    }

    /// Address as carried by the match itself; missing parts stay empty
    fn own_address(&self) -> NormalizedAddress {
        let street = non_empty(&self.street).unwrap_or_default();
        let city = non_empty(&self.city).unwrap_or_default();
        let state = non_empty(&self.state).unwrap_or_default();
        let zip = non_empty(&self.zip).unwrap_or_default();
        let full_address = non_empty(&self.full_address).unwrap_or_else(|| {
            let state_zip = format!("{} {}", state, zip).trim().to_string();
            [street.as_str(), city.as_str(), state_zip.as_str()]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(", ")
        });
        NormalizedAddress {
            full_address,
            street,
            city,
            state,
            zip,
            county: non_empty(&self.county).unwrap_or_default(),
            external_place_id: String::new(),
        }
    }

    fn to_property_match(&self) -> PropertyMatch {
        PropertyMatch {
            address: self.own_address(),
            apn: non_empty(&self.apn).unwrap_or_default(),
            owner_name: self.primary_owner_name().unwrap_or_default(),
            secondary_owner_name: self.secondary_owner_name(),
            county: non_empty(&self.county).unwrap_or_default(),
            legal_description: non_empty(&self.legal_description),
            fips: non_empty(&self.fips),
        }
    }
}

/// Raw title endpoint response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleResponse {
    /// `single_match`, `multi_match`, `not_found` or `error`
    pub status: String,
    pub matches: Vec<TitleMatch>,
    /// Some providers return a lone match under `property`
    pub property: Option<TitleMatch>,
    pub message: Option<String>,
}

impl TitleResponse {
    pub fn single(m: TitleMatch) -> Self {
        Self {
            status: "single_match".to_string(),
            matches: vec![m],
            ..Self::default()
        }
    }

    pub fn multi(matches: Vec<TitleMatch>) -> Self {
        Self {
            status: "multi_match".to_string(),
            matches,
            ..Self::default()
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: "not_found".to_string(),
            ..Self::default()
        }
    }
}

/// Title/ownership data source
#[async_trait]
pub trait TitleSource: Send + Sync {
    async fn lookup(&self, request: &TitleRequest) -> Result<TitleResponse, LookupError>;
}

/// Merge a single provider match into the queried address
fn record_from_single(address: &NormalizedAddress, m: &TitleMatch, as_of: DateTime<Utc>) -> PropertyRecord {
    let county = non_empty(&m.county).unwrap_or_else(|| address.county.clone());
    let mut address = address.clone();
    if address.county.is_empty() {
        address.county = county.clone();
    }
    PropertyRecord {
        address,
        apn: non_empty(&m.apn).unwrap_or_default(),
        legal_description: non_empty(&m.legal_description).unwrap_or_default(),
        county,
        current_owners: m.owners(),
        liens: m.liens.clone(),
        encumbrances: m.encumbrances.clone(),
        tax_info: m.tax_info(),
        last_updated: as_of,
    }
}

/// Turn one multi-match candidate into a record.
///
/// Pure: fields the brief candidate lacks are left empty.
pub fn record_from_match(candidate: &PropertyMatch, as_of: DateTime<Utc>) -> PropertyRecord {
    let mut owners = Vec::new();
    if !candidate.owner_name.is_empty() {
        owners.push(Owner::new(candidate.owner_name.clone()));
    }
    if let Some(second) = &candidate.secondary_owner_name {
        owners.push(Owner::new(second.clone()));
    }
    PropertyRecord {
        address: candidate.address.clone(),
        apn: candidate.apn.clone(),
        legal_description: candidate.legal_description.clone().unwrap_or_default(),
        county: candidate.county.clone(),
        current_owners: owners,
        liens: Vec::new(),
        encumbrances: Vec::new(),
        tax_info: None,
        last_updated: as_of,
    }
}

/// Interpret a raw title response for the queried address
pub fn interpret_response(
    address: &NormalizedAddress,
    response: TitleResponse,
    as_of: DateTime<Utc>,
) -> EnrichmentOutcome {
    let status = response.status.trim().to_lowercase();
    if status == "error" {
        return EnrichmentOutcome::Error {
            reason: response
                .message
                .unwrap_or_else(|| "Title provider reported an error".to_string()),
        };
    }

    let mut matches = response.matches;
    if matches.is_empty() {
        matches.extend(response.property);
    }

    match matches.len() {
        0 => EnrichmentOutcome::NotFound,
        1 => EnrichmentOutcome::Resolved {
            record: record_from_single(address, &matches[0], as_of),
        },
        _ => EnrichmentOutcome::MultiMatch {
            candidates: matches.iter().map(TitleMatch::to_property_match).collect(),
        },
    }
}

pub struct PropertyEnrichmentClient {
    source: Arc<dyn TitleSource>,
}

impl PropertyEnrichmentClient {
    pub fn new(source: Arc<dyn TitleSource>) -> Self {
        Self { source }
    }

    /// Look up title data for an address. Exactly one request is issued.
    pub async fn enrich(&self, address: &NormalizedAddress) -> EnrichmentOutcome {
        let request = TitleRequest::from(address);
        match self.source.lookup(&request).await {
            Ok(response) => {
                let outcome = interpret_response(address, response, Utc::now());
                info!(
                    address = %address.full_address,
                    outcome = outcome_label(&outcome),
                    "Enrichment completed"
                );
                outcome
            }
            Err(e) => {
                warn!(address = %address.full_address, error = %e, "Enrichment request failed");
                EnrichmentOutcome::Error {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Resolve a user's choice among multi-match candidates
    pub fn resolve_multi_match(
        &self,
        outcome: &EnrichmentOutcome,
        chosen_index: usize,
    ) -> Result<EnrichmentOutcome, SelectionError> {
        resolve_multi_match(outcome, chosen_index, Utc::now())
    }
}

pub fn resolve_multi_match(
    outcome: &EnrichmentOutcome,
    chosen_index: usize,
    as_of: DateTime<Utc>,
) -> Result<EnrichmentOutcome, SelectionError> {
    let EnrichmentOutcome::MultiMatch { candidates } = outcome else {
        return Err(SelectionError::NotMultiMatch);
    };
    let candidate = candidates
        .get(chosen_index)
        .ok_or(SelectionError::IndexOutOfRange {
            index: chosen_index,
            count: candidates.len(),
        })?;
    Ok(EnrichmentOutcome::Resolved {
        record: record_from_match(candidate, as_of),
    })
}

pub fn outcome_label(outcome: &EnrichmentOutcome) -> &'static str {
    match outcome {
        EnrichmentOutcome::Resolved { .. } => "resolved",
        EnrichmentOutcome::MultiMatch { .. } => "multi_match",
        EnrichmentOutcome::NotFound => "not_found",
        EnrichmentOutcome::Error { .. } => "error",
    }
}
