//! Property and address records produced by the resolution pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One autocomplete prediction for a partially typed address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressCandidate {
    /// Provider place id, used to resolve the candidate
    pub id: String,
    pub display_text: String,
    pub main_text: String,
    pub secondary_text: String,
}

/// A structured address built from provider components
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAddress {
    pub full_address: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub county: String,
    pub external_place_id: String,
}

/// Record owner. List position matters: the first owner is primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vesting_type: Option<String>,
}

impl Owner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vesting_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lien {
    pub holder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_on: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessed_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_tax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_year: Option<u32>,
}

/// Authoritative property record for one wizard session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub address: NormalizedAddress,
    pub apn: String,
    pub legal_description: String,
    pub county: String,
    pub current_owners: Vec<Owner>,
    #[serde(default)]
    pub liens: Vec<Lien>,
    #[serde(default)]
    pub encumbrances: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_info: Option<TaxInfo>,
    pub last_updated: DateTime<Utc>,
}

impl PropertyRecord {
    /// Primary owner, if the record has any owners at all
    pub fn primary_owner(&self) -> Option<&Owner> {
        self.current_owners.first()
    }

    /// Owner names joined with `;`, in record order
    pub fn owner_names(&self) -> String {
        self.current_owners
            .iter()
            .map(|o| o.name.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// One parcel in a multi-match enrichment response.
///
/// Carries just enough to let the user pick unambiguously; fields the
/// provider omitted stay empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMatch {
    pub address: NormalizedAddress,
    pub apn: String,
    pub owner_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_owner_name: Option<String>,
    pub county: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fips: Option<String>,
}

/// Result of one enrichment request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentOutcome {
    Resolved { record: PropertyRecord },
    MultiMatch { candidates: Vec<PropertyMatch> },
    NotFound,
    Error { reason: String },
}

impl EnrichmentOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, EnrichmentOutcome::Resolved { .. })
    }

    pub fn record(&self) -> Option<&PropertyRecord> {
        match self {
            EnrichmentOutcome::Resolved { record } => Some(record),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(owners: &[&str]) -> PropertyRecord {
        PropertyRecord {
            address: NormalizedAddress::default(),
            apn: "123-456-789".to_string(),
            legal_description: String::new(),
            county: "Los Angeles".to_string(),
            current_owners: owners.iter().map(|n| Owner::new(*n)).collect(),
            liens: Vec::new(),
            encumbrances: Vec::new(),
            tax_info: None,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_owner_names_preserve_order() {
        let r = record(&["Jane Roe", "John Roe"]);
        assert_eq!(r.owner_names(), "Jane Roe; John Roe");
        assert_eq!(r.primary_owner().map(|o| o.name.as_str()), Some("Jane Roe"));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(EnrichmentOutcome::NotFound).unwrap();
        assert_eq!(json["status"], "not_found");

        let json = serde_json::to_value(EnrichmentOutcome::Error {
            reason: "timeout".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["reason"], "timeout");
    }

    #[test]
    fn test_record_accessor_only_for_resolved() {
        let outcome = EnrichmentOutcome::Resolved {
            record: record(&["A"]),
        };
        assert!(outcome.is_resolved());
        assert!(outcome.record().is_some());
        assert!(EnrichmentOutcome::NotFound.record().is_none());
    }
}
