//! Loosely-typed inputs accepted by the validators.
//!
//! These mirror what arrives from clients and remote services before it has
//! been checked, so enum-like fields stay as strings here.

use serde::{Deserialize, Serialize};
use shared_types::{DocumentSuggestion, Lien, Owner, PropertyRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyData {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub apn: Option<String>,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub current_owners: Vec<Owner>,
    #[serde(default)]
    pub liens: Vec<Lien>,
}

impl From<&PropertyRecord> for PropertyData {
    fn from(record: &PropertyRecord) -> Self {
        Self {
            address: record.address.full_address.clone(),
            apn: Some(record.apn.clone()).filter(|a| !a.is_empty()),
            county: record.county.clone(),
            current_owners: record.current_owners.clone(),
            liens: record.liens.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeData {
    #[serde(rename = "type")]
    pub document_type: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionData {
    pub recommended_type: String,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub alternatives: Vec<AlternativeData>,
}

impl From<&DocumentSuggestion> for SuggestionData {
    fn from(s: &DocumentSuggestion) -> Self {
        Self {
            recommended_type: s.recommended_type.as_str().to_string(),
            confidence: s.confidence,
            reasoning: s.reasoning.clone(),
            alternatives: s
                .alternatives
                .iter()
                .map(|a| AlternativeData {
                    document_type: a.document_type.as_str().to_string(),
                    confidence: a.confidence,
                })
                .collect(),
        }
    }
}

/// A property search as submitted by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub address: String,
    #[serde(default)]
    pub county: Option<String>,
}

impl SearchRequest {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            county: None,
        }
    }
}

/// Whatever parts of a session exist so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(default)]
    pub property_data: Option<PropertyData>,
    #[serde(default)]
    pub document_suggestion: Option<SuggestionData>,
    #[serde(default)]
    pub search_request: Option<SearchRequest>,
}
