//! Document generation: request assembly and the remote generator

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{value_text, DocumentType, FieldValues, TransferTax};
use tracing::debug;

use crate::error::{GenerationError, WizardError};
use crate::session::WizardSession;

const PROPERTY_STEP: &str = "property";
const PARTIES_STEP: &str = "parties";
const RECORDING_STEP: &str = "recording";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySection {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub county: String,
    pub apn: String,
    pub legal_description: String,
}

/// Fully assembled document for the generation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub document_type: DocumentType,
    pub property: PropertySection,
    pub parties: FieldValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<TransferTax>,
    pub recording: FieldValues,
    /// Fields from type-specific steps
    #[serde(default)]
    pub details: FieldValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_base64: Option<String>,
}

#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GeneratedDocument, GenerationError>;
}

fn text_of(values: Option<&FieldValues>, field: &str) -> Option<String> {
    values
        .and_then(|v| v.get(field))
        .and_then(value_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Build the generation payload from a session.
///
/// Property fields entered in the wizard win over the enriched record.
pub fn assemble_generation_request(
    session: &WizardSession,
    tax: Option<TransferTax>,
) -> Result<GenerationRequest, WizardError> {
    let document_type = session.document_type.ok_or(WizardError::NoDocumentType)?;
    let entered = session.values(PROPERTY_STEP);
    let record = session.property_record.as_ref();

    let pick = |field: &str, from_record: Option<String>| {
        text_of(entered, field)
            .or(from_record)
            .unwrap_or_default()
    };

    let property = PropertySection {
        address: pick("property_address", record.map(|r| r.address.full_address.clone())),
        city: record.map(|r| r.address.city.clone()).unwrap_or_default(),
        state: record.map(|r| r.address.state.clone()).unwrap_or_default(),
        zip: record.map(|r| r.address.zip.clone()).unwrap_or_default(),
        county: pick("county", record.map(|r| r.county.clone())),
        apn: pick("apn", record.map(|r| r.apn.clone())),
        legal_description: pick(
            "legal_description",
            record.map(|r| r.legal_description.clone()),
        ),
    };

    let details = session
        .step_data
        .iter()
        .filter(|(id, _)| ![PROPERTY_STEP, PARTIES_STEP, RECORDING_STEP].contains(&id.as_str()))
        .flat_map(|(_, values)| values.iter().map(|(k, v)| (k.clone(), v.clone())))
        .collect();

    Ok(GenerationRequest {
        document_type,
        property,
        parties: session.values(PARTIES_STEP).cloned().unwrap_or_default(),
        tax,
        recording: session.values(RECORDING_STEP).cloned().unwrap_or_default(),
        details,
    })
}

/// Posts assembled documents to `{base}/documents/generate`
pub struct HttpDocumentGenerator {
    client: Client,
    base_url: String,
}

impl HttpDocumentGenerator {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Pull the human-readable message out of an error body
fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            ["detail", "error", "message"]
                .iter()
                .find_map(|k| json.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl DocumentGenerator for HttpDocumentGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedDocument, GenerationError> {
        let url = format!("{}/documents/generate", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), document_type = %request.document_type, "Document service responded");

        let body = response.text().await?;
        if !status.is_success() {
            return Err(GenerationError::Rejected {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        serde_json::from_str(&body).map_err(|e| GenerationError::Parse(e.to_string()))
    }
}
