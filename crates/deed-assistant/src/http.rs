//! HTTP assistant backend

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{
    DocumentSuggestion, FieldSuggestion, PromptResponse, PropertyRecord, TransferTax,
    ValidationReport,
};
use tracing::debug;

use crate::backend::{
    AssistantBackend, DocumentCheckRequest, FieldSuggestionRequest, PromptRequest,
    TransferTaxRequest,
};
use crate::failure::FailureReason;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PropertyEnvelope<'a> {
    property: &'a PropertyRecord,
}

#[derive(Deserialize)]
struct SuggestionsEnvelope {
    #[serde(default)]
    suggestions: Vec<FieldSuggestion>,
}

pub struct HttpAssistantBackend {
    client: Client,
    base_url: String,
}

impl HttpAssistantBackend {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, FailureReason>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "Assistant responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FailureReason::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| FailureReason::Parse(e.to_string()))
    }
}

#[async_trait]
impl AssistantBackend for HttpAssistantBackend {
    async fn suggest_document_type(
        &self,
        property: &PropertyRecord,
    ) -> Result<DocumentSuggestion, FailureReason> {
        self.post("document-suggestion", &PropertyEnvelope { property })
            .await
    }

    async fn field_suggestions(
        &self,
        request: &FieldSuggestionRequest,
    ) -> Result<Vec<FieldSuggestion>, FailureReason> {
        let envelope: SuggestionsEnvelope = self.post("field-suggestions", request).await?;
        Ok(envelope.suggestions)
    }

    async fn validate_document(
        &self,
        request: &DocumentCheckRequest,
    ) -> Result<ValidationReport, FailureReason> {
        self.post("validate-document", request).await
    }

    async fn process_prompt(
        &self,
        request: &PromptRequest,
    ) -> Result<PromptResponse, FailureReason> {
        self.post("process-prompt", request).await
    }

    async fn transfer_tax(
        &self,
        request: &TransferTaxRequest,
    ) -> Result<TransferTax, FailureReason> {
        self.post("transfer-tax", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_transfer_tax_roundtrip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transfer-tax"))
            .and(body_partial_json(json!({"value": 500000.0, "county": "Los Angeles"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "countyAmount": 550.0,
                "cityAmount": 0.0,
                "totalAmount": 550.0,
                "basis": "County rate",
                "exemptions": []
            })))
            .mount(&server)
            .await;

        let backend = HttpAssistantBackend::new(Client::new(), server.uri());
        let tax = backend
            .transfer_tax(&TransferTaxRequest {
                value: 500_000.0,
                county: "Los Angeles".into(),
                city: None,
            })
            .await
            .unwrap();
        assert_eq!(tax.total_amount, 550.0);
    }

    #[tokio::test]
    async fn test_field_suggestions_unwraps_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/field-suggestions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "suggestions": [{
                    "field": "grantor",
                    "value": "John Doe",
                    "confidence": 0.9,
                    "reasoning": "From title records",
                    "source": "records"
                }]
            })))
            .mount(&server)
            .await;

        let backend = HttpAssistantBackend::new(Client::new(), format!("{}/", server.uri()));
        let list = backend
            .field_suggestions(&FieldSuggestionRequest {
                document_type: shared_types::DocumentType::GrantDeed,
                step_id: "parties".into(),
                context: Default::default(),
            })
            .await
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].field, "grantor");
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let backend = HttpAssistantBackend::new(Client::new(), server.uri());
        let err = backend
            .process_prompt(&PromptRequest {
                prompt: "hello".into(),
                context: Default::default(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FailureReason::Status {
                status: 502,
                body: "bad gateway".into()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/validate-document"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let backend = HttpAssistantBackend::new(Client::new(), server.uri());
        let err = backend
            .validate_document(&DocumentCheckRequest {
                document_type: shared_types::DocumentType::QuitclaimDeed,
                data: Default::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FailureReason::Parse(_)));
    }
}
