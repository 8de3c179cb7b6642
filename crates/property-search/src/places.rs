//! Google Places autocomplete adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::address::{AddressComponent, AutocompleteProvider, AutocompleteRequest, Prediction};
use crate::error::LookupError;

pub const DEFAULT_PLACES_URL: &str = "https://maps.googleapis.com/maps/api";

pub struct GooglePlacesProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GooglePlacesProvider {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<RawPrediction>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    place_id: String,
    description: String,
    #[serde(default)]
    structured_formatting: StructuredFormatting,
}

#[derive(Debug, Default, Deserialize)]
struct StructuredFormatting {
    #[serde(default)]
    main_text: String,
    #[serde(default)]
    secondary_text: String,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<DetailsResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

/// `OK` and `ZERO_RESULTS` are successes; anything else is a rejection
fn check_status(status: &str, message: Option<String>) -> Result<(), LookupError> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(LookupError::Rejected(
            message.unwrap_or_else(|| other.to_string()),
        )),
    }
}

async fn get_json<T: for<'de> Deserialize<'de>>(
    builder: reqwest::RequestBuilder,
) -> Result<T, LookupError> {
    let response = builder.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LookupError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| LookupError::Parse(e.to_string()))
}

#[async_trait]
impl AutocompleteProvider for GooglePlacesProvider {
    async fn predictions(
        &self,
        request: &AutocompleteRequest,
    ) -> Result<Vec<Prediction>, LookupError> {
        let url = format!("{}/place/autocomplete/json", self.base_url);
        let components = format!("country:{}", request.country_restriction);
        let types = request.types.join("|");
        let builder = self.client.get(url).query(&[
            ("input", request.input.as_str()),
            ("types", types.as_str()),
            ("components", components.as_str()),
            ("key", self.api_key.as_str()),
        ]);

        let body: AutocompleteResponse = get_json(builder).await?;
        check_status(&body.status, body.error_message)?;
        debug!(count = body.predictions.len(), "Autocomplete predictions received");

        Ok(body
            .predictions
            .into_iter()
            .map(|p| Prediction {
                place_id: p.place_id,
                description: p.description,
                main_text: p.structured_formatting.main_text,
                secondary_text: p.structured_formatting.secondary_text,
            })
            .collect())
    }

    async fn place_details(&self, place_id: &str) -> Result<Vec<AddressComponent>, LookupError> {
        let url = format!("{}/place/details/json", self.base_url);
        let builder = self.client.get(url).query(&[
            ("place_id", place_id),
            ("fields", "address_components"),
            ("key", self.api_key.as_str()),
        ]);

        let body: DetailsResponse = get_json(builder).await?;
        check_status(&body.status, body.error_message)?;
        Ok(body
            .result
            .map(|r| r.address_components)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_predictions_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/place/autocomplete/json"))
            .and(query_param("types", "address"))
            .and(query_param("components", "country:us"))
            .and(query_param("input", "123 Main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "predictions": [{
                    "place_id": "abc",
                    "description": "123 Main St, Los Angeles, CA, USA",
                    "structured_formatting": {
                        "main_text": "123 Main St",
                        "secondary_text": "Los Angeles, CA, USA"
                    }
                }]
            })))
            .mount(&server)
            .await;

        let provider = GooglePlacesProvider::new(Client::new(), server.uri(), "key");
        let predictions = provider
            .predictions(&AutocompleteRequest {
                input: "123 Main".into(),
                types: vec!["address".into()],
                country_restriction: "us".into(),
            })
            .await
            .unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].place_id, "abc");
        assert_eq!(predictions[0].secondary_text, "Los Angeles, CA, USA");
    }

    #[tokio::test]
    async fn test_details_components() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/place/details/json"))
            .and(query_param("place_id", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "result": {"address_components": [
                    {"long_name": "Main Street", "short_name": "Main St", "types": ["route"]}
                ]}
            })))
            .mount(&server)
            .await;

        let provider = GooglePlacesProvider::new(Client::new(), server.uri(), "key");
        let components = provider.place_details("abc").await.unwrap();
        assert_eq!(components[0].short_name, "Main St");
    }

    #[tokio::test]
    async fn test_denied_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid."
            })))
            .mount(&server)
            .await;

        let provider = GooglePlacesProvider::new(Client::new(), server.uri(), "bad");
        let err = provider.place_details("abc").await.unwrap_err();
        assert_eq!(
            err,
            LookupError::Rejected("The provided API key is invalid.".into())
        );
    }
}
