//! HTTP title/ownership source

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::enrichment::{TitleRequest, TitleResponse, TitleSource};
use crate::error::LookupError;

pub struct HttpTitleSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTitleSource {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn search_url(&self) -> String {
        format!("{}/property/search", self.base_url)
    }
}

#[async_trait]
impl TitleSource for HttpTitleSource {
    async fn lookup(&self, request: &TitleRequest) -> Result<TitleResponse, LookupError> {
        let mut builder = self.client.post(self.search_url()).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Title provider responded");

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
}
