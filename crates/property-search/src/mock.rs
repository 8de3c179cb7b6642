//! In-memory providers for tests and offline development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::address::{AddressComponent, AutocompleteProvider, AutocompleteRequest, Prediction};
use crate::enrichment::{TitleRequest, TitleResponse, TitleSource};
use crate::error::LookupError;

/// Mock autocomplete provider with canned predictions and details.
#[derive(Default)]
pub struct MockAutocomplete {
    predictions: Vec<Prediction>,
    details: HashMap<String, Vec<AddressComponent>>,
    prediction_calls: Arc<AtomicU32>,
}

impl MockAutocomplete {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prediction(mut self, prediction: Prediction) -> Self {
        self.predictions.push(prediction);
        self
    }

    pub fn with_details(mut self, place_id: &str, components: Vec<AddressComponent>) -> Self {
        self.details.insert(place_id.to_string(), components);
        self
    }

    /// Shared counter of `predictions` calls
    pub fn prediction_calls(&self) -> Arc<AtomicU32> {
        self.prediction_calls.clone()
    }
}

#[async_trait]
impl AutocompleteProvider for MockAutocomplete {
    async fn predictions(
        &self,
        _request: &AutocompleteRequest,
    ) -> Result<Vec<Prediction>, LookupError> {
        self.prediction_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.predictions.clone())
    }

    async fn place_details(&self, place_id: &str) -> Result<Vec<AddressComponent>, LookupError> {
        self.details
            .get(place_id)
            .cloned()
            .ok_or_else(|| LookupError::Rejected(format!("Unknown place id '{}'", place_id)))
    }
}

/// Mock title source replaying a scripted sequence of responses.
///
/// The last scripted response repeats once the script runs out.
pub struct MockTitleSource {
    script: Mutex<Vec<Result<TitleResponse, LookupError>>>,
    requests: Mutex<Vec<TitleRequest>>,
    calls: AtomicU32,
}

impl MockTitleSource {
    pub fn new(responses: Vec<Result<TitleResponse, LookupError>>) -> Self {
        Self {
            script: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn responding(response: TitleResponse) -> Self {
        Self::new(vec![Ok(response)])
    }

    pub fn failing(error: LookupError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TitleRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TitleSource for MockTitleSource {
    async fn lookup(&self, request: &TitleRequest) -> Result<TitleResponse, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let mut script = self
            .script
            .lock()
            .map_err(|_| LookupError::Transport("mock poisoned".into()))?;
        match script.len() {
            0 => Err(LookupError::Transport("no scripted response".into())),
            1 => script[0].clone(),
            _ => script.remove(0),
        }
    }
}
