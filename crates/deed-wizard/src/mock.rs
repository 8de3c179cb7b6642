//! In-memory document generator

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::GenerationError;
use crate::generation::{DocumentGenerator, GeneratedDocument, GenerationRequest};

/// Returns a fixed result and remembers every request
pub struct MockGenerator {
    result: Result<GeneratedDocument, GenerationError>,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: AtomicU32,
}

impl MockGenerator {
    pub fn succeeding(id: &str) -> Self {
        Self::with_result(Ok(GeneratedDocument {
            id: id.to_string(),
            pdf_url: Some(format!("https://documents.local/{}.pdf", id)),
            pdf_base64: None,
        }))
    }

    pub fn failing(error: GenerationError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<GeneratedDocument, GenerationError>) -> Self {
        Self {
            result,
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

#[async_trait]
impl DocumentGenerator for MockGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedDocument, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.result.clone()
    }
}
