//! Shared application state

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use deed_assistant::{AssistantBackend, RetryPolicy, SuggestionClient, Telemetry};
use deed_wizard::{DocumentGenerator, DocumentTypeRegistry, WizardStateMachine};
use property_search::{
    AddressResolver, AutocompleteProvider, PropertyEnrichmentClient, SearchConfig, TitleSource,
};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// Upstream providers, wired once at startup
pub struct Services {
    pub autocomplete: Arc<dyn AutocompleteProvider>,
    pub title: Arc<dyn TitleSource>,
    pub assistant: Option<Arc<dyn AssistantBackend>>,
    pub generator: Arc<dyn DocumentGenerator>,
    pub search: SearchConfig,
    pub retry: RetryPolicy,
    pub telemetry: Arc<dyn Telemetry>,
}

/// One wizard run and its own address search.
///
/// The mutex serializes every operation on the session.
pub struct SessionEntry {
    pub machine: Mutex<WizardStateMachine>,
    pub resolver: AddressResolver,
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DocumentTypeRegistry>,
    pub autocomplete: Arc<dyn AutocompleteProvider>,
    pub search: SearchConfig,
    pub enrichment: Arc<PropertyEnrichmentClient>,
    pub assistant: Arc<SuggestionClient>,
    pub generator: Arc<dyn DocumentGenerator>,
    pub telemetry: Arc<dyn Telemetry>,
    pub sessions: Arc<RwLock<HashMap<Uuid, Arc<SessionEntry>>>>,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        let assistant = SuggestionClient::new(services.assistant, services.retry)
            .with_telemetry(services.telemetry.clone());
        Self {
            registry: Arc::new(DocumentTypeRegistry::standard()),
            autocomplete: services.autocomplete,
            search: services.search,
            enrichment: Arc::new(PropertyEnrichmentClient::new(services.title)),
            assistant: Arc::new(assistant),
            generator: services.generator,
            telemetry: services.telemetry,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn resolver(&self) -> AddressResolver {
        AddressResolver::new(self.autocomplete.clone(), self.search.clone())
    }

    pub async fn create_session(&self) -> (Uuid, Arc<SessionEntry>) {
        let id = Uuid::new_v4();
        let entry = Arc::new(SessionEntry {
            machine: Mutex::new(WizardStateMachine::new(
                self.registry.clone(),
                self.telemetry.clone(),
            )),
            resolver: self.resolver(),
        });
        self.sessions.write().await.insert(id, entry.clone());
        (id, entry)
    }

    pub async fn session(&self, id: Uuid) -> Option<Arc<SessionEntry>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove_session(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Drop sessions started more than `ttl` ago.
    ///
    /// A session whose machine is locked by a request in flight is kept.
    pub async fn evict_expired(&self, ttl: Duration) -> usize {
        let now = Utc::now();
        let entries: Vec<(Uuid, Arc<SessionEntry>)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, entry)| (*id, entry.clone()))
            .collect();
        let expired: Vec<Uuid> = entries
            .into_iter()
            .filter(|(_, entry)| {
                entry
                    .machine
                    .try_lock()
                    .map(|m| m.session().expired(ttl, now))
                    .unwrap_or(false)
            })
            .map(|(id, _)| id)
            .collect();
        if expired.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, _| !expired.contains(id));
        before - sessions.len()
    }

    /// Sweep expired sessions every `period` until the task is aborted
    pub fn spawn_session_sweeper(&self, ttl: Duration, period: Duration) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = state.evict_expired(ttl).await;
                if evicted > 0 {
                    info!(evicted, "Expired wizard sessions dropped");
                } else {
                    debug!("No expired wizard sessions");
                }
            }
        })
    }
}
