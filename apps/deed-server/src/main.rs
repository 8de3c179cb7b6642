//! Deed preparation server
//!
//! Exposes the deed pipeline over HTTP:
//!
//! - Address autocomplete and title enrichment
//! - AI suggestions with offline fallbacks
//! - Wizard sessions from document-type selection to generation
//!
//! Upstream services are configured by flag or environment; without an
//! assistant URL every AI answer comes from the offline fallbacks.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use deed_assistant::{AssistantBackend, HttpAssistantBackend, RetryPolicy, Telemetry, TracingTelemetry};
use deed_wizard::HttpDocumentGenerator;
use property_search::{GooglePlacesProvider, HttpTitleSource, SearchConfig, DEFAULT_PLACES_URL};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod state;

use api::*;
use state::{AppState, Services};

/// Command-line arguments for the deed server
#[derive(Parser, Debug)]
#[command(name = "deed-server")]
#[command(about = "Deed preparation server with property lookup and AI assistance")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Address autocomplete API key
    #[arg(long, env = "GOOGLE_PLACES_API_KEY", default_value = "")]
    places_api_key: String,

    #[arg(long, env = "PLACES_API_URL", default_value = DEFAULT_PLACES_URL)]
    places_base_url: String,

    /// Title and ownership service
    #[arg(long, env = "TITLE_API_URL", default_value = "http://localhost:8001")]
    title_base_url: String,

    #[arg(long, env = "TITLE_API_KEY")]
    title_api_key: Option<String>,

    /// AI assistant service; offline fallbacks only when unset
    #[arg(long, env = "ASSISTANT_API_URL")]
    assistant_base_url: Option<String>,

    /// Document generation service
    #[arg(long, env = "DOCUMENT_API_URL", default_value = "http://localhost:8000")]
    generation_base_url: String,

    /// Address search debounce in milliseconds
    #[arg(long, default_value = "300")]
    debounce_ms: u64,

    /// Country restriction for address autocomplete
    #[arg(long, default_value = "us")]
    country: String,

    /// Wizard sessions older than this are dropped
    #[arg(long, env = "SESSION_TTL_SECS", default_value = "3600")]
    session_ttl_secs: u64,

    /// How often expired sessions are swept
    #[arg(long, default_value = "60")]
    session_sweep_secs: u64,
}

/// Routes without transport-level middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handle_health))
        .route("/api/document-types", get(handle_list_document_types))
        .route("/api/validate/session", post(handle_validate_session))
        // Property lookup
        .route("/api/property/validate-search", post(handle_validate_search))
        .route("/api/property/candidates", post(handle_candidates))
        .route("/api/property/resolve", post(handle_resolve))
        .route("/api/property/enrich", post(handle_enrich))
        // AI assistance
        .route("/api/ai/document-type", post(handle_ai_document_type))
        .route("/api/ai/field-suggestions", post(handle_ai_field_suggestions))
        .route("/api/ai/validate", post(handle_ai_validate))
        .route("/api/ai/prompt", post(handle_ai_prompt))
        .route("/api/ai/transfer-tax", post(handle_ai_transfer_tax))
        // Wizard sessions
        .route("/api/wizard", post(handle_create_session))
        .route("/api/wizard/:id", get(handle_get_session).delete(handle_delete_session))
        .route("/api/wizard/:id/document-type", post(handle_select_document_type))
        .route("/api/wizard/:id/fields", post(handle_update_fields))
        .route("/api/wizard/:id/advance", post(handle_advance))
        .route("/api/wizard/:id/back", post(handle_back))
        .route("/api/wizard/:id/apply-suggestion", post(handle_apply_suggestion))
        .route("/api/wizard/:id/suggestions", post(handle_refresh_suggestions))
        .route("/api/wizard/:id/document-suggestion", post(handle_document_suggestion))
        .route("/api/wizard/:id/property", post(handle_session_property))
        .route("/api/wizard/:id/property/select", post(handle_select_match))
        .route("/api/wizard/:id/property/amend", post(handle_amend_property))
        .route("/api/wizard/:id/generate", post(handle_generate))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting deed server on {}:{}", args.host, args.port);

    if args.places_api_key.is_empty() {
        warn!("GOOGLE_PLACES_API_KEY not set, address autocomplete will be rejected upstream");
    }

    let telemetry: Arc<dyn Telemetry> = Arc::new(TracingTelemetry::new());
    telemetry.start();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let assistant = args.assistant_base_url.as_ref().map(|url| {
        info!("AI assistant: {}", url);
        Arc::new(HttpAssistantBackend::new(client.clone(), url.as_str())) as Arc<dyn AssistantBackend>
    });
    if assistant.is_none() {
        info!("ASSISTANT_API_URL not set, AI answers come from offline fallbacks");
    }

    let services = Services {
        autocomplete: Arc::new(GooglePlacesProvider::new(
            client.clone(),
            args.places_base_url.as_str(),
            args.places_api_key.as_str(),
        )),
        title: Arc::new(HttpTitleSource::new(
            client.clone(),
            args.title_base_url.as_str(),
            args.title_api_key.clone(),
        )),
        assistant,
        generator: Arc::new(HttpDocumentGenerator::new(
            client.clone(),
            args.generation_base_url.as_str(),
        )),
        search: SearchConfig {
            debounce: Duration::from_millis(args.debounce_ms),
            country: args.country.clone(),
            ..SearchConfig::default()
        },
        retry: RetryPolicy::default(),
        telemetry: telemetry.clone(),
    };
    let state = AppState::new(services);
    let sweeper = state.spawn_session_sweeper(
        Duration::from_secs(args.session_ttl_secs),
        Duration::from_secs(args.session_sweep_secs.max(1)),
    );

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .ok_or_else(|| anyhow!("invalid rate limit: {}", args.rate_limit))?,
    );

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router(state)
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("Title service: {}", args.title_base_url);
    info!("Document service: {}", args.generation_base_url);
    info!("Session TTL: {}s", args.session_ttl_secs);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    let events = telemetry.flush();
    info!(events = events.len(), "Flushed telemetry");
    telemetry.shutdown();

    Ok(())
}
