//! API handlers for the deed server
//!
//! Stateless endpoints expose each pipeline component directly; the
//! `/api/wizard` endpoints drive one [`WizardStateMachine`] per session.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use deed_assistant::{Suggested, SuggestionContext};
use deed_wizard::{DocumentTypeConfig, Progress, WizardSession, WizardStateMachine};
use property_search::CandidateBatch;
use serde::{Deserialize, Serialize};
use shared_types::{
    AddressCandidate, DocumentSuggestion, DocumentType, EnrichmentOutcome, FieldSuggestion,
    FieldValues, NormalizedAddress, PromptContext, PromptResponse, PropertyRecord, StepConfig,
    TransferTax, ValidationReport,
};
use tracing::{debug, info};
use uuid::Uuid;
use validation_engine::{SearchRequest, SessionSnapshot, ValidationEngine};

use crate::error::ServerError;
use crate::state::{AppState, SessionEntry};

/// Enrichment tries per wizard property lookup
const ENRICH_ATTEMPTS: u32 = 3;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "deed-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct DocumentTypeListResponse {
    pub success: bool,
    pub document_types: Vec<DocumentTypeConfig>,
    pub count: usize,
}

/// Handler: GET /api/document-types
pub async fn handle_list_document_types(
    State(state): State<AppState>,
) -> Json<DocumentTypeListResponse> {
    let document_types: Vec<DocumentTypeConfig> =
        state.registry.list().into_iter().cloned().collect();
    let count = document_types.len();
    Json(DocumentTypeListResponse {
        success: true,
        document_types,
        count,
    })
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub success: bool,
    pub report: ValidationReport,
}

/// Handler: POST /api/property/validate-search
pub async fn handle_validate_search(Json(request): Json<SearchRequest>) -> Json<ReportResponse> {
    Json(ReportResponse {
        success: true,
        report: ValidationEngine::new().validate_search_request(&request),
    })
}

/// Handler: POST /api/validate/session
pub async fn handle_validate_session(
    Json(snapshot): Json<SessionSnapshot>,
) -> Json<ReportResponse> {
    Json(ReportResponse {
        success: true,
        report: ValidationEngine::new().validate_session_consistency(&snapshot),
    })
}

// ============================================================================
// Property lookup
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatesRequest {
    pub input: String,
    /// Searches within a session supersede that session's earlier searches
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct CandidatesResponse {
    pub success: bool,
    pub status: &'static str,
    pub candidates: Vec<AddressCandidate>,
}

/// Handler: POST /api/property/candidates
pub async fn handle_candidates(
    State(state): State<AppState>,
    Json(request): Json<CandidatesRequest>,
) -> Result<Json<CandidatesResponse>, ServerError> {
    let batch = match request.session_id {
        Some(id) => {
            let entry = find_session(&state, id).await?;
            entry.resolver.search_candidates(&request.input).await?
        }
        None => state.resolver().search_candidates(&request.input).await?,
    };

    let (status, candidates) = match batch {
        CandidateBatch::TooShort => ("too_short", Vec::new()),
        CandidateBatch::Superseded => ("superseded", Vec::new()),
        CandidateBatch::Candidates(list) => ("candidates", list),
    };
    debug!(status, count = candidates.len(), "Candidate search finished");

    Ok(Json(CandidatesResponse {
        success: true,
        status,
        candidates,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub candidate_id: String,
}

#[derive(Serialize)]
pub struct AddressResponse {
    pub success: bool,
    pub address: NormalizedAddress,
}

/// Handler: POST /api/property/resolve
pub async fn handle_resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<AddressResponse>, ServerError> {
    let address = state.resolver().resolve_candidate(&request.candidate_id).await?;
    Ok(Json(AddressResponse {
        success: true,
        address,
    }))
}

#[derive(Deserialize)]
pub struct EnrichRequest {
    pub address: NormalizedAddress,
}

#[derive(Serialize)]
pub struct EnrichResponse {
    pub success: bool,
    pub outcome: EnrichmentOutcome,
}

/// Handler: POST /api/property/enrich
///
/// A search the validator rejects never reaches the title service.
pub async fn handle_enrich(
    State(state): State<AppState>,
    Json(request): Json<EnrichRequest>,
) -> Result<Json<EnrichResponse>, ServerError> {
    let search = SearchRequest {
        address: request.address.full_address.clone(),
        county: Some(request.address.county.clone()).filter(|c| !c.trim().is_empty()),
    };
    let report = ValidationEngine::new().validate_search_request(&search);
    if !report.is_valid {
        return Err(ServerError::SearchRejected(report));
    }

    let outcome = state.enrichment.enrich(&request.address).await;
    Ok(Json(EnrichResponse {
        success: true,
        outcome,
    }))
}

// ============================================================================
// AI assistance
// ============================================================================

/// Any assistant answer, tagged with where it came from
#[derive(Serialize)]
pub struct AssistantResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub answer: Suggested<T>,
}

impl<T: Serialize> From<Suggested<T>> for AssistantResponse<T> {
    fn from(answer: Suggested<T>) -> Self {
        Self {
            success: true,
            answer,
        }
    }
}

#[derive(Deserialize)]
pub struct DocumentTypeRequest {
    pub property: PropertyRecord,
}

/// Handler: POST /api/ai/document-type
pub async fn handle_ai_document_type(
    State(state): State<AppState>,
    Json(request): Json<DocumentTypeRequest>,
) -> Json<AssistantResponse<DocumentSuggestion>> {
    Json(state.assistant.suggest_document_type(&request.property).await.into())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSuggestionsRequest {
    pub document_type: DocumentType,
    pub step_id: String,
    #[serde(default)]
    pub context: SuggestionContext,
}

/// Handler: POST /api/ai/field-suggestions
pub async fn handle_ai_field_suggestions(
    State(state): State<AppState>,
    Json(request): Json<FieldSuggestionsRequest>,
) -> Json<AssistantResponse<Vec<FieldSuggestion>>> {
    let answer = state
        .assistant
        .get_field_suggestions(request.document_type, &request.step_id, &request.context)
        .await;
    Json(answer.into())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateDocumentRequest {
    pub document_type: DocumentType,
    #[serde(default)]
    pub data: FieldValues,
}

/// Handler: POST /api/ai/validate
pub async fn handle_ai_validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateDocumentRequest>,
) -> Json<AssistantResponse<ValidationReport>> {
    let answer = state
        .assistant
        .validate_document(request.document_type, &request.data)
        .await;
    Json(answer.into())
}

#[derive(Deserialize)]
pub struct PromptBody {
    pub prompt: String,
    #[serde(default)]
    pub context: PromptContext,
}

/// Handler: POST /api/ai/prompt
pub async fn handle_ai_prompt(
    State(state): State<AppState>,
    Json(request): Json<PromptBody>,
) -> Json<AssistantResponse<PromptResponse>> {
    let answer = state
        .assistant
        .process_natural_language_prompt(&request.prompt, &request.context)
        .await;
    Json(answer.into())
}

#[derive(Deserialize)]
pub struct TransferTaxBody {
    pub value: f64,
    pub county: String,
    #[serde(default)]
    pub city: Option<String>,
}

/// Handler: POST /api/ai/transfer-tax
pub async fn handle_ai_transfer_tax(
    State(state): State<AppState>,
    Json(request): Json<TransferTaxBody>,
) -> Json<AssistantResponse<TransferTax>> {
    let answer = state
        .assistant
        .calculate_transfer_tax(request.value, &request.county, request.city.as_deref())
        .await;
    Json(answer.into())
}

// ============================================================================
// Wizard sessions
// ============================================================================

/// Snapshot of one wizard session returned by every wizard endpoint
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub success: bool,
    pub session_id: Uuid,
    pub session: WizardSession,
    pub progress: Progress,
    pub current_step: Option<StepConfig>,
    pub can_advance: bool,
    pub generation_failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ValidationReport>,
}

impl WizardView {
    fn of(session_id: Uuid, machine: &WizardStateMachine) -> Self {
        let current_step = machine.current_step().cloned();
        let can_advance = current_step
            .as_ref()
            .map(|s| machine.can_advance(&s.id))
            .unwrap_or(false)
            && machine.has_property();
        Self {
            success: true,
            session_id,
            session: machine.session().clone(),
            progress: machine.progress(),
            current_step,
            can_advance,
            generation_failed: machine.session().last_generation_failed(),
            report: None,
        }
    }

    fn with_report(mut self, report: ValidationReport) -> Self {
        self.report = Some(report);
        self
    }
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<SessionEntry>, ServerError> {
    state
        .session(id)
        .await
        .ok_or_else(|| ServerError::SessionNotFound(id.to_string()))
}

/// Handler: POST /api/wizard
pub async fn handle_create_session(State(state): State<AppState>) -> Json<WizardView> {
    let (id, entry) = state.create_session().await;
    info!(session_id = %id, "Wizard session created");
    let machine = entry.machine.lock().await;
    Json(WizardView::of(id, &machine))
}

/// Handler: GET /api/wizard/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, ServerError> {
    let entry = find_session(&state, id).await?;
    let machine = entry.machine.lock().await;
    Ok(Json(WizardView::of(id, &machine)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub success: bool,
    pub session_id: Uuid,
}

/// Handler: DELETE /api/wizard/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ServerError> {
    if !state.remove_session(id).await {
        return Err(ServerError::SessionNotFound(id.to_string()));
    }
    info!(session_id = %id, "Wizard session deleted");
    Ok(Json(DeletedResponse {
        success: true,
        session_id: id,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectTypeRequest {
    pub document_type: DocumentType,
}

/// Handler: POST /api/wizard/:id/document-type
///
/// Selects the type on a fresh session and switches it on one already in a
/// step.
pub async fn handle_select_document_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectTypeRequest>,
) -> Result<Json<WizardView>, ServerError> {
    let entry = find_session(&state, id).await?;
    let mut machine = entry.machine.lock().await;
    if machine.session().document_type.is_none() {
        machine.select_document_type(request.document_type)?;
    } else {
        machine.change_document_type(request.document_type)?;
    }
    Ok(Json(WizardView::of(id, &machine)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFieldsRequest {
    pub step_id: String,
    pub fields: FieldValues,
}

/// Handler: POST /api/wizard/:id/fields
pub async fn handle_update_fields(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateFieldsRequest>,
) -> Result<Json<WizardView>, ServerError> {
    let entry = find_session(&state, id).await?;
    let mut machine = entry.machine.lock().await;
    let report = machine.update_fields(&request.step_id, request.fields)?;
    Ok(Json(WizardView::of(id, &machine).with_report(report)))
}

/// Handler: POST /api/wizard/:id/advance
pub async fn handle_advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, ServerError> {
    let entry = find_session(&state, id).await?;
    let mut machine = entry.machine.lock().await;
    let to = machine.advance()?;
    debug!(session_id = %id, ?to, "Wizard advanced");
    Ok(Json(WizardView::of(id, &machine)))
}

/// Handler: POST /api/wizard/:id/back
pub async fn handle_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, ServerError> {
    let entry = find_session(&state, id).await?;
    let mut machine = entry.machine.lock().await;
    machine.go_back()?;
    Ok(Json(WizardView::of(id, &machine)))
}

#[derive(Deserialize)]
pub struct ApplySuggestionRequest {
    pub field: String,
}

/// Handler: POST /api/wizard/:id/apply-suggestion
///
/// Applies the stored suggestion for `field`, whichever step holds it.
pub async fn handle_apply_suggestion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApplySuggestionRequest>,
) -> Result<Json<WizardView>, ServerError> {
    let entry = find_session(&state, id).await?;
    let mut machine = entry.machine.lock().await;
    let suggestion = machine
        .session()
        .ai_suggestions
        .values()
        .flatten()
        .find(|s| s.field == request.field)
        .cloned()
        .ok_or_else(|| {
            ServerError::InvalidRequest(format!("No suggestion for field '{}'", request.field))
        })?;
    let report = machine.apply_ai_suggestion(&suggestion)?;
    Ok(Json(WizardView::of(id, &machine).with_report(report)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSuggestionsRequest {
    pub step_id: String,
}

/// Handler: POST /api/wizard/:id/suggestions
pub async fn handle_refresh_suggestions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RefreshSuggestionsRequest>,
) -> Result<Json<WizardView>, ServerError> {
    let entry = find_session(&state, id).await?;
    let mut machine = entry.machine.lock().await;
    machine
        .refresh_suggestions(&request.step_id, &state.assistant)
        .await?;
    Ok(Json(WizardView::of(id, &machine)))
}

/// Handler: POST /api/wizard/:id/document-suggestion
pub async fn handle_document_suggestion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, ServerError> {
    let entry = find_session(&state, id).await?;
    let mut machine = entry.machine.lock().await;
    machine.request_document_suggestion(&state.assistant).await?;
    Ok(Json(WizardView::of(id, &machine)))
}

#[derive(Deserialize)]
pub struct SessionPropertyRequest {
    pub address: NormalizedAddress,
}

/// Handler: POST /api/wizard/:id/property
pub async fn handle_session_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SessionPropertyRequest>,
) -> Result<Json<WizardView>, ServerError> {
    let entry = find_session(&state, id).await?;
    let mut machine = entry.machine.lock().await;
    machine
        .enrich_with_progress(
            &state.enrichment,
            request.address,
            ENRICH_ATTEMPTS,
            |attempt, max| debug!(session_id = %id, attempt, max, "Enrichment attempt"),
        )
        .await?;
    Ok(Json(WizardView::of(id, &machine)))
}

#[derive(Deserialize)]
pub struct SelectMatchRequest {
    pub index: usize,
}

/// Handler: POST /api/wizard/:id/property/select
pub async fn handle_select_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectMatchRequest>,
) -> Result<Json<WizardView>, ServerError> {
    let entry = find_session(&state, id).await?;
    let mut machine = entry.machine.lock().await;
    machine.choose_match(request.index)?;
    Ok(Json(WizardView::of(id, &machine)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendPropertyRequest {
    #[serde(default)]
    pub apn: Option<String>,
    #[serde(default)]
    pub legal_description: Option<String>,
}

/// Handler: POST /api/wizard/:id/property/amend
pub async fn handle_amend_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AmendPropertyRequest>,
) -> Result<Json<WizardView>, ServerError> {
    let entry = find_session(&state, id).await?;
    let mut machine = entry.machine.lock().await;
    machine.amend_property(request.apn, request.legal_description)?;
    Ok(Json(WizardView::of(id, &machine)))
}

/// Handler: POST /api/wizard/:id/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, ServerError> {
    let entry = find_session(&state, id).await?;
    let mut machine = entry.machine.lock().await;
    machine
        .generate(state.generator.as_ref(), &state.assistant)
        .await?;
    info!(session_id = %id, "Deed generated");
    Ok(Json(WizardView::of(id, &machine)))
}
