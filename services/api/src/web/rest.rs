//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use mediscribe_core::{
    analysis,
    domain::{
        AnalysisRequest, DocumentStatus, GenerationRequest, NewDocument,
    },
    ports::PortError,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        analyze_handler,
        generate_handler,
        subscription_handler,
        upgrade_handler,
        list_documents_handler,
        get_profile_handler,
        put_profile_handler,
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
    ),
    components(
        schemas(
            ErrorBody,
            GenerateResponse,
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
        )
    ),
    tags(
        (name = "Mediscribe API", description = "API endpoints for AI-assisted medical document generation.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Uniform error payload: `{ "error": message }`.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// The response payload of a successful document generation.
#[derive(Serialize, ToSchema)]
pub struct GenerateResponse {
    pub content: String,
}

type HandlerError = (StatusCode, Json<ErrorBody>);

/// Maps the port taxonomy onto HTTP statuses. Every failure leaves the
/// service as `{ "error": message }`; raw transport errors never escape.
fn error_response(error: PortError) -> HandlerError {
    let status = match &error {
        PortError::Validation(_) => StatusCode::BAD_REQUEST,
        PortError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        PortError::QuotaExceeded(_) => StatusCode::PAYMENT_REQUIRED,
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Configuration(_) | PortError::Provider(_) | PortError::Unexpected(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
}

//=========================================================================================
// Analysis & Generation
//=========================================================================================

/// Analyze an exam (optionally with an attached image) for a patient.
#[utoipa::path(
    post,
    path = "/analyze",
    responses(
        (status = 200, description = "Structured analysis of the exam"),
        (status = 400, description = "Required patient fields missing", body = ErrorBody),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Completion service not configured or provider failure", body = ErrorBody)
    )
)]
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(request): Json<AnalysisRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    info!(
        %user_id,
        document_type = %request.document_type,
        with_image = request.image_url.is_some(),
        "Analysis requested"
    );

    let result = analysis::analyze(state.analysis_completions.as_ref(), &request)
        .await
        .map_err(|e| {
            error!("Analysis failed: {e}");
            error_response(e)
        })?;

    Ok(Json(result))
}

/// Generate a medical document (laudo, receita or relatorio).
///
/// Entitlement-gated: the caller's plan and this month's usage are checked
/// before anything is dispatched to the completion service. On success the
/// document is persisted and the generated text returned.
#[utoipa::path(
    post,
    path = "/generate",
    responses(
        (status = 200, description = "Generated document text", body = GenerateResponse),
        (status = 400, description = "Required fields missing", body = ErrorBody),
        (status = 401, description = "Not authenticated"),
        (status = 402, description = "Monthly free-tier limit reached", body = ErrorBody),
        (status = 500, description = "Completion service not configured or provider failure", body = ErrorBody)
    )
)]
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(request): Json<GenerationRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let kind = request.kind();
    let now = Utc::now();

    // Best-effort gate: the count is recomputed from the store here, but the
    // check and the later insert are not one transaction (soft cap).
    let allowed = state
        .entitlements
        .can_create(user_id, kind, now)
        .await
        .map_err(error_response)?;
    if !allowed {
        info!(%user_id, %kind, "Generation blocked by quota");
        return Err(error_response(PortError::QuotaExceeded(kind)));
    }

    let content = analysis::generate(state.generation_completions.as_ref(), &request)
        .await
        .map_err(|e| {
            error!("Generation failed: {e}");
            error_response(e)
        })?;

    // Persisted strictly after a successful completion; the usage recount
    // picks it up on the next entitlement load.
    let document = state
        .store
        .create_document(NewDocument {
            user_id,
            kind,
            subtype: request.subtype().to_string(),
            patient_name: request.patient_name().to_string(),
            patient_info: request.patient_info_json(),
            content: content.clone(),
            status: DocumentStatus::Completed,
        })
        .await
        .map_err(|e| {
            error!("Failed to persist generated document: {e}");
            error_response(e)
        })?;

    info!(%user_id, %kind, document_id = %document.id, "Document generated");
    Ok(Json(GenerateResponse { content }))
}

//=========================================================================================
// Subscription
//=========================================================================================

/// Current plan, trial countdown, limits and monthly usage for the caller.
#[utoipa::path(
    get,
    path = "/subscription",
    responses(
        (status = 200, description = "Resolved subscription status"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn subscription_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let status = state
        .entitlements
        .status(user_id, Utc::now())
        .await
        .map_err(error_response)?;
    Ok(Json(status))
}

/// Upgrade the caller to the premium plan.
///
/// Checkout is a stub: no payment provider is wired in; the plan flips to
/// premium immediately and permanently.
#[utoipa::path(
    post,
    path = "/subscription/upgrade",
    responses(
        (status = 200, description = "Upgraded subscription status"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn upgrade_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let status = state
        .entitlements
        .upgrade(user_id, Utc::now())
        .await
        .map_err(error_response)?;
    info!(%user_id, "Account upgraded to premium");
    Ok(Json(status))
}

//=========================================================================================
// Documents & Profile
//=========================================================================================

/// List the caller's generated documents, newest first.
#[utoipa::path(
    get,
    path = "/documents",
    responses(
        (status = 200, description = "The caller's documents"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_documents_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let documents = state
        .store
        .list_documents(user_id)
        .await
        .map_err(error_response)?;
    Ok(Json(documents))
}

/// Fetch the caller's onboarding profile.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "The caller's profile"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Profile not filled in yet", body = ErrorBody)
    )
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let profile = state
        .store
        .get_profile(user_id)
        .await
        .map_err(error_response)?;
    Ok(Json(profile))
}

/// Create or replace the caller's onboarding profile.
#[utoipa::path(
    put,
    path = "/profile",
    responses(
        (status = 204, description = "Profile saved"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn put_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(mut profile): Json<mediscribe_core::domain::ClinicianProfile>,
) -> Result<impl IntoResponse, HandlerError> {
    profile.user_id = user_id;
    state
        .store
        .upsert_profile(profile)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
