//! Handlers for the `/farms/{id}/model` resource.
//!
//! All endpoints require authentication via [`AuthUser`]; ownership is
//! checked by the orchestrator.

use std::future::Future;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use fieldmesh_core::types::DbId;
use fieldmesh_pipeline::{ModelOutcome, OrchestratorError};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run an orchestration on its own task so a client that disconnects
/// (dropping this handler future) does not abandon the poll loop halfway.
async fn detached<F>(operation: F) -> AppResult<ModelOutcome>
where
    F: Future<Output = Result<ModelOutcome, OrchestratorError>> + Send + 'static,
{
    let outcome = tokio::spawn(operation)
        .await
        .map_err(|e| AppError::InternalError(format!("Model orchestration task failed: {e}")))??;
    Ok(outcome)
}

/// `202 Accepted` while a job is outstanding, `200 OK` otherwise.
fn outcome_response(outcome: ModelOutcome) -> impl IntoResponse {
    let status = if outcome.is_pending() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    (status, Json(DataResponse { data: outcome }))
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /api/v1/farms/{id}/model
///
/// Current model projection of the farm. Never contacts the remote service.
pub async fn get_model(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(farm_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let model = state
        .orchestrator
        .current_model(auth.owner_id, farm_id)
        .await?;
    Ok(Json(DataResponse { data: model }))
}

// ---------------------------------------------------------------------------
// Generate
// ---------------------------------------------------------------------------

/// POST /api/v1/farms/{id}/model/generate
///
/// Ensure a model exists or is being generated. Returns 200 with a ready
/// (or idle) outcome, or 202 with a pending one when the job outlives the
/// poll budget or another request already owns it.
pub async fn generate_model(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(farm_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(farm_id, owner_id = auth.owner_id, "Model generation requested");

    let orchestrator = state.orchestrator.clone();
    let owner_id = auth.owner_id;
    let outcome = detached(async move {
        orchestrator.request_generation(owner_id, farm_id).await
    })
    .await?;

    Ok(outcome_response(outcome))
}

// ---------------------------------------------------------------------------
// Check
// ---------------------------------------------------------------------------

/// POST /api/v1/farms/{id}/model/check
///
/// Re-attach to a previously submitted job with one status request.
pub async fn check_model(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(farm_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let orchestrator = state.orchestrator.clone();
    let owner_id = auth.owner_id;
    let outcome = detached(async move { orchestrator.check_status(owner_id, farm_id).await }).await?;

    Ok(outcome_response(outcome))
}
