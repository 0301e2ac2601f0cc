use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fieldmesh_core::error::CoreError;
use fieldmesh_pipeline::collaborators::StoreError;
use fieldmesh_pipeline::OrchestratorError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`OrchestratorError`] and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses of the form `{ "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `fieldmesh_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failure reported by the model generation orchestrator.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

type Classified = (StatusCode, &'static str, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Orchestrator(err) => classify_orchestrator_error(err),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> Classified {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(core: &CoreError) -> Classified {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, "INVALID_TRANSITION", core.to_string())
        }
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
    }
}

/// Map orchestrator failures onto HTTP statuses.
///
/// Remote-service failures are 502 and keep their diagnostic, which is
/// also persisted on the farm. Persistence failures are sanitized.
fn classify_orchestrator_error(err: &OrchestratorError) -> Classified {
    match err {
        OrchestratorError::Configuration(msg) => {
            tracing::error!(error = %msg, "Model generation service is not configured");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "CONFIGURATION_ERROR",
                "Model generation is not configured on this server".to_string(),
            )
        }
        OrchestratorError::AccessDenied { .. } => {
            (StatusCode::FORBIDDEN, "ACCESS_DENIED", err.to_string())
        }
        OrchestratorError::NoPhotoAvailable { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "NO_PHOTO_AVAILABLE",
            err.to_string(),
        ),
        OrchestratorError::SubmissionFailed { .. } => {
            (StatusCode::BAD_GATEWAY, "SUBMISSION_FAILED", err.to_string())
        }
        OrchestratorError::MalformedResponse(_) => {
            (StatusCode::BAD_GATEWAY, "MALFORMED_RESPONSE", err.to_string())
        }
        OrchestratorError::GenerationFailed { .. } => {
            (StatusCode::BAD_GATEWAY, "GENERATION_FAILED", err.to_string())
        }
        OrchestratorError::Core(core) => classify_core_error(core),
        OrchestratorError::Store(StoreError::Database(db)) => classify_sqlx_error(db),
        OrchestratorError::Store(other) => {
            tracing::error!(error = %other, "Farm model store error");
            internal()
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
