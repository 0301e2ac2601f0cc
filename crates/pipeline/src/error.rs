use fieldmesh_core::error::CoreError;
use fieldmesh_core::types::DbId;

use crate::collaborators::StoreError;

/// Failures surfaced by `request_generation` and `check_status`.
///
/// `Configuration`, `AccessDenied` and `NoPhotoAvailable` are raised
/// before any state mutation. The remote failures are persisted on the
/// farm before being returned.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The remote service credential is absent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The farm does not exist or is not owned by the caller.
    #[error("Farm {farm_id} not found or not owned by caller")]
    AccessDenied { farm_id: DbId },

    #[error("Farm {farm_id} has no usable source photo: {detail}")]
    NoPhotoAvailable { farm_id: DbId, detail: String },

    /// The remote service refused the job, or the request never completed
    /// (`status` is `None` for transport failures).
    #[error("Model generation submission failed{}: {body}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    SubmissionFailed { status: Option<u16>, body: String },

    /// The remote service accepted the request but its answer was unusable.
    #[error("Malformed response from model generation service: {0}")]
    MalformedResponse(String),

    /// The remote job reached a terminal failure.
    #[error("Model generation failed for task {task_id}: {reason}")]
    GenerationFailed { task_id: String, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
