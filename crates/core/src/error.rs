use crate::model_status::ModelStatus;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Illegal model status transition from '{from}' to '{to}'")]
    InvalidTransition { from: ModelStatus, to: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}
