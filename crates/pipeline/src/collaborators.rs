//! Seams between the orchestrator and the outside world.
//!
//! Each trait has one production implementation in this crate and an
//! in-memory double in the integration tests.

use std::time::Duration;

use async_trait::async_trait;
use fieldmesh_core::error::CoreError;
use fieldmesh_core::farm_model::FarmModel;
use fieldmesh_core::model_status::ModelStatus;
use fieldmesh_core::types::DbId;
use fieldmesh_meshy::api::RemoteTask;

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

/// A farm the caller has been verified to own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFarm {
    pub farm_id: DbId,
    pub owner_id: DbId,
    pub source_photo_ref: Option<String>,
}

/// Resolves a farm scoped to its owner.
#[async_trait]
pub trait FarmDirectory: Send + Sync {
    /// `Ok(None)` when the farm does not exist or belongs to someone else.
    async fn resolve_owned_farm(
        &self,
        owner_id: DbId,
        farm_id: DbId,
    ) -> Result<Option<OwnedFarm>, StoreError>;
}

// ---------------------------------------------------------------------------
// Farm model state
// ---------------------------------------------------------------------------

/// A status write for the attempt identified by a task id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelWrite<'a> {
    /// `queued` or `processing`.
    Pending(ModelStatus),
    Ready {
        model_url: &'a str,
        model_preview_url: Option<&'a str>,
    },
    Failed {
        reason: &'a str,
    },
}

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be mapped to the domain model.
    #[error("Corrupt farm model row: {0}")]
    Corrupt(#[from] CoreError),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// The persisted farm model projection.
///
/// Writes taking a `task_id` apply only while that task is the farm's
/// current attempt and return `false` otherwise.
#[async_trait]
pub trait FarmModelStore: Send + Sync {
    async fn load(&self, farm_id: DbId) -> Result<Option<FarmModel>, StoreError>;

    /// Compare-and-set into `queued`, clearing the previous attempt.
    ///
    /// Succeeds only when no attempt is in flight, or when the farm is
    /// `queued` without a task id and was claimed more than `stale_after`
    /// ago. Returns the claimed model, or `None` when refused.
    async fn claim(
        &self,
        farm_id: DbId,
        stale_after: Duration,
    ) -> Result<Option<FarmModel>, StoreError>;

    /// Attach the accepted task id to the claimed attempt.
    async fn record_task_id(&self, farm_id: DbId, task_id: &str) -> Result<bool, StoreError>;

    async fn write(
        &self,
        farm_id: DbId,
        task_id: &str,
        write: ModelWrite<'_>,
    ) -> Result<bool, StoreError>;

    /// Mark a claimed attempt failed before any task id was assigned.
    async fn fail_submission(&self, farm_id: DbId, reason: &str) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// Object storage
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Photo not found: {0}")]
    NotFound(String),
}

/// Turns a stored photo reference into a URL the remote service can fetch.
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    async fn resolve_public_url(&self, photo_ref: &str) -> Result<String, StorageError>;
}

// ---------------------------------------------------------------------------
// Remote job service
// ---------------------------------------------------------------------------

/// Remote service errors, classified by how the orchestrator reacts.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Remote service credential is not configured")]
    NotConfigured,

    /// Non-2xx answer.
    #[error("Remote service rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// 2xx answer without a field we need.
    #[error("Malformed remote response: {0}")]
    Malformed(String),

    /// Network, timeout or body decoding failure.
    #[error("Remote transport error: {0}")]
    Transport(String),
}

/// Image-to-3D job service.
#[async_trait]
pub trait RemoteJobClient: Send + Sync {
    /// Fails with [`RemoteError::NotConfigured`] when no credential is set.
    fn ensure_configured(&self) -> Result<(), RemoteError>;

    /// Submit a job; returns the remote task id.
    async fn submit(&self, photo_url: &str) -> Result<String, RemoteError>;

    /// One status request, no retry.
    async fn get_status(&self, task_id: &str) -> Result<RemoteTask, RemoteError>;
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Suspension between poll attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
