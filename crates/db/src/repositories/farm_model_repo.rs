//! Repository for the model-generation columns of the `farms` table.
//!
//! Every write after submission is scoped to the `meshy_task_id` of the
//! attempt that produced it, so a late write from a superseded attempt
//! updates zero rows instead of clobbering the newer attempt.

use fieldmesh_core::model_status::ModelStatus;
use fieldmesh_core::types::DbId;
use sqlx::PgPool;

use crate::models::farm::FarmModelRow;

/// Column list for farm model queries.
const COLUMNS: &str = "\
    id, model_status_id, meshy_task_id, model_url, model_preview_url, \
    model_error, source_photo_ref";

/// Provides query operations for farm model generation state.
pub struct FarmModelRepo;

impl FarmModelRepo {
    // ── Queries ──────────────────────────────────────────────────────

    /// Load the model projection of a farm.
    pub async fn find(pool: &PgPool, farm_id: DbId) -> Result<Option<FarmModelRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM farms WHERE id = $1");
        sqlx::query_as::<_, FarmModelRow>(&query)
            .bind(farm_id)
            .fetch_optional(pool)
            .await
    }

    // ── Submission claim ─────────────────────────────────────────────

    /// Atomically start a fresh attempt.
    ///
    /// Sets `queued`, clears the task id, asset URLs and error, and stamps
    /// `model_claimed_at`, but only if no attempt is in flight. A `queued`
    /// row without a task id whose claim is older than `stale_after_secs`
    /// is treated as abandoned and may be re-claimed.
    ///
    /// Returns the updated row, or `None` when another attempt holds the
    /// farm (or the farm does not exist).
    pub async fn claim_for_submission(
        pool: &PgPool,
        farm_id: DbId,
        stale_after_secs: f64,
    ) -> Result<Option<FarmModelRow>, sqlx::Error> {
        let query = format!(
            "UPDATE farms \
             SET model_status_id = $2, meshy_task_id = NULL, model_url = NULL, \
                 model_preview_url = NULL, model_error = NULL, model_claimed_at = NOW(), \
                 updated_at = NOW() \
             WHERE id = $1 \
               AND (model_status_id NOT IN ($2, $3) \
                    OR (model_status_id = $2 \
                        AND meshy_task_id IS NULL \
                        AND COALESCE(model_claimed_at, 'epoch'::timestamptz) \
                            < NOW() - make_interval(secs => $4))) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FarmModelRow>(&query)
            .bind(farm_id)
            .bind(ModelStatus::Queued.id())
            .bind(ModelStatus::Processing.id())
            .bind(stale_after_secs)
            .fetch_optional(pool)
            .await
    }

    /// Attach the remote task id to a claimed (`queued`) attempt.
    pub async fn record_task_id(
        pool: &PgPool,
        farm_id: DbId,
        task_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE farms SET meshy_task_id = $2, updated_at = NOW() \
             WHERE id = $1 AND model_status_id = $3 AND meshy_task_id IS NULL",
        )
        .bind(farm_id)
        .bind(task_id)
        .bind(ModelStatus::Queued.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    // ── Status transitions ───────────────────────────────────────────

    /// Record a non-terminal status (`queued` or `processing`) for the
    /// attempt identified by `task_id`.
    pub async fn mark_pending(
        pool: &PgPool,
        farm_id: DbId,
        task_id: &str,
        status: ModelStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE farms SET model_status_id = $3, updated_at = NOW() \
             WHERE id = $1 AND meshy_task_id = $2 AND model_status_id IN ($4, $5)",
        )
        .bind(farm_id)
        .bind(task_id)
        .bind(status.id())
        .bind(ModelStatus::Queued.id())
        .bind(ModelStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Mark the attempt `ready` and record its asset URLs.
    pub async fn mark_ready(
        pool: &PgPool,
        farm_id: DbId,
        task_id: &str,
        model_url: &str,
        model_preview_url: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE farms \
             SET model_status_id = $5, model_url = $3, model_preview_url = $4, model_error = NULL, \
                 updated_at = NOW() \
             WHERE id = $1 AND meshy_task_id = $2 AND model_status_id IN ($6, $7, $5)",
        )
        .bind(farm_id)
        .bind(task_id)
        .bind(model_url)
        .bind(model_preview_url)
        .bind(ModelStatus::Ready.id())
        .bind(ModelStatus::Queued.id())
        .bind(ModelStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Mark the attempt `failed`, keeping its task id for diagnostics.
    pub async fn mark_failed(
        pool: &PgPool,
        farm_id: DbId,
        task_id: &str,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE farms SET model_status_id = $4, model_error = $3, updated_at = NOW() \
             WHERE id = $1 AND meshy_task_id = $2 AND model_status_id IN ($5, $6, $4)",
        )
        .bind(farm_id)
        .bind(task_id)
        .bind(reason)
        .bind(ModelStatus::Failed.id())
        .bind(ModelStatus::Queued.id())
        .bind(ModelStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Mark a claimed attempt `failed` before the remote service assigned
    /// a task id (rejected or unparseable submission).
    pub async fn mark_submission_failed(
        pool: &PgPool,
        farm_id: DbId,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE farms SET model_status_id = $3, model_error = $2, updated_at = NOW() \
             WHERE id = $1 AND model_status_id = $4 AND meshy_task_id IS NULL",
        )
        .bind(farm_id)
        .bind(reason)
        .bind(ModelStatus::Failed.id())
        .bind(ModelStatus::Queued.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
