//! Postgres implementations of the ownership and farm model collaborators.

use std::time::Duration;

use async_trait::async_trait;
use fieldmesh_core::farm_model::FarmModel;
use fieldmesh_core::types::DbId;
use fieldmesh_db::repositories::{FarmModelRepo, FarmRepo};
use fieldmesh_db::DbPool;

use crate::collaborators::{FarmDirectory, FarmModelStore, ModelWrite, OwnedFarm, StoreError};

/// Farm ownership and model state stored on the `farms` table.
#[derive(Clone)]
pub struct PgFarmStore {
    pool: DbPool,
}

impl PgFarmStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FarmDirectory for PgFarmStore {
    async fn resolve_owned_farm(
        &self,
        owner_id: DbId,
        farm_id: DbId,
    ) -> Result<Option<OwnedFarm>, StoreError> {
        let farm = FarmRepo::find_owned(&self.pool, farm_id, owner_id).await?;
        Ok(farm.map(|f| OwnedFarm {
            farm_id: f.id,
            owner_id: f.owner_id,
            source_photo_ref: f.source_photo_ref,
        }))
    }
}

#[async_trait]
impl FarmModelStore for PgFarmStore {
    async fn load(&self, farm_id: DbId) -> Result<Option<FarmModel>, StoreError> {
        FarmModelRepo::find(&self.pool, farm_id)
            .await?
            .map(|row| row.into_farm_model())
            .transpose()
            .map_err(StoreError::from)
    }

    async fn claim(
        &self,
        farm_id: DbId,
        stale_after: Duration,
    ) -> Result<Option<FarmModel>, StoreError> {
        FarmModelRepo::claim_for_submission(&self.pool, farm_id, stale_after.as_secs_f64())
            .await?
            .map(|row| row.into_farm_model())
            .transpose()
            .map_err(StoreError::from)
    }

    async fn record_task_id(&self, farm_id: DbId, task_id: &str) -> Result<bool, StoreError> {
        Ok(FarmModelRepo::record_task_id(&self.pool, farm_id, task_id).await?)
    }

    async fn write(
        &self,
        farm_id: DbId,
        task_id: &str,
        write: ModelWrite<'_>,
    ) -> Result<bool, StoreError> {
        let applied = match write {
            ModelWrite::Pending(status) => {
                FarmModelRepo::mark_pending(&self.pool, farm_id, task_id, status).await?
            }
            ModelWrite::Ready {
                model_url,
                model_preview_url,
            } => {
                FarmModelRepo::mark_ready(&self.pool, farm_id, task_id, model_url, model_preview_url)
                    .await?
            }
            ModelWrite::Failed { reason } => {
                FarmModelRepo::mark_failed(&self.pool, farm_id, task_id, reason).await?
            }
        };
        if !applied {
            tracing::debug!(farm_id, task_id, "Farm model write matched no current attempt");
        }
        Ok(applied)
    }

    async fn fail_submission(&self, farm_id: DbId, reason: &str) -> Result<bool, StoreError> {
        Ok(FarmModelRepo::mark_submission_failed(&self.pool, farm_id, reason).await?)
    }
}
