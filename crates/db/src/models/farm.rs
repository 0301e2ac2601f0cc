//! Farm entity models.
//!
//! Only the columns the model orchestrator reads or writes are mapped
//! here; the rest of the farm aggregate belongs to the farm CRUD service.

use fieldmesh_core::error::CoreError;
use fieldmesh_core::farm_model::FarmModel;
use fieldmesh_core::model_status::ModelStatus;
use fieldmesh_core::types::{DbId, StatusId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A farm row with ownership and timestamps.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Farm {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub source_photo_ref: Option<String>,
    pub model_status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a farm.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFarm {
    pub owner_id: DbId,
    pub name: String,
    pub source_photo_ref: Option<String>,
}

/// The model-generation columns of a farm row.
#[derive(Debug, Clone, FromRow)]
pub struct FarmModelRow {
    pub id: DbId,
    pub model_status_id: StatusId,
    pub meshy_task_id: Option<String>,
    pub model_url: Option<String>,
    pub model_preview_url: Option<String>,
    pub model_error: Option<String>,
    pub source_photo_ref: Option<String>,
}

impl FarmModelRow {
    /// Convert into the domain projection, validating the status id.
    pub fn into_farm_model(self) -> Result<FarmModel, CoreError> {
        Ok(FarmModel {
            farm_id: self.id,
            status: ModelStatus::from_id(self.model_status_id)?,
            meshy_task_id: self.meshy_task_id,
            model_url: self.model_url,
            model_preview_url: self.model_preview_url,
            model_error: self.model_error,
            source_photo_ref: self.source_photo_ref,
        })
    }
}
