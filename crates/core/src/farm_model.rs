//! The farm model projection and its read-side helpers.

use serde::{Deserialize, Serialize};

use crate::model_status::ModelStatus;
use crate::types::DbId;

/// Model-generation state of one farm.
///
/// A projection of the farm entity: one per farm, created `unset` along
/// with the farm and written only by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmModel {
    pub farm_id: DbId,
    pub status: ModelStatus,
    /// Remote task id of the current attempt, once the job was accepted.
    pub meshy_task_id: Option<String>,
    /// Primary 3D asset. Only meaningful when `status` is `ready`.
    pub model_url: Option<String>,
    /// Preview image. Only meaningful when `status` is `ready`.
    pub model_preview_url: Option<String>,
    /// Upstream failure reason. Only meaningful when `status` is `failed`.
    pub model_error: Option<String>,
    /// Reference to the uploaded field photo used as generation input.
    pub source_photo_ref: Option<String>,
}

/// Asset locations produced by a finished generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAssets {
    pub model_url: String,
    pub model_preview_url: Option<String>,
}

impl FarmModel {
    /// A freshly created farm: nothing generated yet.
    pub fn unset(farm_id: DbId, source_photo_ref: Option<String>) -> Self {
        Self {
            farm_id,
            status: ModelStatus::Unset,
            meshy_task_id: None,
            model_url: None,
            model_preview_url: None,
            model_error: None,
            source_photo_ref,
        }
    }

    /// The photo reference, if one is set and non-blank.
    pub fn photo_ref(&self) -> Option<&str> {
        self.source_photo_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// Recorded assets, only when the model is `ready`.
    ///
    /// Stale URLs left on a non-ready row are ignored.
    pub fn ready_assets(&self) -> Option<ModelAssets> {
        if self.status != ModelStatus::Ready {
            return None;
        }
        self.model_url.as_ref().map(|url| ModelAssets {
            model_url: url.clone(),
            model_preview_url: self.model_preview_url.clone(),
        })
    }
}
