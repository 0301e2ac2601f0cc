//! Non-error results of the two orchestrator operations.

use fieldmesh_core::farm_model::FarmModel;
use fieldmesh_core::model_status::ModelStatus;
use fieldmesh_core::types::DbId;
use serde::Serialize;

/// What a caller learns from `request_generation` or `check_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ModelOutcome {
    /// The model is available.
    Ready {
        farm_id: DbId,
        meshy_task_id: Option<String>,
        model_url: String,
        model_preview_url: Option<String>,
        /// `true` only when this call submitted the job that produced it.
        submitted: bool,
    },
    /// A job is outstanding; check again later.
    Pending {
        farm_id: DbId,
        status: ModelStatus,
        meshy_task_id: Option<String>,
        submitted: bool,
    },
    /// Nothing is in flight; `status` is the stored status verbatim.
    Idle {
        farm_id: DbId,
        status: ModelStatus,
        model_error: Option<String>,
    },
}

impl ModelOutcome {
    /// Describe a stored farm model without consulting the remote service.
    pub fn from_model(model: &FarmModel) -> Self {
        if let Some(assets) = model.ready_assets() {
            return Self::Ready {
                farm_id: model.farm_id,
                meshy_task_id: model.meshy_task_id.clone(),
                model_url: assets.model_url,
                model_preview_url: assets.model_preview_url,
                submitted: false,
            };
        }
        if model.status.is_in_flight() {
            return Self::Pending {
                farm_id: model.farm_id,
                status: model.status,
                meshy_task_id: model.meshy_task_id.clone(),
                submitted: false,
            };
        }
        Self::Idle {
            farm_id: model.farm_id,
            status: model.status,
            model_error: model.model_error.clone(),
        }
    }

    /// Status carried by the outcome.
    pub fn status(&self) -> ModelStatus {
        match self {
            Self::Ready { .. } => ModelStatus::Ready,
            Self::Pending { status, .. } | Self::Idle { status, .. } => *status,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}
