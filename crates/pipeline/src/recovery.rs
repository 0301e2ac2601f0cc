//! Recovery checker.
//!
//! Re-attaches to a job that was submitted earlier (typically one the
//! poller gave up on) with exactly one status request. Never submits.

use fieldmesh_core::error::CoreError;
use fieldmesh_core::farm_model::FarmModel;
use fieldmesh_core::model_status::ModelStatus;

use crate::error::OrchestratorError;
use crate::orchestrator::ModelOrchestrator;
use crate::outcome::ModelOutcome;
use crate::poller::Applied;

impl ModelOrchestrator {
    pub(crate) async fn recover(&self, model: FarmModel) -> Result<ModelOutcome, OrchestratorError> {
        let farm_id = model.farm_id;
        let Some(task_id) = model.meshy_task_id.clone() else {
            tracing::debug!(farm_id, status = %model.status, "No task on record, nothing to recover");
            return Ok(ModelOutcome::from_model(&model));
        };

        self.remote
            .ensure_configured()
            .map_err(|e| OrchestratorError::Configuration(e.to_string()))?;

        let task = match self.remote.get_status(&task_id).await {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!(
                    farm_id,
                    task_id = %task_id,
                    error = %e,
                    "Recovery status check failed, keeping stored state",
                );
                return Ok(ModelOutcome::from_model(&model));
            }
        };

        let applied = match self
            .apply_observation(farm_id, model.status, &task, false)
            .await
        {
            Ok(applied) => applied,
            Err(OrchestratorError::Core(CoreError::InvalidTransition { from, to })) => {
                tracing::warn!(
                    farm_id,
                    task_id = %task_id,
                    from = %from,
                    to = %to,
                    "Ignoring remote status that would leave a settled model",
                );
                return Ok(ModelOutcome::from_model(&model));
            }
            Err(e) => return Err(e),
        };

        match applied {
            Applied::Ready(outcome) => Ok(outcome),
            Applied::Failed { reason } if model.status == ModelStatus::Failed => {
                Ok(ModelOutcome::Idle {
                    farm_id,
                    status: ModelStatus::Failed,
                    model_error: Some(reason),
                })
            }
            Applied::Failed { reason } => Err(OrchestratorError::GenerationFailed { task_id, reason }),
            Applied::Pending(status) => Ok(ModelOutcome::Pending {
                farm_id,
                status,
                meshy_task_id: Some(task_id),
                submitted: false,
            }),
            Applied::Superseded => self.reload_outcome(farm_id, false).await,
        }
    }
}
