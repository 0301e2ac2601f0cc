//! Status poller.
//!
//! Follows one remote job at a fixed interval until it settles, the
//! budget runs out, or the caller cancels. The deadline is wall-clock
//! time: slow status calls use it up and are cut off when it passes.
//! Transport hiccups skip an attempt; budget exhaustion is a pending
//! outcome, not a failure.

use fieldmesh_core::model_status::ModelStatus;
use fieldmesh_core::types::DbId;
use fieldmesh_meshy::api::{RemoteTask, GENERIC_FAILURE_REASON};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::collaborators::ModelWrite;
use crate::error::OrchestratorError;
use crate::orchestrator::ModelOrchestrator;
use crate::outcome::ModelOutcome;

/// Effect of applying one observed remote status.
#[derive(Debug)]
pub(crate) enum Applied {
    /// Terminal success, persisted.
    Ready(ModelOutcome),
    /// Terminal failure, persisted.
    Failed { reason: String },
    /// Still running; the persisted status.
    Pending(ModelStatus),
    /// The task is no longer the farm's current attempt. Nothing written.
    Superseded,
}

impl ModelOrchestrator {
    /// Poll `task_id` under the configured budget.
    pub(crate) async fn poll_until_settled(
        &self,
        farm_id: DbId,
        task_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ModelOutcome, OrchestratorError> {
        let budget = self.settings.budget;
        let max_attempts = budget.max_attempts();
        let deadline_at = Instant::now() + budget.deadline;
        let mut current = ModelStatus::Queued;
        let mut attempts = 0;

        for attempt in 1..=max_attempts {
            if attempt > 1 && Instant::now() >= deadline_at {
                break;
            }
            attempts = attempt;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Ok(self.cancelled(farm_id, task_id, current, attempt));
                }
                _ = self.sleeper.sleep(budget.interval) => {}
            }

            let window = budget.status_window(deadline_at.saturating_duration_since(Instant::now()));
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Ok(self.cancelled(farm_id, task_id, current, attempt));
                }
                polled = tokio::time::timeout(window, self.remote.get_status(task_id)) => polled,
            };

            let task = match polled {
                Ok(Ok(task)) => task,
                Ok(Err(e)) => {
                    tracing::warn!(
                        farm_id,
                        task_id,
                        attempt,
                        error = %e,
                        "Status poll failed, retrying next interval",
                    );
                    continue;
                }
                Err(_) => {
                    tracing::warn!(
                        farm_id,
                        task_id,
                        attempt,
                        window_ms = window.as_millis() as u64,
                        "Status poll timed out",
                    );
                    continue;
                }
            };

            tracing::debug!(
                farm_id,
                task_id,
                attempt,
                remote_status = task.raw_status.as_deref().unwrap_or("-"),
                "Polled model generation status",
            );

            match self.apply_observation(farm_id, current, &task, true).await? {
                Applied::Ready(outcome) => return Ok(outcome),
                Applied::Failed { reason } => {
                    return Err(OrchestratorError::GenerationFailed {
                        task_id: task_id.to_string(),
                        reason,
                    });
                }
                Applied::Pending(status) => current = status,
                Applied::Superseded => {
                    tracing::warn!(farm_id, task_id, "Polled task superseded, stopping");
                    return self.reload_outcome(farm_id, true).await;
                }
            }
        }

        // Out of budget: leave the job for the recovery checker.
        let persisted = self
            .store
            .write(farm_id, task_id, ModelWrite::Pending(ModelStatus::Processing))
            .await?;
        if !persisted {
            return self.reload_outcome(farm_id, true).await;
        }
        tracing::info!(
            farm_id,
            task_id,
            attempts,
            "Poll budget exhausted, model still processing",
        );
        Ok(ModelOutcome::Pending {
            farm_id,
            status: ModelStatus::Processing,
            meshy_task_id: Some(task_id.to_string()),
            submitted: true,
        })
    }

    /// Persist the transition implied by `task` for the attempt currently
    /// at `from`. Shared by the poller and the recovery checker.
    pub(crate) async fn apply_observation(
        &self,
        farm_id: DbId,
        from: ModelStatus,
        task: &RemoteTask,
        submitted: bool,
    ) -> Result<Applied, OrchestratorError> {
        let next = from.observe(task.status)?;

        let write = match next {
            ModelStatus::Ready => {
                let model_url = task.model_url.as_deref().ok_or_else(|| {
                    OrchestratorError::MalformedResponse(format!(
                        "task {} reported success without a model URL",
                        task.task_id
                    ))
                })?;
                ModelWrite::Ready {
                    model_url,
                    model_preview_url: task.model_preview_url.as_deref(),
                }
            }
            ModelStatus::Failed => ModelWrite::Failed {
                reason: task
                    .failure_reason
                    .as_deref()
                    .unwrap_or(GENERIC_FAILURE_REASON),
            },
            pending => ModelWrite::Pending(pending),
        };

        if !self.store.write(farm_id, &task.task_id, write).await? {
            return Ok(Applied::Superseded);
        }

        Ok(match write {
            ModelWrite::Ready {
                model_url,
                model_preview_url,
            } => {
                tracing::info!(farm_id, task_id = %task.task_id, model_url, "Model ready");
                Applied::Ready(ModelOutcome::Ready {
                    farm_id,
                    meshy_task_id: Some(task.task_id.clone()),
                    model_url: model_url.to_string(),
                    model_preview_url: model_preview_url.map(str::to_string),
                    submitted,
                })
            }
            ModelWrite::Failed { reason } => {
                tracing::warn!(farm_id, task_id = %task.task_id, reason, "Model generation failed");
                Applied::Failed {
                    reason: reason.to_string(),
                }
            }
            ModelWrite::Pending(status) => {
                if status != from {
                    tracing::info!(
                        farm_id,
                        task_id = %task.task_id,
                        from = %from,
                        to = %status,
                        "Model status advanced",
                    );
                }
                Applied::Pending(status)
            }
        })
    }

    fn cancelled(
        &self,
        farm_id: DbId,
        task_id: &str,
        status: ModelStatus,
        attempt: u32,
    ) -> ModelOutcome {
        tracing::info!(farm_id, task_id, attempt, "Polling cancelled");
        ModelOutcome::Pending {
            farm_id,
            status,
            meshy_task_id: Some(task_id.to_string()),
            submitted: true,
        }
    }
}
