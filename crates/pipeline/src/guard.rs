//! Job submission guard.
//!
//! Decides whether a farm needs a new remote job and, if so, claims the
//! farm in the store before the job is submitted. The claim is a single
//! compare-and-set, so two concurrent requests can never both submit.

use fieldmesh_core::farm_model::FarmModel;
use fieldmesh_core::model_status::ModelStatus;

use crate::collaborators::{OwnedFarm, RemoteError};
use crate::error::OrchestratorError;
use crate::orchestrator::ModelOrchestrator;
use crate::outcome::ModelOutcome;

/// What the stored model says about the need for a new job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triage {
    /// Assets are recorded; nothing to do.
    Ready,
    /// An accepted attempt is outstanding; never submit a second one.
    InFlight,
    /// Try to claim. Covers `unset`, `failed`, a `ready` row without
    /// assets, and a `queued` claim with no task id, which the store
    /// only hands over once it is stale.
    Claim,
}

/// Classify `model` through [`ModelStatus::claim`].
///
/// A refused claim means an attempt is outstanding, except for a `queued`
/// row that never recorded a task id: that one may be abandoned.
pub fn triage(model: &FarmModel) -> Triage {
    if model.ready_assets().is_some() {
        return Triage::Ready;
    }
    match model.status.claim() {
        Ok(_) => Triage::Claim,
        Err(_) if model.status == ModelStatus::Queued && model.meshy_task_id.is_none() => {
            Triage::Claim
        }
        Err(e) => {
            tracing::debug!(farm_id = model.farm_id, reason = %e, "Claim refused by status");
            Triage::InFlight
        }
    }
}

/// Result of the admission step.
#[derive(Debug)]
pub(crate) enum Admission {
    /// No job was submitted by this call.
    Settled(ModelOutcome),
    /// A job was accepted and its id recorded on the claimed farm.
    Submitted { task_id: String },
}

impl ModelOrchestrator {
    /// Run the precondition checks, then claim and submit if needed.
    ///
    /// Precondition failures leave the store untouched and perform no
    /// remote call. A failed submission is persisted before it is returned.
    pub(crate) async fn admit(
        &self,
        owned: &OwnedFarm,
        model: FarmModel,
    ) -> Result<Admission, OrchestratorError> {
        let farm_id = owned.farm_id;

        let photo_ref = owned
            .source_photo_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| OrchestratorError::NoPhotoAvailable {
                farm_id,
                detail: "no source photo has been uploaded".to_string(),
            })?;

        match triage(&model) {
            Triage::Ready => {
                tracing::debug!(farm_id, "Model already ready, skipping submission");
                return Ok(Admission::Settled(ModelOutcome::from_model(&model)));
            }
            Triage::InFlight => {
                tracing::info!(
                    farm_id,
                    status = %model.status,
                    task_id = model.meshy_task_id.as_deref().unwrap_or("-"),
                    "Model generation already in flight",
                );
                return Ok(Admission::Settled(ModelOutcome::from_model(&model)));
            }
            Triage::Claim => {}
        }

        self.remote
            .ensure_configured()
            .map_err(|e| OrchestratorError::Configuration(e.to_string()))?;

        let photo_url = self
            .storage
            .resolve_public_url(photo_ref)
            .await
            .map_err(|e| OrchestratorError::NoPhotoAvailable {
                farm_id,
                detail: e.to_string(),
            })?;

        if self
            .store
            .claim(farm_id, self.settings.stale_claim_after)
            .await?
            .is_none()
        {
            tracing::info!(farm_id, "Farm claimed by a concurrent request");
            return Ok(Admission::Settled(self.reload_outcome(farm_id, false).await?));
        }
        tracing::info!(farm_id, previous = %model.status, "Claimed farm for model generation");

        let task_id = match self.remote.submit(&photo_url).await {
            Ok(task_id) => task_id,
            Err(e) => {
                let err = submission_error(e);
                tracing::error!(farm_id, error = %err, "Model generation submission failed");
                self.store.fail_submission(farm_id, &err.to_string()).await?;
                return Err(err);
            }
        };

        if !self.store.record_task_id(farm_id, &task_id).await? {
            tracing::warn!(
                farm_id,
                task_id = %task_id,
                "Claim superseded before the task id was recorded",
            );
            return Ok(Admission::Settled(self.reload_outcome(farm_id, true).await?));
        }
        tracing::info!(farm_id, task_id = %task_id, "Model generation job submitted");

        Ok(Admission::Submitted { task_id })
    }
}

fn submission_error(err: RemoteError) -> OrchestratorError {
    match err {
        RemoteError::NotConfigured => {
            OrchestratorError::Configuration(RemoteError::NotConfigured.to_string())
        }
        RemoteError::Rejected { status, body } => OrchestratorError::SubmissionFailed {
            status: Some(status),
            body,
        },
        RemoteError::Transport(message) => OrchestratorError::SubmissionFailed {
            status: None,
            body: message,
        },
        RemoteError::Malformed(message) => OrchestratorError::MalformedResponse(message),
    }
}
