//! The orchestrator facade shared by the guard, poller and recovery paths.

use std::sync::Arc;

use fieldmesh_core::error::CoreError;
use fieldmesh_core::farm_model::FarmModel;
use fieldmesh_core::types::DbId;
use tokio_util::sync::CancellationToken;

use crate::collaborators::{
    FarmDirectory, FarmModelStore, OwnedFarm, PhotoStorage, RemoteJobClient, Sleeper,
    TokioSleeper,
};
use crate::error::OrchestratorError;
use crate::guard::Admission;
use crate::outcome::ModelOutcome;
use crate::settings::OrchestratorSettings;

/// The I/O implementations an orchestrator is wired with.
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn FarmDirectory>,
    pub store: Arc<dyn FarmModelStore>,
    pub storage: Arc<dyn PhotoStorage>,
    pub remote: Arc<dyn RemoteJobClient>,
    pub sleeper: Arc<dyn Sleeper>,
}

impl Collaborators {
    /// Wire collaborators with the tokio timer as sleeper.
    pub fn new(
        directory: Arc<dyn FarmDirectory>,
        store: Arc<dyn FarmModelStore>,
        storage: Arc<dyn PhotoStorage>,
        remote: Arc<dyn RemoteJobClient>,
    ) -> Self {
        Self {
            directory,
            store,
            storage,
            remote,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }
}

/// Drives farm model generation end to end.
///
/// Cheap to share behind an `Arc`; holds no per-request state. Every
/// operation runs the owner check first.
pub struct ModelOrchestrator {
    pub(crate) directory: Arc<dyn FarmDirectory>,
    pub(crate) store: Arc<dyn FarmModelStore>,
    pub(crate) storage: Arc<dyn PhotoStorage>,
    pub(crate) remote: Arc<dyn RemoteJobClient>,
    pub(crate) sleeper: Arc<dyn Sleeper>,
    pub(crate) settings: OrchestratorSettings,
}

impl ModelOrchestrator {
    pub fn new(collaborators: Collaborators, settings: OrchestratorSettings) -> Self {
        let Collaborators {
            directory,
            store,
            storage,
            remote,
            sleeper,
        } = collaborators;
        Self {
            directory,
            store,
            storage,
            remote,
            sleeper,
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Read the stored farm model. Performs no remote call.
    pub async fn current_model(
        &self,
        owner_id: DbId,
        farm_id: DbId,
    ) -> Result<FarmModel, OrchestratorError> {
        let (_, model) = self.owned_model(owner_id, farm_id).await?;
        Ok(model)
    }

    /// Ensure a model exists or is being generated for the farm.
    ///
    /// Polls until the job settles or the budget runs out.
    pub async fn request_generation(
        &self,
        owner_id: DbId,
        farm_id: DbId,
    ) -> Result<ModelOutcome, OrchestratorError> {
        self.request_generation_until(owner_id, farm_id, &CancellationToken::new())
            .await
    }

    /// Like [`request_generation`](Self::request_generation), but polling
    /// stops early, leaving the stored state as is, once `cancel` fires.
    pub async fn request_generation_until(
        &self,
        owner_id: DbId,
        farm_id: DbId,
        cancel: &CancellationToken,
    ) -> Result<ModelOutcome, OrchestratorError> {
        let (owned, model) = self.owned_model(owner_id, farm_id).await?;
        match self.admit(&owned, model).await? {
            Admission::Settled(outcome) => Ok(outcome),
            Admission::Submitted { task_id } => {
                self.poll_until_settled(farm_id, &task_id, cancel).await
            }
        }
    }

    /// Re-attach to a previously submitted job with a single status check.
    pub async fn check_status(
        &self,
        owner_id: DbId,
        farm_id: DbId,
    ) -> Result<ModelOutcome, OrchestratorError> {
        let (_, model) = self.owned_model(owner_id, farm_id).await?;
        self.recover(model).await
    }

    // ---- shared helpers ----

    pub(crate) async fn owned_model(
        &self,
        owner_id: DbId,
        farm_id: DbId,
    ) -> Result<(OwnedFarm, FarmModel), OrchestratorError> {
        let owned = self
            .directory
            .resolve_owned_farm(owner_id, farm_id)
            .await?
            .ok_or(OrchestratorError::AccessDenied { farm_id })?;
        let model = self.load_model(farm_id).await?;
        Ok((owned, model))
    }

    pub(crate) async fn load_model(&self, farm_id: DbId) -> Result<FarmModel, OrchestratorError> {
        self.store.load(farm_id).await?.ok_or_else(|| {
            OrchestratorError::Core(CoreError::NotFound {
                entity: "farm_model",
                id: farm_id,
            })
        })
    }

    /// Describe whatever is stored now, for paths that lost a race.
    pub(crate) async fn reload_outcome(
        &self,
        farm_id: DbId,
        submitted: bool,
    ) -> Result<ModelOutcome, OrchestratorError> {
        let model = self.load_model(farm_id).await?;
        let outcome = ModelOutcome::from_model(&model);
        Ok(match outcome {
            ModelOutcome::Pending {
                farm_id,
                status,
                meshy_task_id,
                ..
            } => ModelOutcome::Pending {
                farm_id,
                status,
                meshy_task_id,
                submitted,
            },
            other => other,
        })
    }
}
