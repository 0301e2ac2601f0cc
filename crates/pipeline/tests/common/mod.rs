//! In-memory doubles for the orchestrator collaborators.
//!
//! The farm store mirrors the conditional updates of the Postgres
//! repository so guard and poller races behave the same way. Every async
//! fake yields once so concurrent orchestrations interleave.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fieldmesh_core::farm_model::FarmModel;
use fieldmesh_core::model_status::{ModelStatus, RemoteStatus};
use fieldmesh_core::types::DbId;
use fieldmesh_meshy::api::RemoteTask;
use fieldmesh_pipeline::collaborators::{
    FarmDirectory, FarmModelStore, ModelWrite, OwnedFarm, RemoteError, RemoteJobClient, Sleeper,
    StoreError,
};
use fieldmesh_pipeline::storage::PublicUrlStorage;
use fieldmesh_pipeline::{Collaborators, ModelOrchestrator, OrchestratorSettings, PollBudget};
use tokio_util::sync::CancellationToken;

pub const OWNER: DbId = 10;
pub const OTHER_OWNER: DbId = 11;
pub const FARM: DbId = 1;
pub const PHOTO: &str = "farms/1/field.jpg";
pub const STORAGE_BASE: &str = "https://storage.test";
pub const MODEL_URL: &str = "https://x/model.glb";

// ---------------------------------------------------------------------------
// Farm store
// ---------------------------------------------------------------------------

struct Entry {
    owner_id: DbId,
    model: FarmModel,
    claimed_at: Option<Instant>,
}

#[derive(Default)]
pub struct InMemoryFarms {
    farms: Mutex<HashMap<DbId, Entry>>,
    mutations: AtomicUsize,
}

impl InMemoryFarms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an `unset` farm.
    pub fn seed(&self, farm_id: DbId, owner_id: DbId, photo: Option<&str>) {
        self.seed_model(owner_id, FarmModel::unset(farm_id, photo.map(str::to_string)));
    }

    /// Insert a farm in an arbitrary state. A seeded `queued` claim counts
    /// as infinitely old.
    pub fn seed_model(&self, owner_id: DbId, model: FarmModel) {
        self.farms.lock().unwrap().insert(
            model.farm_id,
            Entry {
                owner_id,
                model,
                claimed_at: None,
            },
        );
    }

    pub fn model(&self, farm_id: DbId) -> FarmModel {
        self.farms.lock().unwrap()[&farm_id].model.clone()
    }

    /// Number of writes that changed a row.
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn update<T>(&self, farm_id: DbId, f: impl FnOnce(&mut Entry) -> Option<T>) -> Option<T> {
        let mut farms = self.farms.lock().unwrap();
        let result = farms.get_mut(&farm_id).and_then(f);
        if result.is_some() {
            self.mutations.fetch_add(1, Ordering::SeqCst);
        }
        result
    }
}

#[async_trait]
impl FarmDirectory for InMemoryFarms {
    async fn resolve_owned_farm(
        &self,
        owner_id: DbId,
        farm_id: DbId,
    ) -> Result<Option<OwnedFarm>, StoreError> {
        tokio::task::yield_now().await;
        let farms = self.farms.lock().unwrap();
        Ok(farms
            .get(&farm_id)
            .filter(|e| e.owner_id == owner_id)
            .map(|e| OwnedFarm {
                farm_id,
                owner_id,
                source_photo_ref: e.model.source_photo_ref.clone(),
            }))
    }
}

#[async_trait]
impl FarmModelStore for InMemoryFarms {
    async fn load(&self, farm_id: DbId) -> Result<Option<FarmModel>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self.farms.lock().unwrap().get(&farm_id).map(|e| e.model.clone()))
    }

    async fn claim(
        &self,
        farm_id: DbId,
        stale_after: Duration,
    ) -> Result<Option<FarmModel>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self.update(farm_id, |entry| {
            let model = &mut entry.model;
            let abandoned = model.status == ModelStatus::Queued
                && model.meshy_task_id.is_none()
                && entry.claimed_at.map_or(true, |at| at.elapsed() > stale_after);
            if model.status.is_in_flight() && !abandoned {
                return None;
            }
            model.status = ModelStatus::Queued;
            model.meshy_task_id = None;
            model.model_url = None;
            model.model_preview_url = None;
            model.model_error = None;
            entry.claimed_at = Some(Instant::now());
            Some(model.clone())
        }))
    }

    async fn record_task_id(&self, farm_id: DbId, task_id: &str) -> Result<bool, StoreError> {
        tokio::task::yield_now().await;
        Ok(self
            .update(farm_id, |entry| {
                let model = &mut entry.model;
                (model.status == ModelStatus::Queued && model.meshy_task_id.is_none()).then(|| {
                    model.meshy_task_id = Some(task_id.to_string());
                })
            })
            .is_some())
    }

    async fn write(
        &self,
        farm_id: DbId,
        task_id: &str,
        write: ModelWrite<'_>,
    ) -> Result<bool, StoreError> {
        tokio::task::yield_now().await;
        Ok(self
            .update(farm_id, |entry| {
                let model = &mut entry.model;
                if model.meshy_task_id.as_deref() != Some(task_id) {
                    return None;
                }
                match write {
                    ModelWrite::Pending(status) if model.status.is_in_flight() => {
                        model.status = status;
                    }
                    ModelWrite::Ready {
                        model_url,
                        model_preview_url,
                    } if model.status != ModelStatus::Failed => {
                        model.status = ModelStatus::Ready;
                        model.model_url = Some(model_url.to_string());
                        model.model_preview_url = model_preview_url.map(str::to_string);
                        model.model_error = None;
                    }
                    ModelWrite::Failed { reason } if model.status != ModelStatus::Ready => {
                        model.status = ModelStatus::Failed;
                        model.model_error = Some(reason.to_string());
                    }
                    _ => return None,
                }
                Some(())
            })
            .is_some())
    }

    async fn fail_submission(&self, farm_id: DbId, reason: &str) -> Result<bool, StoreError> {
        tokio::task::yield_now().await;
        Ok(self
            .update(farm_id, |entry| {
                let model = &mut entry.model;
                (model.status == ModelStatus::Queued && model.meshy_task_id.is_none()).then(|| {
                    model.status = ModelStatus::Failed;
                    model.model_error = Some(reason.to_string());
                })
            })
            .is_some())
    }
}

// ---------------------------------------------------------------------------
// Remote job service
// ---------------------------------------------------------------------------

/// Remote double answering from scripted queues.
///
/// An empty submit queue accepts as `T1`; an empty status queue reports
/// `processing`.
pub struct ScriptedRemote {
    configured: bool,
    submits: Mutex<VecDeque<Result<String, RemoteError>>>,
    statuses: Mutex<VecDeque<Result<RemoteTask, RemoteError>>>,
    submitted_urls: Mutex<Vec<String>>,
    status_latency: Duration,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self {
            configured: true,
            submits: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            submitted_urls: Mutex::new(Vec::new()),
            status_latency: Duration::ZERO,
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn submit_result(self, result: Result<String, RemoteError>) -> Self {
        self.submits.lock().unwrap().push_back(result);
        self
    }

    pub fn status(self, result: Result<RemoteTask, RemoteError>) -> Self {
        self.statuses.lock().unwrap().push_back(result);
        self
    }

    /// Make every status call take `latency` of real time.
    pub fn status_latency(self, latency: Duration) -> Self {
        Self {
            status_latency: latency,
            ..self
        }
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn submitted_urls(&self) -> Vec<String> {
        self.submitted_urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteJobClient for ScriptedRemote {
    fn ensure_configured(&self) -> Result<(), RemoteError> {
        if self.configured {
            Ok(())
        } else {
            Err(RemoteError::NotConfigured)
        }
    }

    async fn submit(&self, photo_url: &str) -> Result<String, RemoteError> {
        tokio::task::yield_now().await;
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted_urls.lock().unwrap().push(photo_url.to_string());
        self.submits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("T1".to_string()))
    }

    async fn get_status(&self, task_id: &str) -> Result<RemoteTask, RemoteError> {
        tokio::task::yield_now().await;
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if !self.status_latency.is_zero() {
            tokio::time::sleep(self.status_latency).await;
        }
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(task(task_id, RemoteStatus::Processing)))
    }
}

pub fn task(task_id: &str, status: RemoteStatus) -> RemoteTask {
    RemoteTask {
        task_id: task_id.to_string(),
        status,
        raw_status: Some(status.as_str().to_string()),
        model_url: None,
        model_preview_url: None,
        failure_reason: None,
    }
}

pub fn ready_task(task_id: &str, model_url: &str) -> RemoteTask {
    RemoteTask {
        model_url: Some(model_url.to_string()),
        model_preview_url: Some("https://x/thumb.png".to_string()),
        raw_status: Some("SUCCEEDED".to_string()),
        ..task(task_id, RemoteStatus::Ready)
    }
}

pub fn failed_task(task_id: &str, reason: &str) -> RemoteTask {
    RemoteTask {
        failure_reason: Some(reason.to_string()),
        ..task(task_id, RemoteStatus::Failed)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Returns immediately (after one yield) and records each requested wait.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

/// Fires the token during the first wait, as a client hanging up would.
pub struct CancellingSleeper {
    pub token: CancellationToken,
}

#[async_trait]
impl Sleeper for CancellingSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.token.cancel();
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub farms: Arc<InMemoryFarms>,
    pub remote: Arc<ScriptedRemote>,
    pub sleeper: Arc<RecordingSleeper>,
    pub orchestrator: ModelOrchestrator,
}

/// Budget used by most tests: 5 attempts, 1 s apart. The recording sleeper
/// never waits, so the wall-clock deadline is never reached.
pub fn test_budget() -> PollBudget {
    PollBudget::with_attempts(Duration::from_secs(1), 5)
}

impl Harness {
    /// Farm [`FARM`] owned by [`OWNER`] with photo [`PHOTO`].
    pub fn new(remote: ScriptedRemote) -> Self {
        let farms = InMemoryFarms::new();
        farms.seed(FARM, OWNER, Some(PHOTO));
        Self::build(farms, remote, test_budget())
    }

    pub fn build(farms: InMemoryFarms, remote: ScriptedRemote, budget: PollBudget) -> Self {
        Self::build_with(
            farms,
            remote,
            PublicUrlStorage::new(Some(STORAGE_BASE.to_string())),
            budget,
        )
    }

    pub fn build_with(
        farms: InMemoryFarms,
        remote: ScriptedRemote,
        storage: PublicUrlStorage,
        budget: PollBudget,
    ) -> Self {
        let farms = Arc::new(farms);
        let remote = Arc::new(remote);
        let sleeper = Arc::new(RecordingSleeper::default());
        let collaborators = Collaborators::new(
            farms.clone(),
            farms.clone(),
            Arc::new(storage),
            remote.clone(),
        )
        .with_sleeper(sleeper.clone());
        let settings = OrchestratorSettings {
            budget,
            ..OrchestratorSettings::default()
        };
        Self {
            farms,
            remote,
            sleeper,
            orchestrator: ModelOrchestrator::new(collaborators, settings),
        }
    }

    /// Rebuild the orchestrator around the same fakes with another sleeper.
    pub fn orchestrator_with_sleeper(&self, sleeper: Arc<dyn Sleeper>) -> ModelOrchestrator {
        let collaborators = Collaborators::new(
            self.farms.clone(),
            self.farms.clone(),
            Arc::new(PublicUrlStorage::new(Some(STORAGE_BASE.to_string()))),
            self.remote.clone(),
        )
        .with_sleeper(sleeper);
        ModelOrchestrator::new(collaborators, *self.orchestrator.settings())
    }

    pub fn model(&self) -> FarmModel {
        self.farms.model(FARM)
    }
}
