use std::sync::Arc;

use fieldmesh_pipeline::ModelOrchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything shared sits behind an `Arc` or is a pool.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: fieldmesh_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Farm model generation orchestrator.
    pub orchestrator: Arc<ModelOrchestrator>,
}
