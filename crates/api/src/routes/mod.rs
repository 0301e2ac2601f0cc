pub mod farm_model;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /farms/{id}/model                 current model projection (GET)
/// /farms/{id}/model/generate        request generation (POST)
/// /farms/{id}/model/check           re-check a submitted job (POST)
/// ```
///
/// Every route requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/farms", farm_model::router())
}
