//! Route definitions for farm model generation.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::farm_model;
use crate::state::AppState;

/// Routes mounted at `/farms`.
///
/// ```text
/// GET    /{id}/model              -> get_model
/// POST   /{id}/model/generate     -> generate_model
/// POST   /{id}/model/check        -> check_model
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/model", get(farm_model::get_model))
        .route("/{id}/model/generate", post(farm_model::generate_model))
        .route("/{id}/model/check", post(farm_model::check_model))
}
