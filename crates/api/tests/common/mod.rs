#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use fieldmesh_core::types::DbId;
use fieldmesh_db::models::farm::CreateFarm;
use fieldmesh_db::repositories::FarmRepo;
use fieldmesh_meshy::api::MeshyApi;
use fieldmesh_meshy::config::MeshyConfig;
use fieldmesh_pipeline::postgres::PgFarmStore;
use fieldmesh_pipeline::storage::PublicUrlStorage;
use fieldmesh_pipeline::{Collaborators, ModelOrchestrator, OrchestratorSettings};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::PgPool;
use tower::ServiceExt;

use fieldmesh_api::auth::jwt::{Claims, JwtConfig};
use fieldmesh_api::config::ServerConfig;
use fieldmesh_api::router::build_app_router;
use fieldmesh_api::state::AppState;

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
    }
}

/// Build the full application router against `pool`.
///
/// The Meshy client has no API key, so any path that would reach the
/// remote service fails with a configuration error instead.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let store = Arc::new(PgFarmStore::new(pool.clone()));
    let meshy = MeshyApi::new(MeshyConfig::new(None)).unwrap();
    let orchestrator = ModelOrchestrator::new(
        Collaborators::new(
            store.clone(),
            store,
            Arc::new(PublicUrlStorage::new(Some("https://storage.test".to_string()))),
            Arc::new(meshy),
        ),
        OrchestratorSettings::default(),
    );

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        orchestrator: Arc::new(orchestrator),
    };
    build_app_router(state, &config)
}

/// Issue a valid access token for `owner_id`.
pub fn token_for(owner_id: DbId) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: owner_id,
        exp: now + 900,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Insert a farm owned by `owner_id`.
pub async fn create_farm(pool: &PgPool, owner_id: DbId, photo: Option<&str>) -> DbId {
    let input = CreateFarm {
        owner_id,
        name: "North field".to_string(),
        source_photo_ref: photo.map(str::to_string),
    };
    FarmRepo::create(pool, &input).await.unwrap().id
}

pub async fn send(app: Router, method: Method, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::POST, uri, Some(token)).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
