use std::net::SocketAddr;
use std::sync::Arc;

use fieldmesh_meshy::api::MeshyApi;
use fieldmesh_meshy::config::MeshyConfig;
use fieldmesh_pipeline::postgres::PgFarmStore;
use fieldmesh_pipeline::storage::PublicUrlStorage;
use fieldmesh_pipeline::{Collaborators, ModelOrchestrator, OrchestratorSettings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fieldmesh_api::config::ServerConfig;
use fieldmesh_api::router::build_app_router;
use fieldmesh_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fieldmesh_api=debug,fieldmesh_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = fieldmesh_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    fieldmesh_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    fieldmesh_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Model orchestrator ---
    let meshy_config = MeshyConfig::from_env();
    if !meshy_config.has_credential() {
        tracing::warn!("MESHY_API_KEY not set, model generation requests will fail");
    }
    let meshy = MeshyApi::new(meshy_config).expect("Failed to build Meshy HTTP client");

    let settings = OrchestratorSettings::from_env();
    config.poll_budget_fits(&settings.budget);
    tracing::info!(
        poll_interval_secs = settings.budget.interval.as_secs(),
        poll_deadline_secs = settings.budget.deadline.as_secs(),
        stale_claim_secs = settings.stale_claim_after.as_secs(),
        "Model orchestrator configured",
    );

    let store = Arc::new(PgFarmStore::new(pool.clone()));
    let orchestrator = ModelOrchestrator::new(
        Collaborators::new(
            store.clone(),
            store,
            Arc::new(PublicUrlStorage::from_env()),
            Arc::new(meshy),
        ),
        settings,
    );

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        orchestrator: Arc::new(orchestrator),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
