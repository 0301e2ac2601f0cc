use std::time::Duration;

use fieldmesh_pipeline::PollBudget;

use crate::auth::jwt::JwtConfig;

/// Default request timeout. Sized above the default poll run (120 s
/// deadline plus two 3 s intervals) so a generation request can finish
/// polling before the layer cuts it.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 150;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `150`).
    pub request_timeout_secs: u64,
    /// JWT validation configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `150`                      |
    /// | `JWT_SECRET`           | required                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
        }
    }

    /// Whether a full poll run fits inside the request timeout.
    ///
    /// Compares the run's wall-clock limit, not just its deadline. Logs a
    /// warning when it does not fit: requests would time out while the
    /// detached orchestration keeps polling, and callers only see the
    /// result through `check`.
    pub fn poll_budget_fits(&self, budget: &PollBudget) -> bool {
        let limit = budget.wall_clock_limit();
        let fits = limit < Duration::from_secs(self.request_timeout_secs);
        if !fits {
            tracing::warn!(
                poll_deadline_secs = budget.deadline.as_secs(),
                poll_limit_secs = limit.as_secs(),
                request_timeout_secs = self.request_timeout_secs,
                "Model poll run can outlast the request timeout",
            );
        }
        fits
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
