//! Orchestrator tuning: poll budget and stale-claim threshold.

use std::time::Duration;

/// Default wait between poll attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default total polling budget (40 attempts at the default interval).
pub const DEFAULT_POLL_DEADLINE: Duration = Duration::from_secs(120);

/// Default age after which a `queued` claim without a task id is abandoned.
pub const DEFAULT_STALE_CLAIM_AFTER: Duration = Duration::from_secs(300);

/// Fixed-interval polling budget.
///
/// The deadline must stay a safe fraction of the request-scoped
/// execution limit the orchestrator runs under; past it, the job is left
/// `processing` for the recovery checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    pub interval: Duration,
    pub deadline: Duration,
}

impl Default for PollBudget {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            deadline: DEFAULT_POLL_DEADLINE,
        }
    }
}

impl PollBudget {
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self { interval, deadline }
    }

    /// A budget of exactly `attempts` polls at `interval`.
    pub fn with_attempts(interval: Duration, attempts: u32) -> Self {
        Self {
            interval,
            deadline: interval * attempts,
        }
    }

    /// Number of status polls that fit in the deadline (at least one).
    pub fn max_attempts(&self) -> u32 {
        let interval_ms = self.interval.as_millis();
        if interval_ms == 0 {
            return 1;
        }
        let attempts = self.deadline.as_millis() / interval_ms;
        attempts.clamp(1, u128::from(u32::MAX)) as u32
    }

    /// Time a status call may take when `remaining` is left before the
    /// deadline. Never less than one interval, so a run whose first wait
    /// already reaches the deadline still gets its one poll.
    pub fn status_window(&self, remaining: Duration) -> Duration {
        remaining.max(self.interval)
    }

    /// Upper bound on the wall-clock time of one poll run.
    ///
    /// The last attempt may start just before the deadline, wait one
    /// interval and then hold its status call for one more.
    pub fn wall_clock_limit(&self) -> Duration {
        self.deadline + self.interval * 2
    }

    /// Load from `MODEL_POLL_INTERVAL_SECS` and `MODEL_POLL_DEADLINE_SECS`.
    ///
    /// Malformed values fall back to the defaults with a warning.
    pub fn from_env() -> Self {
        Self {
            interval: env_secs("MODEL_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL),
            deadline: env_secs("MODEL_POLL_DEADLINE_SECS", DEFAULT_POLL_DEADLINE),
        }
    }
}

/// Everything the orchestrator needs beyond its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub budget: PollBudget,
    pub stale_claim_after: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            budget: PollBudget::default(),
            stale_claim_after: DEFAULT_STALE_CLAIM_AFTER,
        }
    }
}

impl OrchestratorSettings {
    /// Load from the environment.
    ///
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `MODEL_POLL_INTERVAL_SECS` | `3`     |
    /// | `MODEL_POLL_DEADLINE_SECS` | `120`   |
    /// | `MODEL_STALE_CLAIM_SECS`   | `300`   |
    pub fn from_env() -> Self {
        Self {
            budget: PollBudget::from_env(),
            stale_claim_after: env_secs("MODEL_STALE_CLAIM_SECS", DEFAULT_STALE_CLAIM_AFTER),
        }
    }
}

fn env_secs(name: &str, default: Duration) -> Duration {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                tracing::warn!(var = name, value = %raw, "Ignoring malformed duration");
                default
            }
        },
        Err(_) => default,
    }
}
