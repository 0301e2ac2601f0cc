//! Farm model generation state machine.
//!
//! A farm's 3D model moves through `unset -> queued -> processing ->
//! {ready, failed}` within one generation attempt. Two kinds of events
//! drive it:
//!
//! - a **claim** by the submission guard, which starts a fresh attempt
//!   (see [`ModelStatus::claim`]);
//! - an **observation** of the remote job status by the poller or the
//!   recovery checker (see [`ModelStatus::observe`]).
//!
//! Observations never start a new attempt, so `ready -> queued` is only
//! reachable through a claim.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::StatusId;

// ---------------------------------------------------------------------------
// ModelStatus
// ---------------------------------------------------------------------------

/// Persisted generation status of a farm's 3D model.
///
/// Discriminants match the seed order of the `model_statuses` lookup table.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    /// No generation has ever been requested.
    Unset = 1,
    /// Claimed by the guard; the remote job may or may not be accepted yet.
    Queued = 2,
    /// The remote job is running (or was still running when polling stopped).
    Processing = 3,
    /// The remote job finished and the asset URLs are recorded.
    Ready = 4,
    /// The remote job (or its submission) failed.
    Failed = 5,
}

/// Every status, in lookup-table order.
pub const ALL_MODEL_STATUSES: &[ModelStatus] = &[
    ModelStatus::Unset,
    ModelStatus::Queued,
    ModelStatus::Processing,
    ModelStatus::Ready,
    ModelStatus::Failed,
];

impl ModelStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Map a `model_statuses.id` back to the enum.
    pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
        ALL_MODEL_STATUSES
            .iter()
            .copied()
            .find(|s| s.id() == id)
            .ok_or_else(|| CoreError::Validation(format!("Unknown model status id {id}")))
    }

    /// Lower-case name as stored in the lookup table and sent over the API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// `queued` and `processing` mean an attempt is outstanding.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Queued | Self::Processing)
    }

    /// Transition taken when the guard starts a fresh attempt.
    ///
    /// Allowed from `unset`, `ready` and `failed`. An in-flight status
    /// yields [`CoreError::Conflict`]: a second attempt is prevented, not
    /// merged.
    pub fn claim(self) -> Result<Self, CoreError> {
        match self {
            Self::Unset | Self::Ready | Self::Failed => Ok(Self::Queued),
            Self::Queued | Self::Processing => Err(CoreError::Conflict(format!(
                "A model generation is already {self} for this farm"
            ))),
        }
    }

    /// Transition taken when a remote status is observed for the current
    /// attempt.
    ///
    /// - In-flight statuses advance monotonically: `queued` may stay
    ///   `queued`, but `processing` never falls back to `queued`.
    ///   [`RemoteStatus::Unknown`] counts as processing.
    /// - Terminal statuses only accept the same terminal observation again.
    /// - `unset` has nothing in flight and rejects every observation.
    pub fn observe(self, remote: RemoteStatus) -> Result<Self, CoreError> {
        let next = match (self, remote) {
            (Self::Queued, RemoteStatus::Queued) => Self::Queued,
            (Self::Queued | Self::Processing, RemoteStatus::Ready) => Self::Ready,
            (Self::Queued | Self::Processing, RemoteStatus::Failed) => Self::Failed,
            (Self::Queued | Self::Processing, _) => Self::Processing,
            (Self::Ready, RemoteStatus::Ready) => Self::Ready,
            (Self::Failed, RemoteStatus::Failed) => Self::Failed,
            (from, to) => {
                return Err(CoreError::InvalidTransition {
                    from,
                    to: to.as_str().to_string(),
                })
            }
        };
        Ok(next)
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RemoteStatus
// ---------------------------------------------------------------------------

/// Remote job status after provider-specific normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Queued,
    Processing,
    Ready,
    Failed,
    /// Unrecognized status string. Never mistaken for success.
    Unknown,
}

impl RemoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_lookup_order() {
        for (i, status) in ALL_MODEL_STATUSES.iter().enumerate() {
            assert_eq!(status.id(), (i + 1) as StatusId);
            assert_eq!(ModelStatus::from_id(status.id()).unwrap(), *status);
        }
    }

    #[test]
    fn unknown_status_id_is_rejected() {
        assert!(ModelStatus::from_id(0).is_err());
        assert!(ModelStatus::from_id(6).is_err());
    }

    #[test]
    fn serializes_as_snake_case_name() {
        let json = serde_json::to_string(&ModelStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        assert_eq!(ModelStatus::Ready.to_string(), "ready");
    }

    // -- claim ----------------------------------------------------------------

    #[test]
    fn claim_starts_attempt_from_idle_or_terminal() {
        for status in [ModelStatus::Unset, ModelStatus::Ready, ModelStatus::Failed] {
            assert_eq!(status.claim().unwrap(), ModelStatus::Queued);
        }
    }

    #[test]
    fn claim_rejected_while_in_flight() {
        assert!(matches!(
            ModelStatus::Queued.claim(),
            Err(CoreError::Conflict(_))
        ));
        assert!(matches!(
            ModelStatus::Processing.claim(),
            Err(CoreError::Conflict(_))
        ));
    }

    // -- observe --------------------------------------------------------------

    #[test]
    fn queued_advances_on_observation() {
        let q = ModelStatus::Queued;
        assert_eq!(q.observe(RemoteStatus::Queued).unwrap(), ModelStatus::Queued);
        assert_eq!(
            q.observe(RemoteStatus::Processing).unwrap(),
            ModelStatus::Processing
        );
        assert_eq!(q.observe(RemoteStatus::Ready).unwrap(), ModelStatus::Ready);
        assert_eq!(q.observe(RemoteStatus::Failed).unwrap(), ModelStatus::Failed);
    }

    #[test]
    fn processing_never_falls_back_to_queued() {
        let p = ModelStatus::Processing;
        assert_eq!(
            p.observe(RemoteStatus::Queued).unwrap(),
            ModelStatus::Processing
        );
    }

    #[test]
    fn unknown_is_treated_as_processing() {
        assert_eq!(
            ModelStatus::Queued.observe(RemoteStatus::Unknown).unwrap(),
            ModelStatus::Processing
        );
        assert_eq!(
            ModelStatus::Processing
                .observe(RemoteStatus::Unknown)
                .unwrap(),
            ModelStatus::Processing
        );
    }

    #[test]
    fn terminal_states_only_self_loop() {
        assert_eq!(
            ModelStatus::Ready.observe(RemoteStatus::Ready).unwrap(),
            ModelStatus::Ready
        );
        assert_eq!(
            ModelStatus::Failed.observe(RemoteStatus::Failed).unwrap(),
            ModelStatus::Failed
        );
        assert!(ModelStatus::Ready.observe(RemoteStatus::Queued).is_err());
        assert!(ModelStatus::Ready.observe(RemoteStatus::Processing).is_err());
        assert!(ModelStatus::Failed.observe(RemoteStatus::Ready).is_err());
    }

    #[test]
    fn unset_rejects_observations() {
        let err = ModelStatus::Unset.observe(RemoteStatus::Ready).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                from: ModelStatus::Unset,
                ..
            }
        ));
    }
}
