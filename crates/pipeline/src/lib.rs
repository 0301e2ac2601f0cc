//! 3D field-model generation orchestrator.
//!
//! Drives one farm's model generation from a single uploaded photo to a
//! recorded set of asset URLs:
//!
//! - [`guard`] decides whether a new remote job is needed and claims the
//!   farm before submitting;
//! - [`poller`] follows the remote job under a bounded budget;
//! - [`recovery`] re-attaches to a submitted job without resubmitting.
//!
//! All I/O goes through the traits in [`collaborators`], with Postgres,
//! storage and Meshy implementations in [`postgres`], [`storage`] and
//! [`remote`].

pub mod collaborators;
pub mod error;
pub mod guard;
pub mod orchestrator;
pub mod outcome;
pub mod poller;
pub mod postgres;
pub mod recovery;
pub mod remote;
pub mod settings;
pub mod storage;

pub use error::OrchestratorError;
pub use orchestrator::{Collaborators, ModelOrchestrator};
pub use outcome::ModelOutcome;
pub use settings::{OrchestratorSettings, PollBudget};
