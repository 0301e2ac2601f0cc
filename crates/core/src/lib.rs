//! Domain types shared by every fieldmesh crate.
//!
//! Holds the farm model projection, the model generation state machine,
//! and the normalized remote job status. Nothing in here performs I/O.

pub mod error;
pub mod farm_model;
pub mod model_status;
pub mod types;
