//! REST client for the Meshy image-to-3D service.
//!
//! Provides job submission and status retrieval, plus the provider
//! compatibility shims that collapse the service's varying response
//! shapes into one [`RemoteTask`](api::RemoteTask).

pub mod api;
pub mod config;
pub mod shims;
