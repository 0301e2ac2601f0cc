//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the farm owner from a JWT Bearer token.

pub mod auth;
