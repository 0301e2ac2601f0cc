//! Authentication primitives.
//!
//! - [`jwt`] -- HS256 access-token validation. Tokens are issued elsewhere.

pub mod jwt;
