// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the inventory backend.

pub mod auth;

pub use auth::{ensure_connection, optional_auth, require_auth, MaybeIdentity};
