// ============================
// inventory-backend-lib/src/auth/mod.rs
// ============================
//! Credential handling: password hashing and bearer tokens.

pub mod password;
pub mod token;

pub use password::{hash_password, hash_password_secure, validate_password_strength, verify_password};
pub use token::{Identity, TokenError, TokenService};
