// ================
// crates/common/src/lib.rs
// ================
//! Common types and structures
//! shared between the inventory server and its clients.
//! This module defines the HTTP request/response bodies and supporting types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role attached to a user account
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Standard,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::Standard
    }
}

/// Registration request body
/// # Fields
/// * `username` - Unique handle (min 3 chars)
/// * `email` - Unique email address
/// * `password` - Plaintext password, hashed server-side and never stored
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request body
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile update request body. Identity fields are immutable after
/// registration; only the password may change.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProfileUpdateRequest {
    pub password: String,
}

/// Public view of a user account. Never carries the password hash.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Response to a successful register or login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthResponse {
    /// Signed bearer token, valid until its embedded expiry
    pub token: String,
    pub user: UserView,
}

/// Owner block attached to item views for authenticated callers
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OwnerView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Public view of an inventory item
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ItemView {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Present only when the caller is authenticated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<OwnerView>,
}

/// Item creation request body
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ItemCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Partial item update: only supplied fields change
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Connection health as reported by the health-check endpoint
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Error,
}

/// Health-check response body
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: HealthStatus,
}
