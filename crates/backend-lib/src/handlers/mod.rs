// crates/backend-lib/src/handlers/mod.rs

//! HTTP handlers for the inventory backend.

pub mod health;
pub mod items;
pub mod users;

use axum::Json;
use serde_json::{json, Value};

/// API index document served at the root, no auth and no storage
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the inventory API!",
        "endpoints": {
            "users": {
                "register": "POST /users/register",
                "login": "POST /users/login",
                "profile": "GET /users/profile",
                "change_password": "PUT /users/profile"
            },
            "items": {
                "get_all": "GET /items",
                "get_one": "GET /items/{id}",
                "create": "POST /items",
                "update": "PUT /items/{id}",
                "delete": "DELETE /items/{id}"
            },
            "health": "GET /health"
        }
    }))
}
