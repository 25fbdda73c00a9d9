// ============================
// inventory-backend-lib/src/router.rs
// ============================
//! Route table and middleware wiring.
//!
//! Mutating routes carry mandatory auth, item reads carry optional auth, and
//! every storage-backed route sits behind the connection gate so the pipeline
//! is always connection -> identity -> handler.
use axum::{
    handler::Handler,
    middleware::from_fn_with_state,
    routing::get,
    routing::post,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{self, health, items, users};
use crate::middleware;
use crate::AppState;

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    let require = from_fn_with_state(state.clone(), middleware::require_auth);
    let optional = from_fn_with_state(state.clone(), middleware::optional_auth);

    let storage_backed = Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route(
            "/users/profile",
            get(users::profile.layer(require.clone()))
                .put(users::update_profile.layer(require.clone())),
        )
        .route(
            "/items",
            get(items::list_items.layer(optional.clone()))
                .post(items::create_item.layer(require.clone())),
        )
        .route(
            "/items/{id}",
            get(items::get_item.layer(optional))
                .put(items::update_item.layer(require.clone()))
                .delete(items::delete_item.layer(require)),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::ensure_connection,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(health::health))
        .merge(storage_backed)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
