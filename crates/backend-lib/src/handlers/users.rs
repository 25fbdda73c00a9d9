// ============================
// inventory-backend-lib/src/handlers/users.rs
// ============================
//! Registration, login and profile handlers.
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use inventory_common::{
    AuthResponse, LoginRequest, ProfileUpdateRequest, RegisterRequest, Role, UserView,
};
use metrics::counter;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::auth::{hash_password_secure, validate_password_strength, verify_password, Identity};
use crate::error::AppError;
use crate::storage::UserRecord;
use crate::AppState;

/// Minimum username length
const MIN_USERNAME_LENGTH: usize = 3;

/// Hash verified on the unknown-account login branch, so response timing
/// does not reveal whether an email exists.
fn placeholder_hash() -> &'static str {
    static PLACEHOLDER: OnceLock<String> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        crate::auth::hash_password("placeholder-password").unwrap_or_default()
    })
}

fn password_requirements_error(state: &AppState) -> AppError {
    let requirements = &state.settings.password_requirements;
    AppError::Validation(format!(
        "Password must be at least {} characters and contain uppercase, lowercase, \
         digit, and special character",
        requirements.min_length
    ))
}

fn validate_registration(state: &AppState, body: &RegisterRequest) -> Result<(), AppError> {
    if body.username.trim().len() < MIN_USERNAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Username must be at least {MIN_USERNAME_LENGTH} characters"
        )));
    }
    if !body.email.contains('@') || body.email.trim().is_empty() {
        return Err(AppError::Validation("A valid email address is required".to_string()));
    }
    if !validate_password_strength(&body.password, &state.settings.password_requirements) {
        return Err(password_requirements_error(state));
    }
    Ok(())
}

/// `POST /users/register`
pub async fn register(
    State(state): State<AppState>,
    Json(mut body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    validate_registration(&state, &body)?;

    let store = state.connection.acquire().await?;

    // hash first so the plaintext is scrubbed whatever happens next
    let password_hash = hash_password_secure(&mut body.password)?;

    let user = UserRecord {
        id: Uuid::new_v4(),
        username: body.username.trim().to_string(),
        email: body.email.trim().to_string(),
        password_hash,
        role: Role::Standard,
        created_at: Utc::now(),
    };

    store.create_user(user.clone()).await?;

    let token = state.tokens.issue(user.id, user.role)?;
    counter!("auth_register_total").increment(1);
    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.view(),
        }),
    ))
}

/// `POST /users/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let store = state.connection.acquire().await?;

    let user = store.user_by_email(&body.email).await?;

    // a missing account and a bad password are the same failure to callers;
    // the unknown-account branch still pays for a full verification so the
    // two are not separable by timing either
    let stored_hash: &str = match user.as_ref() {
        Some(u) => u.password_hash.as_str(),
        None => placeholder_hash(),
    };
    let verified = verify_password(stored_hash, &body.password);

    let Some(user) = user else {
        counter!("auth_login_failure_total").increment(1);
        return Err(AppError::InvalidCredentials);
    };
    if !verified {
        counter!("auth_login_failure_total").increment(1);
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.issue(user.id, user.role)?;
    counter!("auth_login_success_total").increment(1);

    Ok(Json(AuthResponse {
        token,
        user: user.view(),
    }))
}

/// `GET /users/profile` (mandatory auth)
pub async fn profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UserView>, AppError> {
    let store = state.connection.acquire().await?;
    let user = store
        .user_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;
    Ok(Json(user.view()))
}

/// `PUT /users/profile` (mandatory auth)
///
/// Identity fields are immutable after registration; the only mutable
/// credential is the password, rehashed with a fresh salt on every change.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(mut body): Json<ProfileUpdateRequest>,
) -> Result<Json<UserView>, AppError> {
    if !validate_password_strength(&body.password, &state.settings.password_requirements) {
        return Err(password_requirements_error(&state));
    }

    let store = state.connection.acquire().await?;
    let mut user = store
        .user_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    user.password_hash = hash_password_secure(&mut body.password)?;
    store.update_user(user.clone()).await?;

    counter!("auth_password_changed_total").increment(1);
    tracing::info!(user_id = %user.id, "password changed");

    Ok(Json(user.view()))
}
