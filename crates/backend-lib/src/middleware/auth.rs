// ============================
// inventory-backend-lib/src/middleware/auth.rs
// ============================
//! Access control middleware.
//!
//! Two modes, selected per route. Mandatory: no valid bearer token, no
//! request. Optional: anonymous is fine, but a token that is present and
//! invalid is still rejected. Either way, the [`Identity`] this middleware
//! attaches is the only source of truth for who is calling; handlers never
//! trust identity fields in request bodies.
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use std::convert::Infallible;

use crate::auth::{Identity, TokenError};
use crate::error::AppError;
use crate::AppState;

/// Mandatory auth: reject with 401 unless a valid bearer token is presented
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = match resolve_bearer(&state, request.headers()) {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            counter!("auth_rejected_total").increment(1);
            return Err(AppError::MissingToken);
        },
        Err(err) => {
            counter!("auth_rejected_total").increment(1);
            return Err(err);
        },
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Optional auth: proceed anonymously without a token, reject invalid ones
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match resolve_bearer(&state, request.headers()) {
        Ok(Some(identity)) => {
            request.extensions_mut().insert(identity);
        },
        Ok(None) => {},
        Err(err) => {
            counter!("auth_rejected_total").increment(1);
            return Err(err);
        },
    }
    Ok(next.run(request).await)
}

/// Connection gate: establish store readiness before identity resolution.
/// Layered outside the auth middleware on every storage-backed route.
pub async fn ensure_connection(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    state.connection.acquire().await?;
    Ok(next.run(request).await)
}

/// Extractor for routes with optional auth: the identity attached by
/// [`optional_auth`], if any. Never rejects.
pub struct MaybeIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(parts.extensions.get::<Identity>().copied()))
    }
}

/// Pull and verify the bearer token, if any.
///
/// `Ok(None)` means no Authorization header was sent at all; anything
/// present but unusable is an error.
fn resolve_bearer(state: &AppState, headers: &HeaderMap) -> Result<Option<Identity>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::Token(TokenError::Malformed))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AppError::Token(TokenError::Malformed))?;

    let identity = state.tokens.verify(token)?;
    Ok(Some(identity))
}
