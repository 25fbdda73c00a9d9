// ============================
// inventory-backend-lib/src/auth/token.rs
// ============================
//! Bearer token issue/verify.
//!
//! Tokens are stateless HS256 JWTs: validity is proven by signature and
//! expiry, never by a server-side lookup. There is no revocation list; a
//! token stays valid until its natural expiry.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use inventory_common::Role;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::TokenSettings;

/// Secret size in bytes when generating an ephemeral signing key
const EPHEMERAL_SECRET_BYTES: usize = 32;

/// Why a token was rejected. Callers can tell these apart; end users see a
/// single generic 401 regardless.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token could not be parsed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
}

/// Resolved caller identity. Only the middleware constructs this; it is
/// deliberately not deserializable so request payloads cannot smuggle one in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    iat: u64,
    exp: u64,
}

/// Issues and verifies signed bearer tokens
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exact expiry, no grace window
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Build a service from settings, generating an ephemeral secret when
    /// none is configured.
    pub fn from_settings(settings: &TokenSettings) -> Self {
        let ttl = Duration::from_secs(settings.ttl_secs);
        match &settings.secret {
            Some(secret) => Self::new(secret.as_bytes(), ttl),
            None => {
                tracing::warn!(
                    "no token secret configured; using an ephemeral secret, \
                     all tokens die with this process"
                );
                let secret = generate_secret();
                Self::new(secret.as_bytes(), ttl)
            },
        }
    }

    /// Mint a signed token carrying the user identity claim
    pub fn issue(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        self.issue_with_ttl(user_id, role, self.ttl)
    }

    /// Mint a token with an explicit expiry horizon
    pub fn issue_with_ttl(
        &self,
        user_id: Uuid,
        role: Role,
        ttl: Duration,
    ) -> anyhow::Result<String> {
        let iat = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat,
            exp: iat + ttl.as_secs(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Verify a token and return the embedded identity.
    ///
    /// Fails closed: the signature is checked before any claim is inspected,
    /// then expiry, then the subject is decoded.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;

        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Malformed)?;
        Ok(Identity {
            user_id,
            role: data.claims.role,
        })
    }
}

/// Generate a fresh signing secret from OS entropy, base64 URL-safe encoded
pub fn generate_secret() -> String {
    let mut buffer = vec![0u8; EPHEMERAL_SECRET_BYTES];
    OsRng.fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}
