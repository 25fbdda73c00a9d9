// ============================
// inventory-backend-lib/src/lib.rs
// ============================
//! Core library for the inventory backend: credential handling, access
//! control, and backend-store connection lifecycle.

pub mod auth;
pub mod config;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod router;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenService;
use crate::config::Settings;
use crate::connection::{ConnectionManager, Dialer, FlatFileDialer};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Settings manager
    pub settings: Arc<Settings>,
    /// Token issuer/verifier
    pub tokens: Arc<TokenService>,
    /// Backend-store connection singleton
    pub connection: Arc<ConnectionManager>,
}

impl AppState {
    /// Create a new application state with an explicit dialer
    pub fn new(dialer: Arc<dyn Dialer>, settings: Settings) -> Self {
        let tokens = Arc::new(TokenService::from_settings(&settings.token));
        let connection = Arc::new(ConnectionManager::new(
            dialer,
            Duration::from_secs(settings.connect_timeout_secs),
        ));

        Self {
            settings: Arc::new(settings),
            tokens,
            connection,
        }
    }

    /// Create a new application state over the flat-file store at
    /// `settings.data_dir`
    pub fn with_flat_file(settings: Settings) -> Self {
        let dialer = Arc::new(FlatFileDialer::new(settings.data_dir.clone()));
        Self::new(dialer, settings)
    }
}
