// ============================
// inventory-backend-lib/src/connection.rs
// ============================
//! Backend-store connection lifecycle.
//!
//! The connection handle is a process-wide singleton: lazily dialed on the
//! first request after (re)start, then reused by every request in the same
//! process lifetime. Concurrent first requests collapse into one dial
//! attempt. A failed dial is fatal to the requests that needed it but not to
//! the process; the next inbound request retries.
use async_trait::async_trait;
use inventory_common::HealthStatus;
use metrics::counter;
use parking_lot::RwLock;
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::error::AppError;
use crate::storage::Store;

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Connecting,
    Ready,
    Degraded,
    Failed,
}

/// Trait for establishing the backend-store connection
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self) -> anyhow::Result<Arc<dyn Store>>;
}

struct Slot {
    state: ConnectionState,
    handle: Option<Arc<dyn Store>>,
}

/// Restores the pre-dial state if the dialing future is dropped before it
/// resolves, so a cancelled caller never leaves the slot stuck on
/// `Connecting` with no dial in flight.
struct ConnectingGuard<'a> {
    slot: &'a RwLock<Slot>,
    prev: ConnectionState,
    armed: bool,
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut slot = self.slot.write();
            if slot.state == ConnectionState::Connecting {
                slot.state = self.prev;
            }
        }
    }
}

/// Singleton connection manager with mutex-guarded state transitions
pub struct ConnectionManager {
    dialer: Arc<dyn Dialer>,
    dial_timeout: Duration,
    slot: RwLock<Slot>,
    /// Single-flight gate: at most one dial attempt is in flight
    dial_gate: Mutex<()>,
}

impl ConnectionManager {
    pub fn new(dialer: Arc<dyn Dialer>, dial_timeout: Duration) -> Self {
        Self {
            dialer,
            dial_timeout,
            slot: RwLock::new(Slot {
                state: ConnectionState::Uninitialized,
                handle: None,
            }),
            dial_gate: Mutex::new(()),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.slot.read().state
    }

    /// Return the live store handle, dialing it first if necessary.
    ///
    /// The fast path is a lock-free-ish read of the cached handle. The slow
    /// path serializes behind the dial gate with a double-check, so N
    /// concurrent cold-start callers produce exactly one dial and all
    /// observe its outcome. A caller cancelled mid-dial releases the gate and
    /// restores the pre-dial state on drop; the next caller simply retries.
    pub async fn acquire(&self) -> Result<Arc<dyn Store>, AppError> {
        if let Some(handle) = self.cached_handle() {
            return Ok(handle);
        }

        let _gate = self.dial_gate.lock().await;

        // someone else may have dialed while we waited on the gate
        if let Some(handle) = self.cached_handle() {
            return Ok(handle);
        }

        let prev = {
            let mut slot = self.slot.write();
            let prev = slot.state;
            slot.state = ConnectionState::Connecting;
            prev
        };
        let mut restore = ConnectingGuard { slot: &self.slot, prev, armed: true };
        counter!("connection_dial_attempts_total").increment(1);

        let dialed = match timeout(self.dial_timeout, self.dialer.dial()).await {
            Ok(Ok(handle)) => Ok(handle),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err(format!("dial timed out after {:?}", self.dial_timeout)),
        };
        restore.armed = false;

        match dialed {
            Ok(handle) => {
                let mut slot = self.slot.write();
                slot.state = ConnectionState::Ready;
                slot.handle = Some(handle.clone());
                tracing::info!("backend store connected");
                Ok(handle)
            },
            Err(reason) => {
                let mut slot = self.slot.write();
                slot.state = ConnectionState::Failed;
                slot.handle = None;
                counter!("connection_dial_failures_total").increment(1);
                tracing::error!(%reason, "backend store connection failed");
                Err(AppError::ConnectionUnavailable(reason))
            },
        }
    }

    /// Health probe, slow path only. Pings the live connection and moves
    /// Ready <-> Degraded accordingly; Degraded never blocks serving.
    pub async fn health(&self) -> HealthStatus {
        let handle = match self.cached_handle() {
            Some(handle) => handle,
            None => match self.acquire().await {
                Ok(handle) => handle,
                Err(_) => return HealthStatus::Error,
            },
        };

        match handle.ping().await {
            Ok(()) => {
                let mut slot = self.slot.write();
                if slot.state == ConnectionState::Degraded {
                    tracing::info!("backend store recovered");
                    slot.state = ConnectionState::Ready;
                }
                HealthStatus::Ok
            },
            Err(err) => {
                let mut slot = self.slot.write();
                slot.state = ConnectionState::Degraded;
                tracing::warn!(error = %err, "backend store ping failed");
                HealthStatus::Degraded
            },
        }
    }

    fn cached_handle(&self) -> Option<Arc<dyn Store>> {
        let slot = self.slot.read();
        match slot.state {
            ConnectionState::Ready | ConnectionState::Degraded => slot.handle.clone(),
            _ => None,
        }
    }
}

/// Dialer for the flat-file store
pub struct FlatFileDialer {
    data_dir: std::path::PathBuf,
}

impl FlatFileDialer {
    pub fn new<P: Into<std::path::PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

#[async_trait]
impl Dialer for FlatFileDialer {
    async fn dial(&self) -> anyhow::Result<Arc<dyn Store>> {
        let data_dir = self.data_dir.clone();
        // index rebuild does blocking fs work
        let store =
            tokio::task::spawn_blocking(move || crate::storage::FlatFileStore::open(data_dir))
                .await??;
        Ok(Arc::new(store))
    }
}
