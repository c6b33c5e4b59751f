//! Host-driven activity bridge
//!
//! Implements [`ActivityObserver`] for embedding shells. The native shell
//! (mobile or desktop) keeps an [`ActivityHandle`] and calls
//! `notify_active` whenever the application is foregrounded; the bridge
//! forwards the event to whatever callback the auth lifecycle manager
//! registered.
//!
//! Lifecycle: the manager calls `start` once at start-up and `stop` at
//! shutdown. Events fired outside that window are dropped.

use std::sync::Arc;

use hikayat_core::{ActivityCallback, ActivityObserver};
use hikayat_domain::{HikayatError, Result};
use parking_lot::Mutex;
use tracing::debug;

type SharedCallback = Arc<Mutex<Option<ActivityCallback>>>;

/// Observer half, handed to the auth lifecycle manager.
pub struct HostActivityBridge {
    callback: SharedCallback,
}

/// Shell half: cloneable handle that reports foreground transitions.
#[derive(Clone)]
pub struct ActivityHandle {
    callback: SharedCallback,
}

impl HostActivityBridge {
    /// Create a bridge with no callback registered yet.
    #[must_use]
    pub fn new() -> Self {
        Self { callback: Arc::new(Mutex::new(None)) }
    }

    /// Handle for the embedding shell to fire events through.
    #[must_use]
    pub fn handle(&self) -> ActivityHandle {
        ActivityHandle { callback: Arc::clone(&self.callback) }
    }
}

impl Default for HostActivityBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityObserver for HostActivityBridge {
    fn start(&mut self, callback: ActivityCallback) -> Result<()> {
        let mut slot = self.callback.lock();
        if slot.is_some() {
            return Err(HikayatError::Internal("activity bridge already started".into()));
        }
        *slot = Some(callback);
        debug!("activity bridge started");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        // Idempotent: stopping a stopped bridge is a no-op.
        if self.callback.lock().take().is_some() {
            debug!("activity bridge stopped");
        }
        Ok(())
    }
}

impl ActivityHandle {
    /// Report that the application became active.
    ///
    /// Dropped silently when no observer is attached.
    pub fn notify_active(&self) {
        if let Some(callback) = &*self.callback.lock() {
            callback();
        }
    }

    /// Whether an observer callback is currently attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.callback.lock().is_some()
    }
}

impl std::fmt::Debug for HostActivityBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostActivityBridge")
            .field("started", &self.callback.lock().is_some())
            .finish()
    }
}

impl std::fmt::Debug for ActivityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityHandle").field("attached", &self.is_attached()).finish()
    }
}
