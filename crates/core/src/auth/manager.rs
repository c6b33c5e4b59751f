//! Auth lifecycle manager
//!
//! Orchestrates sign-in/sign-up/sign-out against the identity gateway,
//! writes results into the session store, reconciles the application
//! profile, tracks activity recency, and enforces the inactivity-expiry
//! policy.
//!
//! # Lifecycle
//! The derived auth state moves through `Loading` (until [`AuthManager::start`]
//! resolves the initial restore) and then alternates between unauthenticated
//! and authenticated for the life of the process. Expiry is detected at
//! lifecycle checkpoints (restore, app-became-active) and at read time; the
//! expiry transition is manager-initiated, not user-initiated.
//!
//! # Overlapping calls
//! Mutating operations are guarded by a monotonically increasing generation
//! counter: each claims the next generation at entry and commits only while
//! still current. The currency re-check runs inside the store's write-lock
//! critical section, so a stale completion can never interleave its writes
//! with a later operation's clear. A sign-in resolving after a later
//! sign-out is discarded and surfaces as [`AuthError::Superseded`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hikayat_domain::{
    NewProfile, ProfileUpdate, Result, SignUpRequest, UserMetadata, UserProfile,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::errors::AuthError;
use super::policy::InactivityPolicy;
use super::ports::{ActivityObserver, IdentityGateway};
use super::state::{AuthSnapshot, SessionStore};
use crate::time::Clock;

/// The auth lifecycle manager.
///
/// Owns the [`SessionStore`] and is the only writer to it (the activity
/// event path writes through the manager as well). Constructed once per
/// process and shared behind an `Arc`.
pub struct AuthManager {
    gateway: Arc<dyn IdentityGateway>,
    store: Arc<SessionStore>,
    observer: Mutex<Box<dyn ActivityObserver>>,
    generation: AtomicU64,
    activity_task: Mutex<Option<JoinHandle<()>>>,
}

impl AuthManager {
    /// Create a manager with an empty session store in the loading phase.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn IdentityGateway>,
        observer: Box<dyn ActivityObserver>,
        policy: InactivityPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(SessionStore::new(policy, clock));

        Self {
            gateway,
            store,
            observer: Mutex::new(observer),
            generation: AtomicU64::new(0),
            activity_task: Mutex::new(None),
        }
    }

    /// The shared session store handle for UI consumers.
    #[must_use]
    pub fn store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.store)
    }

    /// Current read model.
    pub async fn snapshot(&self) -> AuthSnapshot {
        self.store.snapshot().await
    }

    /// Subscribe to read-model changes.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<AuthSnapshot> {
        self.store.subscribe()
    }

    /// Restore any persisted session, resolve the loading phase, and
    /// subscribe to the activity event source.
    ///
    /// Call once at process start.
    ///
    /// # Errors
    /// Returns an error when the activity observer cannot be started; the
    /// restore itself never fails (a failed restore degrades to
    /// unauthenticated).
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        self.restore_session().await;
        self.store.set_loading(false).await;
        self.subscribe_activity()?;
        info!("auth manager started");
        Ok(())
    }

    /// Release the activity subscription and stop the event consumer.
    pub fn shutdown(&self) {
        if let Err(err) = self.observer.lock().stop() {
            warn!(error = %err, "activity observer stop failed");
        }
        if let Some(handle) = self.activity_task.lock().take() {
            handle.abort();
        }
        info!("auth manager shut down");
    }

    /// Exchange credentials for a session and reconcile the profile.
    ///
    /// On success the session and user land in the store, activity is
    /// recorded, and a profile row is ensured for the user. On rejection the
    /// store is untouched.
    ///
    /// # Errors
    /// Returns the backend's display message on rejection, the normalized
    /// generic message on unexpected failures, or
    /// [`AuthError::Superseded`] when a later operation claimed the state
    /// first.
    pub async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<(), AuthError> {
        let generation = self.claim_generation();

        let grant =
            self.gateway.sign_in_with_password(email, password).await.map_err(AuthError::from)?;

        let user = grant.user.clone();
        let committed = self
            .store
            .transition_if(
                || self.is_current(generation),
                |state, now_ms| {
                    state.set_session(grant.session);
                    state.set_user(grant.user);
                    state.update_last_activity(now_ms);
                },
            )
            .await;
        if !committed {
            debug!("discarding stale sign-in completion");
            return Err(AuthError::Superseded);
        }

        if let Some(user) = user {
            let (profile, created) =
                self.ensure_profile(&user.id, user.email.as_deref().unwrap_or(email)).await;

            let committed = self
                .store
                .transition_if(
                    || self.is_current(generation),
                    |state, _now_ms| state.set_profile(profile),
                )
                .await;
            if !committed {
                debug!("discarding stale profile reconciliation");
                return Err(AuthError::Superseded);
            }

            info!(user_id = %user.id, profile_created = created, "sign-in complete");
        }

        Ok(())
    }

    /// Register a new account.
    ///
    /// Whatever user/session the backend returned is stored; with a
    /// confirmation-required backend the grant carries no session and the
    /// state stays unauthenticated. A profile row is then ensured for the
    /// returned user, seeded from the request metadata; insert failures are
    /// logged and non-fatal.
    ///
    /// # Errors
    /// Duplicate registration maps to the stable product message; other
    /// rejections pass through verbatim.
    pub async fn sign_up(&self, request: &SignUpRequest) -> std::result::Result<(), AuthError> {
        let generation = self.claim_generation();

        let grant = self.gateway.sign_up(request).await.map_err(AuthError::from)?;

        let complete = grant.is_complete();
        let user = grant.user.clone();
        let committed = self
            .store
            .transition_if(
                || self.is_current(generation),
                |state, _now_ms| {
                    state.set_session(grant.session);
                    state.set_user(grant.user);
                },
            )
            .await;
        if !committed {
            debug!("discarding stale sign-up completion");
            return Err(AuthError::Superseded);
        }

        if let Some(user) = user {
            let seed = UserMetadata {
                profile_name: Some(request.profile_name.clone()),
                date_of_birth: request.date_of_birth,
            };
            let (profile, created) = self
                .ensure_profile_seeded(
                    &user.id,
                    user.email.as_deref().unwrap_or(&request.email),
                    Some(seed),
                )
                .await;

            let committed = self
                .store
                .transition_if(
                    || self.is_current(generation),
                    |state, _now_ms| state.set_profile(profile),
                )
                .await;
            if !committed {
                debug!("discarding stale profile reconciliation");
                return Err(AuthError::Superseded);
            }

            info!(session_issued = complete, profile_created = created, "sign-up complete");
        } else {
            info!(session_issued = complete, "sign-up complete");
        }

        Ok(())
    }

    /// Invalidate the session with the backend and clear local state.
    ///
    /// Local state is cleared regardless of the backend outcome, so from
    /// the UI's perspective sign-out always takes effect locally.
    ///
    /// # Errors
    /// Returns [`AuthError::SignOutIncomplete`] when the remote call failed;
    /// the local clear has still happened.
    pub async fn sign_out(&self) -> std::result::Result<(), AuthError> {
        // Claiming a generation here invalidates any in-flight sign-in.
        let _generation = self.claim_generation();

        let remote = self.gateway.sign_out().await;

        // Finally-equivalent step: the local clear happens on every path.
        self.store.clear_auth().await;

        match remote {
            Ok(()) => {
                info!("sign-out complete");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "backend sign-out failed, local state cleared anyway");
                Err(AuthError::SignOutIncomplete)
            }
        }
    }

    /// Re-run profile reconciliation for the current user.
    ///
    /// No-op when no authenticated user is present. Idempotent: a profile
    /// that already exists is never inserted again. The refreshed profile is
    /// silently discarded when a lifecycle operation intervened while the
    /// lookup was in flight.
    ///
    /// # Errors
    /// Never fails in practice; reconciliation failures are logged and the
    /// profile stays as it was.
    pub async fn refresh_profile(&self) -> std::result::Result<(), AuthError> {
        let generation = self.generation.load(Ordering::SeqCst);

        let Some(user) = self.store.authenticated_user().await else {
            debug!("refresh_profile skipped, no authenticated user");
            return Ok(());
        };

        let (profile, _created) =
            self.ensure_profile(&user.id, user.email.as_deref().unwrap_or_default()).await;

        if profile.is_some() {
            let committed = self
                .store
                .transition_if(
                    || self.is_current(generation),
                    |state, _now_ms| state.set_profile(profile),
                )
                .await;
            if !committed {
                debug!("discarding stale profile refresh");
            }
        }
        Ok(())
    }

    /// Profile editing is outside this core's scope.
    ///
    /// The command exists so the UI facade is complete; it is a documented
    /// stub, not a defect.
    ///
    /// # Errors
    /// Always returns [`AuthError::NotImplemented`].
    pub async fn update_profile(
        &self,
        _update: &ProfileUpdate,
    ) -> std::result::Result<(), AuthError> {
        Err(AuthError::NotImplemented)
    }

    async fn ensure_profile(&self, user_id: &str, email: &str) -> (Option<UserProfile>, bool) {
        self.ensure_profile_seeded(user_id, email, None).await
    }

    /// Get-or-create the profile row for a user.
    ///
    /// A `seed` carries the metadata for a fresh row; without one the
    /// backend's cached sign-up metadata is consulted. Returns the profile
    /// (or `None` when reconciliation failed) and whether a row was
    /// inserted. Failures are logged and swallowed; a missing profile is
    /// tolerated, not fatal.
    async fn ensure_profile_seeded(
        &self,
        user_id: &str,
        email: &str,
        seed: Option<UserMetadata>,
    ) -> (Option<UserProfile>, bool) {
        match self.gateway.fetch_profile(user_id).await {
            Ok(Some(profile)) => return (Some(profile), false),
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, user_id, "profile lookup failed");
                return (None, false);
            }
        }

        // The email local-part is the display name of last resort.
        let metadata = match seed {
            Some(metadata) => metadata,
            None => self.signup_metadata(user_id).await,
        };
        let profile_name =
            metadata.profile_name.clone().unwrap_or_else(|| local_part(email).to_string());

        let row = NewProfile {
            id: user_id.to_string(),
            email: email.to_string(),
            profile_name,
            date_of_birth: metadata.date_of_birth,
        };

        match self.gateway.insert_profile(&row).await {
            Ok(profile) => {
                info!(user_id, "profile created");
                (Some(profile), true)
            }
            Err(err) => {
                warn!(error = %err, user_id, "profile insert failed");
                (None, false)
            }
        }
    }

    async fn signup_metadata(&self, user_id: &str) -> UserMetadata {
        match self.gateway.get_user().await {
            Ok(Some(user)) if user.id == user_id => user.user_metadata,
            Ok(_) => UserMetadata::default(),
            Err(err) => {
                warn!(error = %err, user_id, "user metadata lookup failed");
                UserMetadata::default()
            }
        }
    }

    /// Restore a persisted session at start-up.
    ///
    /// A restore that is already past the inactivity window is discarded
    /// through the sign-out path before the loading phase resolves.
    async fn restore_session(&self) {
        let session = match self.gateway.get_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("no persisted session to restore");
                return;
            }
            Err(err) => {
                warn!(error = %err, "session restore failed");
                return;
            }
        };

        self.store.set_session(Some(session)).await;

        match self.gateway.get_user().await {
            Ok(user) => {
                self.store.set_user(user.clone()).await;
                if let Some(user) = user {
                    if self.store.is_session_expired().await {
                        info!("restored session is past the inactivity window, discarding");
                        let _ = self.sign_out().await;
                        return;
                    }
                    let (profile, _created) = self
                        .ensure_profile(&user.id, user.email.as_deref().unwrap_or_default())
                        .await;
                    self.store.set_profile(profile).await;
                    debug!(user_id = %user.id, "session restored");
                }
            }
            Err(err) => {
                warn!(error = %err, "user lookup failed during restore");
            }
        }
    }

    /// Handle an "application became active" event.
    ///
    /// If a session is held: an elapsed inactivity window triggers the
    /// manager-initiated sign-out; otherwise the activity timestamp is
    /// refreshed.
    async fn on_became_active(&self) {
        if !self.store.has_session().await {
            return;
        }

        if self.store.is_session_expired().await {
            info!("inactivity window elapsed, signing out");
            let _ = self.sign_out().await;
        } else {
            self.store.update_last_activity().await;
        }
    }

    /// Register with the activity observer and spawn the single consumer
    /// task that serializes event handling.
    fn subscribe_activity(self: &Arc<Self>) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        self.observer.lock().start(Box::new(move || {
            // The host may fire from any thread; events are forwarded to
            // the consumer task. A send error just means shutdown ran.
            let _ = tx.send(());
        }))?;

        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                manager.on_became_active().await;
            }
        });

        *self.activity_task.lock() = Some(handle);
        Ok(())
    }

    fn claim_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Drop for AuthManager {
    fn drop(&mut self) {
        if let Some(handle) = self.activity_task.lock().take() {
            handle.abort();
        }
    }
}

/// The substring before `@`, or the whole input when there is none.
fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::manager helpers. End-to-end lifecycle scenarios
    //! live in `tests/auth_lifecycle.rs`.
    use super::*;

    /// Validates `local_part` fallback behavior.
    #[test]
    fn local_part_falls_back_to_whole_input() {
        assert_eq!(local_part("nora@example.com"), "nora");
        assert_eq!(local_part("no-at-sign"), "no-at-sign");
        assert_eq!(local_part(""), "");
    }
}
