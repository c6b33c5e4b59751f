//! Session state container
//!
//! `SessionState` is the pure holder of the four auth fields, mutated only
//! through named transitions. `SessionStore` wraps it in the injectable
//! shared handle the rest of the app reads from: a `tokio::sync::watch`
//! channel publishes an immutable [`AuthSnapshot`] after every transition,
//! so UI consumers can either poll `snapshot()` or subscribe for changes.
//!
//! Only the lifecycle manager writes to the store; any number of consumers
//! may read it concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hikayat_domain::{AuthSession, AuthUser, UserProfile};
use serde::Serialize;
use tokio::sync::{watch, RwLock};

use super::policy::InactivityPolicy;
use crate::time::Clock;

/// The four auth fields plus the stored authentication flag.
///
/// Transitions are pure state assignment and cannot fail. The stored flag
/// only covers `session != null AND user != null`; the inactivity-expiry
/// half of `is_authenticated` is evaluated at read time by [`SessionStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<AuthUser>,
    pub profile: Option<UserProfile>,
    pub session: Option<AuthSession>,
    pub is_authenticated: bool,
    pub last_activity_ts: Option<i64>,
}

impl SessionState {
    /// Replace the user and recompute the stored authentication flag.
    pub fn set_user(&mut self, user: Option<AuthUser>) {
        self.user = user;
        self.recompute_flag();
    }

    /// Replace the profile. No other side effects.
    pub fn set_profile(&mut self, profile: Option<UserProfile>) {
        self.profile = profile;
    }

    /// Replace the session and recompute the stored authentication flag.
    pub fn set_session(&mut self, session: Option<AuthSession>) {
        self.session = session;
        self.recompute_flag();
    }

    /// Record the moment the user was last observed active.
    pub fn update_last_activity(&mut self, now_ms: i64) {
        self.last_activity_ts = Some(now_ms);
    }

    /// Reset every field in one assignment; no partial-clear state is
    /// observable through the store.
    pub fn clear_auth(&mut self) {
        *self = Self::default();
    }

    fn recompute_flag(&mut self) {
        self.is_authenticated = self.session.is_some() && self.user.is_some();
    }
}

/// Immutable read model published to UI consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthSnapshot {
    pub user: Option<AuthUser>,
    pub profile: Option<UserProfile>,
    pub session: Option<AuthSession>,
    /// True until the initial session restore has resolved.
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub is_visitor: bool,
    pub is_email_verified: bool,
}

/// Shared, observable session state handle.
///
/// Owned by the lifecycle manager and `Arc`-cloned to consumers. Every
/// transition takes the write lock for its duration and publishes a fresh
/// snapshot before releasing it, so readers observe either the pre- or
/// post-transition state, never a partial one.
pub struct SessionStore {
    state: RwLock<SessionState>,
    loading: AtomicBool,
    policy: InactivityPolicy,
    clock: Arc<dyn Clock>,
    snapshot_tx: watch::Sender<AuthSnapshot>,
}

impl SessionStore {
    /// Create a store in the loading phase with empty state.
    #[must_use]
    pub fn new(policy: InactivityPolicy, clock: Arc<dyn Clock>) -> Self {
        let initial = AuthSnapshot {
            user: None,
            profile: None,
            session: None,
            is_loading: true,
            is_authenticated: false,
            is_visitor: true,
            is_email_verified: false,
        };
        let (snapshot_tx, _) = watch::channel(initial);

        Self {
            state: RwLock::new(SessionState::default()),
            loading: AtomicBool::new(true),
            policy,
            clock,
            snapshot_tx,
        }
    }

    /// Replace the user.
    pub async fn set_user(&self, user: Option<AuthUser>) {
        let mut state = self.state.write().await;
        state.set_user(user);
        self.publish(&state);
    }

    /// Replace the profile.
    pub async fn set_profile(&self, profile: Option<UserProfile>) {
        let mut state = self.state.write().await;
        state.set_profile(profile);
        self.publish(&state);
    }

    /// Replace the session.
    pub async fn set_session(&self, session: Option<AuthSession>) {
        let mut state = self.state.write().await;
        state.set_session(session);
        self.publish(&state);
    }

    /// Record activity at the current clock time.
    pub async fn update_last_activity(&self) {
        let now_ms = self.clock.now_ms();
        let mut state = self.state.write().await;
        state.update_last_activity(now_ms);
        self.publish(&state);
    }

    /// Atomically null user, profile, session and the activity timestamp.
    pub async fn clear_auth(&self) {
        let mut state = self.state.write().await;
        state.clear_auth();
        self.publish(&state);
    }

    /// Apply a transition only while `validate` still holds.
    ///
    /// `validate` runs inside the write-lock critical section, so the check
    /// and the transition are atomic with respect to every other store
    /// write. The transition closure receives the current clock reading for
    /// activity recording. Returns whether the transition was applied; when
    /// `validate` fails the state is untouched and nothing is published.
    pub async fn transition_if<V, A>(&self, validate: V, apply: A) -> bool
    where
        V: FnOnce() -> bool,
        A: FnOnce(&mut SessionState, i64),
    {
        let now_ms = self.clock.now_ms();
        let mut state = self.state.write().await;
        if !validate() {
            return false;
        }
        apply(&mut state, now_ms);
        self.publish(&state);
        true
    }

    /// Resolve or re-enter the loading phase.
    pub async fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::SeqCst);
        let state = self.state.read().await;
        self.publish(&state);
    }

    /// Current read model, with the expiry policy applied at read time.
    pub async fn snapshot(&self) -> AuthSnapshot {
        let state = self.state.read().await;
        self.build_snapshot(&state)
    }

    /// Subscribe to snapshot changes.
    ///
    /// The receiver's current value is the latest published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Derived authentication flag, expiry included.
    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.read().await;
        state.is_authenticated && !self.is_expired(&state)
    }

    /// Whether the inactivity window has elapsed for the held state.
    pub async fn is_session_expired(&self) -> bool {
        let state = self.state.read().await;
        self.is_expired(&state)
    }

    /// Whether any session is held, expired or not.
    pub async fn has_session(&self) -> bool {
        self.state.read().await.session.is_some()
    }

    /// The current user when, and only when, authentication holds.
    pub async fn authenticated_user(&self) -> Option<AuthUser> {
        let state = self.state.read().await;
        if state.is_authenticated && !self.is_expired(&state) {
            state.user.clone()
        } else {
            None
        }
    }

    /// Last recorded activity, epoch milliseconds.
    pub async fn last_activity_ts(&self) -> Option<i64> {
        self.state.read().await.last_activity_ts
    }

    fn is_expired(&self, state: &SessionState) -> bool {
        self.policy.is_expired(state.last_activity_ts, self.clock.now_ms())
    }

    fn build_snapshot(&self, state: &SessionState) -> AuthSnapshot {
        let is_authenticated = state.is_authenticated && !self.is_expired(state);

        AuthSnapshot {
            user: state.user.clone(),
            profile: state.profile.clone(),
            session: state.session.clone(),
            is_loading: self.loading.load(Ordering::SeqCst),
            is_authenticated,
            is_visitor: !is_authenticated,
            is_email_verified: state.user.as_ref().is_some_and(AuthUser::is_email_verified),
        }
    }

    fn publish(&self, state: &SessionState) {
        self.snapshot_tx.send_replace(self.build_snapshot(state));
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("loading", &self.loading.load(Ordering::SeqCst))
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
