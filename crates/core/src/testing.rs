//! Mock implementations of the auth ports
//!
//! Provides scripted in-memory doubles for testing the lifecycle manager
//! and for adapter test suites in other crates. These are deterministic and
//! never touch the network or the OS keychain.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hikayat_domain::{
    AuthGrant, AuthSession, AuthUser, HikayatError, NewProfile, Result, SignUpRequest, UserProfile,
};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::auth::errors::IdentityError;
use crate::auth::ports::{ActivityCallback, ActivityObserver, CredentialStore, IdentityGateway};

type GrantResponse = Mutex<Option<std::result::Result<AuthGrant, IdentityError>>>;

/// Scripted identity gateway with call recording.
///
/// Responses default to "not configured" errors so a test that forgets to
/// script an outcome fails loudly. Profile rows live in an in-memory map,
/// which makes the ensure-profile idempotence observable through
/// [`MockIdentityGateway::insert_calls`].
#[derive(Default)]
pub struct MockIdentityGateway {
    sign_in_response: GrantResponse,
    sign_up_response: GrantResponse,
    sign_out_error: Mutex<Option<IdentityError>>,
    session: Mutex<Option<AuthSession>>,
    user: Mutex<Option<AuthUser>>,
    profiles: Mutex<HashMap<String, UserProfile>>,
    fail_profile_insert: AtomicBool,
    sign_in_gate: Mutex<Option<Arc<Semaphore>>>,
    fetch_profile_gate: Mutex<Option<Arc<Semaphore>>>,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    fetch_profile_calls: AtomicUsize,
    insert_profile_calls: AtomicUsize,
}

impl MockIdentityGateway {
    /// Create a gateway with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next (and every subsequent) sign-in outcome.
    pub fn set_sign_in_result(&self, result: std::result::Result<AuthGrant, IdentityError>) {
        *self.sign_in_response.lock() = Some(result);
    }

    /// Script the sign-up outcome.
    pub fn set_sign_up_result(&self, result: std::result::Result<AuthGrant, IdentityError>) {
        *self.sign_up_response.lock() = Some(result);
    }

    /// Make the remote sign-out fail. Sign-out succeeds by default.
    pub fn set_sign_out_error(&self, error: IdentityError) {
        *self.sign_out_error.lock() = Some(error);
    }

    /// Seed the persisted session returned by `get_session`.
    pub fn set_session(&self, session: Option<AuthSession>) {
        *self.session.lock() = session;
    }

    /// Seed the identity record returned by `get_user`.
    pub fn set_user(&self, user: Option<AuthUser>) {
        *self.user.lock() = user;
    }

    /// Seed an existing profile row.
    pub fn add_profile(&self, profile: UserProfile) {
        self.profiles.lock().insert(profile.id.clone(), profile);
    }

    /// Make every profile insert fail.
    pub fn fail_profile_inserts(&self) {
        self.fail_profile_insert.store(true, Ordering::SeqCst);
    }

    /// Hold sign-in completions until the returned gate receives permits.
    ///
    /// Each blocked sign-in call consumes one permit from the gate; release
    /// one with `gate.add_permits(1)`.
    pub fn hold_sign_in(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.sign_in_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Hold profile lookups until the returned gate receives permits.
    ///
    /// Same contract as [`MockIdentityGateway::hold_sign_in`]: each blocked
    /// lookup consumes one permit.
    pub fn hold_fetch_profile(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.fetch_profile_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Number of sign-in calls observed.
    #[must_use]
    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    /// Number of sign-out calls observed.
    #[must_use]
    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    /// Number of profile lookups observed.
    #[must_use]
    pub fn fetch_profile_calls(&self) -> usize {
        self.fetch_profile_calls.load(Ordering::SeqCst)
    }

    /// Number of profile inserts observed.
    #[must_use]
    pub fn insert_calls(&self) -> usize {
        self.insert_profile_calls.load(Ordering::SeqCst)
    }

    fn unconfigured(operation: &str) -> IdentityError {
        IdentityError::Unexpected(format!("no {operation} outcome scripted"))
    }
}

#[async_trait]
impl IdentityGateway for MockIdentityGateway {
    async fn sign_up(
        &self,
        _request: &SignUpRequest,
    ) -> std::result::Result<AuthGrant, IdentityError> {
        self.sign_up_response.lock().clone().unwrap_or_else(|| Err(Self::unconfigured("sign-up")))
    }

    async fn sign_in_with_password(
        &self,
        _email: &str,
        _password: &str,
    ) -> std::result::Result<AuthGrant, IdentityError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.sign_in_gate.lock().clone();
        if let Some(gate) = gate {
            // Held until the test releases a permit; the permit is consumed.
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(IdentityError::Unexpected("sign-in gate closed".into())),
            }
        }

        self.sign_in_response.lock().clone().unwrap_or_else(|| Err(Self::unconfigured("sign-in")))
    }

    async fn sign_out(&self) -> std::result::Result<(), IdentityError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        match self.sign_out_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn get_session(&self) -> std::result::Result<Option<AuthSession>, IdentityError> {
        Ok(self.session.lock().clone())
    }

    async fn get_user(&self) -> std::result::Result<Option<AuthUser>, IdentityError> {
        Ok(self.user.lock().clone())
    }

    async fn fetch_profile(
        &self,
        user_id: &str,
    ) -> std::result::Result<Option<UserProfile>, IdentityError> {
        self.fetch_profile_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.fetch_profile_gate.lock().clone();
        if let Some(gate) = gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(IdentityError::Unexpected("profile gate closed".into())),
            }
        }

        Ok(self.profiles.lock().get(user_id).cloned())
    }

    async fn insert_profile(
        &self,
        profile: &NewProfile,
    ) -> std::result::Result<UserProfile, IdentityError> {
        self.insert_profile_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_profile_insert.load(Ordering::SeqCst) {
            return Err(IdentityError::Unexpected("insert failed".into()));
        }

        let now = Utc::now();
        let row = UserProfile {
            id: profile.id.clone(),
            email: profile.email.clone(),
            profile_name: profile.profile_name.clone(),
            date_of_birth: profile.date_of_birth,
            avatar_url: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.profiles.lock().insert(row.id.clone(), row.clone());
        Ok(row)
    }
}

impl std::fmt::Debug for MockIdentityGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockIdentityGateway")
            .field("sign_in_calls", &self.sign_in_calls())
            .field("sign_out_calls", &self.sign_out_calls())
            .finish_non_exhaustive()
    }
}

/// In-memory credential store with an optional failure mode.
///
/// When disabled, reads return `None` and writes are dropped, matching the
/// degrade-to-no-op contract of the real adapters.
#[derive(Debug, Clone, Default)]
pub struct MockCredentialStore {
    data: Arc<Mutex<HashMap<String, String>>>,
    disabled: Arc<AtomicBool>,
}

impl MockCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unavailable secure store.
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::SeqCst);
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn get_item(&self, key: &str) -> Option<String> {
        if self.disabled.load(Ordering::SeqCst) {
            return None;
        }
        self.data.lock().get(key).cloned()
    }

    async fn set_item(&self, key: &str, value: &str) {
        if self.disabled.load(Ordering::SeqCst) {
            return;
        }
        self.data.lock().insert(key.to_string(), value.to_string());
    }

    async fn remove_item(&self, key: &str) {
        if self.disabled.load(Ordering::SeqCst) {
            return;
        }
        self.data.lock().remove(key);
    }

    async fn clear(&self) {
        if self.disabled.load(Ordering::SeqCst) {
            return;
        }
        self.data.lock().clear();
    }
}

type SharedActivityCallback = Arc<Mutex<Option<ActivityCallback>>>;

/// Manually driven activity observer for tests.
///
/// The paired [`ActivityTrigger`] stays with the test and fires the
/// registered callback on demand, standing in for the host shell.
pub struct ManualActivityObserver {
    callback: SharedActivityCallback,
}

/// Test-side handle that fires "became active" events.
#[derive(Clone)]
pub struct ActivityTrigger {
    callback: SharedActivityCallback,
}

impl ManualActivityObserver {
    /// Create an observer and its paired trigger.
    #[must_use]
    pub fn new() -> (Self, ActivityTrigger) {
        let callback: SharedActivityCallback = Arc::new(Mutex::new(None));
        (Self { callback: Arc::clone(&callback) }, ActivityTrigger { callback })
    }
}

impl ActivityObserver for ManualActivityObserver {
    fn start(&mut self, callback: ActivityCallback) -> Result<()> {
        let mut slot = self.callback.lock();
        if slot.is_some() {
            return Err(HikayatError::Internal("activity observer already started".into()));
        }
        *slot = Some(callback);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.callback.lock().take();
        Ok(())
    }
}

impl ActivityTrigger {
    /// Fire one "became active" event, if a callback is registered.
    pub fn fire(&self) {
        if let Some(callback) = &*self.callback.lock() {
            callback();
        }
    }

    /// Whether an observer callback is currently registered.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.callback.lock().is_some()
    }
}

impl std::fmt::Debug for ManualActivityObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualActivityObserver")
            .field("started", &self.callback.lock().is_some())
            .finish()
    }
}

impl std::fmt::Debug for ActivityTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityTrigger").field("subscribed", &self.is_subscribed()).finish()
    }
}
