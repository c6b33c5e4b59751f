//! Ports consumed by the auth lifecycle manager
//!
//! These traits abstract the external collaborators (identity backend,
//! secure credential storage, host activity events) to enable dependency
//! injection and testing with mock implementations.

use async_trait::async_trait;
use hikayat_domain::{
    AuthGrant, AuthSession, AuthUser, NewProfile, Result, SignUpRequest, UserProfile,
};

use super::errors::IdentityError;

/// Identity backend operations
///
/// Implemented in infra against the remote identity/profile service. All
/// failures come back as tagged [`IdentityError`] kinds decided at the
/// adapter boundary.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Register a new account with profile metadata attached.
    ///
    /// Confirmation-required backends return a grant carrying the user but
    /// no session.
    ///
    /// # Errors
    /// Returns `IdentityError::AlreadyRegistered` for duplicate emails, or
    /// another tagged kind for other failures.
    async fn sign_up(&self, request: &SignUpRequest) -> std::result::Result<AuthGrant, IdentityError>;

    /// Exchange email/password credentials for a session.
    ///
    /// # Errors
    /// Returns a tagged kind when the backend rejects the credentials or the
    /// call fails.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<AuthGrant, IdentityError>;

    /// Invalidate the current session with the backend.
    ///
    /// # Errors
    /// Returns a tagged kind when the remote call fails. Callers must still
    /// clear local state on failure.
    async fn sign_out(&self) -> std::result::Result<(), IdentityError>;

    /// Restore any persisted session.
    ///
    /// # Errors
    /// Returns a tagged kind when restoration fails outright; a clean miss
    /// is `Ok(None)`.
    async fn get_session(&self) -> std::result::Result<Option<AuthSession>, IdentityError>;

    /// Fetch the identity record for the current session, if any.
    ///
    /// The adapter resolves the current access token itself, so this takes
    /// no arguments.
    ///
    /// # Errors
    /// Returns a tagged kind when the lookup fails.
    async fn get_user(&self) -> std::result::Result<Option<AuthUser>, IdentityError>;

    /// Look up the profile row for a user id.
    ///
    /// # Errors
    /// Returns a tagged kind when the query fails; a missing row is
    /// `Ok(None)`.
    async fn fetch_profile(
        &self,
        user_id: &str,
    ) -> std::result::Result<Option<UserProfile>, IdentityError>;

    /// Insert a new profile row, returning the stored representation.
    ///
    /// # Errors
    /// Returns a tagged kind when the insert fails.
    async fn insert_profile(
        &self,
        profile: &NewProfile,
    ) -> std::result::Result<UserProfile, IdentityError>;
}

/// Secure key-value storage for the opaque session blob
///
/// All operations are infallible at this boundary: adapter failures are
/// logged and degrade to `None`/no-op, matching the consumed storage
/// contract.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read a stored value, or `None` when absent or unreadable.
    async fn get_item(&self, key: &str) -> Option<String>;

    /// Store a value under a key.
    async fn set_item(&self, key: &str, value: &str);

    /// Remove a single key.
    async fn remove_item(&self, key: &str);

    /// Remove everything this store manages.
    async fn clear(&self);
}

/// Callback invoked when the host reports the app became active.
pub type ActivityCallback = Box<dyn Fn() + Send + Sync>;

/// Host-driven "application became active" event source
///
/// The lifecycle manager subscribes at start-up and unsubscribes at
/// shutdown; the host shell fires the callback whenever the app is
/// foregrounded.
pub trait ActivityObserver: Send + Sync {
    /// Start delivering events to `callback`.
    ///
    /// # Errors
    /// Returns `HikayatError::Internal` if the observer is already started.
    fn start(&mut self, callback: ActivityCallback) -> Result<()>;

    /// Stop delivering events and release the callback.
    ///
    /// Idempotent: calling it on a stopped observer is a no-op.
    ///
    /// # Errors
    /// Returns an error only when releasing host resources fails.
    fn stop(&mut self) -> Result<()>;
}
