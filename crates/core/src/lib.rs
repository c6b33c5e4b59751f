//! # Hikayat Core
//!
//! Pure session/auth lifecycle logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - The session state container and its observable store
//! - The auth lifecycle manager (sign-in/sign-up/sign-out, restore, expiry)
//! - Port/adapter interfaces (traits) for the consumed collaborators
//! - A clock abstraction and in-memory test doubles
//!
//! ## Architecture Principles
//! - Only depends on `hikayat-domain`
//! - No HTTP, keychain, or platform code
//! - All external dependencies via traits
//! - Pure, testable lifecycle logic

pub mod auth;
pub mod testing;
pub mod time;

// Re-export the lifecycle surface consumed by embedders
pub use auth::{
    ActivityCallback, ActivityObserver, AuthError, AuthManager, AuthSnapshot, CredentialStore,
    IdentityError, IdentityGateway, InactivityPolicy, SessionState, SessionStore,
};
pub use time::{Clock, MockClock, SystemClock};
