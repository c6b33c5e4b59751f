//! Session/auth lifecycle core
//!
//! Layout:
//! - [`state`]: the session state container and its observable store
//! - [`policy`]: the 30-day inactivity expiry rule
//! - [`ports`]: traits for the consumed external collaborators
//! - [`errors`]: gateway-boundary kinds and display-ready manager errors
//! - [`manager`]: the lifecycle orchestrator and UI facade

pub mod errors;
pub mod manager;
pub mod policy;
pub mod ports;
pub mod state;

pub use errors::{AuthError, IdentityError};
pub use manager::AuthManager;
pub use policy::InactivityPolicy;
pub use ports::{ActivityCallback, ActivityObserver, CredentialStore, IdentityGateway};
pub use state::{AuthSnapshot, SessionState, SessionStore};
