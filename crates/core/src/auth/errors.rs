//! Auth error types
//!
//! Two boundaries, two error types: the identity gateway returns tagged
//! failure kinds decided at the adapter boundary, and the lifecycle manager
//! maps them into display-ready messages for the UI.

use thiserror::Error;

/// Tagged failure kinds returned by the identity gateway.
///
/// Classification happens at the gateway boundary (status codes, backend
/// error codes), never by message inspection in the lifecycle manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The email is already registered with the backend.
    #[error("{0}")]
    AlreadyRegistered(String),

    /// Structured backend rejection; the message is display-ready.
    #[error("{0}")]
    Rejected(String),

    /// Transport-level failure reaching the backend.
    #[error("Network error: {0}")]
    Network(String),

    /// Anything that does not fit the categories above.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Lifecycle manager errors, surfaced to the UI as display-ready strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Backend rejection, message passed through verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Duplicate registration, mapped to the stable product message.
    #[error("This email is already registered. Please login instead.")]
    AlreadyRegistered,

    /// Normalized message for any unexpected failure.
    #[error("An unexpected error occurred")]
    Unexpected,

    /// The backend sign-out failed; local state was still cleared.
    #[error("An unexpected error occurred, user not logged out")]
    SignOutIncomplete,

    /// Declared interface surface that is intentionally not serviced.
    #[error("Not implemented")]
    NotImplemented,

    /// A newer lifecycle operation claimed the state before this one
    /// completed; the stale completion was discarded.
    #[error("Superseded by a newer auth operation")]
    Superseded,
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::AlreadyRegistered(_) => Self::AlreadyRegistered,
            IdentityError::Rejected(message) | IdentityError::Network(message) => {
                Self::Rejected(message)
            }
            IdentityError::Unexpected(_) => Self::Unexpected,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::errors.
    use super::*;

    /// Validates the duplicate-registration mapping.
    ///
    /// Assertions:
    /// - Confirms the stable product message, regardless of what the backend
    ///   said.
    #[test]
    fn already_registered_maps_to_stable_message() {
        let err = AuthError::from(IdentityError::AlreadyRegistered(
            "User already registered".to_string(),
        ));

        assert_eq!(err, AuthError::AlreadyRegistered);
        assert_eq!(err.to_string(), "This email is already registered. Please login instead.");
    }

    /// Validates that backend rejections pass through verbatim.
    #[test]
    fn rejections_pass_through_verbatim() {
        let err = AuthError::from(IdentityError::Rejected("Invalid login credentials".into()));
        assert_eq!(err.to_string(), "Invalid login credentials");

        let err = AuthError::from(IdentityError::Network("connection refused".into()));
        assert_eq!(err.to_string(), "connection refused");
    }

    /// Validates normalization of unexpected gateway failures.
    #[test]
    fn unexpected_failures_are_normalized() {
        let err = AuthError::from(IdentityError::Unexpected("panic in serializer".into()));
        assert_eq!(err.to_string(), "An unexpected error occurred");
    }
}
