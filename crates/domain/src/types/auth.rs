//! Auth domain types
//!
//! Records issued by the identity backend (user, session), the
//! application-level profile row, and the request payloads the lifecycle
//! manager accepts. All of these cross the UI boundary, so they stay
//! serde-friendly and optionally export TypeScript bindings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

/// Identity record issued by the backend.
///
/// Owned by the identity backend; mirrored read-only into the session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Set once the user has confirmed their email address.
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    /// Sign-up metadata echoed back by the backend.
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl AuthUser {
    /// Whether the email-verification timestamp is set.
    #[must_use]
    pub const fn is_email_verified(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// Free-form metadata attached to the identity record at sign-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct UserMetadata {
    #[serde(default)]
    pub profile_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

/// Credential bundle issued by the backend on a successful sign-in.
///
/// The tokens are opaque to the lifecycle core; the bundle is replaced
/// wholesale on sign-in and cleared on sign-out. Inactivity expiry is a
/// separate, local policy and does not read `expires_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_type: String,
    /// Backend-side validity horizon, seconds since the epoch.
    #[serde(default)]
    #[cfg_attr(feature = "ts-gen", ts(type = "number | null"))]
    pub expires_at: Option<i64>,
}

/// What the backend hands back from sign-in/sign-up.
///
/// Confirmation-required backends return a user with no session; the caller
/// decides what to do with a partial grant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthGrant {
    pub user: Option<AuthUser>,
    pub session: Option<AuthSession>,
}

impl AuthGrant {
    /// True when the backend returned both identity and credentials.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.user.is_some() && self.session.is_some()
    }
}

/// Application-level user record, one row per `AuthUser::id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub profile_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for a profile row; timestamps are backend-assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: String,
    pub email: String,
    pub profile_name: String,
    pub date_of_birth: Option<NaiveDate>,
}

/// Sign-up command payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct SignUpRequest {
    pub profile_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

/// Profile edit payload. Accepted by the interface but not yet serviced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct ProfileUpdate {
    #[serde(default)]
    pub profile_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}
