//! Application constants
//!
//! Centralized location for the domain-level constants used throughout the
//! auth core.

// Session policy
pub const SESSION_INACTIVITY_TIMEOUT_MS: i64 = 30 * 24 * 60 * 60 * 1000;

// Credential store
pub const SESSION_STORAGE_KEY: &str = "@hikayat:auth_session";
pub const KEYCHAIN_SERVICE: &str = "com.hikayat.ledger";

// Backend
pub const PROFILES_TABLE: &str = "profiles";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
