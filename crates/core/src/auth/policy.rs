//! Inactivity expiry policy
//!
//! A session is treated as void after 30 days without a recorded activity
//! update, independent of the backend's own token validity window.

use hikayat_domain::constants::SESSION_INACTIVITY_TIMEOUT_MS;
use hikayat_domain::SessionConfig;

/// Inactivity window after which a held session is treated as expired.
///
/// The comparison is a strict `>`: a session whose last activity is exactly
/// at the threshold is still valid. A session with no recorded activity
/// never expires under this policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactivityPolicy {
    timeout_ms: i64,
}

impl InactivityPolicy {
    /// Create a policy with an explicit timeout in milliseconds.
    #[must_use]
    pub const fn new(timeout_ms: i64) -> Self {
        Self { timeout_ms }
    }

    /// The configured timeout in milliseconds.
    #[must_use]
    pub const fn timeout_ms(&self) -> i64 {
        self.timeout_ms
    }

    /// Whether the inactivity window has elapsed.
    #[must_use]
    pub const fn is_expired(&self, last_activity_ts: Option<i64>, now_ms: i64) -> bool {
        match last_activity_ts {
            Some(ts) => now_ms - ts > self.timeout_ms,
            None => false,
        }
    }
}

impl Default for InactivityPolicy {
    fn default() -> Self {
        Self::new(SESSION_INACTIVITY_TIMEOUT_MS)
    }
}

impl From<&SessionConfig> for InactivityPolicy {
    fn from(config: &SessionConfig) -> Self {
        Self::new(config.inactivity_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::policy.
    use super::*;

    const THIRTY_DAYS_MS: i64 = 2_592_000_000;

    /// Validates that the default policy carries the product threshold.
    #[test]
    fn default_policy_is_thirty_days() {
        assert_eq!(InactivityPolicy::default().timeout_ms(), THIRTY_DAYS_MS);
    }

    /// Validates the no-activity case.
    ///
    /// Assertions:
    /// - Ensures a `None` activity timestamp never expires.
    #[test]
    fn no_recorded_activity_never_expires() {
        let policy = InactivityPolicy::default();

        assert!(!policy.is_expired(None, 0));
        assert!(!policy.is_expired(None, i64::MAX));
    }

    /// Validates the expiry boundary.
    ///
    /// Assertions:
    /// - Exactly the threshold is not expired.
    /// - One millisecond past the threshold is expired.
    #[test]
    fn boundary_is_exclusive() {
        let policy = InactivityPolicy::default();
        let last = 1_000_000;

        assert!(!policy.is_expired(Some(last), last + THIRTY_DAYS_MS));
        assert!(policy.is_expired(Some(last), last + THIRTY_DAYS_MS + 1));
    }

    /// Validates that the policy tracks a configured timeout.
    #[test]
    fn custom_timeout_from_session_config() {
        let config = SessionConfig { inactivity_timeout_ms: 1_000 };
        let policy = InactivityPolicy::from(&config);

        assert!(!policy.is_expired(Some(0), 1_000));
        assert!(policy.is_expired(Some(0), 1_001));
    }
}
