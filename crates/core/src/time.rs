//! Time abstraction for testability
//!
//! Provides a trait-based approach to time operations so that
//! inactivity-expiry logic can be tested deterministically without relying on
//! actual time passage.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use hikayat_core::{Clock, MockClock, SystemClock};
//!
//! // Use system clock in production
//! let clock = SystemClock;
//! let now = clock.now_ms();
//!
//! // Use mock clock in tests
//! let mock = MockClock::new();
//! let start = mock.now_ms();
//! mock.advance(Duration::from_secs(5));
//! assert_eq!(mock.now_ms() - start, 5_000);
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Trait for time operations to enable testing
///
/// This trait provides an abstraction over wall-clock reads, allowing code
/// to work with either real system time or mocked time for testing.
pub trait Clock: Send + Sync {
    /// Get current system time (wall clock)
    fn system_time(&self) -> SystemTime;

    /// Get milliseconds since UNIX epoch
    ///
    /// Convenience method for getting the current time as signed milliseconds
    /// since the UNIX epoch, the unit activity timestamps are recorded in.
    fn now_ms(&self) -> i64 {
        self.system_time()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or_default()
    }
}

/// Real system clock implementation
///
/// This implementation uses the actual system clock for time operations.
/// Use this in production code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Mock clock for deterministic testing
///
/// This implementation allows you to control time in tests, making them
/// deterministic and fast. You can advance time manually without actually
/// waiting.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use hikayat_core::{Clock, MockClock};
///
/// let clock = MockClock::new();
/// let start = clock.now_ms();
///
/// // Simulate 31 days passing
/// clock.advance(Duration::from_secs(31 * 24 * 60 * 60));
///
/// assert_eq!(clock.now_ms() - start, 31 * 24 * 60 * 60 * 1000);
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    base_system_time: SystemTime,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a new mock clock
    ///
    /// The clock starts at the current real time but can be advanced
    /// manually without real time passing.
    #[must_use]
    pub fn new() -> Self {
        Self { base_system_time: SystemTime::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Advance the mock clock by a duration
    ///
    /// This simulates time passing without actually waiting. Clones of the
    /// clock share the same elapsed time.
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Set the mock clock to a specific elapsed time
    ///
    /// This sets the clock to an absolute elapsed time, replacing any
    /// previous elapsed time.
    pub fn set_elapsed(&self, duration: Duration) {
        *self.elapsed.lock() = duration;
    }

    /// Get the current elapsed time
    ///
    /// Returns how much time has been simulated since the clock was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn system_time(&self) -> SystemTime {
        self.base_system_time + *self.elapsed.lock()
    }
}
