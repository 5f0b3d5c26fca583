//! Wall-clock abstraction for token expiry bookkeeping
//!
//! Token lifetimes are tracked in whole epoch seconds, so the session layer
//! only needs "what time is it now". [`SystemClock`] reads the real clock;
//! [`MockClock`] lets tests move time forward without sleeping.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use weavelink_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::at_epoch_seconds(1_700_000_000);
//! clock.advance(Duration::from_secs(18));
//! assert_eq!(clock.epoch_seconds(), 1_700_000_018);
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Current time as whole seconds since the UNIX epoch.
    fn epoch_seconds(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Manually driven clock for deterministic tests.
///
/// Clones share the same time, so a test can hand one clone to the code under
/// test and keep another to advance it.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Clock frozen at the real current time.
    #[must_use]
    pub fn new() -> Self {
        Self { current: Arc::new(Mutex::new(Utc::now())) }
    }

    /// Clock frozen at the given epoch second.
    ///
    /// Out-of-range values fall back to the UNIX epoch.
    #[must_use]
    pub fn at_epoch_seconds(seconds: i64) -> Self {
        let start = Utc.timestamp_opt(seconds, 0).single().unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self { current: Arc::new(Mutex::new(start)) }
    }

    /// Moves the clock forward.
    pub fn advance(&self, duration: Duration) {
        let step = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        let mut current = self.current.lock();
        *current += step;
    }

    /// Jumps to an absolute time.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.current.lock() = at;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}
