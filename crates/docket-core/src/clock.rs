//! Injectable wall clock.
//!
//! Repositories never call `Utc::now()` directly so tests can pin or step
//! time and observe `createdAt`/`updatedAt` exactly.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Start at a given millisecond timestamp.
    ///
    /// Out-of-range values fall back to the Unix epoch.
    #[must_use]
    pub fn at_millis(ms: i64) -> Self {
        Self::new(DateTime::from_timestamp_millis(ms).unwrap_or_default())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Next creation-derived identifier: `max(now_ms, last + 1)`.
///
/// Keeps identifiers tied to the creation millisecond while staying unique
/// when several records are created within one millisecond or the wall
/// clock steps backwards.
#[must_use]
pub fn next_monotonic_millis(now: DateTime<Utc>, last: Option<i64>) -> i64 {
    let now_ms = now.timestamp_millis();
    last.map_or(now_ms, |last| now_ms.max(last.saturating_add(1)))
}
