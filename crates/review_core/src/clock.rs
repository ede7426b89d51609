//! Time source injected into managers that stamp creation dates.
//!
//! # Invariants
//! - Returned instants are truncated to millisecond precision, matching
//!   what the store persists.

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Supplies the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Wall clock backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        truncate_to_millis(Utc::now())
    }
}

/// Clock that hands out a preset instant, advancing by a fixed step per call.
///
/// The step is truncated to whole milliseconds; a zero step yields the same
/// instant every time. The clock stops advancing at the end of the
/// representable range.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: chrono::Duration,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: chrono::Duration) -> Self {
        Self {
            next: Mutex::new(truncate_to_millis(start)),
            step: chrono::Duration::milliseconds(step.num_milliseconds()),
        }
    }

    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::new(at, chrono::Duration::zero())
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self
            .next
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let current = *next;
        *next = current.checked_add_signed(self.step).unwrap_or(current);
        current
    }
}

/// Drops sub-millisecond precision.
pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}
