// Time sources

use chrono::{Local, NaiveDateTime, Utc};
use std::cell::Cell;

/// Source of "now" for timestamps and deadline checks
pub trait Clock {
    /// Milliseconds since the Unix epoch, used for `created_at` / `updated_at`
    fn now_ms(&self) -> i64;

    /// Wall-clock local time, used for deadline checks and "today"
    fn now_local(&self) -> NaiveDateTime;
}

/// The machine clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        now_ms()
    }

    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock pinned to a given instant; `advance` moves it forward.
///
/// The local time is treated as UTC when converting to epoch milliseconds.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Cell::new(now) }
    }

    /// Pin the clock to `YYYY-MM-DDTHH:MM[:SS]`; `None` when malformed
    pub fn at(text: &str) -> Option<Self> {
        crate::form::parse_datetime(text).map(Self::new)
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now.get().and_utc().timestamp_millis()
    }

    fn now_local(&self) -> NaiveDateTime {
        self.now.get()
    }
}

// Helper function for timestamps
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000_000);
    }

    #[test]
    fn test_fixed_clock_advance() {
        let clock = FixedClock::at("2025-03-01T08:00").unwrap();
        let before = clock.now_ms();
        clock.advance(chrono::Duration::seconds(5));
        assert_eq!(clock.now_ms() - before, 5_000);
        assert_eq!(clock.now_local().to_string(), "2025-03-01 08:00:05");
    }

    #[test]
    fn test_fixed_clock_rejects_malformed_time() {
        assert!(FixedClock::at("01/03/2025").is_none());
        assert!(FixedClock::at("2025-03-01 08:00:30").is_some());
    }
}
