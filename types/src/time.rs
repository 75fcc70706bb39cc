//! Timestamp type and the clock abstraction.
//!
//! Timestamps are Unix epoch milliseconds (UTC). Millisecond resolution keeps
//! "newest first" ordering stable when an admin regenerates a code twice
//! within the same second.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A Unix timestamp in milliseconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// This timestamp shifted forward by `duration`, saturating at `u64::MAX`.
    pub fn plus(&self, duration: Duration) -> Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Whether a deadline at this timestamp has been reached at `now`.
    ///
    /// The boundary counts as reached: a deadline equal to `now` is over.
    pub fn is_reached_at(&self, now: Timestamp) -> bool {
        now.0 >= self.0
    }

    /// Big-endian bytes, so byte order matches numeric order in LMDB keys.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Source of "now" for everything that evaluates expiry.
///
/// Production code uses [`SystemClock`]; tests swap in a controllable clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_adds_duration_in_millis() {
        let t = Timestamp::from_secs(10);
        assert_eq!(t.plus(Duration::from_secs(5)).as_millis(), 15_000);
        assert_eq!(t.plus(Duration::from_millis(1)).as_millis(), 10_001);
    }

    #[test]
    fn plus_saturates() {
        let t = Timestamp::from_millis(u64::MAX - 1);
        assert_eq!(t.plus(Duration::from_secs(60)).as_millis(), u64::MAX);
    }

    #[test]
    fn deadline_equal_to_now_is_reached() {
        let deadline = Timestamp::from_millis(1_000);
        assert!(!deadline.is_reached_at(Timestamp::from_millis(999)));
        assert!(deadline.is_reached_at(Timestamp::from_millis(1_000)));
        assert!(deadline.is_reached_at(Timestamp::from_millis(1_001)));
    }

    #[test]
    fn be_bytes_preserve_ordering() {
        let a = Timestamp::from_millis(255);
        let b = Timestamp::from_millis(256);
        assert!(a.to_be_bytes() < b.to_be_bytes());
    }

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now() > Timestamp::EPOCH);
    }
}
