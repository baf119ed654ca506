use std::sync::atomic::{AtomicI64, Ordering};

use time::OffsetDateTime;

use crate::state::EpochMillis;

/// Source of wall-clock instants for the session.
pub trait Clock: Send + Sync {
    /// Current instant in milliseconds since the Unix epoch.
    fn now(&self) -> EpochMillis;
}

/// Reads the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> EpochMillis {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        EpochMillis::try_from(millis).unwrap_or(EpochMillis::MAX)
    }
}

/// Clock that only moves when told to; used to replay timing scenarios.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Clock frozen at `start`.
    pub fn new(start: EpochMillis) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Jump to `now`; may move backwards.
    pub fn set(&self, now: EpochMillis) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `millis`.
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> EpochMillis {
        self.now.load(Ordering::SeqCst)
    }
}
