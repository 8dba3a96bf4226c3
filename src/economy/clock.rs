//! Time source abstraction and daily reset boundary math.
//!
//! All reset decisions go through a [`Clock`] so tests can walk a guild
//! across day boundaries deterministically instead of sleeping.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Injectable time source.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time. The only clock used outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests. Cloning shares the underlying instant, so a
/// test can hold one handle and advance time under a running service.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, delta: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += delta;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// Remaining time until the next reset boundary, floor semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetCountdown {
    pub hours: i64,
    pub minutes: i64,
}

/// The reset boundary governing `ts`: today's `reset_hour:00:00` if `ts`
/// has passed it, otherwise yesterday's. This is the normalization step
/// that makes mid-day boundaries work; plain calendar-date comparison
/// would misclassify timestamps between midnight and the boundary.
fn boundary_for(ts: DateTime<Utc>, reset_hour: u8) -> DateTime<Utc> {
    let hour = u32::from(reset_hour.min(23));
    let boundary = ts
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(ts);
    if ts < boundary {
        boundary - Duration::days(1)
    } else {
        boundary
    }
}

/// True when `now` sits in a later reset window than `last_reset`, i.e. the
/// energy pool has crossed at least one boundary since it last refilled.
pub fn needs_reset(last_reset: DateTime<Utc>, now: DateTime<Utc>, reset_hour: u8) -> bool {
    boundary_for(now, reset_hour) > boundary_for(last_reset, reset_hour)
}

/// Hours and minutes until the next boundary: today's `reset_hour` if still
/// ahead, else tomorrow's. Never negative.
pub fn time_until_next_reset(now: DateTime<Utc>, reset_hour: u8) -> ResetCountdown {
    let next = boundary_for(now, reset_hour) + Duration::days(1);
    let remaining = next - now;
    ResetCountdown {
        hours: remaining.num_hours(),
        minutes: remaining.num_minutes() % 60,
    }
}
