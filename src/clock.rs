//! Injectable source of "now".
//!
//! Every operation that needs today's date takes a `&dyn Clock` and reads it
//! once, so a single reconciliation or stats pass sees one consistent instant.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub trait Clock {
    fn now(&self) -> DateTime<Tz>;

    /// Calendar day of `now()` in the clock's timezone.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock projected into a configured timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }
}

/// A clock pinned to one instant. Used by tests and by replays of a past day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Tz>,
}

impl FixedClock {
    pub fn new(now: DateTime<Tz>) -> Self {
        Self { now }
    }

    /// Pin to a local wall-clock time. Returns `None` when the time falls in
    /// a DST gap of `tz`.
    pub fn from_local(tz: Tz, local: NaiveDateTime) -> Option<Self> {
        tz.from_local_datetime(&local).earliest().map(Self::new)
    }

    /// Noon UTC on the given day, the usual fixture in tests.
    #[cfg(test)]
    pub(crate) fn utc_noon(year: i32, month: u32, day: u32) -> Self {
        let now = Tz::UTC
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .expect("valid fixture date");
        Self::new(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        self.now
    }
}
