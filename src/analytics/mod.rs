//! Dashboard analytics over record snapshots.
//!
//! Both engines are pure passes over a caller-supplied slice: they read the
//! clock once, compare canonical day keys lexically, and silently skip
//! records whose dates do not parse.

pub mod activity;
pub mod notes;

pub use activity::{compute_activity_stats, ActivityStats, TrendBucket};
pub use notes::{compute_note_stats, NoteStats};

use chrono::{Days, NaiveDate};
use chrono_tz::Tz;

use crate::dates::{day_key, follow_up_key};

/// Follow-ups up to this many days ahead count as upcoming.
pub const UPCOMING_WINDOW_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUpBucket {
    /// On or before today.
    Due,
    /// After today, within the upcoming window.
    Upcoming,
}

/// Day-key bounds for sorting follow-up dates into due and upcoming.
#[derive(Debug, Clone)]
pub struct FollowUpWindow {
    tz: Tz,
    today_key: String,
    limit_key: String,
}

impl FollowUpWindow {
    pub fn new(today: NaiveDate, tz: Tz) -> Self {
        let limit = today
            .checked_add_days(Days::new(UPCOMING_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MAX);
        Self {
            tz,
            today_key: day_key(today),
            limit_key: day_key(limit),
        }
    }

    /// Bucket for a raw follow-up value; `None` when it is blank, unparseable
    /// or beyond the window.
    pub fn classify(&self, raw: &str) -> Option<FollowUpBucket> {
        let Some(key) = follow_up_key(raw, self.tz) else {
            if !raw.trim().is_empty() {
                log::debug!("Skipping unparseable follow-up date '{}'", raw);
            }
            return None;
        };
        if key <= self.today_key {
            Some(FollowUpBucket::Due)
        } else if key <= self.limit_key {
            Some(FollowUpBucket::Upcoming)
        } else {
            None
        }
    }
}
