use std::collections::{BTreeMap, HashSet};

use chrono::{Days, NaiveDate};
use serde::Serialize;

use super::{FollowUpBucket, FollowUpWindow};
use crate::clock::Clock;
use crate::dates::{day_key, short_label, timestamp_day, DAY_KEY_FORMAT};
use crate::error::RegistroError;
use crate::status::is_charging_status;
use crate::types::Activity;

/// Activity count for one day of the trend chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendBucket {
    pub date_key: String,
    pub short_label: String,
    pub count: usize,
}

/// Derived dashboard numbers for an activity snapshot. Borrows the records
/// it lists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats<'a> {
    pub total_activities: usize,
    pub unique_categories: usize,
    pub today_activities: usize,
    pub current_streak: usize,
    pub longest_streak: usize,
    pub last_activity: Option<&'a Activity>,
    pub daily_trend: Vec<TrendBucket>,
    pub due_follow_ups: Vec<&'a Activity>,
    pub upcoming_follow_ups: Vec<&'a Activity>,
}

fn next_day_key(key: &str) -> Option<String> {
    NaiveDate::parse_from_str(key, DAY_KEY_FORMAT)
        .ok()?
        .succ_opt()
        .map(day_key)
}

/// Longest run of consecutive days in an ascending set of day keys.
fn longest_run<'k>(sorted_keys: impl Iterator<Item = &'k String>) -> usize {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<&String> = None;
    for key in sorted_keys {
        run = match previous.and_then(|p| next_day_key(p)) {
            Some(expected) if expected == *key => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(key);
    }
    longest
}

/// Compute dashboard stats for `activities`, which the caller keeps ordered
/// newest first.
///
/// `window_days` sets the length of `daily_trend` and must be at least 1.
/// Records with an unparseable `createdAt` are left out of the day-based
/// counts; ones with an unparseable `nextFollowUp` are left out of the
/// follow-up lists.
pub fn compute_activity_stats<'a>(
    activities: &'a [Activity],
    window_days: i64,
    clock: &dyn Clock,
) -> Result<ActivityStats<'a>, RegistroError> {
    if window_days < 1 {
        return Err(RegistroError::InvalidArgument(format!(
            "days must be a positive number, got {}",
            window_days
        )));
    }

    let now = clock.now();
    let tz = now.timezone();
    let today = now.date_naive();
    let today_key = day_key(today);

    // Activity count per creation day; BTreeMap keeps keys in day order.
    let mut per_day: BTreeMap<String, usize> = BTreeMap::new();
    for activity in activities {
        match timestamp_day(&activity.created_at, tz) {
            Some(day) => *per_day.entry(day_key(day)).or_default() += 1,
            None => log::debug!(
                "Skipping activity {} with unparseable createdAt '{}'",
                activity.id,
                activity.created_at
            ),
        }
    }

    let unique_categories = activities
        .iter()
        .filter_map(|a| a.category.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect::<HashSet<_>>()
        .len();

    let mut current_streak = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor {
        if !per_day.contains_key(&day_key(day)) {
            break;
        }
        current_streak += 1;
        cursor = day.pred_opt();
    }

    let longest_streak = longest_run(per_day.keys());

    let window = FollowUpWindow::new(today, tz);
    let mut due_follow_ups = Vec::new();
    let mut upcoming_follow_ups = Vec::new();
    for activity in activities {
        if !is_charging_status(activity.status.as_deref()) {
            continue;
        }
        let Some(follow_up) = activity.next_follow_up.as_deref() else {
            continue;
        };
        match window.classify(follow_up) {
            Some(FollowUpBucket::Due) => due_follow_ups.push(activity),
            Some(FollowUpBucket::Upcoming) => upcoming_follow_ups.push(activity),
            None => {}
        }
    }

    // Walk back from today and stop at the first day the calendar can't hold.
    let mut days: Vec<NaiveDate> = (0..window_days as u64)
        .map_while(|offset| today.checked_sub_days(Days::new(offset)))
        .collect();
    days.reverse();

    let daily_trend = days
        .into_iter()
        .map(|day| {
            let date_key = day_key(day);
            let count = per_day.get(&date_key).copied().unwrap_or(0);
            TrendBucket {
                short_label: short_label(day),
                date_key,
                count,
            }
        })
        .collect();

    Ok(ActivityStats {
        total_activities: activities.len(),
        unique_categories,
        today_activities: per_day.get(&today_key).copied().unwrap_or(0),
        current_streak,
        longest_streak,
        last_activity: activities.first(),
        daily_trend,
        due_follow_ups,
        upcoming_follow_ups,
    })
}
