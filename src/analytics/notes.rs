use std::collections::BTreeMap;

use serde::Serialize;

use super::{FollowUpBucket, FollowUpWindow};
use crate::clock::Clock;
use crate::dates::timestamp_day;
use crate::types::{Note, NoteStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteStats<'a> {
    pub total: usize,
    /// Only statuses that occur are present.
    pub status_count: BTreeMap<NoteStatus, usize>,
    pub today_created: usize,
    pub due_alerts: Vec<&'a Note>,
    pub upcoming_alerts: Vec<&'a Note>,
}

/// Compute dashboard stats for notes.
///
/// Alerts use the same due/upcoming windows as activity follow-ups, but only
/// notes in `em_andamento` or `cobranca` raise them, keyed on `alertDate`.
pub fn compute_note_stats<'a>(notes: &'a [Note], clock: &dyn Clock) -> NoteStats<'a> {
    let now = clock.now();
    let tz = now.timezone();
    let today = now.date_naive();
    let window = FollowUpWindow::new(today, tz);

    let mut status_count = BTreeMap::new();
    let mut today_created = 0;
    let mut due_alerts = Vec::new();
    let mut upcoming_alerts = Vec::new();

    for note in notes {
        *status_count.entry(note.status).or_insert(0) += 1;

        if timestamp_day(&note.created_at, tz) == Some(today) {
            today_created += 1;
        }

        if !note.status.raises_alerts() {
            continue;
        }
        let Some(alert_date) = note.alert_date.as_deref() else {
            continue;
        };
        match window.classify(alert_date) {
            Some(FollowUpBucket::Due) => due_alerts.push(note),
            Some(FollowUpBucket::Upcoming) => upcoming_alerts.push(note),
            None => {}
        }
    }

    NoteStats {
        total: notes.len(),
        status_count,
        today_created,
        due_alerts,
        upcoming_alerts,
    }
}
