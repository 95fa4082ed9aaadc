//! Record lifecycle: how drafts become stored activities and notes, and how
//! edits merge into existing ones.
//!
//! Storage, id generation and timestamps belong to the repository; these
//! functions receive the id and "now" and return the record to persist.

use std::fs;
use std::path::Path;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::de::DeserializeOwned;

use crate::categories::{keys, CategoryDefinition};
use crate::describe::{describe, describe_with_schema};
use crate::error::RegistroError;
use crate::reconcile::FormState;
use crate::types::{Activity, ActivityDraft, Note, NoteDraft};

/// Source of activity snapshots, newest first.
pub trait ActivityRepository {
    fn activities(&self) -> Vec<Activity>;
}

/// Source of note snapshots, newest first.
pub trait NoteRepository {
    fn notes(&self) -> Vec<Note>;
}

impl ActivityRepository for Vec<Activity> {
    fn activities(&self) -> Vec<Activity> {
        self.clone()
    }
}

impl NoteRepository for Vec<Note> {
    fn notes(&self) -> Vec<Note> {
        self.clone()
    }
}

/// Read a JSON array snapshot of records, newest first.
pub fn load_snapshot<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, RegistroError> {
    let content = fs::read_to_string(path)?;
    let records: Vec<T> = serde_json::from_str(&content)
        .map_err(|e| RegistroError::parse(path.display().to_string(), e))?;
    log::debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn trimmed_or_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ActivityDraft {
    /// Build the draft an activity form submits.
    ///
    /// The description is derived from the fields in form order, falling back
    /// to the category name. Empty field maps are not stored.
    pub fn from_form(state: &FormState, schema: Option<&CategoryDefinition>) -> Self {
        let category_name = schema.map(|s| s.name.as_str());
        Self {
            description: match schema {
                Some(schema) => describe_with_schema(&state.fields, schema),
                None => describe(&state.fields, None),
            },
            category: category_name.map(str::to_string),
            category_id: non_empty(&state.category_id),
            status: state.status.clone(),
            status_updated_at: state.status_updated_at.clone(),
            next_follow_up: state.next_follow_up.clone(),
            fields: if state.fields.is_empty() {
                None
            } else {
                Some(state.fields.clone())
            },
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// A new activity from a draft. A status without a date is stamped `now`.
pub fn new_activity(draft: ActivityDraft, id: impl Into<String>, now: DateTime<Tz>) -> Activity {
    let now_iso = now.to_rfc3339();
    let status_updated_at = match &draft.status {
        Some(_) => draft.status_updated_at.or_else(|| Some(now_iso.clone())),
        None => None,
    };
    Activity {
        id: id.into(),
        description: draft.description.trim().to_string(),
        category: trimmed_or_none(draft.category.as_deref()),
        category_id: draft.category_id,
        status: draft.status,
        status_updated_at,
        next_follow_up: draft.next_follow_up,
        fields: draft.fields,
        created_at: now_iso,
    }
}

/// Merge an edit into a stored activity.
///
/// Absent draft values keep the stored ones, except `category`, which is
/// replaced. An explicit status-change date wins; otherwise a changed status
/// is stamped `now`.
pub fn update_activity(existing: &Activity, draft: ActivityDraft, now: DateTime<Tz>) -> Activity {
    let status_changed = draft
        .status
        .as_deref()
        .is_some_and(|s| !s.is_empty() && existing.status.as_deref() != Some(s));
    let status_updated_at = match draft.status_updated_at {
        Some(stamp) => Some(stamp),
        None if status_changed => Some(now.to_rfc3339()),
        None => existing.status_updated_at.clone(),
    };

    Activity {
        id: existing.id.clone(),
        description: draft.description.trim().to_string(),
        category: trimmed_or_none(draft.category.as_deref()),
        category_id: draft.category_id.or_else(|| existing.category_id.clone()),
        status: draft.status.or_else(|| existing.status.clone()),
        status_updated_at,
        next_follow_up: draft
            .next_follow_up
            .or_else(|| existing.next_follow_up.clone()),
        fields: draft.fields.or_else(|| existing.fields.clone()),
        created_at: existing.created_at.clone(),
    }
}

/// Move an activity's follow-up to `date`, keeping the mirrored field in sync.
pub fn reschedule_activity(activity: &Activity, date: &str) -> Activity {
    let mut fields = activity.fields.clone().unwrap_or_default();
    fields.insert(keys::NEXT_FOLLOW_UP.to_string(), date.to_string());
    Activity {
        next_follow_up: Some(date.to_string()),
        fields: Some(fields),
        ..activity.clone()
    }
}

pub fn new_note(draft: NoteDraft, id: impl Into<String>, now: DateTime<Tz>) -> Note {
    let now_iso = now.to_rfc3339();
    Note {
        id: id.into(),
        date: draft.date,
        name: draft.name,
        status: draft.status,
        close_date: draft.close_date,
        description: draft.description,
        alert_date: draft.alert_date,
        status_updated_at: draft.status_updated_at.or_else(|| Some(now_iso.clone())),
        created_at: now_iso,
    }
}

/// Replace a note's content with `draft`. A status change is always stamped
/// `now`, even when the draft carries a date.
pub fn update_note(existing: &Note, draft: NoteDraft, now: DateTime<Tz>) -> Note {
    let status_updated_at = if draft.status != existing.status {
        Some(now.to_rfc3339())
    } else {
        draft
            .status_updated_at
            .or_else(|| existing.status_updated_at.clone())
    };
    Note {
        id: existing.id.clone(),
        date: draft.date,
        name: draft.name,
        status: draft.status,
        close_date: draft.close_date,
        description: draft.description,
        alert_date: draft.alert_date,
        status_updated_at,
        created_at: existing.created_at.clone(),
    }
}

pub fn reschedule_note(note: &Note, date: &str) -> Note {
    Note {
        alert_date: Some(date.to_string()),
        ..note.clone()
    }
}
