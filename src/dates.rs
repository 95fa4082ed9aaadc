//! Day keys and tolerant date parsing.
//!
//! All day comparisons go through canonical `YYYY-MM-DD` keys; lexical order
//! on that format equals chronological order, so callers compare strings.
//!
//! Accepted inputs, in order:
//! 1. RFC 3339 timestamps (`2024-03-15T10:00:00.000Z`), converted into `tz`
//! 2. Offset-less date-times (`2024-03-15T10:00:00`), taken as local wall time
//! 3. Bare dates (`2024-03-15`), taken as that local day
//!
//! Anything else yields `None`; callers treat that as "field absent".

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";
const SHORT_LABEL_FORMAT: &str = "%d/%m";
const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";
const DISPLAY_TIMESTAMP_FORMAT: &str = "%d/%m/%Y as %H:%M";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

/// "dd/MM" label used under trend bars.
pub fn short_label(date: NaiveDate) -> String {
    date.format(SHORT_LABEL_FORMAT).to_string()
}

enum Parsed {
    Instant(DateTime<Tz>),
    LocalDateTime(NaiveDateTime),
    Day(NaiveDate),
}

fn parse_any(value: &str, tz: Tz) -> Option<Parsed> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(Parsed::Instant(dt.with_timezone(&tz)));
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Parsed::LocalDateTime(naive));
        }
    }

    NaiveDate::parse_from_str(value, DAY_KEY_FORMAT)
        .ok()
        .map(Parsed::Day)
}

/// Calendar day a stored timestamp falls on, seen from `tz`.
pub fn timestamp_day(value: &str, tz: Tz) -> Option<NaiveDate> {
    match parse_any(value, tz)? {
        Parsed::Instant(dt) => Some(dt.date_naive()),
        Parsed::LocalDateTime(naive) => Some(naive.date()),
        Parsed::Day(day) => Some(day),
    }
}

/// Day key of a follow-up or alert date, `None` when unparseable.
pub fn follow_up_key(value: &str, tz: Tz) -> Option<String> {
    timestamp_day(value, tz).map(day_key)
}

fn local_instant(value: &str, tz: Tz) -> Option<DateTime<Tz>> {
    match parse_any(value, tz)? {
        Parsed::Instant(dt) => Some(dt),
        Parsed::LocalDateTime(naive) => tz.from_local_datetime(&naive).earliest(),
        Parsed::Day(day) => tz
            .from_local_datetime(&day.and_time(chrono::NaiveTime::MIN))
            .earliest(),
    }
}

/// Render a record timestamp as `dd/MM/yyyy as HH:mm`.
///
/// Unparseable input is returned unchanged so a corrupt record still shows
/// something.
pub fn format_record_timestamp(value: &str, tz: Tz) -> String {
    match local_instant(value, tz) {
        Some(dt) => dt.format(DISPLAY_TIMESTAMP_FORMAT).to_string(),
        None => {
            log::warn!("Failed to format record timestamp '{}'", value);
            value.to_string()
        }
    }
}

/// Render a date as `dd/MM/yyyy`; empty for missing values.
pub fn format_date_display(value: Option<&str>, tz: Tz) -> String {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return String::new();
    };
    match timestamp_day(value, tz) {
        Some(day) => day.format(DISPLAY_DATE_FORMAT).to_string(),
        None => {
            log::warn!("Failed to format date for display '{}'", value);
            value.to_string()
        }
    }
}

/// Normalize any accepted date value to a day key, or empty string.
pub fn to_input_date(value: Option<&str>, tz: Tz) -> String {
    value
        .and_then(|v| timestamp_day(v, tz))
        .map(day_key)
        .unwrap_or_default()
}

/// Day key `days` after `value`, or empty string when `value` is unparseable.
pub fn add_days_input(value: &str, days: i64, tz: Tz) -> String {
    timestamp_day(value, tz)
        .and_then(|day| day.checked_add_signed(Duration::days(days)))
        .map(day_key)
        .unwrap_or_default()
}
