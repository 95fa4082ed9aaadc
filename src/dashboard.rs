// Dashboard service
// Composes activity/note analytics and the category summary into the single
// payload the overview screen renders.

use std::collections::HashMap;

use serde::Serialize;

use crate::analytics::{compute_activity_stats, compute_note_stats, ActivityStats, NoteStats};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::RegistroError;
use crate::types::{Activity, Note};

const UNCATEGORIZED_KEY: &str = "sem categoria";
const UNCATEGORIZED_LABEL: &str = "Sem categoria";

/// Grouping key for a free-text category name.
pub fn normalize_category_label(category: Option<&str>) -> String {
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => c.to_lowercase(),
        None => UNCATEGORIZED_KEY.to_string(),
    }
}

/// Display form of a free-text category name.
pub fn display_category_label(category: Option<&str>) -> String {
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => c.to_string(),
        None => UNCATEGORIZED_LABEL.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// Activities per category, most used first.
///
/// Names differing only in case or surrounding spaces are grouped; the label
/// shown is the spelling seen last. Ties keep first-seen order.
pub fn category_summary(activities: &[Activity]) -> Vec<CategoryCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut summary: Vec<CategoryCount> = Vec::new();

    for activity in activities {
        let key = normalize_category_label(activity.category.as_deref());
        let label = display_category_label(activity.category.as_deref());
        match index.get(&key) {
            Some(&i) => {
                summary[i].count += 1;
                summary[i].label = label;
            }
            None => {
                index.insert(key, summary.len());
                summary.push(CategoryCount { label, count: 1 });
            }
        }
    }

    summary.sort_by(|a, b| b.count.cmp(&a.count));
    summary
}

/// Everything the overview screen shows, borrowed from the snapshots.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard<'a> {
    /// No activities and no notes yet; the screen shows an empty state.
    pub is_empty: bool,
    pub activity_stats: ActivityStats<'a>,
    pub note_stats: NoteStats<'a>,
    pub top_categories: Vec<CategoryCount>,
    /// Categories beyond `top_categories`.
    pub more_categories: usize,
    pub recent_activities: &'a [Activity],
    /// Highest daily count in the trend, for scaling bars.
    pub trend_max: usize,
}

pub fn build_dashboard<'a>(
    activities: &'a [Activity],
    notes: &'a [Note],
    config: &Config,
    clock: &dyn Clock,
) -> Result<Dashboard<'a>, RegistroError> {
    let activity_stats = compute_activity_stats(activities, config.trend_days, clock)?;
    let note_stats = compute_note_stats(notes, clock);

    let mut top_categories = category_summary(activities);
    let more_categories = top_categories.len().saturating_sub(config.category_limit);
    top_categories.truncate(config.category_limit);

    let trend_max = activity_stats
        .daily_trend
        .iter()
        .map(|b| b.count)
        .max()
        .unwrap_or(0);

    let recent = activities.len().min(config.recent_limit);

    Ok(Dashboard {
        is_empty: activities.is_empty() && notes.is_empty(),
        activity_stats,
        note_stats,
        top_categories,
        more_categories,
        recent_activities: &activities[..recent],
        trend_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::types::NoteStatus;

    fn activity(id: &str, category: Option<&str>, created_at: &str) -> Activity {
        Activity {
            id: id.into(),
            description: id.into(),
            category: category.map(str::to_string),
            category_id: None,
            status: None,
            status_updated_at: None,
            next_follow_up: None,
            fields: None,
            created_at: created_at.into(),
        }
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(normalize_category_label(Some("  Telefonia ")), "telefonia");
        assert_eq!(normalize_category_label(Some("  ")), "sem categoria");
        assert_eq!(normalize_category_label(None), "sem categoria");
        assert_eq!(display_category_label(Some(" Telefonia ")), "Telefonia");
        assert_eq!(display_category_label(None), "Sem categoria");
    }

    #[test]
    fn test_category_summary_groups_and_sorts() {
        let ts = "2024-03-15T09:00:00Z";
        let activities = vec![
            activity("a", Some("Chamados"), ts),
            activity("b", None, ts),
            activity("c", Some("telefonia"), ts),
            activity("d", Some(" Telefonia"), ts),
            activity("e", Some(""), ts),
            activity("f", Some("Telefonia"), ts),
        ];
        let summary = category_summary(&activities);
        assert_eq!(
            summary,
            vec![
                CategoryCount { label: "Telefonia".into(), count: 3 },
                CategoryCount { label: "Sem categoria".into(), count: 2 },
                CategoryCount { label: "Chamados".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_empty_dashboard() {
        let clock = FixedClock::utc_noon(2024, 3, 15);
        let dash = build_dashboard(&[], &[], &Config::default(), &clock).unwrap();
        assert!(dash.is_empty);
        assert_eq!(dash.activity_stats.daily_trend.len(), 7);
        assert_eq!(dash.trend_max, 0);
        assert!(dash.recent_activities.is_empty());
    }

    #[test]
    fn test_dashboard_limits() {
        let clock = FixedClock::utc_noon(2024, 3, 15);
        let activities: Vec<Activity> = (0..8)
            .map(|i| {
                let cat = format!("Cat {}", i);
                activity(&format!("a{}", i), Some(&cat), "2024-03-15T09:00:00Z")
            })
            .collect();
        let notes = vec![Note {
            id: "n1".into(),
            date: "2024-03-15".into(),
            name: "Nota".into(),
            status: NoteStatus::Cobranca,
            close_date: None,
            description: String::new(),
            alert_date: Some("2024-03-15".into()),
            status_updated_at: None,
            created_at: "2024-03-15T09:00:00Z".into(),
        }];

        let config = Config {
            trend_days: 3,
            ..Config::default()
        };
        let dash = build_dashboard(&activities, &notes, &config, &clock).unwrap();
        assert!(!dash.is_empty);
        assert_eq!(dash.top_categories.len(), 6);
        assert_eq!(dash.more_categories, 2);
        assert_eq!(dash.recent_activities.len(), 5);
        assert_eq!(dash.recent_activities[0].id, "a0");
        assert_eq!(dash.activity_stats.daily_trend.len(), 3);
        assert_eq!(dash.trend_max, 8);
        assert_eq!(dash.note_stats.due_alerts.len(), 1);
    }

    #[test]
    fn test_dashboard_propagates_invalid_window() {
        let clock = FixedClock::utc_noon(2024, 3, 15);
        let config = Config {
            trend_days: 0,
            ..Config::default()
        };
        let result = build_dashboard(&[], &[], &config, &clock);
        assert!(matches!(result, Err(RegistroError::InvalidArgument(_))));
    }
}
