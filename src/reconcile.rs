//! Form-state reconciliation for category-driven records.
//!
//! Editors keep a [`FormState`] and, after every edit or category switch,
//! replace it with the output of [`reconcile`]. The output is a fixed point:
//! reconciling it again with the same schema and day returns it unchanged,
//! so calling it on every keystroke cannot oscillate.
//!
//! The special storage keys (see [`keys`]) tie the field map to the
//! top-level status, status-change date and next follow-up date:
//! - a status makes `statusUpdatedAt` non-empty, stamped with today on change
//! - a charging status (see [`is_charging_status`]) makes `nextFollowUp`
//!   non-empty, defaulting to today
//! - no status clears both dates and their mirrored fields

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::categories::{keys, CategoryDefinition, CategoryField, FieldType};
use crate::clock::Clock;
use crate::dates::day_key;
use crate::status::is_charging_status;
use crate::types::{Activity, FieldMap};

/// Editable state of an activity form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    /// Empty when no category is selected.
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_follow_up: Option<String>,
}

impl FormState {
    /// Seed an editor from a stored activity.
    pub fn from_activity(activity: &Activity) -> Self {
        Self {
            category_id: activity.category_id.clone().unwrap_or_default(),
            fields: activity.fields.clone().unwrap_or_default(),
            status: activity.status.clone(),
            status_updated_at: activity.status_updated_at.clone(),
            next_follow_up: activity.next_follow_up.clone(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Bring `current` in line with `schema`.
///
/// With no schema the whole state is cleared. Otherwise every schema field is
/// materialized in schema order, then the top-level status and dates are
/// derived from the materialized `status` field. Fields not in the schema
/// are dropped.
pub fn reconcile(
    current: &FormState,
    schema: Option<&CategoryDefinition>,
    clock: &dyn Clock,
) -> FormState {
    let Some(schema) = schema else {
        return FormState::default();
    };
    let today = day_key(clock.today());

    let mut fields = FieldMap::new();
    for field in &schema.fields {
        let existing = current.fields.get(&field.key).cloned();
        let mut value = match field.key.as_str() {
            keys::STATUS => existing
                .or_else(|| current.status.clone())
                .or_else(|| field.first_option_value().map(str::to_string)),
            keys::STATUS_UPDATED => current
                .status_updated_at
                .clone()
                .or(existing)
                .or_else(|| Some(today.clone())),
            keys::NEXT_FOLLOW_UP => current.next_follow_up.clone().or(existing),
            keys::CREATED_ON => existing
                .filter(|v| !v.is_empty())
                .or_else(|| Some(today.clone())),
            _ => existing,
        };

        if field.read_only && value.as_deref().map_or(true, str::is_empty) {
            value = Some(if field.field_type == FieldType::Date {
                today.clone()
            } else {
                String::new()
            });
        }

        fields.insert(field.key.clone(), value.unwrap_or_default());
    }

    let status = fields.get(keys::STATUS).and_then(|s| non_empty(s));

    let status_updated_at = match &status {
        Some(s) => {
            let unchanged = current.status.as_deref() == Some(s.as_str());
            let stamped = match &current.status_updated_at {
                Some(prev) if !prev.is_empty() && unchanged => prev.clone(),
                _ => today.clone(),
            };
            if let Some(v) = fields.get_mut(keys::STATUS_UPDATED) {
                v.clone_from(&stamped);
            }
            Some(stamped)
        }
        None => {
            if let Some(v) = fields.get_mut(keys::STATUS_UPDATED) {
                v.clear();
            }
            None
        }
    };

    let next_follow_up = if status.is_some() && is_charging_status(status.as_deref()) {
        let follow_up = fields
            .get(keys::NEXT_FOLLOW_UP)
            .and_then(|v| non_empty(v))
            .unwrap_or_else(|| today.clone());
        if let Some(v) = fields.get_mut(keys::NEXT_FOLLOW_UP) {
            v.clone_from(&follow_up);
        }
        Some(follow_up)
    } else {
        if let Some(v) = fields.get_mut(keys::NEXT_FOLLOW_UP) {
            v.clear();
        }
        None
    };

    FormState {
        category_id: schema.id.clone(),
        fields,
        status,
        status_updated_at,
        next_follow_up,
    }
}

/// State after the user picks a category: everything from the previous
/// category is dropped, then the new schema's defaults are materialized.
pub fn select_category(schema: Option<&CategoryDefinition>, clock: &dyn Clock) -> FormState {
    let base = FormState {
        category_id: schema.map(|s| s.id.clone()).unwrap_or_default(),
        ..FormState::default()
    };
    reconcile(&base, schema, clock)
}

fn number_filter_regex() -> &'static Regex {
    static NUMBER_FILTER_RE: OnceLock<Regex> = OnceLock::new();
    NUMBER_FILTER_RE
        .get_or_init(|| Regex::new(r"[^0-9-]").expect("number filter regex should compile"))
}

/// Apply one user edit to the form.
///
/// Unknown and read-only fields are ignored. Number fields keep only digits
/// and '-'. Editing `status` stamps the status date and opens or closes the
/// follow-up; editing `proxima_cobranca` moves the follow-up. The result is
/// not reconciled; callers pass it through [`reconcile`] next.
pub fn apply_field_edit(
    current: &FormState,
    schema: &CategoryDefinition,
    key: &str,
    raw_value: &str,
    clock: &dyn Clock,
) -> FormState {
    let Some(field) = schema.field(key) else {
        return current.clone();
    };
    if field.read_only {
        return current.clone();
    }

    let value = if field.field_type == FieldType::Number {
        number_filter_regex().replace_all(raw_value, "").into_owned()
    } else {
        raw_value.to_string()
    };

    let mut next = current.clone();
    next.fields.insert(key.to_string(), value.clone());

    if key == keys::STATUS {
        let today = day_key(clock.today());
        next.status = non_empty(&value);
        if next.status.is_some() {
            next.status_updated_at = Some(today.clone());
            next.fields
                .insert(keys::STATUS_UPDATED.to_string(), today.clone());
            if is_charging_status(next.status.as_deref()) {
                let follow_up = current
                    .next_follow_up
                    .clone()
                    .filter(|v| !v.is_empty())
                    .unwrap_or(today);
                next.fields
                    .insert(keys::NEXT_FOLLOW_UP.to_string(), follow_up.clone());
                next.next_follow_up = Some(follow_up);
            } else {
                if let Some(v) = next.fields.get_mut(keys::NEXT_FOLLOW_UP) {
                    v.clear();
                }
                next.next_follow_up = None;
            }
        } else {
            next.status_updated_at = None;
            if let Some(v) = next.fields.get_mut(keys::STATUS_UPDATED) {
                v.clear();
            }
            if let Some(v) = next.fields.get_mut(keys::NEXT_FOLLOW_UP) {
                v.clear();
            }
            next.next_follow_up = None;
        }
    }

    if key == keys::NEXT_FOLLOW_UP {
        next.next_follow_up = non_empty(&value);
    }

    next
}

/// Whether an editor should show `field` given the current values.
///
/// Hidden fields keep their stored values.
pub fn is_field_visible(field: &CategoryField, values: &FieldMap) -> bool {
    match &field.depends_on {
        None => true,
        Some(dep) => dep.is_satisfied_by(values.get(&dep.field_key).map(String::as_str)),
    }
}

/// A field is required when the schema says so, and `proxima_cobranca` is
/// required while the status is a charging one.
pub fn is_field_required(field: &CategoryField, state: &FormState) -> bool {
    field.required
        || (field.key == keys::NEXT_FOLLOW_UP && is_charging_status(state.status.as_deref()))
}

/// Schema fields in editor order: `status` first, the rest as defined.
pub fn ordered_fields(schema: &CategoryDefinition) -> Vec<&CategoryField> {
    let (status, others): (Vec<&CategoryField>, Vec<&CategoryField>) = schema
        .fields
        .iter()
        .partition(|f| f.key == keys::STATUS);
    status.into_iter().chain(others).collect()
}

/// Fields an editor renders right now, in editor order.
pub fn visible_fields<'a>(
    schema: &'a CategoryDefinition,
    values: &FieldMap,
) -> Vec<&'a CategoryField> {
    ordered_fields(schema)
        .into_iter()
        .filter(|f| is_field_visible(f, values))
        .collect()
}

/// Display label of a select value, if `field` has such an option.
pub fn select_option_label<'a>(field: &'a CategoryField, value: Option<&str>) -> Option<&'a str> {
    match value {
        Some(v) if !v.is_empty() => field.option_label(v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::{CategoryRegistry, SchemaRegistry};
    use crate::clock::FixedClock;

    const TODAY: &str = "2024-03-15";

    fn clock() -> FixedClock {
        FixedClock::utc_noon(2024, 3, 15)
    }

    fn registry() -> CategoryRegistry {
        CategoryRegistry::with_defaults().expect("defaults should load")
    }

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn assert_invariants(out: &FormState) {
        if is_charging_status(out.status.as_deref()) {
            assert!(
                out.next_follow_up.as_deref().is_some_and(|v| !v.is_empty()),
                "charging status without follow-up: {:?}",
                out
            );
        }
        if out.status.is_none() {
            assert!(out.status_updated_at.is_none());
            assert!(out.next_follow_up.is_none());
            for key in [keys::STATUS_UPDATED, keys::NEXT_FOLLOW_UP] {
                if let Some(v) = out.fields.get(key) {
                    assert_eq!(v, "", "{} should be cleared: {:?}", key, out);
                }
            }
        }
    }

    /// A spread of messy states to throw at each default category.
    fn sample_states(category_id: &str) -> Vec<FormState> {
        vec![
            FormState::default(),
            FormState {
                category_id: category_id.into(),
                ..FormState::default()
            },
            FormState {
                category_id: category_id.into(),
                fields: fields(&[("status", ""), ("nome", "Ana")]),
                status: Some("cobranca".into()),
                status_updated_at: Some("2024-01-01".into()),
                next_follow_up: Some("".into()),
            },
            FormState {
                category_id: category_id.into(),
                fields: fields(&[("status", "cobranca"), ("proxima_cobranca", "")]),
                status: Some("finalizado".into()),
                status_updated_at: None,
                next_follow_up: None,
            },
            FormState {
                category_id: category_id.into(),
                fields: fields(&[
                    ("status", "em_andamento_custom"),
                    ("status_modificado", "2024-02-02"),
                    ("data_criacao", "2023-12-31"),
                    ("unrelated", "x"),
                ]),
                status: Some("em_andamento_custom".into()),
                status_updated_at: Some("2024-02-02".into()),
                next_follow_up: Some("2024-04-01".into()),
            },
            FormState {
                category_id: category_id.into(),
                fields: fields(&[("status", "finalizado"), ("proxima_cobranca", "2024-03-20")]),
                status: None,
                status_updated_at: Some("".into()),
                next_follow_up: Some("2024-03-20".into()),
            },
            FormState {
                category_id: category_id.into(),
                fields: fields(&[("ano", "2024"), ("nome", "  ")]),
                status: Some("cobranca_por_atendimento".into()),
                status_updated_at: None,
                next_follow_up: None,
            },
        ]
    }

    #[test]
    fn test_absent_schema_clears_everything() {
        let current = FormState {
            category_id: "cat_gone".into(),
            fields: fields(&[("nome", "Ana")]),
            status: Some("cobranca".into()),
            status_updated_at: Some(TODAY.into()),
            next_follow_up: Some(TODAY.into()),
        };
        assert_eq!(reconcile(&current, None, &clock()), FormState::default());
    }

    #[test]
    fn test_new_general_service_form_defaults() {
        let reg = registry();
        let out = select_category(reg.category("cat_atendimento_gerais"), &clock());

        assert_eq!(out.category_id, "cat_atendimento_gerais");
        assert_eq!(out.status.as_deref(), Some("em_acompanhamento"));
        assert_eq!(out.status_updated_at.as_deref(), Some(TODAY));
        assert_eq!(out.next_follow_up, None);
        assert_eq!(out.fields["status"], "em_acompanhamento");
        assert_eq!(out.fields["status_modificado"], TODAY);
        assert_eq!(out.fields["data_criacao"], TODAY);
        assert_eq!(out.fields["proxima_cobranca"], "");
        assert_eq!(out.fields["nome"], "");
        assert_eq!(out.fields.len(), 6);
    }

    #[test]
    fn test_new_ticket_form_opens_follow_up() {
        let reg = registry();
        let out = select_category(reg.category("cat_atendimento_chamados"), &clock());

        assert_eq!(out.status.as_deref(), Some("cobranca_por_aprovacao"));
        assert_eq!(out.next_follow_up.as_deref(), Some(TODAY));
        assert_eq!(out.fields["proxima_cobranca"], TODAY);
    }

    #[test]
    fn test_category_without_status_has_no_dates() {
        let reg = registry();
        let out = select_category(reg.category("cat_telefonia_movel"), &clock());
        assert_eq!(out.status, None);
        assert_eq!(out.status_updated_at, None);
        assert_eq!(out.next_follow_up, None);
        assert!(out.fields.values().all(|v| v.is_empty()));
        assert_eq!(out.fields.len(), 17);
    }

    #[test]
    fn test_unchanged_status_keeps_its_date() {
        let reg = registry();
        let current = FormState {
            category_id: "cat_atendimento_gerais".into(),
            fields: fields(&[("status", "cobranca"), ("status_modificado", "2024-03-01")]),
            status: Some("cobranca".into()),
            status_updated_at: Some("2024-03-01".into()),
            next_follow_up: Some("2024-03-18".into()),
        };
        let out = reconcile(&current, reg.category("cat_atendimento_gerais"), &clock());
        assert_eq!(out.status_updated_at.as_deref(), Some("2024-03-01"));
        assert_eq!(out.fields["status_modificado"], "2024-03-01");
        assert_eq!(out.next_follow_up.as_deref(), Some("2024-03-18"));
        assert_eq!(out.fields["proxima_cobranca"], "2024-03-18");
    }

    #[test]
    fn test_changed_status_is_stamped_today() {
        let reg = registry();
        let current = FormState {
            category_id: "cat_atendimento_gerais".into(),
            fields: fields(&[("status", "finalizado")]),
            status: Some("cobranca".into()),
            status_updated_at: Some("2024-03-01".into()),
            next_follow_up: Some("2024-03-18".into()),
        };
        let out = reconcile(&current, reg.category("cat_atendimento_gerais"), &clock());
        assert_eq!(out.status.as_deref(), Some("finalizado"));
        assert_eq!(out.status_updated_at.as_deref(), Some(TODAY));
        assert_eq!(out.fields["status_modificado"], TODAY);
        assert_eq!(out.next_follow_up, None);
        assert_eq!(out.fields["proxima_cobranca"], "");
    }

    #[test]
    fn test_top_level_follow_up_wins_over_field() {
        let reg = registry();
        let current = FormState {
            category_id: "cat_atendimento_gerais".into(),
            fields: fields(&[("status", "cobranca"), ("proxima_cobranca", "2024-03-16")]),
            status: Some("cobranca".into()),
            status_updated_at: Some("2024-03-10".into()),
            next_follow_up: Some("2024-03-22".into()),
        };
        let out = reconcile(&current, reg.category("cat_atendimento_gerais"), &clock());
        assert_eq!(out.next_follow_up.as_deref(), Some("2024-03-22"));
        assert_eq!(out.fields["proxima_cobranca"], "2024-03-22");
    }

    #[test]
    fn test_creation_date_is_write_once() {
        let reg = registry();
        let schema = reg.category("cat_atendimento_gerais");
        let current = FormState {
            category_id: "cat_atendimento_gerais".into(),
            fields: fields(&[("data_criacao", "2023-11-02")]),
            ..FormState::default()
        };
        let out = reconcile(&current, schema, &clock());
        assert_eq!(out.fields["data_criacao"], "2023-11-02");

        let later = FixedClock::utc_noon(2024, 6, 1);
        assert_eq!(reconcile(&out, schema, &later).fields["data_criacao"], "2023-11-02");
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let reg = registry();
        for schema in reg.categories() {
            for state in sample_states(&schema.id) {
                let once = reconcile(&state, Some(schema), &clock());
                let twice = reconcile(&once, Some(schema), &clock());
                assert_eq!(once, twice, "not a fixed point for {} from {:?}", schema.id, state);
            }
        }
    }

    #[test]
    fn test_charging_and_clearing_invariants() {
        let reg = registry();
        for schema in reg.categories() {
            for state in sample_states(&schema.id) {
                assert_invariants(&reconcile(&state, Some(schema), &clock()));
            }
        }
    }

    #[test]
    fn test_empty_status_field_is_kept_and_clears_dates() {
        let reg = registry();
        let current = FormState {
            category_id: "cat_atendimento_gerais".into(),
            fields: fields(&[("status", ""), ("proxima_cobranca", "2024-03-20")]),
            status: Some("cobranca".into()),
            status_updated_at: Some("2024-03-10".into()),
            next_follow_up: None,
        };
        let out = reconcile(&current, reg.category("cat_atendimento_gerais"), &clock());
        assert_eq!(out.status, None);
        assert_eq!(out.fields["status"], "");
        assert_eq!(out.fields["status_modificado"], "");
        assert_eq!(out.fields["proxima_cobranca"], "");
        assert_invariants(&out);
    }

    #[test]
    fn test_edit_status_to_charging_opens_follow_up() {
        let reg = registry();
        let schema = reg.category("cat_atendimento_gerais").unwrap();
        let start = select_category(Some(schema), &clock());

        let edited = apply_field_edit(&start, schema, "status", "cobranca", &clock());
        assert_eq!(edited.status.as_deref(), Some("cobranca"));
        assert_eq!(edited.next_follow_up.as_deref(), Some(TODAY));
        assert_eq!(edited.fields["proxima_cobranca"], TODAY);

        let moved = apply_field_edit(&edited, schema, "proxima_cobranca", "2024-03-20", &clock());
        let out = reconcile(&moved, Some(schema), &clock());
        assert_eq!(out.next_follow_up.as_deref(), Some("2024-03-20"));
        assert_eq!(out.fields["proxima_cobranca"], "2024-03-20");
        assert_eq!(out, reconcile(&out, Some(schema), &clock()));
    }

    #[test]
    fn test_edit_status_to_closed_clears_follow_up() {
        let reg = registry();
        let schema = reg.category("cat_atendimento_chamados").unwrap();
        let start = select_category(Some(schema), &clock());
        assert!(start.next_follow_up.is_some());

        let edited = apply_field_edit(&start, schema, "status", "finalizado", &clock());
        assert_eq!(edited.next_follow_up, None);
        assert_eq!(edited.fields["proxima_cobranca"], "");

        let cleared = apply_field_edit(&edited, schema, "status", "", &clock());
        let out = reconcile(&cleared, Some(schema), &clock());
        assert_eq!(out.status, None);
        assert_eq!(out.status_updated_at, None);
        assert_eq!(out.fields["status_modificado"], "");
    }

    #[test]
    fn test_edit_ignores_read_only_and_unknown_fields() {
        let reg = registry();
        let schema = reg.category("cat_atendimento_gerais").unwrap();
        let start = select_category(Some(schema), &clock());
        assert_eq!(
            apply_field_edit(&start, schema, "data_criacao", "2020-01-01", &clock()),
            start
        );
        assert_eq!(apply_field_edit(&start, schema, "nope", "x", &clock()), start);
    }

    #[test]
    fn test_edit_number_field_is_sanitized() {
        let reg = registry();
        let schema = reg.category("cat_telefonia_movel").unwrap();
        let start = select_category(Some(schema), &clock());
        let edited = apply_field_edit(&start, schema, "ano", "20a2-4 ", &clock());
        assert_eq!(edited.fields["ano"], "202-4");
    }

    #[test]
    fn test_follow_up_visibility_retains_value() {
        let reg = registry();
        let schema = reg.category("cat_atendimento_gerais").unwrap();
        let follow_up = schema.field("proxima_cobranca").unwrap();

        let open = fields(&[("status", "cobranca"), ("proxima_cobranca", "2024-03-20")]);
        assert!(is_field_visible(follow_up, &open));

        let closed = fields(&[("status", "finalizado"), ("proxima_cobranca", "2024-03-20")]);
        assert!(!is_field_visible(follow_up, &closed));
        assert_eq!(closed["proxima_cobranca"], "2024-03-20");
        assert!(!is_field_visible(follow_up, &FieldMap::new()));

        let shown: Vec<&str> = visible_fields(schema, &closed)
            .iter()
            .map(|f| f.key.as_str())
            .collect();
        assert_eq!(
            shown,
            vec!["status", "nome", "data_criacao", "descricao", "status_modificado"]
        );
    }

    #[test]
    fn test_required_follow_up_while_charging() {
        let reg = registry();
        let schema = reg.category("cat_atendimento_gerais").unwrap();
        let follow_up = schema.field("proxima_cobranca").unwrap();
        let nome = schema.field("nome").unwrap();

        let mut state = FormState {
            status: Some("cobranca".into()),
            ..FormState::default()
        };
        assert!(is_field_required(follow_up, &state));
        assert!(is_field_required(nome, &state));

        state.status = Some("finalizado".into());
        assert!(!is_field_required(follow_up, &state));
    }

    #[test]
    fn test_select_option_label() {
        let reg = registry();
        let status = reg
            .category("cat_atendimento_chamados")
            .and_then(|c| c.field("status"))
            .unwrap();
        assert_eq!(
            select_option_label(status, Some("cobranca_por_atendimento")),
            Some("Cobranca por atendimento")
        );
        assert_eq!(select_option_label(status, Some("")), None);
        assert_eq!(select_option_label(status, None), None);
    }

    #[test]
    fn test_form_state_from_activity() {
        let activity = Activity {
            id: "a1".into(),
            description: "Ana".into(),
            category: Some("Atendimento - Atendimentos gerais".into()),
            category_id: Some("cat_atendimento_gerais".into()),
            status: Some("cobranca".into()),
            status_updated_at: Some("2024-03-01".into()),
            next_follow_up: Some("2024-03-18".into()),
            fields: Some(fields(&[("nome", "Ana"), ("status", "cobranca")])),
            created_at: "2024-03-01T10:00:00Z".into(),
        };
        let state = FormState::from_activity(&activity);
        assert_eq!(state.category_id, "cat_atendimento_gerais");
        assert_eq!(state.fields["nome"], "Ana");
        assert_eq!(state.next_follow_up.as_deref(), Some("2024-03-18"));
    }
}
