use crate::categories::CategoryDefinition;
use crate::types::FieldMap;

/// Keys tried first, in order, when summarizing a record.
const DESCRIPTION_KEYS: &[&str] = &[
    "nome",
    "descricao",
    "numero_chamado",
    "servico_movel",
    "modelo",
    "operadora",
];

const DEFAULT_DESCRIPTION: &str = "Atividade";

/// Human-readable summary of a record's fields.
///
/// 1. First non-blank value among `DESCRIPTION_KEYS`
/// 2. First non-blank value in map order
/// 3. `fallback_name` if non-blank, else "Atividade"
pub fn describe(fields: &FieldMap, fallback_name: Option<&str>) -> String {
    describe_ordered(fields, fields.values(), fallback_name)
}

/// Like [`describe`], but step 2 walks the category's fields in form order,
/// then any keys the category does not define. The category name is the
/// fallback.
pub fn describe_with_schema(fields: &FieldMap, schema: &CategoryDefinition) -> String {
    let in_form_order = schema.fields.iter().filter_map(|f| fields.get(&f.key));
    let extra = fields
        .iter()
        .filter(|(key, _)| schema.field(key).is_none())
        .map(|(_, value)| value);
    describe_ordered(fields, in_form_order.chain(extra), Some(&schema.name))
}

fn describe_ordered<'a>(
    fields: &'a FieldMap,
    values: impl Iterator<Item = &'a String>,
    fallback_name: Option<&str>,
) -> String {
    let priority = DESCRIPTION_KEYS
        .iter()
        .filter_map(|key| fields.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty());
    if let Some(value) = priority {
        return value.to_string();
    }

    if let Some(value) = values.map(|v| v.trim()).find(|v| !v.is_empty()) {
        return value.to_string();
    }

    match fallback_name {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => DEFAULT_DESCRIPTION.to_string(),
    }
}
