use super::schema::CategoryDefinition;
use crate::error::RegistroError;

const MOBILE_PHONE_CATEGORY: &str = include_str!("../../categories/telefonia-movel.json");
const TICKETS_CATEGORY: &str = include_str!("../../categories/chamados.json");
const GENERAL_SERVICE_CATEGORY: &str = include_str!("../../categories/atendimentos-gerais.json");
const EXECUTIVE_SERVICE_CATEGORY: &str =
    include_str!("../../categories/atendimentos-executivos.json");

/// All embedded categories in display order.
const ALL_CATEGORIES: &[(&str, &str)] = &[
    ("cat_telefonia_movel", MOBILE_PHONE_CATEGORY),
    ("cat_atendimento_chamados", TICKETS_CATEGORY),
    ("cat_atendimento_gerais", GENERAL_SERVICE_CATEGORY),
    ("cat_atendimento_executivos", EXECUTIVE_SERVICE_CATEGORY),
];

/// Look up an embedded category's JSON by id.
pub fn get_embedded(id: &str) -> Option<&'static str> {
    ALL_CATEGORIES
        .iter()
        .find(|(cat_id, _)| *cat_id == id)
        .map(|(_, json)| *json)
}

/// Ids of the embedded categories, in display order.
pub fn embedded_ids() -> impl Iterator<Item = &'static str> {
    ALL_CATEGORIES.iter().map(|(id, _)| *id)
}

/// Parse every embedded category. A new install starts with these.
pub fn default_categories() -> Result<Vec<CategoryDefinition>, RegistroError> {
    ALL_CATEGORIES
        .iter()
        .map(|(id, json)| {
            serde_json::from_str(json)
                .map_err(|e| RegistroError::parse(format!("embedded category '{}'", id), e))
        })
        .collect()
}
