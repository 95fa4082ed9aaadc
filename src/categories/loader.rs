use std::collections::HashSet;
use std::path::Path;

use super::embedded;
use super::schema::{CategoryDefinition, FieldType};
use crate::error::RegistroError;

/// Load an embedded category by id.
pub fn load_category(id: &str) -> Result<CategoryDefinition, RegistroError> {
    let json = embedded::get_embedded(id)
        .ok_or_else(|| RegistroError::UnknownCategory(id.to_string()))?;
    serde_json::from_str(json)
        .map_err(|e| RegistroError::parse(format!("embedded category '{}'", id), e))
}

/// Load a user-edited category list (a JSON array) from disk.
pub fn load_custom_categories(path: &Path) -> Result<Vec<CategoryDefinition>, RegistroError> {
    let content = std::fs::read_to_string(path)?;
    let categories: Vec<CategoryDefinition> = serde_json::from_str(&content)
        .map_err(|e| RegistroError::parse(path.display().to_string(), e))?;
    let mut ids = HashSet::new();
    for category in &categories {
        validate_category(category)?;
        if !ids.insert(category.id.as_str()) {
            return Err(RegistroError::invalid_category(
                &category.id,
                "a category with this id already exists",
            ));
        }
    }
    log::debug!(
        "Loaded {} categories from {}",
        categories.len(),
        path.display()
    );
    Ok(categories)
}

/// Validate a category's structure: identity, unique keys, select options and
/// dependency targets.
pub fn validate_category(category: &CategoryDefinition) -> Result<(), RegistroError> {
    if category.id.trim().is_empty() {
        return Err(RegistroError::invalid_category(
            &category.name,
            "category id is required",
        ));
    }
    if category.name.trim().is_empty() {
        return Err(RegistroError::invalid_category(
            &category.id,
            "category name is required",
        ));
    }

    let mut keys = HashSet::new();
    for field in &category.fields {
        if field.key.trim().is_empty() {
            return Err(RegistroError::invalid_category(
                &category.id,
                format!("field '{}' has an empty key", field.id),
            ));
        }
        if !keys.insert(field.key.as_str()) {
            return Err(RegistroError::invalid_category(
                &category.id,
                format!("duplicate field key '{}'", field.key),
            ));
        }
        let has_options = field.options.as_ref().is_some_and(|o| !o.is_empty());
        if field.field_type == FieldType::Select && !has_options {
            return Err(RegistroError::invalid_category(
                &category.id,
                format!("select field '{}' has no options", field.key),
            ));
        }
    }

    for field in &category.fields {
        if let Some(dep) = &field.depends_on {
            if dep.field_key == field.key || !keys.contains(dep.field_key.as_str()) {
                return Err(RegistroError::invalid_category(
                    &category.id,
                    format!(
                        "field '{}' depends on '{}', which is not another field of this category",
                        field.key, dep.field_key
                    ),
                ));
            }
        }
    }

    Ok(())
}
