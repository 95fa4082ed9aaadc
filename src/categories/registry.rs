use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::embedded;
use super::loader::validate_category;
use super::schema::{CategoryDefinition, CategoryField, FieldDependency, FieldType, SelectOption};
use crate::error::RegistroError;

/// Read-only category lookup handed to the reconciler and form helpers.
pub trait SchemaRegistry {
    fn categories(&self) -> &[CategoryDefinition];

    /// An empty id means "no category selected" and never matches.
    fn category(&self, id: &str) -> Option<&CategoryDefinition> {
        if id.is_empty() {
            return None;
        }
        self.categories().iter().find(|c| c.id == id)
    }
}

/// A field about to be added to a category. A blank `key` is derived from the
/// label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewField {
    #[serde(default)]
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default)]
    pub depends_on: Option<FieldDependency>,
}

/// In-memory category list with the editing operations of the category
/// manager. Ids are generated by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryRegistry {
    categories: Vec<CategoryDefinition>,
}

impl SchemaRegistry for CategoryRegistry {
    fn categories(&self) -> &[CategoryDefinition] {
        &self.categories
    }
}

impl CategoryRegistry {
    pub fn new(categories: Vec<CategoryDefinition>) -> Self {
        Self { categories }
    }

    /// Registry seeded with the embedded default categories.
    pub fn with_defaults() -> Result<Self, RegistroError> {
        Ok(Self::new(embedded::default_categories()?))
    }

    pub fn into_categories(self) -> Vec<CategoryDefinition> {
        self.categories
    }

    fn position(&self, id: &str) -> Result<usize, RegistroError> {
        self.categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| RegistroError::UnknownCategory(id.to_string()))
    }

    pub fn add_category(
        &mut self,
        id: impl Into<String>,
        name: &str,
    ) -> Result<&CategoryDefinition, RegistroError> {
        let category = CategoryDefinition {
            id: id.into(),
            name: name.trim().to_string(),
            fields: Vec::new(),
        };
        if self.categories.iter().any(|c| c.id == category.id) {
            return Err(RegistroError::invalid_category(
                &category.id,
                "a category with this id already exists",
            ));
        }
        validate_category(&category)?;
        self.categories.push(category);
        Ok(&self.categories[self.categories.len() - 1])
    }

    pub fn rename_category(&mut self, id: &str, name: &str) -> Result<(), RegistroError> {
        let idx = self.position(id)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistroError::invalid_category(id, "category name is required"));
        }
        self.categories[idx].name = name.to_string();
        Ok(())
    }

    /// Remove a category. Records pointing at it keep their stored fields.
    pub fn delete_category(&mut self, id: &str) -> Result<CategoryDefinition, RegistroError> {
        let idx = self.position(id)?;
        Ok(self.categories.remove(idx))
    }

    pub fn add_field(
        &mut self,
        category_id: &str,
        field_id: impl Into<String>,
        field: NewField,
    ) -> Result<&CategoryField, RegistroError> {
        let idx = self.position(category_id)?;
        let key = if field.key.trim().is_empty() {
            field_key_slug(&field.label)
        } else {
            field.key
        };
        let field = CategoryField {
            id: field_id.into(),
            key,
            label: field.label,
            field_type: field.field_type.unwrap_or(FieldType::Text),
            required: field.required,
            read_only: field.read_only,
            placeholder: field.placeholder,
            options: field.options,
            depends_on: field.depends_on,
        };

        let mut candidate = self.categories[idx].clone();
        candidate.fields.push(field);
        validate_category(&candidate)?;
        self.categories[idx] = candidate;

        let fields = &self.categories[idx].fields;
        Ok(&fields[fields.len() - 1])
    }

    /// Apply `mutator` to one field. The field id cannot change, and a key
    /// left blank by the mutator keeps its previous value.
    pub fn update_field(
        &mut self,
        category_id: &str,
        field_id: &str,
        mutator: impl FnOnce(&mut CategoryField),
    ) -> Result<(), RegistroError> {
        let idx = self.position(category_id)?;
        let mut candidate = self.categories[idx].clone();
        let field = candidate
            .fields
            .iter_mut()
            .find(|f| f.id == field_id)
            .ok_or_else(|| RegistroError::UnknownField {
                category: category_id.to_string(),
                field: field_id.to_string(),
            })?;

        let previous_key = field.key.clone();
        mutator(field);
        field.id = field_id.to_string();
        if field.key.trim().is_empty() {
            field.key = previous_key;
        }

        validate_category(&candidate)?;
        self.categories[idx] = candidate;
        Ok(())
    }

    /// Remove a field. Fails while another field's `dependsOn` still names it.
    pub fn remove_field(
        &mut self,
        category_id: &str,
        field_id: &str,
    ) -> Result<CategoryField, RegistroError> {
        let idx = self.position(category_id)?;
        let mut candidate = self.categories[idx].clone();
        let pos = candidate
            .fields
            .iter()
            .position(|f| f.id == field_id)
            .ok_or_else(|| RegistroError::UnknownField {
                category: category_id.to_string(),
                field: field_id.to_string(),
            })?;
        let removed = candidate.fields.remove(pos);

        validate_category(&candidate)?;
        self.categories[idx] = candidate;
        Ok(removed)
    }
}

fn separator_regex() -> &'static Regex {
    static SEPARATOR_RE: OnceLock<Regex> = OnceLock::new();
    SEPARATOR_RE.get_or_init(|| Regex::new(r"[\s/]+").expect("separator regex should compile"))
}

/// Derive a storage key from a field label.
///
/// Example: "Número / Linha" → "numero_linha"
pub fn field_key_slug(label: &str) -> String {
    let kept: String = label
        .nfkd()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/') || c.is_whitespace())
        .collect();
    let lowered = kept.trim().to_lowercase();
    separator_regex().replace_all(&lowered, "_").into_owned()
}
