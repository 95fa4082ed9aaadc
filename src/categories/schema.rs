use serde::{Deserialize, Serialize};

/// Storage keys the reconciler treats specially wherever a category has them.
pub mod keys {
    /// Mirrors the record's top-level status.
    pub const STATUS: &str = "status";
    /// Mirrors the status-change date.
    pub const STATUS_UPDATED: &str = "status_modificado";
    /// Mirrors the next follow-up date.
    pub const NEXT_FOLLOW_UP: &str = "proxima_cobranca";
    /// Write-once creation date.
    pub const CREATED_ON: &str = "data_criacao";
}

/// Input type of a category field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Email,
    Tel,
    Select,
    Textarea,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Show a field only while another field holds one of `values`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDependency {
    pub field_key: String,
    pub values: Vec<String>,
}

impl FieldDependency {
    pub fn is_satisfied_by(&self, value: Option<&str>) -> bool {
        value.is_some_and(|v| self.values.iter().any(|allowed| allowed == v))
    }
}

/// One typed field of a user-defined category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryField {
    /// Stable id, survives key renames.
    pub id: String,
    /// Storage key in the record's field map (e.g. "numero_linha").
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<FieldDependency>,
}

impl CategoryField {
    pub fn first_option_value(&self) -> Option<&str> {
        self.options
            .as_ref()
            .and_then(|opts| opts.first())
            .map(|opt| opt.value.as_str())
    }

    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .as_ref()?
            .iter()
            .find(|opt| opt.value == value)
            .map(|opt| opt.label.as_str())
    }
}

/// A named, ordered set of fields records of this category carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<CategoryField>,
}

impl CategoryDefinition {
    pub fn field(&self, key: &str) -> Option<&CategoryField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn field_by_id(&self, id: &str) -> Option<&CategoryField> {
        self.fields.iter().find(|f| f.id == id)
    }
}
