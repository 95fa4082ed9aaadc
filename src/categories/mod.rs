//! User-defined record categories.
//!
//! A category is an ordered list of typed fields with optional conditional
//! visibility. Four defaults ship embedded as JSON; users add, edit and
//! remove categories and fields through [`CategoryRegistry`].

pub mod embedded;
pub mod loader;
pub mod registry;
pub mod schema;

pub use registry::{field_key_slug, CategoryRegistry, NewField, SchemaRegistry};
pub use schema::{
    keys, CategoryDefinition, CategoryField, FieldDependency, FieldType, SelectOption,
};
