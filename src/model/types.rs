//! Field schema type definitions
//!
//! Supported kinds:
//! - boolean: `true`/`false`, `1`/`0` and their string forms
//! - non_neg_int: unsigned integer or digit string
//! - string: any scalar, stringified
//! - username: bare username or email address
//! - email: email address
//! - role: one of the user roles
//! - array: passthrough, validated by the owning entity
//! - record: nested sub-model with its own schema

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::engine::Model;
use super::errors::ModelResult;
use super::value::FieldValue;

/// Coercion kind of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field_type", rename_all = "snake_case")]
pub enum FieldKind {
    Boolean,
    NonNegInt,
    String,
    Username,
    Email,
    Role,
    /// Kept as raw JSON
    Array,
    /// Owned sub-model, never touched by the scalar coercion loop
    Record {
        schema: Arc<ModelSchema>,
    },
}

/// The four disjoint field-name categories, derived from the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCategory {
    Boolean,
    Numeric,
    String,
    Nested,
}

impl FieldKind {
    /// Returns the kind name used in the JSON schema form
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Boolean => "boolean",
            FieldKind::NonNegInt => "non_neg_int",
            FieldKind::String => "string",
            FieldKind::Username => "username",
            FieldKind::Email => "email",
            FieldKind::Role => "role",
            FieldKind::Array => "array",
            FieldKind::Record { .. } => "record",
        }
    }

    pub fn category(&self) -> FieldCategory {
        match self {
            FieldKind::Boolean => FieldCategory::Boolean,
            FieldKind::NonNegInt => FieldCategory::Numeric,
            FieldKind::String | FieldKind::Username | FieldKind::Email | FieldKind::Role => {
                FieldCategory::String
            }
            FieldKind::Array | FieldKind::Record { .. } => FieldCategory::Nested,
        }
    }

    /// Whether the field is an owned sub-model
    pub fn is_record(&self) -> bool {
        matches!(self, FieldKind::Record { .. })
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Field definition: kind, optional default, required flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
}

impl FieldDef {
    /// Create an optional field of the given kind with no default
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            default_value: None,
            required: false,
        }
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn non_neg_int() -> Self {
        Self::new(FieldKind::NonNegInt)
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn username() -> Self {
        Self::new(FieldKind::Username)
    }

    pub fn email() -> Self {
        Self::new(FieldKind::Email)
    }

    pub fn role() -> Self {
        Self::new(FieldKind::Role)
    }

    pub fn array() -> Self {
        Self::new(FieldKind::Array)
    }

    /// Create a nested-record field owning a sub-model of `schema`
    pub fn record(schema: Arc<ModelSchema>) -> Self {
        Self::new(FieldKind::Record { schema })
    }

    /// Marks the field as required at construction
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the value substituted when the field is absent at construction
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn category(&self) -> FieldCategory {
        self.kind.category()
    }
}

/// A named field schema. Each field name has exactly one definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    /// Entity name used in error messages
    pub name: String,
    pub fields: BTreeMap<String, FieldDef>,
}

impl ModelSchema {
    /// Create an empty schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Declares a field, replacing any earlier definition of the same name
    pub fn field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    /// Wraps the schema for sharing between instances
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// All declared field names
    pub fn all_fields(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Fields flagged `required`
    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, def)| def.required)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn fields_in(&self, category: FieldCategory) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, def)| def.category() == category)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn boolean_fields(&self) -> Vec<&str> {
        self.fields_in(FieldCategory::Boolean)
    }

    pub fn numeric_fields(&self) -> Vec<&str> {
        self.fields_in(FieldCategory::Numeric)
    }

    pub fn string_fields(&self) -> Vec<&str> {
        self.fields_in(FieldCategory::String)
    }

    pub fn nested_fields(&self) -> Vec<&str> {
        self.fields_in(FieldCategory::Nested)
    }

    /// Schema of a nested-record field
    pub fn record_schema(&self, name: &str) -> Option<&Arc<ModelSchema>> {
        match self.fields.get(name).map(|def| &def.kind) {
            Some(FieldKind::Record { schema }) => Some(schema),
            _ => None,
        }
    }

    /// Validates the schema itself: every default must coerce through its
    /// own kind, and nested schemas must be valid.
    pub fn validate_structure(&self) -> ModelResult<()> {
        for (name, def) in &self.fields {
            if let FieldKind::Record { schema } = &def.kind {
                schema.validate_structure()?;
            }
            match (&def.kind, &def.default_value) {
                (FieldKind::Record { .. }, Some(_)) => {
                    Model::build_record(self, name, None)?;
                }
                (kind, Some(default)) => {
                    FieldValue::coerce(kind, default).map_err(|e| e.with_field(name))?;
                }
                (_, None) => {}
            }
        }
        Ok(())
    }
}
