//! Model error types
//!
//! Error codes:
//! - INVALID_NON_NEG_INT
//! - INVALID_USERNAME
//! - INVALID_EMAIL
//! - INVALID_BOOLEAN
//! - INVALID_ROLE
//! - MISSING_REQUIRED_FIELDS
//! - UNKNOWN_FIELDS
//! - INVALID_ENUM_VARIANT

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Kinds of failure raised by the parsing primitives and the model engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// Value is not an unsigned integer
    InvalidNonNegInt,
    /// Value matches neither the username nor the email pattern
    InvalidUsername,
    /// Value does not match the email pattern
    InvalidEmail,
    /// Value is not one of the accepted boolean forms
    InvalidBoolean,
    /// Value is not a member of the user role set
    InvalidRole,
    /// Construction input is missing required fields
    MissingRequiredFields,
    /// Construction input carries undeclared fields
    UnknownFields,
    /// Unrecognized tag for a discriminated type
    InvalidEnumVariant,
}

impl ParseErrorKind {
    /// Returns the stable string code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ParseErrorKind::InvalidNonNegInt => "INVALID_NON_NEG_INT",
            ParseErrorKind::InvalidUsername => "INVALID_USERNAME",
            ParseErrorKind::InvalidEmail => "INVALID_EMAIL",
            ParseErrorKind::InvalidBoolean => "INVALID_BOOLEAN",
            ParseErrorKind::InvalidRole => "INVALID_ROLE",
            ParseErrorKind::MissingRequiredFields => "MISSING_REQUIRED_FIELDS",
            ParseErrorKind::UnknownFields => "UNKNOWN_FIELDS",
            ParseErrorKind::InvalidEnumVariant => "INVALID_ENUM_VARIANT",
        }
    }

    /// Structural kinds are raised by the engine rather than a primitive
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ParseErrorKind::MissingRequiredFields | ParseErrorKind::UnknownFields
        )
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for ParseErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// A structured, immutable parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct ParseError {
    kind: ParseErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<String>,
}

impl ParseError {
    fn new(kind: ParseErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
            field: None,
            fields: Vec::new(),
        }
    }

    /// Value is not a non-negative integer
    pub fn non_neg_int(value: &Value) -> Self {
        Self::new(
            ParseErrorKind::InvalidNonNegInt,
            format!("The value {} is not a non-negative integer", display_raw(value)),
        )
    }

    /// Value is not a valid username
    pub fn username(value: &Value) -> Self {
        Self::new(
            ParseErrorKind::InvalidUsername,
            format!("The value '{}' is not a valid username", display_raw(value)),
        )
    }

    /// Value is not a valid email
    pub fn email(value: &Value) -> Self {
        Self::new(
            ParseErrorKind::InvalidEmail,
            format!("The value '{}' is not a valid email", display_raw(value)),
        )
    }

    /// Value is not a boolean
    pub fn boolean(value: &Value) -> Self {
        Self::new(
            ParseErrorKind::InvalidBoolean,
            format!("The value '{}' is not a boolean", display_raw(value)),
        )
    }

    /// Value is not a valid role. Always names the `role` field.
    pub fn role(value: &Value) -> Self {
        Self::new(
            ParseErrorKind::InvalidRole,
            format!("The value '{}' is not a valid role", display_raw(value)),
        )
        .with_field("role")
    }

    /// Required fields absent from a construction input
    pub fn missing_required(model: &str, missing: Vec<String>) -> Self {
        let mut err = Self::new(
            ParseErrorKind::MissingRequiredFields,
            format!(
                "The field(s) '{}' must be present in {}",
                missing.join(", "),
                model
            ),
        );
        err.fields = missing;
        err
    }

    /// Undeclared fields present in a construction input
    pub fn unknown_fields(model: &str, unknown: Vec<String>) -> Self {
        let mut err = Self::new(
            ParseErrorKind::UnknownFields,
            format!(
                "The field(s) '{}' is(are) not valid for {}",
                unknown.join(", "),
                model
            ),
        );
        err.fields = unknown;
        err
    }

    /// Unrecognized discriminator tag, e.g. a problem set type
    pub fn enum_variant(type_name: &str, value: &str) -> Self {
        Self::new(
            ParseErrorKind::InvalidEnumVariant,
            format!("The {} '{}' is not valid", type_name, value),
        )
    }

    /// Attaches the offending field name
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Prefixes the field path with the name of the enclosing record
    pub fn within(mut self, parent: &str) -> Self {
        self.field = Some(match self.field.take() {
            Some(field) => format!("{}.{}", parent, field),
            None => parent.to_owned(),
        });
        self
    }

    /// Returns the error kind
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// Returns the human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending field, if known
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns every offending field name of a structural error
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ParseError>;

/// Renders a raw value the way it would be interpolated into text.
pub(crate) fn display_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ParseErrorKind::InvalidNonNegInt.code(), "INVALID_NON_NEG_INT");
        assert_eq!(ParseErrorKind::InvalidRole.code(), "INVALID_ROLE");
        assert_eq!(ParseErrorKind::UnknownFields.code(), "UNKNOWN_FIELDS");
        assert_eq!(ParseErrorKind::InvalidEnumVariant.code(), "INVALID_ENUM_VARIANT");
    }

    #[test]
    fn test_role_error_names_field() {
        let err = ParseError::role(&json!("superhero"));
        assert_eq!(err.kind(), ParseErrorKind::InvalidRole);
        assert_eq!(err.field(), Some("role"));
        assert!(err.message().contains("superhero"));
    }

    #[test]
    fn test_missing_required_lists_names() {
        let err = ParseError::missing_required("User", vec!["username".into(), "email".into()]);
        assert_eq!(err.message(), "The field(s) 'username, email' must be present in User");
        assert_eq!(err.fields(), ["username", "email"]);
        assert!(err.kind().is_structural());
    }

    #[test]
    fn test_within_builds_field_path() {
        let err = ParseError::non_neg_int(&json!("x")).with_field("open").within("set_dates");
        assert_eq!(err.field(), Some("set_dates.open"));
        let err = ParseError::missing_required("Dates", vec!["open".into()]).within("set_dates");
        assert_eq!(err.field(), Some("set_dates"));
    }

    #[test]
    fn test_display_includes_code() {
        let err = ParseError::non_neg_int(&json!(-1));
        assert_eq!(
            err.to_string(),
            "INVALID_NON_NEG_INT: The value -1 is not a non-negative integer"
        );
    }

    #[test]
    fn test_serializes_as_plain_record() {
        let err = ParseError::boolean(&json!("T")).with_field("visible");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["kind"], "INVALID_BOOLEAN");
        assert_eq!(value["field"], "visible");
        assert!(value.get("fields").is_none());
    }
}
