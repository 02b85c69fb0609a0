//! Coerced field values

use serde_json::{Number, Value};

use super::engine::Model;
use super::errors::ModelResult;
use super::parsers::{
    parse_array, parse_boolean, parse_email, parse_non_neg_int, parse_string, parse_user_role,
    parse_username, UserRole,
};
use super::types::FieldKind;

/// A field value after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(u64),
    Str(String),
    Role(UserRole),
    /// Passthrough JSON for `array` fields
    Array(Value),
    /// Owned nested sub-model
    Record(Model),
}

impl FieldValue {
    /// Runs `raw` through the primitive matching `kind`.
    ///
    /// Returns `Ok(None)` for record kinds, which the scalar path never
    /// coerces.
    pub fn coerce(kind: &FieldKind, raw: &Value) -> ModelResult<Option<FieldValue>> {
        let value = match kind {
            FieldKind::Boolean => FieldValue::Bool(parse_boolean(raw)?),
            FieldKind::NonNegInt => FieldValue::Int(parse_non_neg_int(raw)?),
            FieldKind::String => FieldValue::Str(parse_string(raw)),
            FieldKind::Username => FieldValue::Str(parse_username(raw)?),
            FieldKind::Email => FieldValue::Str(parse_email(raw)?),
            FieldKind::Role => FieldValue::Role(parse_user_role(raw)?),
            FieldKind::Array => FieldValue::Array(parse_array(raw)),
            FieldKind::Record { .. } => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Plain JSON projection; records flatten recursively
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(n) => Value::Number(Number::from(*n)),
            FieldValue::Str(s) => Value::String(s.clone()),
            FieldValue::Role(role) => Value::String(role.as_str().to_owned()),
            FieldValue::Array(raw) => raw.clone(),
            FieldValue::Record(model) => Value::Object(model.to_object(None)),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// String view; roles render as their canonical names
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            FieldValue::Role(role) => Some(role.as_str()),
            _ => None,
        }
    }

    pub fn as_role(&self) -> Option<UserRole> {
        match self {
            FieldValue::Role(role) => Some(*role),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Value> {
        match self {
            FieldValue::Array(raw) => Some(raw),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Model> {
        match self {
            FieldValue::Record(model) => Some(model),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelSchema, ParseErrorKind};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_coerce_dispatches_on_kind() {
        assert_eq!(
            FieldValue::coerce(&FieldKind::NonNegInt, &json!("5")).unwrap(),
            Some(FieldValue::Int(5))
        );
        assert_eq!(
            FieldValue::coerce(&FieldKind::String, &json!(2)).unwrap(),
            Some(FieldValue::Str("2".into()))
        );
        assert_eq!(
            FieldValue::coerce(&FieldKind::Role, &json!("student")).unwrap(),
            Some(FieldValue::Role(UserRole::Student))
        );
        assert_eq!(
            FieldValue::coerce(&FieldKind::Array, &json!([1, "a"])).unwrap(),
            Some(FieldValue::Array(json!([1, "a"])))
        );
    }

    #[test]
    fn test_coerce_skips_records() {
        let kind = FieldKind::Record {
            schema: Arc::new(ModelSchema::new("Dates")),
        };
        assert_eq!(FieldValue::coerce(&kind, &json!({ "open": 1 })).unwrap(), None);
    }

    #[test]
    fn test_coerce_propagates_primitive_error() {
        let err = FieldValue::coerce(&FieldKind::Email, &json!("nope")).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::InvalidEmail);
    }

    #[test]
    fn test_to_json() {
        assert_eq!(FieldValue::Int(3).to_json(), json!(3));
        assert_eq!(FieldValue::Role(UserRole::Ta).to_json(), json!("TA"));
        assert_eq!(FieldValue::Bool(false).to_json(), json!(false));
    }
}
