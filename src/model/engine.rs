//! Model engine: schema-driven construction, mutation and projection
//!
//! Construction semantics:
//! - All required keys are present (a `null` value still counts as present)
//! - No undeclared fields exist
//! - Absent fields with a default take the default
//! - Every non-record field is coerced through its kind's primitive
//! - All-or-nothing: an error produces no instance
//!
//! Mutation (`set`) coerces only the supplied keys and skips the structural
//! checks. A failed `set` leaves the instance untouched.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::errors::{ModelResult, ParseError};
use super::parsers::UserRole;
use super::types::ModelSchema;
use super::value::FieldValue;

/// A loosely-typed input or output record.
pub type Record = Map<String, Value>;

/// A validated instance of a [`ModelSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    schema: Arc<ModelSchema>,
    values: BTreeMap<String, FieldValue>,
}

/// Whether absent inputs fall back to schema defaults.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Defaults {
    OnAbsent,
    OnNullOnly,
}

impl Model {
    /// Builds an instance from `input`.
    ///
    /// # Errors
    ///
    /// - `MISSING_REQUIRED_FIELDS` naming every absent required key
    /// - `UNKNOWN_FIELDS` naming every undeclared key
    /// - the primitive's error for the first field that fails coercion
    pub fn construct(schema: Arc<ModelSchema>, input: &Record) -> ModelResult<Self> {
        let missing: Vec<String> = schema
            .required_fields()
            .into_iter()
            .filter(|name| !input.contains_key(*name))
            .map(str::to_owned)
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::missing_required(&schema.name, missing));
        }

        let unknown: Vec<String> = input
            .keys()
            .filter(|key| !schema.contains(key))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(ParseError::unknown_fields(&schema.name, unknown));
        }

        let values = coerce_fields(&schema, input, Defaults::OnAbsent)?;
        Ok(Self { schema, values })
    }

    /// Builds an instance with every field at its default.
    pub fn with_defaults(schema: Arc<ModelSchema>) -> ModelResult<Self> {
        Self::construct(schema, &Record::new())
    }

    /// Re-coerces the supplied fields. Fields not mentioned keep their
    /// values; undeclared keys and record fields are ignored.
    ///
    /// Unlike [`Model::construct`], no required or unknown field checks run
    /// here. Whether mutation should enforce them is still an open product
    /// question.
    pub fn set(&mut self, input: &Record) -> ModelResult<()> {
        let staged = coerce_fields(&self.schema, input, Defaults::OnNullOnly)?;
        self.values.extend(staged);
        Ok(())
    }

    /// Builds the sub-model for record field `name` of `schema` from `raw`,
    /// falling back to the field default and then to an empty record.
    pub fn build_record(schema: &ModelSchema, name: &str, raw: Option<&Value>) -> ModelResult<Model> {
        let sub = schema
            .record_schema(name)
            .ok_or_else(|| ParseError::unknown_fields(&schema.name, vec![name.to_owned()]))?;

        let raw = match raw {
            None | Some(Value::Null) => schema.get(name).and_then(|def| def.default_value.as_ref()),
            given => given,
        };

        let built = match raw {
            None => Model::with_defaults(Arc::clone(sub)),
            Some(Value::Object(record)) => Model::construct(Arc::clone(sub), record),
            Some(_) => Err(ParseError::unknown_fields(&schema.name, vec![name.to_owned()])),
        };
        built.map_err(|e| e.within(name))
    }

    /// Constructs and installs the sub-model of record field `name`.
    pub fn init_record(&mut self, name: &str, raw: Option<&Value>) -> ModelResult<()> {
        let sub = Self::build_record(&self.schema, name, raw)?;
        self.values.insert(name.to_owned(), FieldValue::Record(sub));
        Ok(())
    }

    /// Applies `raw` to the installed sub-model with `set` semantics,
    /// installing one first if the field is still unset. `null` is a no-op.
    pub fn update_record(&mut self, name: &str, raw: &Value) -> ModelResult<()> {
        if self.schema.record_schema(name).is_none() {
            return Err(ParseError::unknown_fields(&self.schema.name, vec![name.to_owned()]));
        }
        if raw.is_null() {
            return Ok(());
        }
        if let (Value::Object(partial), Some(FieldValue::Record(sub))) = (raw, self.values.get_mut(name)) {
            return sub.set(partial).map_err(|e| e.within(name));
        }
        self.init_record(name, Some(raw))
    }

    /// Replaces the sub-model of record field `name` wholesale.
    pub fn put_record(&mut self, name: &str, sub: Model) -> ModelResult<()> {
        match self.schema.record_schema(name) {
            Some(expected) if **expected == *sub.schema => {
                self.values.insert(name.to_owned(), FieldValue::Record(sub));
                Ok(())
            }
            _ => Err(ParseError::unknown_fields(&self.schema.name, vec![name.to_owned()])),
        }
    }

    /// Plain record of every requested field that currently has a value.
    /// Defaults to all declared fields; unknown or unset names are skipped.
    pub fn to_object(&self, fields: Option<&[&str]>) -> Record {
        let names = match fields {
            Some(names) => names.to_vec(),
            None => self.schema.all_fields(),
        };
        names
            .into_iter()
            .filter_map(|name| self.values.get(name).map(|v| (name.to_owned(), v.to_json())))
            .collect()
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// Entity name of the schema
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FieldValue::as_bool)
    }

    pub fn get_int(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(FieldValue::as_int)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    pub fn get_role(&self, name: &str) -> Option<UserRole> {
        self.get(name).and_then(FieldValue::as_role)
    }

    pub fn get_array(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(FieldValue::as_array)
    }

    pub fn get_record(&self, name: &str) -> Option<&Model> {
        self.get(name).and_then(FieldValue::as_record)
    }

    pub fn get_record_mut(&mut self, name: &str) -> Option<&mut Model> {
        match self.values.get_mut(name) {
            Some(FieldValue::Record(sub)) => Some(sub),
            _ => None,
        }
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_object(None).serialize(serializer)
    }
}

/// Coerces the scalar fields of `schema` found in `input` into a staged map.
fn coerce_fields(
    schema: &ModelSchema,
    input: &Record,
    defaults: Defaults,
) -> ModelResult<BTreeMap<String, FieldValue>> {
    let mut staged = BTreeMap::new();

    for (name, def) in &schema.fields {
        if def.kind.is_record() {
            continue;
        }

        let raw = match input.get(name) {
            Some(Value::Null) => def.default_value.as_ref(),
            None if defaults == Defaults::OnAbsent => def.default_value.as_ref(),
            None => None,
            Some(value) => Some(value),
        };
        let Some(raw) = raw else { continue };

        if let Some(value) = FieldValue::coerce(&def.kind, raw).map_err(|e| e.with_field(name))? {
            staged.insert(name.clone(), value);
        }
    }

    Ok(staged)
}
