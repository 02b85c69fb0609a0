//! Model engine for courseware
//!
//! A model is an instance of a field schema. Raw, loosely-typed records are
//! coerced field-by-field into strict values at construction and whenever a
//! caller updates an instance.
//!
//! # Design Principles
//!
//! - Construction is all-or-nothing
//! - Required fields must be present, unknown fields are rejected
//! - Defaults fill absent fields at construction only
//! - Updates coerce only the supplied keys and commit atomically
//! - Nested records are owned sub-models built by the entity

mod engine;
mod errors;
pub mod parsers;
mod types;
mod value;

pub use engine::{Model, Record};
pub use errors::{ModelResult, ParseError, ParseErrorKind};
pub use parsers::UserRole;
pub use types::{FieldCategory, FieldDef, FieldKind, ModelSchema};
pub use value::FieldValue;
