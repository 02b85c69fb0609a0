//! courseware - validated data models for courses, users, problem sets
//! and settings
//!
//! Raw records from an API or a form are coerced through a declarative
//! field schema into typed entities, and flattened back to plain records.

pub mod cli;
pub mod entities;
pub mod model;
pub mod store;
