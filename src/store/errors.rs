//! # Store Errors
//!
//! Error types for the in-memory state containers.

use thiserror::Error;

use crate::model::ParseError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// State container errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A record failed to construct or update
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// No entity with the given key is cached
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    /// An entity with the given key is already cached
    #[error("{entity} '{key}' already exists")]
    Duplicate { entity: &'static str, key: String },

    /// A record of a hydration batch failed to construct
    #[error("record {index} is invalid: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: ParseError,
    },

    /// A hydration batch entry is not a JSON object
    #[error("record {index} is not an object")]
    NotAnObject { index: usize },
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl ToString) -> Self {
        StoreError::Duplicate {
            entity,
            key: key.to_string(),
        }
    }

    /// The underlying parse failure, if any
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            StoreError::Parse(e) | StoreError::InvalidRecord { source: e, .. } => Some(e),
            _ => None,
        }
    }
}
