// Error taxonomy for record collections

use crate::form::FieldErrors;
use std::fmt;
use thiserror::Error;

/// Errors raised by store operations that reference a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with this id exists in the collection
    #[error("record '{0}' not found")]
    NotFound(String),

    /// The record type has no boolean field with this name
    #[error("field '{field}' of {collection} cannot be toggled")]
    UnsupportedFlag { collection: &'static str, field: String },
}

/// Errors raised when a form submission cannot be applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("validation failed: {0}")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure to parse a status, weekday or sort key from user input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// A durable write failed; the in-memory mutation was kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceWarning {
    pub key: String,
    pub message: String,
}

impl fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "changes to '{}' were not saved: {}", self.key, self.message)
    }
}
