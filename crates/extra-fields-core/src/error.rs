//! Error types for field validation, field declaration and settings loading
//!
//! Per-value failures are reported as [`ValidationError`]s carrying an
//! [`ErrorDetail`]; a serializer collects them into [`ValidationErrors`]
//! keyed by field name. Misuse detected while declaring a field is a
//! [`DeclarationError`] and never surfaces at validation time.
//!
//! Copyright (c) 2025 Extra Fields Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Key used for errors that do not belong to a single field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Structured detail of a validation failure
///
/// Simple fields report an ordered list of messages. Compound fields (such
/// as the point field) report messages keyed by the offending sub-field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    /// Ordered, human-readable messages
    List(Vec<String>),
    /// Nested details keyed by sub-field name
    Map(BTreeMap<String, ErrorDetail>),
}

impl ErrorDetail {
    /// All messages in this detail, depth first
    pub fn messages(&self) -> Vec<&str> {
        match self {
            ErrorDetail::List(messages) => messages.iter().map(String::as_str).collect(),
            ErrorDetail::Map(entries) => entries
                .values()
                .flat_map(|detail| detail.messages())
                .collect(),
        }
    }

    /// Render the detail in the JSON error payload shape
    pub fn to_value(&self) -> Value {
        match self {
            ErrorDetail::List(messages) => {
                Value::Array(messages.iter().cloned().map(Value::String).collect())
            }
            ErrorDetail::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, detail)| (key.clone(), detail.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorDetail::List(messages) => write!(f, "{}", messages.join(" ")),
            ErrorDetail::Map(entries) => {
                let mut first = true;
                for (key, detail) in entries {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}: {}", key, detail)?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

/// Rejection of a single input value
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationError {
    detail: ErrorDetail,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error: {}", self.detail)
    }
}

impl ValidationError {
    /// Create an error with a single message
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            detail: ErrorDetail::List(vec![message.into()]),
        }
    }

    /// Create an error keyed by sub-field
    pub fn from_map(entries: BTreeMap<String, ErrorDetail>) -> Self {
        Self {
            detail: ErrorDetail::Map(entries),
        }
    }

    /// Wrap this error under a sub-field key
    pub fn nested<K: Into<String>>(self, key: K) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(key.into(), self.detail);
        Self::from_map(entries)
    }

    /// The structured detail
    pub fn detail(&self) -> &ErrorDetail {
        &self.detail
    }

    /// Consume the error, keeping its detail
    pub fn into_detail(self) -> ErrorDetail {
        self.detail
    }

    /// All messages of this error, depth first
    pub fn messages(&self) -> Vec<&str> {
        self.detail.messages()
    }
}

/// Result type for single-value validation
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Field-scoped validation errors collected by a serializer
///
/// Serializes to the `{"field": ["message", ...]}` payload shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, ErrorDetail>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multiple validation errors occurred:")?;
        for (i, (field, detail)) in self.errors.iter().enumerate() {
            write!(f, "\n{}. {}: {}", i + 1, field, detail)?;
        }
        Ok(())
    }
}

impl ValidationErrors {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error of one field
    pub fn add<F: Into<String>>(&mut self, field: F, error: ValidationError) {
        self.errors.insert(field.into(), error.into_detail());
    }

    /// Detail recorded for a field
    pub fn get(&self, field: &str) -> Option<&ErrorDetail> {
        self.errors.get(field)
    }

    /// Iterate over `(field, detail)` pairs in field-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ErrorDetail)> {
        self.errors.iter().map(|(field, detail)| (field.as_str(), detail))
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of fields with errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Render the collection in the JSON error payload shape
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.errors
                .iter()
                .map(|(field, detail)| (field.clone(), detail.to_value()))
                .collect(),
        )
    }

    /// Ok if no errors were recorded
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Misuse detected while a field is being declared
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// The child of a range field was declared with `source`
    #[error("The `source` argument is not meaningful when applied to a `child=` field. Remove `source=` from the field declaration.")]
    SourceOnChild,
}

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file could not be parsed
    #[error("Invalid settings file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A single setting holds an unusable value
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// A single value was rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A serializer rejected one or more fields
    #[error(transparent)]
    Fields(#[from] ValidationErrors),

    /// A field was declared incorrectly
    #[error("Declaration error: {0}")]
    Declaration(#[from] DeclarationError),

    /// Settings could not be loaded
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;
