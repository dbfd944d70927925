//! Serializer: a named, ordered set of fields validated together
//!
//! Copyright (c) 2025 Extra Fields Team
//! Licensed under the Apache-2.0 license

use crate::error::{ValidationError, ValidationErrors, NON_FIELD_ERRORS};
use crate::fields::{messages, AnyValue, DynField, Validated};
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Values produced by a serializer, keyed by attribute name
///
/// A key holding `None` was validated as null; a key that is absent was
/// not part of the input.
#[derive(Default)]
pub struct ValidatedData {
    values: BTreeMap<String, Option<AnyValue>>,
}

impl ValidatedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, or null
    pub fn insert<K, T>(&mut self, key: K, value: Option<T>)
    where
        K: Into<String>,
        T: Any + Send + Sync,
    {
        self.values
            .insert(key.into(), value.map(|value| Box::new(value) as AnyValue));
    }

    fn insert_any(&mut self, key: String, value: Option<AnyValue>) {
        self.values.insert(key, value);
    }

    /// Typed access to a non-null value
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values
            .get(key)?
            .as_ref()
            .and_then(|value| value.downcast_ref::<T>())
    }

    fn get_any(&self, key: &str) -> Option<&Option<AnyValue>> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Whether `key` is present and null
    pub fn is_null(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(None))
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Overwrite entries with those of `other`
    pub fn merge(&mut self, other: ValidatedData) {
        self.values.extend(other.values);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for ValidatedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.values
                    .iter()
                    .map(|(key, value)| (key, if value.is_some() { "<value>" } else { "null" })),
            )
            .finish()
    }
}

/// An ordered collection of named fields
///
/// ```
/// use extra_fields_core::{Base64ImageField, DateTimeField, FieldDeclaration, Serializer};
/// use serde_json::json;
///
/// let serializer = Serializer::new()
///     .field("file", Base64ImageField::new().required(false))
///     .field("created", DateTimeField::new());
///
/// let data = serializer
///     .validate(&json!({"file": "", "created": "2001-01-01T13:00:00Z"}))
///     .unwrap();
/// assert!(data.is_null("file"));
/// ```
#[derive(Default)]
pub struct Serializer {
    fields: Vec<(String, Box<dyn DynField>)>,
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field(
                "fields",
                &self.fields.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field; fields are validated and rendered in declaration
    /// order
    pub fn field<N, F>(mut self, name: N, field: F) -> Self
    where
        N: Into<String>,
        F: DynField + 'static,
    {
        self.fields.push((name.into(), Box::new(field)));
        self
    }

    /// Names of the declared fields
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    fn attribute<'a>(name: &'a str, field: &'a dyn DynField) -> &'a str {
        field.field_options().source.as_deref().unwrap_or(name)
    }

    /// Validate a JSON object against every declared field
    ///
    /// All field errors are collected before failing.
    pub fn validate(&self, data: &Value) -> Result<ValidatedData, ValidationErrors> {
        let object = match data {
            Value::Object(object) => object,
            other => {
                let mut errors = ValidationErrors::new();
                errors.add(
                    NON_FIELD_ERRORS,
                    ValidationError::new(messages::invalid_data(other)),
                );
                return Err(errors);
            }
        };

        let mut validated = ValidatedData::new();
        let mut errors = ValidationErrors::new();
        for (name, field) in &self.fields {
            match field.run_validation_any(object.get(name)) {
                Ok(Validated::Missing) => {}
                Ok(Validated::Null) => {
                    validated.insert_any(Self::attribute(name, field.as_ref()).to_string(), None)
                }
                Ok(Validated::Value(value)) => validated
                    .insert_any(Self::attribute(name, field.as_ref()).to_string(), Some(value)),
                Err(error) => errors.add(name.clone(), error),
            }
        }

        if errors.is_empty() {
            Ok(validated)
        } else {
            debug!(failed = errors.len(), "serializer rejected input");
            Err(errors)
        }
    }

    /// Validate `data` and write the validated values into `instance`
    ///
    /// Values absent from `data` are left untouched; nulls overwrite.
    pub fn update(&self, instance: &mut ValidatedData, data: &Value) -> Result<(), ValidationErrors> {
        let validated = self.validate(data)?;
        instance.merge(validated);
        Ok(())
    }

    /// Render every field present in `data`
    pub fn to_representation(&self, data: &ValidatedData) -> Value {
        let mut output = Map::new();
        for (name, field) in &self.fields {
            let rendered = match data.get_any(Self::attribute(name, field.as_ref())) {
                None => continue,
                Some(None) => Value::Null,
                Some(Some(value)) => match field.to_representation_any(value.as_ref()) {
                    Some(rendered) => rendered,
                    None => {
                        debug!(field = %name, "stored value has an unexpected type");
                        continue;
                    }
                },
            };
            output.insert(name.clone(), rendered);
        }
        Value::Object(output)
    }
}
