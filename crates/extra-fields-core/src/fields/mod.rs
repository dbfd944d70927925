//! Field types and the contract they share
//!
//! Every field turns an external JSON value into an internal value (or
//! rejects it with a [`ValidationError`]) and renders internal values back
//! to JSON. Missing and `null` inputs are handled once, in
//! [`Field::run_validation`], so individual fields only deal with real
//! data.
//!
//! - [`scalar`]: integer, float, date and datetime fields
//! - [`file`]: base64 file uploads and the image specialization
//! - [`geo`]: geographic points
//! - [`range`]: range fields generic over a child scalar
//!
//! Copyright (c) 2025 Extra Fields Team
//! Licensed under the Apache-2.0 license

pub mod file;
pub mod geo;
pub mod messages;
pub mod range;
pub mod scalar;

use crate::error::{ValidationError, ValidationResult};
use serde_json::Value;
use std::any::Any;

pub use file::{Base64FileField, Base64ImageField, FileKind, ImageKind, Rejection, UploadedFile};
pub use geo::{Point, PointField};
pub use range::{
    Bounds, DateRangeField, DateTimeRangeField, FloatRangeField, IntegerRangeField, Range,
    RangeField,
};
pub use scalar::{DateField, DateTimeField, FloatField, IntegerField};

/// Options every field declaration carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOptions {
    /// Reject inputs where the key is absent
    pub required: bool,
    /// Accept `null` as "no value"
    pub allow_null: bool,
    /// Name of the attribute the value is stored under, when it differs
    /// from the field name
    pub source: Option<String>,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            required: true,
            allow_null: false,
            source: None,
        }
    }
}

impl FieldOptions {
    /// Options for fields where `null` means "no value"
    pub fn nullable() -> Self {
        Self {
            allow_null: true,
            ..Self::default()
        }
    }
}

/// Outcome of running a field on a possibly missing input
#[derive(Debug, Clone, PartialEq)]
pub enum Validated<T> {
    /// The key was absent and the field is not required
    Missing,
    /// The input means "no value"
    Null,
    /// A validated internal value
    Value(T),
}

impl<T> Validated<T> {
    /// The value, if there is one
    pub fn into_option(self) -> Option<T> {
        match self {
            Validated::Value(value) => Some(value),
            Validated::Missing | Validated::Null => None,
        }
    }

    pub fn as_ref(&self) -> Validated<&T> {
        match self {
            Validated::Missing => Validated::Missing,
            Validated::Null => Validated::Null,
            Validated::Value(value) => Validated::Value(value),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Validated<U> {
        match self {
            Validated::Missing => Validated::Missing,
            Validated::Null => Validated::Null,
            Validated::Value(value) => Validated::Value(f(value)),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Validated::Missing)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Validated::Null)
    }
}

/// Shared contract of every field type
pub trait Field {
    /// Internal representation produced by this field
    type Value;

    /// Declared options of this field
    fn options(&self) -> &FieldOptions;

    /// Transform a present, non-null input
    ///
    /// `Ok(None)` means the input is this field's spelling of "no value".
    fn to_internal_value(&self, data: &Value) -> ValidationResult<Option<Self::Value>>;

    /// Render an internal value
    fn to_representation(&self, value: &Self::Value) -> Value;

    /// Validate a possibly missing input
    fn run_validation(&self, data: Option<&Value>) -> ValidationResult<Validated<Self::Value>> {
        let options = self.options();
        let data = match data {
            None if options.required => return Err(ValidationError::new(messages::REQUIRED)),
            None => return Ok(Validated::Missing),
            Some(Value::Null) if options.allow_null => return Ok(Validated::Null),
            Some(Value::Null) => return Err(ValidationError::new(messages::NULL)),
            Some(data) => data,
        };

        Ok(match self.to_internal_value(data)? {
            Some(value) => Validated::Value(value),
            None => Validated::Null,
        })
    }
}

/// Builder methods for the options every field declares
pub trait FieldDeclaration: Sized {
    fn options_mut(&mut self) -> &mut FieldOptions;

    /// Set whether the key must be present
    fn required(mut self, required: bool) -> Self {
        self.options_mut().required = required;
        self
    }

    /// Set whether `null` is accepted
    fn allow_null(mut self, allow_null: bool) -> Self {
        self.options_mut().allow_null = allow_null;
        self
    }

    /// Store the value under another attribute name
    fn source<S: Into<String>>(mut self, source: S) -> Self {
        self.options_mut().source = Some(source.into());
        self
    }
}

/// Type-erased internal value
pub type AnyValue = Box<dyn Any + Send + Sync>;

/// Object-safe view of a [`Field`], used to hold heterogeneous fields
/// in a serializer
pub trait DynField: Send + Sync {
    fn field_options(&self) -> &FieldOptions;

    fn run_validation_any(&self, data: Option<&Value>) -> ValidationResult<Validated<AnyValue>>;

    /// Render a value produced by this field; `None` if the value has
    /// another type
    fn to_representation_any(&self, value: &(dyn Any + Send + Sync)) -> Option<Value>;
}

impl<F> DynField for F
where
    F: Field + Send + Sync,
    F::Value: Send + Sync + 'static,
{
    fn field_options(&self) -> &FieldOptions {
        self.options()
    }

    fn run_validation_any(&self, data: Option<&Value>) -> ValidationResult<Validated<AnyValue>> {
        Ok(self
            .run_validation(data)?
            .map(|value| Box::new(value) as AnyValue))
    }

    fn to_representation_any(&self, value: &(dyn Any + Send + Sync)) -> Option<Value> {
        value
            .downcast_ref::<F::Value>()
            .map(|value| self.to_representation(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_input_handling() {
        let required = IntegerField::new();
        let error = required.run_validation(None).unwrap_err();
        assert_eq!(error.messages(), vec![messages::REQUIRED]);

        let optional = IntegerField::new().required(false);
        assert!(optional.run_validation(None).unwrap().is_missing());
    }

    #[test]
    fn test_null_input_handling() {
        let field = IntegerField::new();
        let error = field.run_validation(Some(&Value::Null)).unwrap_err();
        assert_eq!(error.messages(), vec![messages::NULL]);

        let nullable = IntegerField::new().allow_null(true);
        assert!(nullable.run_validation(Some(&Value::Null)).unwrap().is_null());
    }

    #[test]
    fn test_dyn_field_roundtrip() {
        let field: Box<dyn DynField> = Box::new(IntegerField::new());
        let validated = field.run_validation_any(Some(&json!("7"))).unwrap();
        let value = match validated {
            Validated::Value(value) => value,
            other => panic!("expected a value, got {:?}", other.is_null()),
        };
        assert_eq!(field.to_representation_any(value.as_ref()), Some(json!(7)));

        let wrong_type: AnyValue = Box::new("seven".to_string());
        assert_eq!(field.to_representation_any(wrong_type.as_ref()), None);
    }

    #[test]
    fn test_validated_helpers() {
        assert_eq!(Validated::Value(3).map(|v| v * 2).into_option(), Some(6));
        assert_eq!(Validated::<i32>::Null.into_option(), None);
        assert!(Validated::<i32>::Missing.as_ref().is_missing());
    }
}
