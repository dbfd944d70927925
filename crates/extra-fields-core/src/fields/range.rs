//! Range fields
//!
//! A range field reads `{"lower": .., "upper": .., "bounds": "[)", "empty": false}`
//! and hands each bound to a child scalar field. The four concrete range
//! fields are aliases of [`RangeField`] over the matching scalar.
//!
//! Copyright (c) 2025 Extra Fields Team
//! Licensed under the Apache-2.0 license

use super::{
    messages, DateField, DateTimeField, Field, FieldDeclaration, FieldOptions, FloatField,
    IntegerField,
};
use crate::error::{DeclarationError, ValidationError, ValidationResult};
use crate::settings::Settings;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

pub const LOWER: &str = "lower";
pub const UPPER: &str = "upper";
pub const BOUNDS: &str = "bounds";
pub const EMPTY: &str = "empty";

/// Keys a range mapping may contain
pub const RANGE_KEYS: [&str; 4] = [LOWER, UPPER, BOUNDS, EMPTY];

/// Inclusiveness of the two ends of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bounds {
    /// `[)`
    #[default]
    LowerInclusive,
    /// `(]`
    UpperInclusive,
    /// `()`
    Exclusive,
    /// `[]`
    Inclusive,
}

impl Bounds {
    pub const ALL: [Bounds; 4] = [
        Bounds::LowerInclusive,
        Bounds::UpperInclusive,
        Bounds::Exclusive,
        Bounds::Inclusive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bounds::LowerInclusive => "[)",
            Bounds::UpperInclusive => "(]",
            Bounds::Exclusive => "()",
            Bounds::Inclusive => "[]",
        }
    }

    /// Parse a two character specifier
    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bounds| bounds.as_str() == text)
    }

    pub fn includes_lower(&self) -> bool {
        matches!(self, Bounds::LowerInclusive | Bounds::Inclusive)
    }

    pub fn includes_upper(&self) -> bool {
        matches!(self, Bounds::UpperInclusive | Bounds::Inclusive)
    }

    fn from_value(data: Option<&Value>) -> ValidationResult<Self> {
        match data {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::String(text)) => {
                Self::parse(text).ok_or_else(|| ValidationError::new(messages::invalid_bounds(text)))
            }
            Some(other) => Err(ValidationError::new(messages::invalid_bounds(
                messages::json_type_name(other),
            ))),
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A range of `T`: empty, or bounded on zero, one or both sides
#[derive(Debug, Clone, PartialEq)]
pub enum Range<T> {
    /// Contains no value at all
    Empty,
    /// `None` on a side means unbounded on that side
    Bounded {
        lower: Option<T>,
        upper: Option<T>,
        bounds: Bounds,
    },
}

impl<T> Default for Range<T> {
    /// The unbounded range
    fn default() -> Self {
        Range::Bounded {
            lower: None,
            upper: None,
            bounds: Bounds::default(),
        }
    }
}

impl<T> Range<T> {
    pub fn new(lower: Option<T>, upper: Option<T>, bounds: Bounds) -> Self {
        Range::Bounded {
            lower,
            upper,
            bounds,
        }
    }

    pub fn empty() -> Self {
        Range::Empty
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Range::Empty)
    }

    pub fn lower(&self) -> Option<&T> {
        match self {
            Range::Bounded { lower, .. } => lower.as_ref(),
            Range::Empty => None,
        }
    }

    pub fn upper(&self) -> Option<&T> {
        match self {
            Range::Bounded { upper, .. } => upper.as_ref(),
            Range::Empty => None,
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Range::Bounded { bounds, .. } => Some(*bounds),
            Range::Empty => None,
        }
    }
}

impl<T: PartialOrd> Range<T> {
    /// Whether `value` lies inside the range
    pub fn contains(&self, value: &T) -> bool {
        let Range::Bounded {
            lower,
            upper,
            bounds,
        } = self
        else {
            return false;
        };

        let above_lower = match lower {
            None => true,
            Some(lower) => match value.partial_cmp(lower) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => bounds.includes_lower(),
                _ => false,
            },
        };
        let below_upper = match upper {
            None => true,
            Some(upper) => match value.partial_cmp(upper) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => bounds.includes_upper(),
                _ => false,
            },
        };
        above_lower && below_upper
    }
}

/// Field reading a [`Range`] whose bounds are validated by `C`
#[derive(Debug, Clone)]
pub struct RangeField<C> {
    options: FieldOptions,
    child: C,
}

pub type IntegerRangeField = RangeField<IntegerField>;
pub type FloatRangeField = RangeField<FloatField>;
pub type DateRangeField = RangeField<DateField>;
pub type DateTimeRangeField = RangeField<DateTimeField>;

impl<C: Field + Default> Default for RangeField<C> {
    fn default() -> Self {
        Self {
            options: FieldOptions::nullable(),
            child: C::default(),
        }
    }
}

impl<C: Field + Default> RangeField<C> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Field> RangeField<C> {
    /// Range field with an explicitly configured child
    ///
    /// Bounds are not attributes of their own, so a child declared with
    /// `source` is refused.
    pub fn with_child(child: C) -> Result<Self, DeclarationError> {
        if child.options().source.is_some() {
            return Err(DeclarationError::SourceOnChild);
        }
        Ok(Self {
            options: FieldOptions::nullable(),
            child,
        })
    }

    pub fn child(&self) -> &C {
        &self.child
    }

    fn bound(&self, data: Option<&Value>) -> ValidationResult<Option<C::Value>> {
        match data {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(self.child.run_validation(Some(value))?.into_option()),
        }
    }

    fn render_bound(&self, value: Option<&C::Value>) -> Value {
        value.map_or(Value::Null, |value| self.child.to_representation(value))
    }
}

impl RangeField<DateField> {
    /// Date range using the date formats from `settings`
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            options: FieldOptions::nullable(),
            child: DateField::from_settings(settings),
        }
    }
}

impl RangeField<DateTimeField> {
    /// Datetime range using the formats and timezone handling from
    /// `settings`
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            options: FieldOptions::nullable(),
            child: DateTimeField::from_settings(settings),
        }
    }
}

fn check_keys(mapping: &Map<String, Value>) -> ValidationResult<()> {
    let mut extra: Vec<&str> = mapping
        .keys()
        .map(String::as_str)
        .filter(|key| !RANGE_KEYS.contains(key))
        .collect();
    if extra.is_empty() {
        return Ok(());
    }
    extra.sort_unstable();
    debug!(keys = ?extra, "range input has unexpected keys");
    Err(ValidationError::new(messages::extra_content(&extra)))
}

fn is_empty_flag(data: Option<&Value>) -> ValidationResult<bool> {
    match data {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(_) => Err(ValidationError::new(messages::INVALID_BOOLEAN)),
    }
}

impl<C> FieldDeclaration for RangeField<C> {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl<C: Field> Field for RangeField<C> {
    type Value = Range<C::Value>;

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn to_internal_value(&self, data: &Value) -> ValidationResult<Option<Range<C::Value>>> {
        let mapping = match data {
            Value::String(text) if text.is_empty() => return Ok(None),
            Value::Object(mapping) => mapping,
            other => return Err(ValidationError::new(messages::not_a_dict(other))),
        };

        check_keys(mapping)?;
        if is_empty_flag(mapping.get(EMPTY))? {
            return Ok(Some(Range::Empty));
        }

        let bounds = Bounds::from_value(mapping.get(BOUNDS))?;
        let lower = self.bound(mapping.get(LOWER))?;
        let upper = self.bound(mapping.get(UPPER))?;
        Ok(Some(Range::new(lower, upper, bounds)))
    }

    fn to_representation(&self, value: &Range<C::Value>) -> Value {
        let mut output = Map::new();
        match value {
            Range::Empty => {
                output.insert(EMPTY.to_string(), Value::Bool(true));
            }
            Range::Bounded {
                lower,
                upper,
                bounds,
            } => {
                output.insert(LOWER.to_string(), self.render_bound(lower.as_ref()));
                output.insert(UPPER.to_string(), self.render_bound(upper.as_ref()));
                output.insert(BOUNDS.to_string(), Value::String(bounds.to_string()));
            }
        }
        Value::Object(output)
    }
}
