//! Builds field declarations from their JSON description in a case file

use extra_fields_core::{
    Base64ImageField, DateField, DateRangeField, DateTimeField, DateTimeRangeField, DynField,
    FieldDeclaration, FloatField, FloatRangeField, IntegerField, IntegerRangeField, PointField,
    Settings,
};
use serde::{Deserialize, Serialize};

/// Field types a case can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    Float,
    Date,
    Datetime,
    IntegerRange,
    FloatRange,
    DateRange,
    DatetimeRange,
    Point,
    Base64Image,
}

/// A field declaration as written in a case file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub kind: FieldKind,

    #[serde(default)]
    pub required: Option<bool>,

    #[serde(default)]
    pub allow_null: Option<bool>,

    /// Point SRID
    #[serde(default)]
    pub srid: Option<u32>,

    /// Render point coordinates as strings
    #[serde(default)]
    pub str_points: bool,

    /// Accepted image extensions
    #[serde(default)]
    pub allowed_types: Option<Vec<String>>,

    /// Render images as base64
    #[serde(default)]
    pub represent_in_base64: bool,

    /// Settings for date and datetime based fields
    #[serde(default)]
    pub settings: Option<Settings>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: None,
            allow_null: None,
            srid: None,
            str_points: false,
            allowed_types: None,
            represent_in_base64: false,
            settings: None,
        }
    }
}

fn declare<F>(spec: &FieldSpec, mut field: F) -> Box<dyn DynField>
where
    F: DynField + FieldDeclaration + 'static,
{
    if let Some(required) = spec.required {
        field = field.required(required);
    }
    if let Some(allow_null) = spec.allow_null {
        field = field.allow_null(allow_null);
    }
    Box::new(field)
}

/// Build the field a case declares
pub fn build_field(spec: &FieldSpec) -> Box<dyn DynField> {
    let settings = spec.settings.clone().unwrap_or_default();

    match spec.kind {
        FieldKind::Integer => declare(spec, IntegerField::new()),
        FieldKind::Float => declare(spec, FloatField::new()),
        FieldKind::Date => declare(spec, DateField::from_settings(&settings)),
        FieldKind::Datetime => declare(spec, DateTimeField::from_settings(&settings)),
        FieldKind::IntegerRange => declare(spec, IntegerRangeField::new()),
        FieldKind::FloatRange => declare(spec, FloatRangeField::new()),
        FieldKind::DateRange => declare(spec, DateRangeField::from_settings(&settings)),
        FieldKind::DatetimeRange => declare(spec, DateTimeRangeField::from_settings(&settings)),
        FieldKind::Point => {
            let mut field = PointField::new().str_points(spec.str_points);
            if let Some(srid) = spec.srid {
                field = field.srid(srid);
            }
            declare(spec, field)
        }
        FieldKind::Base64Image => {
            let mut field =
                Base64ImageField::new().represent_in_base64(spec.represent_in_base64);
            if let Some(ref allowed_types) = spec.allowed_types {
                field = field.allowed_types(allowed_types.iter().cloned());
            }
            declare(spec, field)
        }
    }
}
