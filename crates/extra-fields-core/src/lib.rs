//! Extra Fields Core - Validated field types for JSON payloads
//!
//! This crate provides field types that turn external JSON values into
//! typed internal values and render them back, with structured,
//! user-facing validation errors.
//!
//! # Main Components
//!
//! - **Field Contract**: [`Field`], [`FieldDeclaration`] and the type-erased [`DynField`]
//! - **Image Uploads**: [`Base64ImageField`] and the generic [`Base64FileField`]
//! - **Geographic Points**: [`PointField`]
//! - **Ranges**: [`IntegerRangeField`], [`FloatRangeField`], [`DateRangeField`], [`DateTimeRangeField`]
//! - **Serializer**: validates a whole object and collects field errors
//! - **Settings**: timezone and format handling for date and datetime fields
//!
//! # Example
//!
//! ```
//! use extra_fields_core::{Field, IntegerRangeField, Range, Bounds};
//! use serde_json::json;
//!
//! let field = IntegerRangeField::new();
//! let range = field
//!     .run_validation(Some(&json!({"lower": "1", "upper": 5})))
//!     .unwrap()
//!     .into_option();
//! assert_eq!(range, Some(Range::new(Some(1), Some(5), Bounds::default())));
//! ```

pub mod error;
pub mod fields;
pub mod serializer;
pub mod settings;

// Re-export main types for convenience
pub use error::{
    DeclarationError, Error, ErrorDetail, Result, SettingsError, ValidationError,
    ValidationErrors, ValidationResult, NON_FIELD_ERRORS,
};
pub use fields::{
    // Contract
    AnyValue, DynField, Field, FieldDeclaration, FieldOptions, Validated,

    // Scalars
    DateField, DateTimeField, FloatField, IntegerField,

    // Files
    Base64FileField, Base64ImageField, FileKind, ImageKind, Rejection, UploadedFile,

    // Geo
    Point, PointField,

    // Ranges
    Bounds, DateRangeField, DateTimeRangeField, FloatRangeField, IntegerRangeField, Range,
    RangeField,
};
pub use serializer::{Serializer, ValidatedData};
pub use settings::{Settings, TimeFormat, UtcOffset};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
