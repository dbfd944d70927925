//! User-facing validation messages
//!
//! Copyright (c) 2025 Extra Fields Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;
use std::fmt::Display;

pub const REQUIRED: &str = "This field is required.";
pub const NULL: &str = "This field may not be null.";

pub const INVALID_INTEGER: &str = "A valid integer is required.";
pub const INVALID_NUMBER: &str = "A valid number is required.";
pub const INVALID_BOOLEAN: &str = "Must be a valid boolean.";
pub const MAX_STRING_LENGTH: &str = "String value too large.";

pub const INVALID_FILE: &str = "Please upload a valid file.";
pub const INVALID_FILE_TYPE: &str = "The type of the file couldn't be determined.";
pub const INVALID_IMAGE: &str = "Please upload a valid image.";
pub const INVALID_IMAGE_TYPE: &str = "The type of the image couldn't be determined.";

/// Name of a JSON value's type as reported in messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(number) if number.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

pub fn not_a_dict(value: &Value) -> String {
    format!(
        "Expected a dictionary of items but got type \"{}\".",
        json_type_name(value)
    )
}

pub fn invalid_data(value: &Value) -> String {
    format!(
        "Invalid data. Expected a dictionary, but got {}.",
        json_type_name(value)
    )
}

pub fn extra_content(keys: &[&str]) -> String {
    format!("Extra content not allowed \"{}\".", keys.join(", "))
}

pub fn not_base64_string(value: &Value) -> String {
    format!(
        "Invalid type. This is not an base64 string: \"{}\".",
        json_type_name(value)
    )
}

pub fn invalid_bounds(given: &str) -> String {
    format!(
        "Invalid bounds \"{}\". Expected one of \"[)\", \"(]\", \"()\", \"[]\".",
        given
    )
}

pub fn max_value(limit: impl Display) -> String {
    format!("Ensure this value is less than or equal to {}.", limit)
}

pub fn min_value(limit: impl Display) -> String {
    format!("Ensure this value is greater than or equal to {}.", limit)
}

pub fn date_wrong_format(formats: &str) -> String {
    format!(
        "Date has wrong format. Use one of these formats instead: {}.",
        formats
    )
}

pub fn datetime_wrong_format(formats: &str) -> String {
    format!(
        "Datetime has wrong format. Use one of these formats instead: {}.",
        formats
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_names() {
        assert_eq!(json_type_name(&json!("x")), "str");
        assert_eq!(json_type_name(&json!(1)), "int");
        assert_eq!(json_type_name(&json!(1.5)), "float");
        assert_eq!(json_type_name(&json!([])), "list");
        assert_eq!(json_type_name(&json!({})), "dict");
        assert_eq!(json_type_name(&json!(true)), "bool");
        assert_eq!(json_type_name(&Value::Null), "NoneType");
    }

    #[test]
    fn test_formatted_messages() {
        assert_eq!(
            not_a_dict(&json!("not a dict")),
            "Expected a dictionary of items but got type \"str\"."
        );
        assert_eq!(extra_content(&["foo"]), "Extra content not allowed \"foo\".");
        assert_eq!(
            extra_content(&["bar", "foo"]),
            "Extra content not allowed \"bar, foo\"."
        );
        assert_eq!(max_value(90.0), "Ensure this value is less than or equal to 90.");
        assert_eq!(min_value(-180.0), "Ensure this value is greater than or equal to -180.");
    }
}
