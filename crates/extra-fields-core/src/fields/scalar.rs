//! Scalar fields: integer, float, date and datetime
//!
//! These are the building blocks the range fields delegate to for their
//! bounds, and the plain fields a serializer declares next to the custom
//! ones.
//!
//! Copyright (c) 2025 Extra Fields Team
//! Licensed under the Apache-2.0 license

use super::{messages, Field, FieldDeclaration, FieldOptions};
use crate::error::{ValidationError, ValidationResult};
use crate::settings::{Settings, TimeFormat};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::OnceLock;
use tracing::trace;

/// Longest string the numeric fields will try to parse
pub const MAX_STRING_LENGTH: usize = 1000;

const ISO_8601_DATE_HINT: &str = "YYYY[-MM[-DD]]";
const ISO_8601_DATETIME_HINT: &str = "YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z]";

fn decimal_suffix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\.0*\s*$").expect("valid decimal suffix pattern"))
}

fn iso_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("valid date pattern")
    })
}

fn iso_datetime_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(\d{4})-(\d{1,2})-(\d{1,2})[T ](\d{1,2}):(\d{1,2})(?::(\d{1,2})(?:[\.,](\d{1,6})\d{0,6})?)?\s*(Z|[+-]\d{2}(?::?\d{2})?)?$",
        )
        .expect("valid datetime pattern")
    })
}

fn numeric_text(data: &str) -> ValidationResult<&str> {
    if data.len() > MAX_STRING_LENGTH {
        return Err(ValidationError::new(messages::MAX_STRING_LENGTH));
    }
    Ok(data.trim())
}

/// Integer field
#[derive(Debug, Clone, Default)]
pub struct IntegerField {
    options: FieldOptions,
    min_value: Option<i64>,
    max_value: Option<i64>,
}

impl IntegerField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_value(mut self, min_value: i64) -> Self {
        self.min_value = Some(min_value);
        self
    }

    pub fn max_value(mut self, max_value: i64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    fn parse(data: &Value) -> ValidationResult<i64> {
        let invalid = || ValidationError::new(messages::INVALID_INTEGER);
        match data {
            Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    return Ok(value);
                }
                match number.as_f64() {
                    Some(value)
                        if value.fract() == 0.0
                            && value >= i64::MIN as f64
                            && value < i64::MAX as f64 =>
                    {
                        Ok(value as i64)
                    }
                    _ => Err(invalid()),
                }
            }
            Value::String(text) => {
                let text = numeric_text(text)?;
                decimal_suffix()
                    .replace(text, "")
                    .parse::<i64>()
                    .map_err(|_| invalid())
            }
            _ => Err(invalid()),
        }
    }
}

impl FieldDeclaration for IntegerField {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl Field for IntegerField {
    type Value = i64;

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn to_internal_value(&self, data: &Value) -> ValidationResult<Option<i64>> {
        let value = Self::parse(data)?;
        if let Some(max) = self.max_value {
            if value > max {
                return Err(ValidationError::new(messages::max_value(max)));
            }
        }
        if let Some(min) = self.min_value {
            if value < min {
                return Err(ValidationError::new(messages::min_value(min)));
            }
        }
        Ok(Some(value))
    }

    fn to_representation(&self, value: &i64) -> Value {
        Value::from(*value)
    }
}

/// Floating point field
#[derive(Debug, Clone, Default)]
pub struct FloatField {
    options: FieldOptions,
    min_value: Option<f64>,
    max_value: Option<f64>,
}

impl FloatField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_value(mut self, min_value: f64) -> Self {
        self.min_value = Some(min_value);
        self
    }

    pub fn max_value(mut self, max_value: f64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    fn parse(data: &Value) -> ValidationResult<f64> {
        let value = match data {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => numeric_text(text)?.parse::<f64>().ok(),
            _ => None,
        };
        value
            .filter(|value| value.is_finite())
            .ok_or_else(|| ValidationError::new(messages::INVALID_NUMBER))
    }
}

impl FieldDeclaration for FloatField {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl Field for FloatField {
    type Value = f64;

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn to_internal_value(&self, data: &Value) -> ValidationResult<Option<f64>> {
        let value = Self::parse(data)?;
        if let Some(max) = self.max_value {
            if value > max {
                return Err(ValidationError::new(messages::max_value(max)));
            }
        }
        if let Some(min) = self.min_value {
            if value < min {
                return Err(ValidationError::new(messages::min_value(min)));
            }
        }
        Ok(Some(value))
    }

    fn to_representation(&self, value: &f64) -> Value {
        Number::from_f64(*value).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Turn chrono format strings into the hints shown in error messages
fn humanize_formats(formats: &[TimeFormat], iso_hint: &str) -> String {
    formats
        .iter()
        .map(|format| match format {
            TimeFormat::Iso8601 => iso_hint.to_string(),
            TimeFormat::Custom(format) => format
                .replace("%Y", "YYYY")
                .replace("%y", "YY")
                .replace("%m", "MM")
                .replace("%b", "[Jan-Dec]")
                .replace("%B", "[January-December]")
                .replace("%d", "DD")
                .replace("%H", "hh")
                .replace("%I", "hh")
                .replace("%M", "mm")
                .replace("%S", "ss")
                .replace("%p", "[AM|PM]")
                .replace("%z", "[+HHMM|-HHMM]")
                .replace("%:z", "[+HH:MM|-HH:MM]")
                .replace("%f", "uuuuuu"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn capture_u32(captures: &regex::Captures<'_>, index: usize) -> Option<u32> {
    captures.get(index).and_then(|m| m.as_str().parse().ok())
}

fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let captures = iso_date_pattern().captures(text)?;
    let year = captures.get(1)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, capture_u32(&captures, 2)?, capture_u32(&captures, 3)?)
}

/// A parsed ISO 8601 datetime, with its offset when one was given
enum ParsedDateTime {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

fn parse_iso_offset(text: &str) -> Option<FixedOffset> {
    if text == "Z" {
        return FixedOffset::east_opt(0);
    }
    let sign = if text.starts_with('-') { -1 } else { 1 };
    let digits: String = text[1..].chars().filter(|c| *c != ':').collect();
    let hours: i32 = digits.get(..2)?.parse().ok()?;
    let minutes: i32 = match digits.get(2..) {
        Some("") | None => 0,
        Some(minutes) => minutes.parse().ok()?,
    };
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_iso_datetime(text: &str) -> Option<ParsedDateTime> {
    let captures = iso_datetime_pattern().captures(text)?;
    let year = captures.get(1)?.as_str().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, capture_u32(&captures, 2)?, capture_u32(&captures, 3)?)?;

    let micros = match captures.get(7) {
        Some(fraction) => format!("{:0<6}", fraction.as_str()).parse().ok()?,
        None => 0,
    };
    let time = NaiveTime::from_hms_micro_opt(
        capture_u32(&captures, 4)?,
        capture_u32(&captures, 5)?,
        capture_u32(&captures, 6).unwrap_or(0),
        micros,
    )?;
    let naive = NaiveDateTime::new(date, time);

    match captures.get(8) {
        Some(offset) => {
            let offset = parse_iso_offset(offset.as_str())?;
            offset.from_local_datetime(&naive).single().map(ParsedDateTime::Aware)
        }
        None => Some(ParsedDateTime::Naive(naive)),
    }
}

/// Date field
#[derive(Debug, Clone)]
pub struct DateField {
    options: FieldOptions,
    format: TimeFormat,
    input_formats: Vec<TimeFormat>,
}

impl Default for DateField {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl DateField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Date field using the formats from `settings`
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            options: FieldOptions::default(),
            format: settings.date_format.clone(),
            input_formats: settings.date_input_formats.clone(),
        }
    }

    pub fn format(mut self, format: TimeFormat) -> Self {
        self.format = format;
        self
    }

    pub fn input_formats(mut self, input_formats: Vec<TimeFormat>) -> Self {
        self.input_formats = input_formats;
        self
    }

    fn wrong_format(&self) -> ValidationError {
        ValidationError::new(messages::date_wrong_format(&humanize_formats(
            &self.input_formats,
            ISO_8601_DATE_HINT,
        )))
    }
}

impl FieldDeclaration for DateField {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl Field for DateField {
    type Value = NaiveDate;

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn to_internal_value(&self, data: &Value) -> ValidationResult<Option<NaiveDate>> {
        let text = match data {
            Value::String(text) => text.as_str(),
            _ => return Err(self.wrong_format()),
        };

        for format in &self.input_formats {
            let parsed = match format {
                TimeFormat::Iso8601 => parse_iso_date(text),
                TimeFormat::Custom(format) => NaiveDate::parse_from_str(text, format).ok(),
            };
            if let Some(date) = parsed {
                return Ok(Some(date));
            }
        }

        trace!(input = %text, "no date input format matched");
        Err(self.wrong_format())
    }

    fn to_representation(&self, value: &NaiveDate) -> Value {
        match &self.format {
            TimeFormat::Iso8601 => Value::String(value.format("%Y-%m-%d").to_string()),
            TimeFormat::Custom(format) => Value::String(value.format(format).to_string()),
        }
    }
}

/// Timezone-aware datetime field
#[derive(Debug, Clone)]
pub struct DateTimeField {
    options: FieldOptions,
    format: TimeFormat,
    input_formats: Vec<TimeFormat>,
    use_tz: bool,
    default_offset: FixedOffset,
}

impl Default for DateTimeField {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl DateTimeField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Datetime field using the formats and timezone handling from
    /// `settings`
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            options: FieldOptions::default(),
            format: settings.datetime_format.clone(),
            input_formats: settings.datetime_input_formats.clone(),
            use_tz: settings.use_tz,
            default_offset: settings.time_zone.fixed(),
        }
    }

    pub fn format(mut self, format: TimeFormat) -> Self {
        self.format = format;
        self
    }

    pub fn input_formats(mut self, input_formats: Vec<TimeFormat>) -> Self {
        self.input_formats = input_formats;
        self
    }

    fn wrong_format(&self) -> ValidationError {
        ValidationError::new(messages::datetime_wrong_format(&humanize_formats(
            &self.input_formats,
            ISO_8601_DATETIME_HINT,
        )))
    }

    /// Attach or convert to the default offset
    fn enforce_timezone(&self, parsed: ParsedDateTime) -> Option<DateTime<FixedOffset>> {
        match parsed {
            ParsedDateTime::Aware(value) if self.use_tz => Some(value),
            ParsedDateTime::Aware(value) => Some(value.with_timezone(&self.default_offset)),
            ParsedDateTime::Naive(naive) => self
                .default_offset
                .from_local_datetime(&naive)
                .single(),
        }
    }

    fn parse_custom(text: &str, format: &str) -> Option<ParsedDateTime> {
        if let Ok(value) = DateTime::parse_from_str(text, format) {
            return Some(ParsedDateTime::Aware(value));
        }
        NaiveDateTime::parse_from_str(text, format)
            .ok()
            .map(ParsedDateTime::Naive)
    }

    fn iso_representation(&self, value: &DateTime<FixedOffset>) -> String {
        let mut text = value.format("%Y-%m-%dT%H:%M:%S").to_string();
        let micros = value.timestamp_subsec_micros();
        if micros != 0 {
            text.push_str(&format!(".{:06}", micros));
        }
        if self.use_tz {
            if value.offset().local_minus_utc() == 0 {
                text.push('Z');
            } else {
                text.push_str(&value.format("%:z").to_string());
            }
        }
        text
    }
}

impl FieldDeclaration for DateTimeField {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl Field for DateTimeField {
    type Value = DateTime<FixedOffset>;

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn to_internal_value(&self, data: &Value) -> ValidationResult<Option<DateTime<FixedOffset>>> {
        let text = match data {
            Value::String(text) => text.as_str(),
            _ => return Err(self.wrong_format()),
        };

        for format in &self.input_formats {
            let parsed = match format {
                TimeFormat::Iso8601 => parse_iso_datetime(text),
                TimeFormat::Custom(format) => Self::parse_custom(text, format),
            };
            if let Some(value) = parsed.and_then(|parsed| self.enforce_timezone(parsed)) {
                return Ok(Some(value));
            }
        }

        trace!(input = %text, "no datetime input format matched");
        Err(self.wrong_format())
    }

    fn to_representation(&self, value: &DateTime<FixedOffset>) -> Value {
        let value = value.with_timezone(&self.default_offset);
        match &self.format {
            TimeFormat::Iso8601 => Value::String(self.iso_representation(&value)),
            TimeFormat::Custom(format) => Value::String(value.format(format).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::UtcOffset;
    use serde_json::json;

    fn messages_of(error: ValidationError) -> Vec<String> {
        error.messages().into_iter().map(String::from).collect()
    }

    #[test]
    fn test_integer_inputs() {
        let field = IntegerField::new();
        assert_eq!(field.to_internal_value(&json!(1)).unwrap(), Some(1));
        assert_eq!(field.to_internal_value(&json!("1")).unwrap(), Some(1));
        assert_eq!(field.to_internal_value(&json!(" 12 ")).unwrap(), Some(12));
        assert_eq!(field.to_internal_value(&json!("1.0")).unwrap(), Some(1));
        assert_eq!(field.to_internal_value(&json!(1.0)).unwrap(), Some(1));
        assert_eq!(field.to_internal_value(&json!("-3")).unwrap(), Some(-3));
    }

    #[test]
    fn test_integer_invalid_inputs() {
        let field = IntegerField::new();
        for input in [json!("a"), json!("1.5"), json!(1.5), json!(""), json!(true), json!([1])] {
            let error = field.to_internal_value(&input).unwrap_err();
            assert_eq!(messages_of(error), vec![messages::INVALID_INTEGER], "input {}", input);
        }

        let too_long = Value::String("1".repeat(MAX_STRING_LENGTH + 1));
        let error = field.to_internal_value(&too_long).unwrap_err();
        assert_eq!(messages_of(error), vec![messages::MAX_STRING_LENGTH]);
    }

    #[test]
    fn test_integer_limits() {
        let field = IntegerField::new().min_value(0).max_value(10);
        assert_eq!(
            messages_of(field.to_internal_value(&json!(11)).unwrap_err()),
            vec!["Ensure this value is less than or equal to 10."]
        );
        assert_eq!(
            messages_of(field.to_internal_value(&json!(-1)).unwrap_err()),
            vec!["Ensure this value is greater than or equal to 0."]
        );
    }

    #[test]
    fn test_float_inputs() {
        let field = FloatField::new();
        assert_eq!(field.to_internal_value(&json!("1")).unwrap(), Some(1.0));
        assert_eq!(field.to_internal_value(&json!(2.5)).unwrap(), Some(2.5));
        assert_eq!(field.to_internal_value(&json!(" 1.1 ")).unwrap(), Some(1.1));
        for input in [json!("a"), json!(""), json!("NaN"), json!("inf"), json!(null)] {
            let error = field.to_internal_value(&input).unwrap_err();
            assert_eq!(messages_of(error), vec![messages::INVALID_NUMBER], "input {}", input);
        }
        assert_eq!(field.to_representation(&1.1), json!(1.1));
    }

    #[test]
    fn test_date_inputs() {
        let field = DateField::new();
        assert_eq!(
            field.to_internal_value(&json!("2001-01-01")).unwrap(),
            NaiveDate::from_ymd_opt(2001, 1, 1)
        );
        assert_eq!(
            field.to_internal_value(&json!("2001-2-3")).unwrap(),
            NaiveDate::from_ymd_opt(2001, 2, 3)
        );
        assert_eq!(
            messages_of(field.to_internal_value(&json!("a")).unwrap_err()),
            vec!["Date has wrong format. Use one of these formats instead: YYYY[-MM[-DD]]."]
        );
        assert_eq!(
            messages_of(field.to_internal_value(&json!("2001-02-30")).unwrap_err()),
            vec!["Date has wrong format. Use one of these formats instead: YYYY[-MM[-DD]]."]
        );
        assert_eq!(
            messages_of(field.to_internal_value(&json!("2001-01-01T13:00:00Z")).unwrap_err()),
            vec!["Date has wrong format. Use one of these formats instead: YYYY[-MM[-DD]]."]
        );
    }

    #[test]
    fn test_date_custom_formats() {
        let field = DateField::new()
            .input_formats(vec![TimeFormat::Custom("%d/%m/%Y".into())])
            .format(TimeFormat::Custom("%d.%m.%Y".into()));
        let date = field.to_internal_value(&json!("24/12/2020")).unwrap().unwrap();
        assert_eq!(field.to_representation(&date), json!("24.12.2020"));
        assert_eq!(
            messages_of(field.to_internal_value(&json!("2020-12-24")).unwrap_err()),
            vec!["Date has wrong format. Use one of these formats instead: DD/MM/YYYY."]
        );
    }

    #[test]
    fn test_datetime_inputs() {
        let field = DateTimeField::new();
        let value = field
            .to_internal_value(&json!("2001-01-01T13:00:00Z"))
            .unwrap()
            .unwrap();
        assert_eq!(value.offset().local_minus_utc(), 0);
        assert_eq!(field.to_representation(&value), json!("2001-01-01T13:00:00Z"));

        let with_fraction = field
            .to_internal_value(&json!("2001-01-01 13:00:00.5+02:00"))
            .unwrap()
            .unwrap();
        assert_eq!(
            field.to_representation(&with_fraction),
            json!("2001-01-01T11:00:00.500000Z")
        );

        let naive = field.to_internal_value(&json!("2001-01-01T13:00")).unwrap().unwrap();
        assert_eq!(field.to_representation(&naive), json!("2001-01-01T13:00:00Z"));
    }

    #[test]
    fn test_datetime_invalid_inputs() {
        let field = DateTimeField::new();
        for input in [json!("a"), json!("2001-13-01T00:00"), json!(12)] {
            assert_eq!(
                messages_of(field.to_internal_value(&input).unwrap_err()),
                vec!["Datetime has wrong format. Use one of these formats instead: \
                      YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z]."],
                "input {}",
                input
            );
        }
    }

    #[test]
    fn test_datetime_without_timezone_support() {
        let settings = Settings {
            use_tz: false,
            time_zone: "+01:00".parse::<UtcOffset>().unwrap(),
            ..Settings::default()
        };
        let field = DateTimeField::from_settings(&settings);
        let value = field
            .to_internal_value(&json!("2001-01-01T13:00:00Z"))
            .unwrap()
            .unwrap();
        assert_eq!(field.to_representation(&value), json!("2001-01-01T14:00:00"));
    }

    #[test]
    fn test_datetime_in_local_offset() {
        let settings = Settings {
            time_zone: "-05:00".parse::<UtcOffset>().unwrap(),
            ..Settings::default()
        };
        let field = DateTimeField::from_settings(&settings);
        let value = field.to_internal_value(&json!("2001-01-01T08:00")).unwrap().unwrap();
        assert_eq!(field.to_representation(&value), json!("2001-01-01T08:00:00-05:00"));
    }
}
