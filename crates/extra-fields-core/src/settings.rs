//! Settings shared by the date and datetime fields
//!
//! Settings are resolved from:
//! - Default values
//! - A settings file (YAML or JSON, chosen by extension)
//! - Environment variables (`EXTRA_FIELDS_*`)
//!
//! Fields copy what they need at construction time, so a caller can build
//! fields from a locally modified [`Settings`] without touching anything
//! global.
//!
//! Copyright (c) 2025 Extra Fields Team
//! Licensed under the Apache-2.0 license

use crate::error::SettingsError;
use chrono::format::{Item, StrftimeItems};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

pub const ENV_USE_TZ: &str = "EXTRA_FIELDS_USE_TZ";
pub const ENV_TIME_ZONE: &str = "EXTRA_FIELDS_TIME_ZONE";
pub const ENV_DATETIME_FORMAT: &str = "EXTRA_FIELDS_DATETIME_FORMAT";
pub const ENV_DATE_FORMAT: &str = "EXTRA_FIELDS_DATE_FORMAT";

/// A date or datetime format: ISO 8601 or a chrono format string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeFormat {
    Iso8601,
    Custom(String),
}

impl TimeFormat {
    pub const ISO_8601: &'static str = "iso-8601";
}

impl FromStr for TimeFormat {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(Self::ISO_8601) {
            return Ok(TimeFormat::Iso8601);
        }
        if s.is_empty() || StrftimeItems::new(s).any(|item| matches!(item, Item::Error)) {
            return Err(SettingsError::InvalidValue {
                key: "format".to_string(),
                message: format!("'{}' is not a valid format string", s),
            });
        }
        Ok(TimeFormat::Custom(s.to_string()))
    }
}

impl TryFrom<String> for TimeFormat {
    type Error = SettingsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeFormat> for String {
    fn from(format: TimeFormat) -> Self {
        format.to_string()
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeFormat::Iso8601 => f.write_str(TimeFormat::ISO_8601),
            TimeFormat::Custom(format) => f.write_str(format),
        }
    }
}

/// A fixed UTC offset such as `Z`, `+02:00` or `-0530`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UtcOffset(FixedOffset);

impl UtcOffset {
    pub fn utc() -> Self {
        Self(Utc.fix())
    }

    pub fn fixed(&self) -> FixedOffset {
        self.0
    }
}

impl Default for UtcOffset {
    fn default() -> Self {
        Self::utc()
    }
}

impl From<FixedOffset> for UtcOffset {
    fn from(offset: FixedOffset) -> Self {
        Self(offset)
    }
}

impl FromStr for UtcOffset {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SettingsError::InvalidValue {
            key: "time_zone".to_string(),
            message: format!("'{}' is not a UTC offset (expected Z or +HH:MM)", s),
        };

        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
            return Ok(Self::utc());
        }

        let (sign, rest) = if let Some(rest) = trimmed.strip_prefix('+') {
            (1, rest)
        } else if let Some(rest) = trimmed.strip_prefix('-') {
            (-1, rest)
        } else {
            return Err(invalid());
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if !(digits.len() == 2 || digits.len() == 4) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
        let minutes: i32 = if digits.len() == 4 {
            digits[2..].parse().map_err(|_| invalid())?
        } else {
            0
        };
        if minutes >= 60 {
            return Err(invalid());
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for UtcOffset {
    type Error = SettingsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UtcOffset> for String {
    fn from(offset: UtcOffset) -> Self {
        offset.to_string()
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.0.local_minus_utc();
        if seconds == 0 {
            return f.write_str("Z");
        }
        let sign = if seconds < 0 { '-' } else { '+' };
        let seconds = seconds.abs();
        write!(f, "{}{:02}:{:02}", sign, seconds / 3600, (seconds % 3600) / 60)
    }
}

/// Date and time handling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Datetimes are timezone aware; naive inputs are read in `time_zone`
    pub use_tz: bool,

    /// Default offset for naive datetimes and for rendering
    pub time_zone: UtcOffset,

    /// Output format of datetime fields
    pub datetime_format: TimeFormat,

    /// Accepted input formats of datetime fields
    pub datetime_input_formats: Vec<TimeFormat>,

    /// Output format of date fields
    pub date_format: TimeFormat,

    /// Accepted input formats of date fields
    pub date_input_formats: Vec<TimeFormat>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_tz: true,
            time_zone: UtcOffset::utc(),
            datetime_format: TimeFormat::Iso8601,
            datetime_input_formats: vec![TimeFormat::Iso8601],
            date_format: TimeFormat::Iso8601,
            date_input_formats: vec![TimeFormat::Iso8601],
        }
    }
}

impl Settings {
    /// Load settings from a YAML or JSON file
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path.extension().and_then(|s| s.to_str());
        let settings = if extension == Some("yaml") || extension == Some("yml") {
            serde_yaml::from_str(&content).map_err(|e| SettingsError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| SettingsError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        debug!(path = %path.display(), "loaded field settings");
        Ok(settings)
    }

    /// Load settings from a specific file (or defaults), then apply
    /// environment overrides
    pub fn load_with_file(file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env()?;
        Ok(settings)
    }

    /// Apply `EXTRA_FIELDS_*` environment overrides
    pub fn apply_env(&mut self) -> Result<(), SettingsError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(use_tz) = lookup(ENV_USE_TZ) {
            self.use_tz = match use_tz.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(SettingsError::InvalidValue {
                        key: ENV_USE_TZ.to_string(),
                        message: format!("'{}' is not a boolean", other),
                    })
                }
            };
        }

        if let Some(time_zone) = lookup(ENV_TIME_ZONE) {
            self.time_zone = time_zone.parse()?;
        }

        if let Some(format) = lookup(ENV_DATETIME_FORMAT) {
            self.datetime_format = format.parse()?;
        }

        if let Some(format) = lookup(ENV_DATE_FORMAT) {
            self.date_format = format.parse()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.use_tz);
        assert_eq!(settings.time_zone.to_string(), "Z");
        assert_eq!(settings.datetime_format, TimeFormat::Iso8601);
        assert_eq!(settings.date_input_formats, vec![TimeFormat::Iso8601]);
    }

    #[test]
    fn test_time_format_parsing() {
        assert_eq!("ISO-8601".parse::<TimeFormat>().unwrap(), TimeFormat::Iso8601);
        assert_eq!(
            "%d/%m/%Y".parse::<TimeFormat>().unwrap(),
            TimeFormat::Custom("%d/%m/%Y".to_string())
        );
        assert!("%Q".parse::<TimeFormat>().is_err());
        assert!("".parse::<TimeFormat>().is_err());
    }

    #[test]
    fn test_offset_parsing() {
        assert_eq!("Z".parse::<UtcOffset>().unwrap(), UtcOffset::utc());
        assert_eq!("+02:00".parse::<UtcOffset>().unwrap().fixed().local_minus_utc(), 7200);
        assert_eq!("-0530".parse::<UtcOffset>().unwrap().fixed().local_minus_utc(), -19800);
        assert_eq!("+05".parse::<UtcOffset>().unwrap().to_string(), "+05:00");
        assert!("02:00".parse::<UtcOffset>().is_err());
        assert!("+02:75".parse::<UtcOffset>().is_err());
        assert!("+abc".parse::<UtcOffset>().is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_USE_TZ, "false"),
            (ENV_TIME_ZONE, "+01:00"),
            (ENV_DATE_FORMAT, "%d.%m.%Y"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert!(!settings.use_tz);
        assert_eq!(settings.time_zone.to_string(), "+01:00");
        assert_eq!(settings.date_format, TimeFormat::Custom("%d.%m.%Y".to_string()));
        assert_eq!(settings.datetime_format, TimeFormat::Iso8601);
    }

    #[test]
    fn test_invalid_override() {
        let mut settings = Settings::default();
        let result = settings.apply_overrides(|key| {
            (key == ENV_USE_TZ).then(|| "maybe".to_string())
        });
        assert!(matches!(result, Err(SettingsError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "use_tz: false\ntime_zone: \"-03:00\"\ndate_input_formats:\n  - iso-8601\n  - \"%d/%m/%Y\"").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert!(!settings.use_tz);
        assert_eq!(settings.time_zone.to_string(), "-03:00");
        assert_eq!(settings.date_input_formats.len(), 2);
        assert_eq!(settings.datetime_format, TimeFormat::Iso8601);
    }

    #[test]
    fn test_from_json_file_with_bad_format() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"datetime_format": "%Q"}}"#).unwrap();

        let result = Settings::from_file(file.path());
        assert!(matches!(result, Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = Settings::load_with_file(Some(Path::new("/nonexistent/settings.yaml")));
        assert!(matches!(result, Err(SettingsError::Io { .. })));
    }
}
