//! Comparison of rendered values and error payloads against a case file
//!
//! Numbers compare with a tolerance so that `2` and `2.0` agree, strings
//! recorded as volatile are masked on both sides first, and a mismatch is
//! reported both as a list of paths and as a line diff of the pretty JSON.

use crate::{GoldenError, Result};
use colored::{Color, Colorize};
use regex::Regex;
use serde_json::{Number, Value};
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeSet;
use std::fmt;

/// Placeholder written over volatile values
pub const MASK: &str = "***MASKED***";

/// How values are compared and mismatches displayed
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Colorize the line diff
    pub colored: bool,

    /// Unchanged lines kept around each hunk
    pub context_lines: usize,

    /// Largest difference at which two numbers still count as equal
    pub float_tolerance: f64,

    /// Cap on printed diff lines, 0 for no cap
    pub max_diff_lines: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            colored: true,
            context_lines: 2,
            float_tolerance: 1e-9,
            max_diff_lines: 80,
        }
    }
}

/// A place where the actual value departs from the expected one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    Changed(String),
    Missing(String),
    Extra(String),
    Length {
        path: String,
        expected: usize,
        actual: usize,
    },
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Changed(path) => f.write_str(display_path(path)),
            Mismatch::Missing(path) => write!(f, "{} (missing in actual)", display_path(path)),
            Mismatch::Extra(path) => write!(f, "{} (extra in actual)", display_path(path)),
            Mismatch::Length {
                path,
                expected,
                actual,
            } => write!(
                f,
                "{} (expected {} items, got {})",
                display_path(path),
                expected,
                actual
            ),
        }
    }
}

/// Outcome of one comparison
#[derive(Debug)]
pub struct DiffResult {
    pub matches: bool,

    /// Line diff of expected against actual, empty on a match
    pub diff_output: String,

    pub mismatches: Vec<Mismatch>,
}

impl DiffResult {
    /// Mismatches as display strings, in path order
    pub fn differing_paths(&self) -> Vec<String> {
        self.mismatches.iter().map(ToString::to_string).collect()
    }
}

/// Strings at `path` matching `pattern` are replaced by [`MASK`]
#[derive(Debug)]
struct VolatileField {
    path: Vec<String>,
    pattern: Regex,
}

impl VolatileField {
    fn mask(&self, value: &mut Value) {
        mask_at(value, &self.path, &self.pattern);
    }
}

/// Arrays are transparent: the path continues into every item
fn mask_at(value: &mut Value, path: &[String], pattern: &Regex) {
    match (value, path.split_first()) {
        (Value::Array(items), _) => {
            for item in items {
                mask_at(item, path, pattern);
            }
        }
        (Value::Object(map), Some((key, rest))) => {
            if let Some(next) = map.get_mut(key) {
                mask_at(next, rest, pattern);
            }
        }
        (Value::String(text), None) if pattern.is_match(text.as_str()) => *text = MASK.to_string(),
        _ => {}
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Compares expected and actual JSON values of a case
pub struct DiffEngine {
    options: DiffOptions,
    volatile: Vec<VolatileField>,
}

impl DiffEngine {
    pub fn new(options: DiffOptions) -> Self {
        Self {
            options,
            volatile: Vec::new(),
        }
    }

    /// Mask strings at `path` that match `pattern`
    ///
    /// `path` is dot separated; an empty path is the value itself.
    pub fn add_volatile_pattern(&mut self, path: &str, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern).map_err(|e| {
            GoldenError::CorpusError(format!("Invalid volatile pattern '{}': {}", pattern, e))
        })?;

        self.volatile.push(VolatileField {
            path: path
                .split('.')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
            pattern: regex,
        });
        Ok(())
    }

    pub fn compare(&self, expected: &Value, actual: &Value) -> DiffResult {
        let expected = self.masked(expected);
        let actual = self.masked(actual);

        let mut mismatches = Vec::new();
        self.walk(&expected, &actual, "", &mut mismatches);

        let diff_output = if mismatches.is_empty() {
            String::new()
        } else {
            self.line_diff(&expected, &actual)
        };

        DiffResult {
            matches: mismatches.is_empty(),
            diff_output,
            mismatches,
        }
    }

    fn masked(&self, value: &Value) -> Value {
        let mut value = value.clone();
        for field in &self.volatile {
            field.mask(&mut value);
        }
        value
    }

    fn numbers_equal(&self, expected: &Number, actual: &Number) -> bool {
        match (expected.as_f64(), actual.as_f64()) {
            (Some(expected), Some(actual)) => {
                (expected - actual).abs() <= self.options.float_tolerance
            }
            _ => expected == actual,
        }
    }

    fn walk(&self, expected: &Value, actual: &Value, path: &str, out: &mut Vec<Mismatch>) {
        match (expected, actual) {
            (Value::Object(expected), Value::Object(actual)) => {
                let keys: BTreeSet<&String> = expected.keys().chain(actual.keys()).collect();
                for key in keys {
                    let path = child_path(path, key);
                    match (expected.get(key), actual.get(key)) {
                        (Some(expected), Some(actual)) => self.walk(expected, actual, &path, out),
                        (Some(_), None) => out.push(Mismatch::Missing(path)),
                        (None, _) => out.push(Mismatch::Extra(path)),
                    }
                }
            }
            (Value::Array(expected), Value::Array(actual)) => {
                for (index, (expected, actual)) in expected.iter().zip(actual).enumerate() {
                    self.walk(expected, actual, &format!("{}[{}]", path, index), out);
                }
                if expected.len() != actual.len() {
                    out.push(Mismatch::Length {
                        path: path.to_string(),
                        expected: expected.len(),
                        actual: actual.len(),
                    });
                }
            }
            (Value::Number(expected), Value::Number(actual)) => {
                if !self.numbers_equal(expected, actual) {
                    out.push(Mismatch::Changed(path.to_string()));
                }
            }
            (expected, actual) => {
                if expected != actual {
                    out.push(Mismatch::Changed(path.to_string()));
                }
            }
        }
    }

    fn paint(&self, line: String, color: Color) -> String {
        if self.options.colored {
            line.as_str().color(color).to_string()
        } else {
            line
        }
    }

    /// Hunks of the pretty-printed values, separated by `...`
    fn line_diff(&self, expected: &Value, actual: &Value) -> String {
        let expected = serde_json::to_string_pretty(expected).unwrap_or_default();
        let actual = serde_json::to_string_pretty(actual).unwrap_or_default();
        let diff = TextDiff::from_lines(&expected, &actual);

        let mut lines = Vec::new();
        for (index, group) in diff.grouped_ops(self.options.context_lines).iter().enumerate() {
            if index > 0 {
                lines.push("...".to_string());
            }
            for op in group {
                for change in diff.iter_changes(op) {
                    let text = change.value().trim_end_matches('\n');
                    lines.push(match change.tag() {
                        ChangeTag::Delete => self.paint(format!("-{}", text), Color::Red),
                        ChangeTag::Insert => self.paint(format!("+{}", text), Color::Green),
                        ChangeTag::Equal => format!(" {}", text),
                    });
                }
            }
        }

        let limit = self.options.max_diff_lines;
        if limit > 0 && lines.len() > limit {
            let hidden = lines.len() - limit;
            lines.truncate(limit);
            lines.push(format!("... {} more lines", hidden));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn plain() -> DiffEngine {
        DiffEngine::new(DiffOptions {
            colored: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_key_order_is_irrelevant() {
        let result = plain().compare(
            &json!({"lower": 1, "upper": 2, "bounds": "[)"}),
            &json!({"bounds": "[)", "upper": 2, "lower": 1}),
        );
        assert!(result.matches);
        assert!(result.diff_output.is_empty());
    }

    #[test]
    fn test_integer_and_float_numbers_match() {
        let engine = plain();
        assert!(engine.compare(&json!({"upper": 2}), &json!({"upper": 2.0})).matches);
        assert!(!engine.compare(&json!({"upper": 2}), &json!({"upper": 2.5})).matches);
        assert!(!engine.compare(&json!(1), &json!("1")).matches);
    }

    #[test]
    fn test_mismatches_in_path_order() {
        let expected = json!({"latitude": ["This field is required."], "longitude": 1});
        let actual = json!({"latitude": ["A valid number is required."], "extra": true, "longitude": 1});

        let result = plain().compare(&expected, &actual);
        assert!(!result.matches);
        assert_eq!(
            result.differing_paths(),
            vec!["extra (extra in actual)".to_string(), "latitude[0]".to_string()]
        );
        assert!(result.diff_output.contains("-    \"This field is required.\""));
        assert!(result.diff_output.contains("+    \"A valid number is required.\""));
    }

    #[test]
    fn test_length_and_missing_keys() {
        let result = plain().compare(
            &json!({"errors": ["a", "b"], "srid": 4326}),
            &json!({"errors": ["a"]}),
        );
        assert_eq!(
            result.mismatches,
            vec![
                Mismatch::Length {
                    path: "errors".to_string(),
                    expected: 2,
                    actual: 1
                },
                Mismatch::Missing("srid".to_string()),
            ]
        );
    }

    #[test]
    fn test_root_value_masking() {
        let mut engine = plain();
        engine
            .add_volatile_pattern("", r"^[0-9a-f]{8}-[0-9a-f]{3}\.gif$")
            .unwrap();

        assert!(engine.compare(&json!(MASK), &json!("1b4e28ba-2fa.gif")).matches);

        let result = engine.compare(&json!(MASK), &json!("picture.gif"));
        assert!(!result.matches);
        assert_eq!(result.differing_paths(), vec!["<root>".to_string()]);
    }

    #[test]
    fn test_masking_reaches_into_arrays() {
        let mut engine = plain();
        engine.add_volatile_pattern("files.name", r"\.png$").unwrap();

        let masked = engine.masked(&json!({"files": [{"name": "a.png"}, {"name": "b.gif"}]}));
        assert_eq!(masked, json!({"files": [{"name": MASK}, {"name": "b.gif"}]}));
    }

    #[test]
    fn test_long_diffs_are_truncated() {
        let engine = DiffEngine::new(DiffOptions {
            colored: false,
            max_diff_lines: 3,
            ..Default::default()
        });
        let result = engine.compare(&json!([1, 2, 3, 4]), &json!([5, 6, 7, 8]));
        assert!(result.diff_output.ends_with("more lines"));
        assert_eq!(result.diff_output.lines().count(), 4);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(plain().add_volatile_pattern("name", "(").is_err());
    }
}
