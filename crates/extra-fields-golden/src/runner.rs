//! Golden test runner for executing field cases

use crate::{
    corpus::{CorpusManager, FieldCase},
    diff::DiffEngine,
    registry::build_field,
    GoldenConfig, GoldenError, Result,
};
use colored::*;
use extra_fields_core::{DynField, Validated};
use serde_json::Value;
use std::time::Instant;

/// Result of running one case file
#[derive(Debug)]
pub struct TestResult {
    /// `category/name` of the case
    pub name: String,

    /// Whether every input behaved as expected
    pub passed: bool,

    /// One entry per input that did not
    pub failures: Vec<String>,

    /// Number of inputs checked
    pub checked: usize,

    /// Execution time in milliseconds
    pub duration_ms: u64,
}

impl TestResult {
    /// Print the test result
    pub fn print(&self, verbose: bool) {
        let status = if self.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };

        println!(
            "{} {} ({} inputs, {}ms)",
            status, self.name, self.checked, self.duration_ms
        );

        if verbose || !self.passed {
            for failure in &self.failures {
                println!("  {}: {}", "Mismatch".red(), failure);
            }
        }
    }
}

/// Runner for golden tests
pub struct GoldenTestRunner {
    config: GoldenConfig,
    corpus_manager: CorpusManager,
}

impl GoldenTestRunner {
    /// Create a new test runner
    pub fn new(config: GoldenConfig) -> Self {
        let corpus_manager = CorpusManager::new(&config.corpus_dir);

        Self {
            config,
            corpus_manager,
        }
    }

    /// Run a single case by `category/name`
    pub fn run_case(&self, id: &str) -> Result<TestResult> {
        let case = self.corpus_manager.find_case(id)?;
        let result = self.execute_case(&case)?;

        if self.config.verbose {
            result.print(true);
        }

        if result.passed {
            Ok(result)
        } else {
            Err(GoldenError::TestFailed(format!(
                "Case '{}' failed:\n{}",
                id,
                result.failures.join("\n")
            )))
        }
    }

    /// Run all cases whose id contains `pattern` (`*` runs everything),
    /// restricted to the configured tags
    pub fn run_batch(&self, pattern: &str) -> Result<Vec<TestResult>> {
        let cases = self
            .corpus_manager
            .filter_by_tags(self.corpus_manager.discover_cases()?, &self.config.tags);
        let pattern = pattern.trim_end_matches('*').trim_end_matches('/');

        let filtered: Vec<_> = cases
            .into_iter()
            .filter(|c| pattern.is_empty() || c.id().contains(pattern))
            .collect();

        if filtered.is_empty() {
            return Err(GoldenError::CorpusError(format!(
                "No cases found matching pattern '{}'",
                pattern
            )));
        }

        println!("Running {} cases...\n", filtered.len());

        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        for case in &filtered {
            let result = self.execute_case(case).unwrap_or_else(|e| TestResult {
                name: case.id(),
                passed: false,
                failures: vec![e.to_string()],
                checked: 0,
                duration_ms: 0,
            });

            if result.passed {
                passed += 1;
            } else {
                failed += 1;
            }

            result.print(self.config.verbose);
            results.push(result);
        }

        println!("\n{}", "=== Test Summary ===".bold());
        println!(
            "{}: {} passed, {} failed",
            "Results".bold(),
            passed.to_string().green(),
            failed.to_string().red()
        );

        if failed > 0 {
            Err(GoldenError::TestFailed(format!("{} case(s) failed", failed)))
        } else {
            Ok(results)
        }
    }

    /// Execute every input of a case
    pub fn execute_case(&self, case: &FieldCase) -> Result<TestResult> {
        let start = Instant::now();
        let name = case.id();

        if !case.metadata.enabled {
            return Ok(TestResult {
                name,
                passed: true,
                failures: Vec::new(),
                checked: 0,
                duration_ms: 0,
            });
        }

        let field = build_field(&case.field);

        let mut diff_engine = DiffEngine::new(self.config.diff_options.clone());
        for volatile in &case.volatile_fields {
            diff_engine.add_volatile_pattern(&volatile.path, &volatile.pattern)?;
        }

        let mut failures = Vec::new();

        for valid in &case.valid_inputs {
            let outcome = render(field.as_ref(), &valid.input).and_then(|actual| {
                let diff = diff_engine.compare(&valid.output, &actual);
                if diff.matches {
                    Ok(())
                } else {
                    Err(format!("rendering differs\n{}", diff.diff_output))
                }
            });
            if let Err(message) = outcome {
                failures.push(format!("input {}: {}", valid.input, message));
            }
        }

        for invalid in &case.invalid_inputs {
            let outcome = match field.run_validation_any(Some(&invalid.input)) {
                Ok(_) => Err("accepted, expected a validation error".to_string()),
                Err(error) => {
                    let diff = diff_engine.compare(&invalid.errors, &error.detail().to_value());
                    if diff.matches {
                        Ok(())
                    } else {
                        Err(format!("error payload differs\n{}", diff.diff_output))
                    }
                }
            };
            if let Err(message) = outcome {
                failures.push(format!("input {}: {}", invalid.input, message));
            }
        }

        Ok(TestResult {
            name,
            passed: failures.is_empty(),
            failures,
            checked: case.valid_inputs.len() + case.invalid_inputs.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// List all available cases
    pub fn list_cases(&self) -> Result<Vec<String>> {
        let cases = self.corpus_manager.discover_cases()?;
        Ok(cases.iter().map(FieldCase::id).collect())
    }

    /// Get corpus statistics
    pub fn get_statistics(&self) -> Result<()> {
        let stats = self.corpus_manager.get_statistics()?;
        stats.print();
        Ok(())
    }
}

/// Validate `input` and render the validated value
fn render(field: &dyn DynField, input: &Value) -> std::result::Result<Value, String> {
    match field.run_validation_any(Some(input)) {
        Ok(Validated::Value(value)) => field
            .to_representation_any(value.as_ref())
            .ok_or_else(|| "value could not be rendered".to_string()),
        Ok(Validated::Null) | Ok(Validated::Missing) => Ok(Value::Null),
        Err(error) => Err(format!("rejected with {}", error.detail().to_value())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiffOptions;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn runner_with(case: Value) -> (TempDir, GoldenTestRunner) {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("fields");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("case.json"), serde_json::to_string(&case).unwrap()).unwrap();

        let config = GoldenConfig {
            corpus_dir: temp_dir.path().to_path_buf(),
            tags: Vec::new(),
            diff_options: DiffOptions {
                colored: false,
                ..Default::default()
            },
            verbose: false,
        };
        (temp_dir, GoldenTestRunner::new(config))
    }

    #[test]
    fn test_passing_case() {
        let (_dir, runner) = runner_with(json!({
            "name": "ints",
            "field": {"kind": "integer_range"},
            "valid_inputs": [
                {"input": {"lower": "1"}, "output": {"lower": 1, "upper": null, "bounds": "[)"}},
                {"input": "", "output": null}
            ],
            "invalid_inputs": [
                {"input": {"foo": 1}, "errors": ["Extra content not allowed \"foo\"."]}
            ],
            "metadata": {"description": "integer ranges"}
        }));

        assert_eq!(runner.list_cases().unwrap(), vec!["fields/ints".to_string()]);
        let result = runner.run_case("fields/ints").unwrap();
        assert!(result.passed);
        assert_eq!(result.checked, 3);
    }

    #[test]
    fn test_failing_case_reports_each_input() {
        let (_dir, runner) = runner_with(json!({
            "name": "points",
            "field": {"kind": "point"},
            "valid_inputs": [
                {"input": {"latitude": 1, "longitude": 2}, "output": {"latitude": 1, "longitude": 3}}
            ],
            "invalid_inputs": [
                {"input": {"latitude": 1, "longitude": 2}, "errors": ["never"]}
            ],
            "metadata": {"description": "deliberately wrong expectations"}
        }));

        let case = runner.corpus_manager.find_case("fields/points").unwrap();
        let result = runner.execute_case(&case).unwrap();
        assert!(!result.passed);
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures[1].contains("accepted"));

        assert!(runner.run_case("fields/points").is_err());
        assert!(runner.run_batch("*").is_err());
    }

    #[test]
    fn test_unknown_pattern() {
        let (_dir, runner) = runner_with(json!({
            "name": "empty",
            "field": {"kind": "float"},
            "metadata": {"description": "no inputs"}
        }));
        assert!(matches!(
            runner.run_batch("geo/"),
            Err(GoldenError::CorpusError(_))
        ));
        assert!(runner.run_batch("fields/*").is_ok());
    }

    #[test]
    fn test_batch_respects_tags() {
        let (_dir, mut runner) = runner_with(json!({
            "name": "tagged",
            "field": {"kind": "integer"},
            "valid_inputs": [{"input": "4", "output": 4}],
            "metadata": {"description": "tagged case", "tags": ["scalar"]}
        }));

        runner.config.tags = vec!["geo".to_string()];
        assert!(runner.run_batch("*").is_err());

        runner.config.tags = vec!["scalar".to_string()];
        assert_eq!(runner.run_batch("*").unwrap().len(), 1);
    }
}
