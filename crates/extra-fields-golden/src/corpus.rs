//! Field case corpus management for golden tests

use crate::registry::FieldSpec;
use crate::{GoldenError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A field case in the corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldCase {
    /// Name of the case
    pub name: String,

    /// Category/group of the case, usually its directory
    #[serde(default)]
    pub category: String,

    /// The field under test
    pub field: FieldSpec,

    /// Inputs that must validate, with the rendering of their value
    #[serde(default)]
    pub valid_inputs: Vec<ValidInput>,

    /// Inputs that must be rejected, with the error payload
    #[serde(default)]
    pub invalid_inputs: Vec<InvalidInput>,

    /// Rendered values that differ between runs
    #[serde(default)]
    pub volatile_fields: Vec<VolatileFieldSpec>,

    /// Case metadata
    pub metadata: CaseMetadata,
}

/// An accepted input and how its validated value renders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidInput {
    pub input: Value,
    pub output: Value,
}

/// A rejected input and the error it produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidInput {
    pub input: Value,
    pub errors: Value,
}

/// A rendered value that changes between runs
///
/// An empty path addresses the rendered value itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatileFieldSpec {
    #[serde(default)]
    pub path: String,
    pub pattern: String,
}

/// Metadata about a case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseMetadata {
    /// Description of what this tests
    pub description: String,

    /// Tags for categorization
    #[serde(default)]
    pub tags: Vec<String>,

    /// Whether this case is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Priority level (lower = higher priority)
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_true() -> bool {
    true
}

fn default_priority() -> u32 {
    100
}

impl FieldCase {
    /// `category/name`, the identifier used to select a case
    pub fn id(&self) -> String {
        if self.category.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.category, self.name)
        }
    }
}

/// Manages the case corpus
pub struct CorpusManager {
    corpus_dir: PathBuf,
}

impl CorpusManager {
    /// Create a new corpus manager
    pub fn new(corpus_dir: impl AsRef<Path>) -> Self {
        Self {
            corpus_dir: corpus_dir.as_ref().to_path_buf(),
        }
    }

    /// Discover all cases in the corpus
    pub fn discover_cases(&self) -> Result<Vec<FieldCase>> {
        let mut cases = Vec::new();

        if !self.corpus_dir.exists() {
            return Ok(cases);
        }

        for entry in WalkDir::new(&self.corpus_dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                match self.load_case(path) {
                    Ok(case) => cases.push(case),
                    Err(e) => eprintln!("Warning: skipping case: {}", e),
                }
            }
        }

        cases.sort_by(|a, b| {
            a.metadata
                .priority
                .cmp(&b.metadata.priority)
                .then_with(|| a.id().cmp(&b.id()))
        });

        Ok(cases)
    }

    /// Load a case file; the category defaults to its parent directory
    pub fn load_case(&self, path: &Path) -> Result<FieldCase> {
        let content = fs::read_to_string(path)?;
        let mut case: FieldCase =
            serde_json::from_str(&content).map_err(|source| GoldenError::InvalidCase {
                path: path.to_path_buf(),
                source,
            })?;

        if case.category.is_empty() {
            case.category = path
                .parent()
                .and_then(|dir| dir.strip_prefix(&self.corpus_dir).ok())
                .map(|dir| dir.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
        }

        Ok(case)
    }

    /// Find a case by `category/name`
    pub fn find_case(&self, id: &str) -> Result<FieldCase> {
        self.discover_cases()?
            .into_iter()
            .find(|case| case.id() == id)
            .ok_or_else(|| GoldenError::CorpusError(format!("No case named '{}'", id)))
    }

    /// Filter cases by tags
    pub fn filter_by_tags(&self, cases: Vec<FieldCase>, tags: &[String]) -> Vec<FieldCase> {
        if tags.is_empty() {
            return cases;
        }

        cases
            .into_iter()
            .filter(|c| tags.iter().any(|tag| c.metadata.tags.contains(tag)))
            .collect()
    }

    /// Get statistics about the corpus
    pub fn get_statistics(&self) -> Result<CorpusStatistics> {
        let cases = self.discover_cases()?;

        let mut stats = CorpusStatistics {
            total_cases: cases.len(),
            ..Default::default()
        };

        for case in cases {
            if case.metadata.enabled {
                stats.enabled_cases += 1;
            } else {
                stats.disabled_cases += 1;
            }
            stats.total_inputs += case.valid_inputs.len() + case.invalid_inputs.len();

            *stats.cases_by_category.entry(case.category).or_insert(0) += 1;

            for tag in case.metadata.tags {
                *stats.cases_by_tag.entry(tag).or_insert(0) += 1;
            }
        }

        Ok(stats)
    }
}

/// Statistics about the corpus
#[derive(Debug, Default)]
pub struct CorpusStatistics {
    pub total_cases: usize,
    pub enabled_cases: usize,
    pub disabled_cases: usize,
    pub total_inputs: usize,
    pub cases_by_category: HashMap<String, usize>,
    pub cases_by_tag: HashMap<String, usize>,
}

impl CorpusStatistics {
    /// Print statistics to stdout
    pub fn print(&self) {
        println!("=== Corpus Statistics ===");
        println!("Total cases: {}", self.total_cases);
        println!("Enabled: {}", self.enabled_cases);
        println!("Disabled: {}", self.disabled_cases);
        println!("Inputs: {}", self.total_inputs);

        if !self.cases_by_category.is_empty() {
            println!("\nCases by category:");
            let mut categories: Vec<_> = self.cases_by_category.iter().collect();
            categories.sort_by_key(|(k, _)| k.as_str());
            for (category, count) in categories {
                println!("  {}: {}", category, count);
            }
        }

        if !self.cases_by_tag.is_empty() {
            println!("\nCases by tag:");
            let mut tags: Vec<_> = self.cases_by_tag.iter().collect();
            tags.sort_by_key(|(k, _)| k.as_str());
            for (tag, count) in tags {
                println!("  {}: {}", tag, count);
            }
        }
    }
}
