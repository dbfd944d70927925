//! Golden test infrastructure for the field types
//!
//! This crate runs table-driven field cases stored as JSON files under
//! `golden-corpus/`. Each case names a field declaration, the inputs it
//! must accept together with their rendering, and the inputs it must
//! reject together with the exact error payload.
//!
//! Environment knobs, read by [`GoldenConfig::from_env`]:
//! - `GOLDEN_CORPUS_DIR`: corpus location
//! - `GOLDEN_TAGS`: comma separated tags; batches only run matching cases
//! - `GOLDEN_VERBOSE`: print every case, passing or not
//! - `NO_COLOR`: plain diffs

pub mod corpus;
pub mod diff;
pub mod registry;
pub mod runner;

use std::path::PathBuf;
use thiserror::Error;

pub use corpus::{CorpusManager, FieldCase};
pub use diff::{DiffEngine, DiffOptions, DiffResult, Mismatch};
pub use registry::{build_field, FieldKind, FieldSpec};
pub use runner::{GoldenTestRunner, TestResult};

#[derive(Debug, Error)]
pub enum GoldenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A case file is not valid JSON or does not match the case schema
    #[error("Invalid case file {}: {source}", path.display())]
    InvalidCase {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Corpus error: {0}")]
    CorpusError(String),

    #[error("Test failed: {0}")]
    TestFailed(String),
}

pub type Result<T> = std::result::Result<T, GoldenError>;

/// Where the corpus lives and how results are shown
#[derive(Debug, Clone)]
pub struct GoldenConfig {
    pub corpus_dir: PathBuf,

    /// Only run cases carrying one of these tags; empty runs all
    pub tags: Vec<String>,

    pub diff_options: DiffOptions,

    /// Print passing cases too
    pub verbose: bool,
}

impl Default for GoldenConfig {
    fn default() -> Self {
        // Relative to a crate directory, where cargo runs tests
        Self {
            corpus_dir: PathBuf::from("../../golden-corpus"),
            tags: Vec::new(),
            diff_options: DiffOptions::default(),
            verbose: false,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

fn parse_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

impl GoldenConfig {
    /// Defaults overridden by the `GOLDEN_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through any key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            corpus_dir: lookup("GOLDEN_CORPUS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.corpus_dir),
            tags: lookup("GOLDEN_TAGS")
                .map(|tags| parse_tags(&tags))
                .unwrap_or(defaults.tags),
            diff_options: DiffOptions {
                colored: lookup("NO_COLOR").is_none(),
                ..defaults.diff_options
            },
            verbose: lookup("GOLDEN_VERBOSE")
                .map(|verbose| parse_flag(&verbose))
                .unwrap_or(defaults.verbose),
        }
    }
}

/// Define a `#[test]` running one case, named `category/name`
#[macro_export]
macro_rules! golden_test {
    ($name:ident, $case:expr) => {
        #[test]
        fn $name() {
            let runner = $crate::GoldenTestRunner::new($crate::GoldenConfig::from_env());
            if let Err(e) = runner.run_case($case) {
                panic!("golden case {} failed: {}", $case, e);
            }
        }
    };
}

/// Define a `#[test]` named `golden_tests` running every case whose id
/// matches the pattern
#[macro_export]
macro_rules! golden_test_batch {
    ($pattern:expr) => {
        #[test]
        fn golden_tests() {
            let runner = $crate::GoldenTestRunner::new($crate::GoldenConfig::from_env());
            if let Err(e) = runner.run_batch($pattern) {
                panic!("golden batch {} failed: {}", $pattern, e);
            }
        }
    };
}
