//! Golden corpus tests for the field types
//!
//! Every case file under `golden-corpus/fields/` is checked: accepted
//! inputs must render as recorded and rejected inputs must produce the
//! recorded error payload.

use extra_fields_golden::{GoldenConfig, GoldenTestRunner};

/// Run all cases in the corpus
#[test]
fn golden_test_suite() {
    let runner = GoldenTestRunner::new(GoldenConfig::from_env());

    match runner.run_batch("*") {
        Ok(results) => {
            assert!(results.iter().all(|r| r.passed));
            println!("All {} golden cases passed!", results.len());
        }
        Err(e) => panic!("Golden cases failed: {}", e),
    }
}

/// Show corpus statistics
#[test]
fn golden_corpus_stats() {
    let runner = GoldenTestRunner::new(GoldenConfig::from_env());
    runner.get_statistics().expect("Failed to get corpus statistics");
    assert!(runner.list_cases().unwrap().len() >= 6);
}

// Individual cases using the macros
mod individual_cases {
    use extra_fields_golden::{golden_test, golden_test_batch};

    golden_test!(test_integer_range, "fields/integer_range");
    golden_test!(test_float_range, "fields/float_range");
    golden_test!(test_date_range, "fields/date_range");
    golden_test!(test_datetime_range, "fields/datetime_range");
    golden_test!(test_point, "fields/point");
    golden_test!(test_base64_image, "fields/base64_image");

    golden_test_batch!("fields/*");
}
