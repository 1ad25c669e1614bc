//! Property-based tests for analysis invariants.
//!
//! For any generated unit:
//! - cyclomatic complexity is at least 1 everywhere
//! - the feature vector has exactly nine finite values
//! - findings are ordered by severity then line, with bounded confidence

mod common;

use common::MODEL;
use defectscope::config::AnalysisConfig;
use defectscope::{analyze, FEATURE_NAMES};
use proptest::prelude::*;

const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield", "match",
    "case", "type", "print", "exec",
];

fn python_identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,10}".prop_filter("not a keyword", |s| !PYTHON_KEYWORDS.contains(&s.as_str()))
}

/// One statement line inside a function body, given the parameter names.
fn statement(params: Vec<String>) -> impl Strategy<Value = String> {
    let pick = prop::sample::select(params);
    prop_oneof![
        pick.clone().prop_map(|p| format!("    total += {p}")),
        pick.clone()
            .prop_map(|p| format!("    if {p} > 0:\n        total -= 1")),
        pick.clone()
            .prop_map(|p| format!("    for _ in range({p}):\n        total += 1")),
        pick.prop_map(|p| format!("    while total < {p}:\n        total += 2")),
    ]
}

fn function_source() -> impl Strategy<Value = String> {
    (
        python_identifier(),
        prop::collection::hash_set(python_identifier(), 1..7),
    )
        .prop_flat_map(|(name, params)| {
            let params: Vec<String> = params.into_iter().filter(|p| *p != name).collect();
            let params = if params.is_empty() {
                vec!["value".to_string()]
            } else {
                params
            };
            let body = prop::collection::vec(statement(params.clone()), 0..40);
            (Just(name), Just(params), body)
        })
        .prop_map(|(name, params, body)| {
            let mut source = format!("def fn_{name}({}):\n    total = 0\n", params.join(", "));
            for line in body {
                source.push_str(&line);
                source.push('\n');
            }
            source.push_str("    return total\n");
            source
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_complexity_is_at_least_one(source in function_source()) {
        let result = analyze(&source, "gen.py", &AnalysisConfig::default(), &MODEL).unwrap();
        prop_assert!(result.metrics.unit.cyclomatic >= 1);
        prop_assert!(result.metrics.functions.iter().all(|f| f.cyclomatic >= 1));
    }

    #[test]
    fn prop_feature_vector_is_well_formed(source in function_source()) {
        let result = analyze(&source, "gen.py", &AnalysisConfig::default(), &MODEL).unwrap();
        prop_assert_eq!(result.features.len(), FEATURE_NAMES.len());
        prop_assert!(result.features.values().iter().all(|v| v.is_finite()));
        prop_assert!((0.0..=1.0).contains(&result.prediction.probability));
        prop_assert!((0.0..=100.0).contains(&result.quality_score));
    }

    #[test]
    fn prop_findings_are_ordered_and_bounded(source in function_source()) {
        let result = analyze(&source, "gen.py", &AnalysisConfig::default(), &MODEL).unwrap();
        for pair in result.findings.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(
                a.severity > b.severity
                    || (a.severity == b.severity && a.location.start <= b.location.start),
                "{:?} before {:?}", a, b
            );
        }
        prop_assert!(result.findings.iter().all(|f| (0.0..=1.0).contains(&f.confidence)));
    }

    #[test]
    fn prop_tests_are_sorted_by_priority(source in function_source()) {
        let result = analyze(&source, "gen.py", &AnalysisConfig::default(), &MODEL).unwrap();
        for pair in result.tests.windows(2) {
            prop_assert!(pair[0].priority >= pair[1].priority);
        }
    }
}
