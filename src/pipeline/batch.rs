//! Parallel analysis of independent units.
//!
//! Units share nothing but the read-only model handle, so each one runs on
//! its own rayon worker. A failed unit is reported next to its siblings and
//! never aborts the batch.

use super::{analyze, AnalysisResult};
use crate::config::AnalysisConfig;
use crate::errors::AnalysisError;
use crate::prediction::TrainedModelHandle;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Source text with its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInput {
    pub unit_id: String,
    pub source: String,
}

impl SourceInput {
    pub fn new(unit_id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            source: source.into(),
        }
    }
}

/// Per-unit outcome of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitOutcome {
    pub unit_id: String,
    pub result: Result<AnalysisResult, AnalysisError>,
}

impl UnitOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Analyze every input; outcomes come back in input order.
pub fn analyze_batch(
    inputs: &[SourceInput],
    config: &AnalysisConfig,
    model: &TrainedModelHandle,
) -> Vec<UnitOutcome> {
    let outcomes: Vec<UnitOutcome> = inputs
        .par_iter()
        .map(|input| UnitOutcome {
            unit_id: input.unit_id.clone(),
            result: analyze(&input.source, &input.unit_id, config, model),
        })
        .collect();

    let summary = summarize(&outcomes);
    log::info!(
        "Analyzed {} units: {} succeeded, {} failed",
        outcomes.len(),
        summary.succeeded,
        summary.failed
    );
    outcomes
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

pub fn summarize(outcomes: &[UnitOutcome]) -> BatchSummary {
    outcomes
        .iter()
        .fold(BatchSummary::default(), |mut summary, outcome| {
            if outcome.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;
    use crate::prediction::{synthetic_dataset, train_model};

    fn model() -> TrainedModelHandle {
        let config = TrainingConfig {
            ensemble_size: 2,
            epochs: 60,
            ..TrainingConfig::default()
        };
        train_model(&synthetic_dataset(150, 3), &config).unwrap()
    }

    #[test]
    fn test_failures_are_isolated_and_order_kept() {
        let inputs = vec![
            SourceInput::new("a.py", "def a():\n    return 1\n"),
            SourceInput::new("broken.py", "def broken(:\n"),
            SourceInput::new("c.py", "class C:\n    pass\n"),
        ];
        let outcomes = analyze_batch(&inputs, &AnalysisConfig::default(), &model());

        let ids: Vec<_> = outcomes.iter().map(|o| o.unit_id.as_str()).collect();
        assert_eq!(ids, vec!["a.py", "broken.py", "c.py"]);
        assert!(outcomes[0].is_success());
        assert!(matches!(outcomes[1].result, Err(AnalysisError::Parse(_))));
        assert!(outcomes[2].is_success());
        assert_eq!(
            summarize(&outcomes),
            BatchSummary {
                succeeded: 2,
                failed: 1
            }
        );
    }

    #[test]
    fn test_empty_batch() {
        assert!(analyze_batch(&[], &AnalysisConfig::default(), &model()).is_empty());
    }
}
