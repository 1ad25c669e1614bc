//! End-to-end analysis of one source unit, and of batches of units.
//!
//! Stages run in a fixed order: parse, extract, metrics, smells, feature
//! vector, prediction, synthesis. Each stage returns a complete value or a
//! typed error, and the first error ends the unit's analysis.

pub mod batch;
pub mod scoring;

pub use batch::{analyze_batch, summarize, BatchSummary, SourceInput, UnitOutcome};
pub use scoring::quality_score;

use crate::config::{validate_analysis_config, AnalysisConfig, Granularity};
use crate::core::parse_source;
use crate::debt::{CodeSmellFinding, SmellDetector};
use crate::errors::{AnalysisError, FeatureBuildError};
use crate::extraction::extract_structure;
use crate::metrics::{compute_metrics, MetricsReport};
use crate::prediction::{
    build_function_vector, build_vector, DefectPrediction, FeatureVector, TrainedModelHandle,
};
use crate::testing::{synthesize_unit, GeneratedTestCase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

/// Everything produced for one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub unit_id: String,
    pub analyzed_at: DateTime<Utc>,
    pub metrics: MetricsReport,
    pub findings: Vec<CodeSmellFinding>,
    pub features: FeatureVector,
    pub prediction: DefectPrediction,
    /// Present only with function granularity, in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub function_predictions: Vec<DefectPrediction>,
    pub tests: Vec<GeneratedTestCase>,
    /// 0-100, higher is better
    pub quality_score: f64,
}

/// Analyze one unit of Python source.
pub fn analyze(
    source: &str,
    unit_id: &str,
    config: &AnalysisConfig,
    model: &TrainedModelHandle,
) -> Result<AnalysisResult, AnalysisError> {
    let _span = info_span!("analyze", unit = unit_id).entered();

    if let Some(error) = validate_analysis_config(config).into_iter().next() {
        return Err(error.into());
    }

    let unit = {
        let _span = info_span!("parse").entered();
        parse_source(source, unit_id, &config.parser)?
    };

    let structure = extract_structure(&unit);
    let metrics = {
        let _span = info_span!("metrics").entered();
        compute_metrics(&unit, &structure)
    };

    let findings = {
        let _span = info_span!("smells").entered();
        SmellDetector::new(config.thresholds.clone()).detect(&unit, &structure, &metrics)
    };

    let (features, prediction, function_predictions) = {
        let _span = info_span!("predict").entered();
        let features = build_vector(&metrics.unit).inspect_err(report_contract_violation)?;
        let prediction = model.predict(
            unit_id,
            &features,
            config.prediction.decision_threshold,
            config.prediction.top_factors,
        )?;
        let function_predictions = match config.prediction.granularity {
            Granularity::Unit => Vec::new(),
            Granularity::Function => predict_functions(&metrics, config, model)?,
        };
        (features, prediction, function_predictions)
    };

    let tests = {
        let _span = info_span!("synthesize").entered();
        synthesize_unit(&unit, &structure, &config.synthesis)
    };

    let score = quality_score(
        &metrics,
        &findings,
        std::iter::once(&prediction).chain(&function_predictions),
    );
    debug!(
        findings = findings.len(),
        tests = tests.len(),
        probability = prediction.probability,
        quality = score,
        "analysis complete"
    );

    Ok(AnalysisResult {
        unit_id: unit_id.to_string(),
        analyzed_at: Utc::now(),
        metrics,
        findings,
        features,
        prediction,
        function_predictions,
        tests,
        quality_score: score,
    })
}

fn predict_functions(
    metrics: &MetricsReport,
    config: &AnalysisConfig,
    model: &TrainedModelHandle,
) -> Result<Vec<DefectPrediction>, AnalysisError> {
    metrics
        .functions
        .iter()
        .map(|function| {
            let class = function
                .class_name
                .as_deref()
                .and_then(|name| metrics.classes.iter().find(|c| c.name == name));
            let vector = build_function_vector(function, &metrics.unit, class)
                .inspect_err(report_contract_violation)?;
            Ok(model.predict(
                &function.qualified_name,
                &vector,
                config.prediction.decision_threshold,
                config.prediction.top_factors,
            )?)
        })
        .collect()
}

fn report_contract_violation(error: &FeatureBuildError) {
    log::error!("metrics report violates the feature contract: {error}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;
    use crate::debt::SmellCategory;
    use crate::prediction::{synthetic_dataset, train_model};
    use crate::testing::TestKind;
    use indoc::indoc;
    use once_cell::sync::Lazy;

    static MODEL: Lazy<TrainedModelHandle> = Lazy::new(|| {
        let config = TrainingConfig {
            ensemble_size: 3,
            epochs: 100,
            ..TrainingConfig::default()
        };
        train_model(&synthetic_dataset(200, 7), &config).unwrap()
    });

    #[test]
    fn test_analyze_simple_function() {
        let result = analyze(
            "def add(a, b):\n    return a + b\n",
            "add.py",
            &AnalysisConfig::default(),
            &MODEL,
        )
        .unwrap();

        assert_eq!(result.metrics.functions[0].cyclomatic, 1);
        assert!(result.findings.is_empty());
        assert_eq!(result.tests.len(), 1);
        assert_eq!(result.tests[0].kind, TestKind::HappyPath);
        assert_eq!(result.features.len(), 9);
        assert!((0.0..=1.0).contains(&result.prediction.probability));
        assert!(result.function_predictions.is_empty());
        assert_eq!(result.prediction.target, "add.py");
    }

    #[test]
    fn test_parse_error_short_circuits() {
        let err =
            analyze("def broken(:\n", "bad.py", &AnalysisConfig::default(), &MODEL).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = AnalysisConfig::default();
        config.prediction.decision_threshold = 2.0;
        let err = analyze("x = 1\n", "x.py", &config, &MODEL).unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_function_granularity() {
        let source = indoc! {"
            class Account:
                def deposit(self, amount):
                    self.balance = amount

            def helper():
                return 1
        "};
        let mut config = AnalysisConfig::default();
        config.prediction.granularity = Granularity::Function;
        let result = analyze(source, "acct.py", &config, &MODEL).unwrap();

        let targets: Vec<_> = result
            .function_predictions
            .iter()
            .map(|p| p.target.as_str())
            .collect();
        assert_eq!(targets, vec!["Account.deposit", "helper"]);
    }

    #[test]
    fn test_mismatched_model_is_surfaced() {
        let mut trained = MODEL.model().clone();
        trained.model.feature_names.pop();
        let narrow = TrainedModelHandle::new(trained);

        let err = analyze("x = 1\n", "x.py", &AnalysisConfig::default(), &narrow).unwrap_err();
        assert_eq!(err.kind(), "feature_mismatch");
    }

    #[test]
    fn test_findings_lower_quality_score() {
        let params = (0..8).map(|i| format!("p{i}")).collect::<Vec<_>>().join(", ");
        let source = format!("def wide({params}):\n    return p0\n");
        let result = analyze(&source, "w.py", &AnalysisConfig::default(), &MODEL).unwrap();
        assert_eq!(result.findings[0].category, SmellCategory::LongParameterList);
        assert!(result.quality_score < 100.0);
    }
}
