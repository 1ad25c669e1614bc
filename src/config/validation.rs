//! Configuration validation with error accumulation.
//!
//! Every problem is collected so a user sees all invalid settings in one run.

use super::core::{AnalysisConfig, TrainingConfig};
use crate::errors::ConfigError;

/// Validate analysis and training settings, returning every problem found.
pub fn validate_config(analysis: &AnalysisConfig, training: &TrainingConfig) -> Vec<ConfigError> {
    let mut errors = validate_analysis_config(analysis);
    errors.extend(validate_training_config(training));
    errors
}

pub fn validate_analysis_config(config: &AnalysisConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    let t = &config.thresholds;

    let positive_counts = [
        ("thresholds.long_method_lines", t.long_method_lines),
        ("thresholds.max_parameters", t.max_parameters),
        ("thresholds.large_class_methods", t.large_class_methods),
        ("thresholds.large_class_lines", t.large_class_lines),
        ("thresholds.duplicate_min_lines", t.duplicate_min_lines),
    ];
    errors.extend(
        positive_counts
            .iter()
            .filter(|(_, value)| *value == 0)
            .map(|(field, _)| ConfigError::invalid(*field, "must be greater than 0")),
    );

    if t.max_complexity == 0 {
        errors.push(ConfigError::invalid(
            "thresholds.max_complexity",
            "must be greater than 0",
        ));
    }

    if !(t.confidence_scale.is_finite() && t.confidence_scale >= 0.0) {
        errors.push(ConfigError::invalid(
            "thresholds.confidence_scale",
            format!("expected a non-negative number, got {}", t.confidence_scale),
        ));
    }

    if !(t.escalation_ratio.is_finite() && t.escalation_ratio >= 1.0) {
        errors.push(ConfigError::invalid(
            "thresholds.escalation_ratio",
            format!("expected a number >= 1.0, got {}", t.escalation_ratio),
        ));
    }

    for (category, confidence) in &t.base_confidence {
        if !is_probability(*confidence) {
            errors.push(ConfigError::invalid(
                format!("thresholds.base_confidence.{category}"),
                format!("expected 0.0-1.0, got {confidence}"),
            ));
        }
    }

    let threshold = config.prediction.decision_threshold;
    if !is_probability(threshold) {
        errors.push(ConfigError::invalid(
            "prediction.decision_threshold",
            format!("expected 0.0-1.0, got {threshold}"),
        ));
    }

    errors
}

pub fn validate_training_config(config: &TrainingConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.ensemble_size == 0 {
        errors.push(ConfigError::invalid(
            "training.ensemble_size",
            "must be greater than 0",
        ));
    }
    if config.epochs == 0 {
        errors.push(ConfigError::invalid("training.epochs", "must be greater than 0"));
    }
    if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
        errors.push(ConfigError::invalid(
            "training.learning_rate",
            format!("expected a positive number, got {}", config.learning_rate),
        ));
    }
    if !(config.l2_penalty.is_finite() && config.l2_penalty >= 0.0) {
        errors.push(ConfigError::invalid(
            "training.l2_penalty",
            format!("expected a non-negative number, got {}", config.l2_penalty),
        ));
    }
    if !(config.holdout_fraction >= 0.0 && config.holdout_fraction < 1.0) {
        errors.push(ConfigError::invalid(
            "training.holdout_fraction",
            format!("expected 0.0 <= fraction < 1.0, got {}", config.holdout_fraction),
        ));
    }

    errors
}

fn is_probability(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AnalysisConfig::default(), &TrainingConfig::default()).is_empty());
    }

    #[test]
    fn test_all_errors_are_accumulated() {
        let mut analysis = AnalysisConfig::default();
        analysis.thresholds.max_parameters = 0;
        analysis.prediction.decision_threshold = 1.5;
        analysis
            .thresholds
            .base_confidence
            .insert("LONG_METHOD".to_string(), -0.1);
        let training = TrainingConfig {
            epochs: 0,
            ..TrainingConfig::default()
        };

        let errors = validate_config(&analysis, &training);
        assert_eq!(errors.len(), 4);
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("prediction.decision_threshold")));
    }

    #[test]
    fn test_nan_threshold_is_rejected() {
        let mut analysis = AnalysisConfig::default();
        analysis.prediction.decision_threshold = f64::NAN;
        assert_eq!(validate_analysis_config(&analysis).len(), 1);
    }
}
