use serde::{Deserialize, Serialize};

use super::thresholds::SmellThresholds;

/// Root configuration, as read from `.defectscope.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DefectscopeConfig {
    #[serde(flatten)]
    pub analysis: AnalysisConfig,

    /// Settings for `train`
    #[serde(default)]
    pub training: TrainingConfig,
}

/// Settings for one `analyze` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub parser: ParserConfig,

    /// Smell detection thresholds
    #[serde(default)]
    pub thresholds: SmellThresholds,

    #[serde(default)]
    pub prediction: PredictionConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

impl AnalysisConfig {
    /// Apply per-call overrides on top of this configuration.
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        overrides.apply(&mut self);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Treat empty (or comment-only) text as a valid zero-count unit.
    #[serde(default = "default_true")]
    pub allow_empty: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { allow_empty: true }
    }
}

/// Granularity of defect predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One prediction for the whole unit
    #[default]
    Unit,
    /// Unit prediction plus one per function
    Function,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Probability at or above which a unit is labeled defective
    #[serde(default = "default_decision_threshold")]
    pub decision_threshold: f64,

    #[serde(default)]
    pub granularity: Granularity,

    /// Number of feature importances attached to each prediction
    #[serde(default = "default_top_factors")]
    pub top_factors: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            decision_threshold: default_decision_threshold(),
            granularity: Granularity::default(),
            top_factors: default_top_factors(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Also generate tests for `_private` functions
    #[serde(default)]
    pub include_private: bool,

    /// Cap on the estimated assertion count of a happy-path case
    #[serde(default = "default_max_assertions")]
    pub max_assertions: u32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            include_private: false,
            max_assertions: default_max_assertions(),
        }
    }
}

/// Hyperparameters for training the defect predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of bootstrap members in the ensemble
    #[serde(default = "default_ensemble_size")]
    pub ensemble_size: usize,

    #[serde(default = "default_epochs")]
    pub epochs: usize,

    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    #[serde(default = "default_l2_penalty")]
    pub l2_penalty: f64,

    /// Share of records held out for quality evaluation
    #[serde(default = "default_holdout_fraction")]
    pub holdout_fraction: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            ensemble_size: default_ensemble_size(),
            epochs: default_epochs(),
            learning_rate: default_learning_rate(),
            l2_penalty: default_l2_penalty(),
            holdout_fraction: default_holdout_fraction(),
        }
    }
}

/// Named per-call overrides. Unset fields keep the configured value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    pub long_method_lines: Option<usize>,
    pub max_parameters: Option<usize>,
    pub max_complexity: Option<u32>,
    pub max_nesting: Option<u32>,
    pub large_class_methods: Option<usize>,
    pub decision_threshold: Option<f64>,
    pub granularity: Option<Granularity>,
    pub include_private: Option<bool>,
    pub allow_empty: Option<bool>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut AnalysisConfig) {
        let thresholds = &mut config.thresholds;
        if let Some(v) = self.long_method_lines {
            thresholds.long_method_lines = v;
        }
        if let Some(v) = self.max_parameters {
            thresholds.max_parameters = v;
        }
        if let Some(v) = self.max_complexity {
            thresholds.max_complexity = v;
        }
        if let Some(v) = self.max_nesting {
            thresholds.max_nesting = v;
        }
        if let Some(v) = self.large_class_methods {
            thresholds.large_class_methods = v;
        }
        if let Some(v) = self.decision_threshold {
            config.prediction.decision_threshold = v;
        }
        if let Some(v) = self.granularity {
            config.prediction.granularity = v;
        }
        if let Some(v) = self.include_private {
            config.synthesis.include_private = v;
        }
        if let Some(v) = self.allow_empty {
            config.parser.allow_empty = v;
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_decision_threshold() -> f64 {
    0.5
}
fn default_top_factors() -> usize {
    3
}
fn default_max_assertions() -> u32 {
    5
}
fn default_seed() -> u64 {
    42
}
fn default_ensemble_size() -> usize {
    8
}
fn default_epochs() -> usize {
    300
}
fn default_learning_rate() -> f64 {
    0.1
}
fn default_l2_penalty() -> f64 {
    0.001
}
fn default_holdout_fraction() -> f64 {
    0.2
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_empty_toml_is_default() {
        let config: DefectscopeConfig = toml::from_str("").unwrap();
        assert_eq!(config, DefectscopeConfig::default());
    }

    #[test]
    fn test_toml_sections() {
        let config: DefectscopeConfig = toml::from_str(indoc! {r#"
            [thresholds]
            long_method_lines = 40

            [prediction]
            decision_threshold = 0.7
            granularity = "function"

            [training]
            seed = 7
        "#})
        .unwrap();
        assert_eq!(config.analysis.thresholds.long_method_lines, 40);
        assert_eq!(config.analysis.prediction.decision_threshold, 0.7);
        assert_eq!(config.analysis.prediction.granularity, Granularity::Function);
        assert_eq!(config.training.seed, 7);
        assert_eq!(config.training.epochs, 300);
    }

    #[test]
    fn test_overrides_only_touch_set_fields() {
        let overrides = ConfigOverrides {
            max_parameters: Some(2),
            decision_threshold: Some(0.3),
            ..Default::default()
        };
        let config = AnalysisConfig::default().with_overrides(&overrides);
        assert_eq!(config.thresholds.max_parameters, 2);
        assert_eq!(config.prediction.decision_threshold, 0.3);
        assert_eq!(config.thresholds.long_method_lines, 25);
        assert!(config.parser.allow_empty);
    }
}
