use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Smell detection thresholds.
///
/// A rule fires when the measured value strictly exceeds its threshold.
/// Everything here is data: changing a value never requires touching rule
/// logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmellThresholds {
    #[serde(default = "default_long_method_lines")]
    pub long_method_lines: usize,

    #[serde(default = "default_max_parameters")]
    pub max_parameters: usize,

    #[serde(default = "default_max_complexity")]
    pub max_complexity: u32,

    #[serde(default = "default_max_nesting")]
    pub max_nesting: u32,

    #[serde(default = "default_large_class_methods")]
    pub large_class_methods: usize,

    #[serde(default = "default_large_class_lines")]
    pub large_class_lines: usize,

    #[serde(default = "default_god_object_methods")]
    pub god_object_methods: usize,

    #[serde(default = "default_god_object_responsibilities")]
    pub god_object_responsibilities: usize,

    /// Minimum code lines of a function body considered for duplication.
    #[serde(default = "default_duplicate_min_lines")]
    pub duplicate_min_lines: usize,

    /// Confidence gained per 100% overshoot of a threshold.
    #[serde(default = "default_confidence_scale")]
    pub confidence_scale: f64,

    /// Findings at or above `threshold * escalation_ratio` are HIGH.
    #[serde(default = "default_escalation_ratio")]
    pub escalation_ratio: f64,

    /// Base confidence overrides keyed by category name (e.g. `LONG_METHOD`).
    #[serde(default)]
    pub base_confidence: BTreeMap<String, f64>,
}

impl Default for SmellThresholds {
    fn default() -> Self {
        Self {
            long_method_lines: default_long_method_lines(),
            max_parameters: default_max_parameters(),
            max_complexity: default_max_complexity(),
            max_nesting: default_max_nesting(),
            large_class_methods: default_large_class_methods(),
            large_class_lines: default_large_class_lines(),
            god_object_methods: default_god_object_methods(),
            god_object_responsibilities: default_god_object_responsibilities(),
            duplicate_min_lines: default_duplicate_min_lines(),
            confidence_scale: default_confidence_scale(),
            escalation_ratio: default_escalation_ratio(),
            base_confidence: BTreeMap::new(),
        }
    }
}

impl SmellThresholds {
    /// Tighter limits for codebases held to a high standard.
    pub fn strict() -> Self {
        Self {
            long_method_lines: 15,
            max_parameters: 3,
            max_complexity: 7,
            max_nesting: 2,
            large_class_methods: 10,
            large_class_lines: 200,
            ..Self::default()
        }
    }

    /// Looser limits for legacy code.
    pub fn lenient() -> Self {
        Self {
            long_method_lines: 50,
            max_parameters: 6,
            max_complexity: 20,
            max_nesting: 5,
            large_class_methods: 25,
            large_class_lines: 600,
            ..Self::default()
        }
    }
}

fn default_long_method_lines() -> usize {
    25
}
fn default_max_parameters() -> usize {
    4
}
fn default_max_complexity() -> u32 {
    10
}
fn default_max_nesting() -> u32 {
    3
}
fn default_large_class_methods() -> usize {
    15
}
fn default_large_class_lines() -> usize {
    300
}
fn default_god_object_methods() -> usize {
    20
}
fn default_god_object_responsibilities() -> usize {
    5
}
fn default_duplicate_min_lines() -> usize {
    5
}
fn default_confidence_scale() -> f64 {
    0.1
}
fn default_escalation_ratio() -> f64 {
    2.0
}
