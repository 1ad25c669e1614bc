//! Projection of metrics into the predictor's fixed-order feature vector.
//!
//! The order of [`FEATURE_NAMES`] is the contract between analysis and every
//! trained model. Reordering it invalidates all serialized models.

use crate::errors::FeatureBuildError;
use crate::metrics::{ClassMetrics, FunctionMetrics, UnitMetrics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const FEATURE_COUNT: usize = 9;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "cyclomatic_complexity",
    "lines_of_code",
    "number_of_methods",
    "coupling_between_objects",
    "lack_of_cohesion",
    "depth_of_inheritance",
    "halstead_difficulty",
    "halstead_volume",
    "maintainability_index",
];

/// Ordered feature values, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    /// Wrap raw values without checking their count; the predictor rejects
    /// vectors of the wrong length. Every value must be finite.
    pub fn from_raw(values: Vec<f64>) -> Result<Self, FeatureBuildError> {
        if let Some((i, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            let field = FEATURE_NAMES
                .get(i)
                .map_or_else(|| format!("feature[{i}]"), |name| name.to_string());
            log::error!("Feature `{field}` is not finite: {value}");
            return Err(FeatureBuildError::non_finite(field, value));
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Named values in feature order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

/// Unit-level vector.
pub fn build_vector(metrics: &UnitMetrics) -> Result<FeatureVector, FeatureBuildError> {
    checked([
        f64::from(metrics.cyclomatic),
        metrics.lines_of_code as f64,
        metrics.function_count as f64,
        metrics.coupling as f64,
        metrics.cohesion_lack,
        f64::from(metrics.inheritance_depth),
        metrics.halstead.difficulty,
        metrics.halstead.volume,
        metrics.maintainability.raw(),
    ])
}

/// Vector for one function. Coupling comes from the unit, cohesion and
/// inheritance from the enclosing class when there is one, 0 otherwise.
pub fn build_function_vector(
    function: &FunctionMetrics,
    unit: &UnitMetrics,
    class: Option<&ClassMetrics>,
) -> Result<FeatureVector, FeatureBuildError> {
    checked([
        f64::from(function.cyclomatic),
        function.lines_of_code as f64,
        1.0,
        unit.coupling as f64,
        class.map_or(0.0, |c| c.cohesion_lack),
        class.map_or(0.0, |c| f64::from(c.inheritance_depth)),
        function.halstead.difficulty,
        function.halstead.volume,
        function.maintainability.raw(),
    ])
}

/// Vector from loosely-typed metrics keyed by feature name.
///
/// Complexity, size and the Halstead/maintainability measures are required;
/// the design proxies default to 0.
pub fn build_vector_from_map(
    metrics: &BTreeMap<String, f64>,
) -> Result<FeatureVector, FeatureBuildError> {
    const OPTIONAL: [&str; 4] = [
        "number_of_methods",
        "coupling_between_objects",
        "lack_of_cohesion",
        "depth_of_inheritance",
    ];

    let mut values = [0.0; FEATURE_COUNT];
    for (slot, name) in values.iter_mut().zip(FEATURE_NAMES) {
        *slot = match metrics.get(name) {
            Some(value) => *value,
            None if OPTIONAL.contains(&name) => 0.0,
            None => return Err(FeatureBuildError::missing(name)),
        };
    }
    checked(values)
}

fn checked(values: [f64; FEATURE_COUNT]) -> Result<FeatureVector, FeatureBuildError> {
    FeatureVector::from_raw(values.to_vec())
}
