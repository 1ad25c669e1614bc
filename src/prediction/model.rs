//! Bagged logistic-regression ensemble over standardized features.

use super::features::FeatureVector;
use crate::core::RiskLevel;
use crate::errors::FeatureMismatchError;
use serde::{Deserialize, Serialize};

/// Z-score standardization fitted on training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    /// Population standard deviations; constant features get 1.0
    pub scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[&[f64]], width: usize) -> Self {
        let n = rows.len().max(1) as f64;
        let means: Vec<f64> = (0..width)
            .map(|j| rows.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let scales = (0..width)
            .map(|j| {
                let variance = rows.iter().map(|row| (row[j] - means[j]).powi(2)).sum::<f64>() / n;
                let std = variance.sqrt();
                if std > 1e-12 {
                    std
                } else {
                    1.0
                }
            })
            .collect();
        Self { means, scales }
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect()
    }
}

/// One logistic-regression member of the ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticMember {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LogisticMember {
    pub fn predict_proba(&self, standardized: &[f64]) -> f64 {
        let logit: f64 = self
            .weights
            .iter()
            .zip(standardized)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        sigmoid(logit)
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Share of the model's attention a feature receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectPrediction {
    /// Unit id or qualified function name
    pub target: String,
    /// Ensemble mean, 0-1
    pub probability: f64,
    /// `probability >= decision_threshold`
    pub is_defective: bool,
    /// `max(p, 1 - p)`
    pub confidence: f64,
    /// Variance of member probabilities
    pub variance: f64,
    pub risk_level: RiskLevel,
    pub top_factors: Vec<FeatureImportance>,
}

/// Trained ensemble with its feature contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectModel {
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub members: Vec<LogisticMember>,
}

impl DefectModel {
    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    /// Every parameter vector must cover exactly the named features.
    pub fn check_shape(&self) -> Result<(), String> {
        let width = self.feature_count();
        if self.members.is_empty() {
            return Err("ensemble has no members".to_string());
        }
        if self.scaler.means.len() != width || self.scaler.scales.len() != width {
            return Err(format!(
                "scaler covers {}/{} features, expected {width}",
                self.scaler.means.len(),
                self.scaler.scales.len()
            ));
        }
        if let Some((i, member)) = self
            .members
            .iter()
            .enumerate()
            .find(|(_, member)| member.weights.len() != width)
        {
            return Err(format!(
                "member {i} has {} weights, expected {width}",
                member.weights.len()
            ));
        }
        Ok(())
    }

    /// Mean and variance of member probabilities.
    pub fn predict_proba(
        &self,
        vector: &FeatureVector,
    ) -> Result<(f64, f64), FeatureMismatchError> {
        if vector.len() != self.feature_count() {
            return Err(FeatureMismatchError {
                expected: self.feature_count(),
                actual: vector.len(),
            });
        }

        let standardized = self.scaler.transform(vector.values());
        let probabilities: Vec<f64> = self
            .members
            .iter()
            .map(|member| member.predict_proba(&standardized))
            .collect();
        let n = probabilities.len().max(1) as f64;
        let mean = probabilities.iter().sum::<f64>() / n;
        let variance = probabilities.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        Ok((mean, variance))
    }

    pub fn predict(
        &self,
        target: &str,
        vector: &FeatureVector,
        decision_threshold: f64,
        top_factors: usize,
    ) -> Result<DefectPrediction, FeatureMismatchError> {
        let (probability, variance) = self.predict_proba(vector)?;

        Ok(DefectPrediction {
            target: target.to_string(),
            probability,
            is_defective: probability >= decision_threshold,
            confidence: probability.max(1.0 - probability),
            variance,
            risk_level: RiskLevel::from_probability(probability),
            top_factors: self.feature_importances().into_iter().take(top_factors).collect(),
        })
    }

    /// Normalized |weight| of the averaged member, most important first.
    pub fn feature_importances(&self) -> Vec<FeatureImportance> {
        let n = self.members.len().max(1) as f64;
        let magnitudes: Vec<f64> = (0..self.feature_count())
            .map(|j| {
                (self
                    .members
                    .iter()
                    .map(|m| m.weights.get(j).copied().unwrap_or(0.0))
                    .sum::<f64>()
                    / n)
                    .abs()
            })
            .collect();
        let total: f64 = magnitudes.iter().sum();

        let mut importances: Vec<_> = self
            .feature_names
            .iter()
            .zip(magnitudes)
            .map(|(feature, magnitude)| FeatureImportance {
                feature: feature.clone(),
                importance: if total > 0.0 { magnitude / total } else { 0.0 },
            })
            .collect();
        importances.sort_by(|a, b| {
            b.importance
                .total_cmp(&a.importance)
                .then_with(|| a.feature.cmp(&b.feature))
        });
        importances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> DefectModel {
        DefectModel {
            feature_names: vec!["a".into(), "b".into(), "c".into()],
            scaler: StandardScaler {
                means: vec![0.0; 3],
                scales: vec![1.0; 3],
            },
            members: vec![
                LogisticMember {
                    weights: vec![2.0, -1.0, 0.0],
                    bias: 0.0,
                },
                LogisticMember {
                    weights: vec![1.0, -1.0, 0.0],
                    bias: 0.0,
                },
            ],
        }
    }

    #[test]
    fn test_zero_input_is_even_odds() {
        let prediction = model()
            .predict("u", &FeatureVector::from_raw(vec![0.0; 3]).unwrap(), 0.5, 3)
            .unwrap();
        assert_eq!(prediction.probability, 0.5);
        assert_eq!(prediction.variance, 0.0);
        assert!(prediction.is_defective);
        assert_eq!(prediction.confidence, 0.5);
        assert_eq!(prediction.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let err = model()
            .predict("u", &FeatureVector::from_raw(vec![0.0; 9]).unwrap(), 0.5, 3)
            .unwrap_err();
        assert_eq!(err, FeatureMismatchError { expected: 3, actual: 9 });
    }

    #[test]
    fn test_importances_are_normalized_and_sorted() {
        let importances = model().feature_importances();
        let names: Vec<_> = importances.iter().map(|i| i.feature.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!((importances[0].importance - 0.6).abs() < 1e-12);
        assert!((importances[1].importance - 0.4).abs() < 1e-12);
        let total: f64 = importances.iter().map(|i| i.importance).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_decision_threshold_is_runtime() {
        let vector = FeatureVector::from_raw(vec![1.0, 0.0, 0.0]).unwrap();
        let strict = model().predict("u", &vector, 0.99, 1).unwrap();
        let loose = model().predict("u", &vector, 0.1, 1).unwrap();
        assert_eq!(strict.probability, loose.probability);
        assert!(!strict.is_defective);
        assert!(loose.is_defective);
        assert!(strict.variance > 0.0);
        assert_eq!(strict.top_factors.len(), 1);
    }

    #[test]
    fn test_scaler_handles_constant_columns() {
        let data = [[1.0, 5.0], [3.0, 5.0]];
        let rows: Vec<&[f64]> = data.iter().map(|row| row.as_slice()).collect();
        let scaler = StandardScaler::fit(&rows, 2);
        assert_eq!(scaler.means, vec![2.0, 5.0]);
        assert_eq!(scaler.scales, vec![1.0, 1.0]);
        assert_eq!(scaler.transform(&[3.0, 5.0]), vec![1.0, 0.0]);
    }
}
