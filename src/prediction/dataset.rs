//! Labeled training data and a synthetic generator.

use super::features::{FeatureVector, FEATURE_COUNT};
use crate::complexity::calculate_maintainability;
use crate::errors::TrainingError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub features: Vec<f64>,
    pub defective: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledDataset {
    pub records: Vec<LabeledRecord>,
}

impl LabeledDataset {
    pub fn new(records: Vec<LabeledRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, features: FeatureVector, defective: bool) {
        self.records.push(LabeledRecord {
            features: features.values().to_vec(),
            defective,
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(defective, clean)` record counts.
    pub fn class_counts(&self) -> (usize, usize) {
        let defective = self.records.iter().filter(|r| r.defective).count();
        (defective, self.records.len() - defective)
    }

    /// Reject datasets training cannot use, naming how many records are bad.
    pub fn validate(&self) -> Result<(), TrainingError> {
        if self.records.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        let ragged = self
            .records
            .iter()
            .filter(|r| r.features.len() != FEATURE_COUNT)
            .count();
        if ragged > 0 {
            return Err(TrainingError::RaggedFeatures {
                expected: FEATURE_COUNT,
                records: ragged,
            });
        }

        let non_finite = self
            .records
            .iter()
            .filter(|r| r.features.iter().any(|v| !v.is_finite()))
            .count();
        if non_finite > 0 {
            return Err(TrainingError::NonFiniteFeatures {
                records: non_finite,
            });
        }

        match self.class_counts() {
            (0, clean) => Err(TrainingError::SingleClass {
                label: false,
                records: clean,
            }),
            (defective, 0) => Err(TrainingError::SingleClass {
                label: true,
                records: defective,
            }),
            _ => Ok(()),
        }
    }
}

/// Synthetic dataset with realistic metric distributions and a labeling
/// rule from defect-prediction research (complexity, size, coupling and
/// cohesion raise risk), plus Gaussian noise.
pub fn synthetic_dataset(samples: usize, seed: u64) -> LabeledDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let records = (0..samples)
        .map(|_| synthetic_record(&mut rng))
        .collect();
    LabeledDataset { records }
}

fn synthetic_record(rng: &mut StdRng) -> LabeledRecord {
    let complexity = 1.0 + gamma2(rng, 3.0).round();
    let loc = lognormal(rng, 3.0, 1.0).round().max(1.0);
    let methods = poisson(rng, 5.0) + 1.0;
    let coupling = poisson(rng, 2.0);
    let cohesion_lack = beta22(rng);
    let inheritance = poisson(rng, 1.0);
    let difficulty = complexity * rng.gen_range(0.5..1.5);
    let volume = loc * rng.gen_range(1.0..3.0) * 5.0;
    let maintainability = calculate_maintainability(volume, complexity as u32, loc as usize).raw();

    let risk = 0.1 * (complexity / 10.0).min(1.0)
        + 0.15 * (loc / 100.0).min(1.0)
        + 0.1 * (methods / 15.0).min(1.0)
        + 0.1 * (coupling / 5.0).min(1.0)
        + 0.15 * cohesion_lack
        + 0.1 * (difficulty / 20.0).min(1.0)
        + 0.1 * (inheritance / 3.0).min(1.0)
        + 0.1 * normal(rng);

    LabeledRecord {
        features: vec![
            complexity,
            loc,
            methods,
            coupling,
            cohesion_lack,
            inheritance,
            difficulty,
            volume,
            maintainability,
        ],
        defective: risk > 0.45,
    }
}

/// Standard normal via Box-Muller.
fn normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn lognormal(rng: &mut StdRng, mu: f64, sigma: f64) -> f64 {
    (mu + sigma * normal(rng)).exp()
}

/// Gamma with shape 2: the sum of two exponentials.
fn gamma2(rng: &mut StdRng, scale: f64) -> f64 {
    let exp = |rng: &mut StdRng| -scale * rng.gen_range(f64::EPSILON..1.0).ln();
    exp(&mut *rng) + exp(&mut *rng)
}

/// Knuth's multiplication method; fine for small means.
fn poisson(rng: &mut StdRng, lambda: f64) -> f64 {
    let limit = (-lambda).exp();
    let mut product: f64 = rng.gen();
    let mut count = 0.0;
    while product > limit {
        product *= rng.gen::<f64>();
        count += 1.0;
    }
    count
}

/// Beta(2, 2) is the median of three uniforms.
fn beta22(rng: &mut StdRng) -> f64 {
    let mut u: [f64; 3] = [rng.gen(), rng.gen(), rng.gen()];
    u.sort_by(f64::total_cmp);
    u[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(features: Vec<f64>, defective: bool) -> LabeledRecord {
        LabeledRecord {
            features,
            defective,
        }
    }

    #[test]
    fn test_synthetic_is_reproducible() {
        assert_eq!(synthetic_dataset(50, 7), synthetic_dataset(50, 7));
        assert_ne!(synthetic_dataset(50, 7), synthetic_dataset(50, 8));
    }

    #[test]
    fn test_synthetic_is_trainable() {
        let dataset = synthetic_dataset(400, 42);
        assert_eq!(dataset.len(), 400);
        assert!(dataset.validate().is_ok());
        let (defective, clean) = dataset.class_counts();
        assert!(defective > 20 && clean > 20, "{defective}/{clean}");
    }

    #[test]
    fn test_validate_reports_offending_counts() {
        assert_eq!(
            LabeledDataset::default().validate(),
            Err(TrainingError::EmptyDataset)
        );

        let ragged = LabeledDataset::new(vec![
            record(vec![1.0; 9], true),
            record(vec![1.0; 8], false),
            record(vec![1.0; 3], false),
        ]);
        assert_eq!(
            ragged.validate(),
            Err(TrainingError::RaggedFeatures {
                expected: 9,
                records: 2
            })
        );

        let mut nan = vec![1.0; 9];
        nan[4] = f64::NAN;
        let non_finite = LabeledDataset::new(vec![record(nan, true), record(vec![1.0; 9], false)]);
        assert_eq!(
            non_finite.validate(),
            Err(TrainingError::NonFiniteFeatures { records: 1 })
        );

        let single = LabeledDataset::new(vec![record(vec![1.0; 9], true); 3]);
        assert_eq!(
            single.validate(),
            Err(TrainingError::SingleClass {
                label: true,
                records: 3
            })
        );
    }
}
