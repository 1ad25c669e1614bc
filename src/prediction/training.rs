//! Seeded, reproducible training of the defect model.
//!
//! One `StdRng` stream drives the whole run: the stratified holdout split
//! first, then one bootstrap resample per ensemble member. Same dataset and
//! seed give bit-identical parameters.

use super::dataset::LabeledDataset;
use super::features::FEATURE_NAMES;
use super::model::{sigmoid, DefectModel, LogisticMember, StandardScaler};
use crate::config::{validate_training_config, TrainingConfig};
use crate::errors::TrainingError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Informational quality of a trained model. Never used as a gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelQuality {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub train_size: usize,
    /// 0 when no holdout was requested; the scores then describe the
    /// training set
    pub holdout_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub model: DefectModel,
    pub quality: ModelQuality,
    pub seed: u64,
}

pub fn train(
    dataset: &LabeledDataset,
    config: &TrainingConfig,
) -> Result<TrainedModel, TrainingError> {
    let config_errors = validate_training_config(config);
    if !config_errors.is_empty() {
        let message = config_errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(TrainingError::InvalidConfig(message));
    }
    dataset.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (train_idx, holdout_idx) = stratified_split(dataset, config.holdout_fraction, &mut rng);

    let train_rows: Vec<&[f64]> = train_idx
        .iter()
        .map(|&i| dataset.records[i].features.as_slice())
        .collect();
    let scaler = StandardScaler::fit(&train_rows, FEATURE_NAMES.len());
    let standardized: Vec<Vec<f64>> = train_rows.iter().map(|row| scaler.transform(row)).collect();
    let labels: Vec<f64> = train_idx
        .iter()
        .map(|&i| if dataset.records[i].defective { 1.0 } else { 0.0 })
        .collect();

    let members = (0..config.ensemble_size)
        .map(|_| {
            let sample: Vec<usize> = (0..standardized.len())
                .map(|_| rng.gen_range(0..standardized.len()))
                .collect();
            fit_member(&standardized, &labels, &sample, config)
        })
        .collect();

    let model = DefectModel {
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        scaler,
        members,
    };

    let eval_idx = if holdout_idx.is_empty() {
        &train_idx
    } else {
        &holdout_idx
    };
    let quality = ModelQuality {
        train_size: train_idx.len(),
        holdout_size: holdout_idx.len(),
        ..evaluate(&model, dataset, eval_idx)
    };

    log::info!(
        "Trained {} members on {} records (holdout {}): accuracy {:.3}, f1 {:.3}",
        config.ensemble_size,
        quality.train_size,
        quality.holdout_size,
        quality.accuracy,
        quality.f1
    );

    Ok(TrainedModel {
        model,
        quality,
        seed: config.seed,
    })
}

/// Shuffle each class separately and hold out `fraction` of it, always
/// leaving at least one record of each class for training.
fn stratified_split(
    dataset: &LabeledDataset,
    fraction: f64,
    rng: &mut StdRng,
) -> (Vec<usize>, Vec<usize>) {
    let mut train = Vec::new();
    let mut holdout = Vec::new();

    for label in [false, true] {
        let mut indexes: Vec<usize> = dataset
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.defective == label)
            .map(|(i, _)| i)
            .collect();
        indexes.shuffle(rng);

        let take = ((indexes.len() as f64 * fraction).round() as usize)
            .min(indexes.len().saturating_sub(1));
        holdout.extend_from_slice(&indexes[..take]);
        train.extend_from_slice(&indexes[take..]);
    }

    train.sort_unstable();
    holdout.sort_unstable();
    (train, holdout)
}

/// Full-batch gradient descent on a class-balanced, L2-regularized log loss.
fn fit_member(
    rows: &[Vec<f64>],
    labels: &[f64],
    sample: &[usize],
    config: &TrainingConfig,
) -> LogisticMember {
    let width = rows.first().map_or(0, Vec::len);
    let positives = sample.iter().filter(|&&i| labels[i] > 0.5).count();
    let negatives = sample.len() - positives;
    let n = sample.len() as f64;
    let class_weight = |label: f64| {
        let count = if label > 0.5 { positives } else { negatives };
        if count == 0 {
            1.0
        } else {
            n / (2.0 * count as f64)
        }
    };

    let mut member = LogisticMember {
        weights: vec![0.0; width],
        bias: 0.0,
    };

    for _ in 0..config.epochs {
        let mut grad_w = vec![0.0; width];
        let mut grad_b = 0.0;

        for &i in sample {
            let error = (member.predict_proba(&rows[i]) - labels[i]) * class_weight(labels[i]);
            for (g, x) in grad_w.iter_mut().zip(&rows[i]) {
                *g += error * x;
            }
            grad_b += error;
        }

        for (w, g) in member.weights.iter_mut().zip(&grad_w) {
            *w -= config.learning_rate * (g / n + config.l2_penalty * *w);
        }
        member.bias -= config.learning_rate * grad_b / n;
    }

    member
}

fn evaluate(model: &DefectModel, dataset: &LabeledDataset, indexes: &[usize]) -> ModelQuality {
    let (mut tp, mut fp, mut tn, mut fneg) = (0usize, 0usize, 0usize, 0usize);

    for &i in indexes {
        let record = &dataset.records[i];
        let standardized = model.scaler.transform(&record.features);
        let probability = model
            .members
            .iter()
            .map(|m| m.predict_proba(&standardized))
            .sum::<f64>()
            / model.members.len().max(1) as f64;
        match (probability >= 0.5, record.defective) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fneg += 1,
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fneg);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ModelQuality {
        accuracy: ratio(tp + tn, indexes.len()),
        precision,
        recall,
        f1,
        ..ModelQuality::default()
    }
}
