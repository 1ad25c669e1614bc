// Shared helpers for defectscope integration tests
#![allow(dead_code)]

use defectscope::{train_model, synthetic_dataset, TrainedModelHandle, TrainingConfig};
use once_cell::sync::Lazy;

/// Small ensemble so integration tests train quickly.
pub fn fast_training(seed: u64) -> TrainingConfig {
    TrainingConfig {
        seed,
        ensemble_size: 3,
        epochs: 80,
        ..TrainingConfig::default()
    }
}

pub static MODEL: Lazy<TrainedModelHandle> = Lazy::new(|| {
    train_model(&synthetic_dataset(300, 11), &fast_training(11)).expect("synthetic data trains")
});

/// A 30-line function with 5 parameters and eleven branches.
pub const BRANCHY: &str = "\
def process(a, b, c, d, e):
    total = 0
    if a > 0:
        total += a
    if b > 0:
        total += b
    if c > 0:
        total += c
    if d > 0:
        total += d
    if e > 0:
        total += e
    if a > b:
        total -= 1
    if b > c:
        total -= 1
    if c > d:
        total -= 1
    if d > e:
        total -= 1
    if total > 100:
        total = 100
    if total < -100:
        total = -100
    scaled = total * 2
    shifted = scaled + 1
    halved = shifted // 2
    doubled = halved * 2
    result = doubled - total
    return result
";
