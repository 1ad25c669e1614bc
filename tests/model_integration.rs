//! Training, prediction and model-blob behavior through the public API.

mod common;

use common::fast_training;
use defectscope::errors::ModelFormatError;
use defectscope::prediction::{build_vector_from_map, FEATURE_COUNT};
use defectscope::{
    synthetic_dataset, train_model, FeatureVector, LabeledDataset, ModelSlot, RiskLevel,
    TrainedModelHandle, TrainingError, FEATURE_NAMES,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn risky_vector() -> FeatureVector {
    let metrics: BTreeMap<String, f64> = [
        ("cyclomatic_complexity", 25.0),
        ("lines_of_code", 900.0),
        ("number_of_methods", 40.0),
        ("coupling_between_objects", 18.0),
        ("lack_of_cohesion", 0.9),
        ("depth_of_inheritance", 4.0),
        ("halstead_difficulty", 60.0),
        ("halstead_volume", 20000.0),
        ("maintainability_index", 10.0),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    build_vector_from_map(&metrics).unwrap()
}

#[test]
fn test_training_is_reproducible_for_a_seed() {
    let dataset = synthetic_dataset(200, 3);
    let first = train_model(&dataset, &fast_training(3)).unwrap();
    let second = train_model(&dataset, &fast_training(3)).unwrap();

    assert_eq!(first.model(), second.model());
    assert_eq!(first.to_bytes().unwrap(), second.to_bytes().unwrap());
}

#[test]
fn test_trained_model_uses_fixed_feature_order() {
    let handle = train_model(&synthetic_dataset(150, 1), &fast_training(1)).unwrap();
    assert_eq!(handle.feature_count(), FEATURE_COUNT);
    assert_eq!(handle.model().model.feature_names, FEATURE_NAMES.to_vec());
}

#[test]
fn test_prediction_is_deterministic_and_bounded() {
    let handle = train_model(&synthetic_dataset(300, 8), &fast_training(8)).unwrap();
    let vector = risky_vector();

    let first = handle.predict("big.py", &vector, 0.5, 3).unwrap();
    let second = handle.predict("big.py", &vector, 0.5, 3).unwrap();
    assert_eq!(first, second);
    assert!((0.0..=1.0).contains(&first.probability));
    assert!((0.0..=1.0).contains(&first.confidence));
    assert!(first.top_factors.len() <= 3);
    assert!(first.is_defective, "p={}", first.probability);
    assert_ne!(first.risk_level, RiskLevel::Low);
}

#[test]
fn test_blob_round_trip_predicts_identically() {
    let handle = train_model(&synthetic_dataset(150, 4), &fast_training(4)).unwrap();
    let restored = TrainedModelHandle::from_bytes(&handle.to_bytes().unwrap()).unwrap();
    let vector = risky_vector();

    assert_eq!(restored, handle);
    assert_eq!(
        restored.predict("x", &vector, 0.5, 2).unwrap(),
        handle.predict("x", &vector, 0.5, 2).unwrap()
    );
}

#[test]
fn test_foreign_blob_is_rejected() {
    let err = TrainedModelHandle::from_bytes(b"{\"weights\": []}").unwrap_err();
    assert!(matches!(err, ModelFormatError::Decode(_)), "{err:?}");
}

#[test]
fn test_empty_dataset_cannot_train() {
    let err = train_model(&LabeledDataset::default(), &fast_training(0)).unwrap_err();
    assert!(matches!(err, TrainingError::EmptyDataset), "{err:?}");
}

#[test]
fn test_slot_swap_is_visible_to_readers() {
    let old = train_model(&synthetic_dataset(120, 1), &fast_training(1)).unwrap();
    let new = train_model(&synthetic_dataset(120, 2), &fast_training(2)).unwrap();
    let slot = Arc::new(ModelSlot::new(old.clone()));

    let held = slot.current();
    let previous = slot.replace(new.clone());

    assert_eq!(previous, old);
    assert_eq!(held, old);
    let reader = Arc::clone(&slot);
    let seen = std::thread::spawn(move || reader.current()).join().unwrap();
    assert_eq!(seen, new);
}
