//! Defect prediction: feature vectors, training and the trained model.

pub mod dataset;
pub mod features;
pub mod handle;
pub mod model;
pub mod training;

pub use dataset::{synthetic_dataset, LabeledDataset, LabeledRecord};
pub use features::{
    build_function_vector, build_vector, build_vector_from_map, FeatureVector, FEATURE_COUNT,
    FEATURE_NAMES,
};
pub use handle::{ModelSlot, TrainedModelHandle, MODEL_FORMAT_VERSION};
pub use model::{DefectModel, DefectPrediction, FeatureImportance};
pub use training::{train, ModelQuality, TrainedModel};

use crate::config::TrainingConfig;
use crate::errors::TrainingError;

/// Train a model and wrap it in a shareable handle.
pub fn train_model(
    dataset: &LabeledDataset,
    config: &TrainingConfig,
) -> Result<TrainedModelHandle, TrainingError> {
    let _span = tracing::info_span!("train_model", records = dataset.len()).entered();
    let model = train(dataset, config)?;
    tracing::info!(
        accuracy = model.quality.accuracy,
        f1 = model.quality.f1,
        "model trained"
    );
    Ok(TrainedModelHandle::new(model))
}
