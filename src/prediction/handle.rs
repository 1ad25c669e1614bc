//! Shareable trained-model handles and their opaque byte format.

use super::features::FeatureVector;
use super::model::DefectPrediction;
use super::training::{ModelQuality, TrainedModel};
use crate::errors::{FeatureMismatchError, ModelFormatError};
use parking_lot::RwLock;
use std::sync::Arc;

/// Bumped whenever the serialized layout or the feature order changes.
pub const MODEL_FORMAT_VERSION: u16 = 1;

const MAGIC: &[u8; 4] = b"DSCM";

/// Cheaply clonable, read-only reference to a trained model.
///
/// Safe to share across threads for concurrent `predict` calls. Replace a
/// model by swapping handles (see [`ModelSlot`]), never by mutating one.
#[derive(Debug, Clone)]
pub struct TrainedModelHandle {
    inner: Arc<TrainedModel>,
}

impl TrainedModelHandle {
    pub fn new(model: TrainedModel) -> Self {
        Self {
            inner: Arc::new(model),
        }
    }

    pub fn model(&self) -> &TrainedModel {
        &self.inner
    }

    pub fn quality(&self) -> &ModelQuality {
        &self.inner.quality
    }

    pub fn feature_count(&self) -> usize {
        self.inner.model.feature_count()
    }

    pub fn predict(
        &self,
        target: &str,
        vector: &FeatureVector,
        decision_threshold: f64,
        top_factors: usize,
    ) -> Result<DefectPrediction, FeatureMismatchError> {
        self.inner
            .model
            .predict(target, vector, decision_threshold, top_factors)
    }

    /// Serialize to an opaque, versioned blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelFormatError> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend(
            postcard::to_allocvec(&MODEL_FORMAT_VERSION)
                .map_err(|e| ModelFormatError::Encode(e.to_string()))?,
        );
        bytes.extend(
            postcard::to_allocvec(self.inner.as_ref())
                .map_err(|e| ModelFormatError::Encode(e.to_string()))?,
        );
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelFormatError> {
        let body = bytes
            .strip_prefix(MAGIC.as_slice())
            .ok_or_else(|| ModelFormatError::Decode("missing model header".to_string()))?;
        let (version, rest) = postcard::take_from_bytes::<u16>(body)
            .map_err(|e| ModelFormatError::Decode(e.to_string()))?;
        if version != MODEL_FORMAT_VERSION {
            return Err(ModelFormatError::Version {
                found: version,
                expected: MODEL_FORMAT_VERSION,
            });
        }
        let model: TrainedModel =
            postcard::from_bytes(rest).map_err(|e| ModelFormatError::Decode(e.to_string()))?;
        model.model.check_shape().map_err(ModelFormatError::Shape)?;
        Ok(Self::new(model))
    }
}

impl PartialEq for TrainedModelHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl From<TrainedModel> for TrainedModelHandle {
    fn from(model: TrainedModel) -> Self {
        Self::new(model)
    }
}

/// A swappable "current model" owned by a composition root.
///
/// Readers take a handle clone and keep predicting with it even while a new
/// model is installed.
#[derive(Debug)]
pub struct ModelSlot {
    current: RwLock<TrainedModelHandle>,
}

impl ModelSlot {
    pub fn new(handle: TrainedModelHandle) -> Self {
        Self {
            current: RwLock::new(handle),
        }
    }

    pub fn current(&self) -> TrainedModelHandle {
        self.current.read().clone()
    }

    /// Atomically install a new model, returning the previous one.
    pub fn replace(&self, handle: TrainedModelHandle) -> TrainedModelHandle {
        std::mem::replace(&mut *self.current.write(), handle)
    }
}
