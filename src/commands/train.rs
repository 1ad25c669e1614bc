use super::resolve_config;
use crate::io;
use crate::prediction::{
    build_vector_from_map, synthetic_dataset, train_model, LabeledDataset, ModelQuality,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub struct TrainConfig {
    pub dataset: Option<PathBuf>,
    pub samples: usize,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
}

/// A record keyed by feature name, for datasets exported from other tools.
#[derive(Debug, Deserialize)]
struct NamedRecord {
    metrics: BTreeMap<String, f64>,
    defective: bool,
}

pub fn handle_train(config: TrainConfig) -> Result<ModelQuality> {
    let mut settings = resolve_config(config.config.as_deref())?;
    if let Some(seed) = config.seed {
        settings.training.seed = seed;
    }

    let dataset = match &config.dataset {
        Some(path) => load_dataset(path)?,
        None => {
            log::info!(
                "No dataset given; generating {} synthetic records",
                config.samples
            );
            synthetic_dataset(config.samples, settings.training.seed)
        }
    };

    let handle = train_model(&dataset, &settings.training)?;
    let bytes = handle.to_bytes()?;
    io::write_bytes(&config.output, &bytes)?;
    log::info!("Wrote model to {}", config.output.display());

    Ok(*handle.quality())
}

/// Read a dataset as `{"records": [{"features": [...], "defective": bool}]}`
/// or as a list of `{"metrics": {name: value}, "defective": bool}`.
pub fn load_dataset(path: &Path) -> Result<LabeledDataset> {
    let contents = io::read_file(path)?;
    if let Ok(dataset) = serde_json::from_str::<LabeledDataset>(&contents) {
        return Ok(dataset);
    }

    let named: Vec<NamedRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a labeled dataset", path.display()))?;
    let mut dataset = LabeledDataset::default();
    for (index, record) in named.into_iter().enumerate() {
        let vector = build_vector_from_map(&record.metrics)
            .with_context(|| format!("record {index} in {}", path.display()))?;
        dataset.push(vector, record.defective);
    }
    Ok(dataset)
}
