//! CLI command implementations.
//!
//! - **analyze**: metrics, smells, defect risk and suggested tests for Python files
//! - **train**: fit a defect model and write it as a blob
//! - **init**: write a default `.defectscope.toml`

pub mod analyze;
pub mod init;
pub mod train;

pub use analyze::{handle_analyze, load_model, AnalyzeConfig};
pub use init::init_config;
pub use train::{handle_train, load_dataset, TrainConfig};

use crate::config::{load_config, load_config_from_path, DefectscopeConfig};
use anyhow::Result;
use std::path::Path;

/// Explicit config file, or the nearest `.defectscope.toml`.
pub(crate) fn resolve_config(path: Option<&Path>) -> Result<DefectscopeConfig> {
    match path {
        Some(path) => Ok(load_config_from_path(path)?),
        None => Ok(load_config()),
    }
}
