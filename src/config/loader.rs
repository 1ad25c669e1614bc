use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::core::DefectscopeConfig;
use super::validation::validate_config;
use crate::errors::ConfigError;

pub const CONFIG_FILE_NAME: &str = ".defectscope.toml";

/// Parse TOML and reject it if any setting is invalid.
pub fn parse_and_validate_config(contents: &str) -> Result<DefectscopeConfig, ConfigError> {
    let config = toml::from_str::<DefectscopeConfig>(contents)
        .map_err(|e| ConfigError::Parse(format!("Failed to parse {CONFIG_FILE_NAME}: {e}")))?;

    match validate_config(&config.analysis, &config.training)
        .into_iter()
        .next()
    {
        Some(first) => Err(first),
        None => Ok(config),
    }
}

/// Load and validate a configuration file at an explicit path.
pub fn load_config_from_path(path: &Path) -> Result<DefectscopeConfig, ConfigError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::Parse(format!("Failed to read {}: {e}", path.display())))?;
    parse_and_validate_config(&contents)
}

/// A config found during discovery; unreadable or invalid files are skipped.
fn discover_at(path: &Path) -> Option<DefectscopeConfig> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            log::warn!("Cannot read {}: {e}", path.display());
            return None;
        }
    };

    parse_and_validate_config(&contents)
        .inspect(|_| log::debug!("Using config {}", path.display()))
        .inspect_err(|e| log::warn!("Ignoring {}: {e}", path.display()))
        .ok()
}

/// Directory ancestors of `start`, nearest first, up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Find the nearest `.defectscope.toml` above `start` and load it.
pub fn load_config_from(start: PathBuf) -> DefectscopeConfig {
    const MAX_TRAVERSAL_DEPTH: usize = 10;

    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| discover_at(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No {CONFIG_FILE_NAME} within {MAX_TRAVERSAL_DEPTH} directories; using defaults"
            );
            DefectscopeConfig::default()
        })
}

/// Load configuration starting from the current directory.
pub fn load_config() -> DefectscopeConfig {
    match std::env::current_dir() {
        Ok(dir) => load_config_from(dir),
        Err(e) => {
            log::warn!("Current directory unavailable ({e}); using default config");
            DefectscopeConfig::default()
        }
    }
}

/// Default configuration rendered as TOML, for `defectscope init`.
pub fn default_config_toml() -> Result<String, ConfigError> {
    toml::to_string_pretty(&DefectscopeConfig::default())
        .map_err(|e| ConfigError::Parse(e.to_string()))
}
