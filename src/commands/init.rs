use crate::config::{default_config_toml, CONFIG_FILE_NAME};
use crate::io;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Write the default configuration into `dir`.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    let contents = format!("# Defectscope configuration\n\n{}", default_config_toml()?);
    io::write_file(&config_path, &contents)?;
    log::info!("Created {}", config_path.display());

    Ok(config_path)
}
