mod core;
mod loader;
mod thresholds;
pub mod validation;

pub use self::core::{
    AnalysisConfig, ConfigOverrides, DefectscopeConfig, Granularity, ParserConfig,
    PredictionConfig, SynthesisConfig, TrainingConfig,
};
pub use loader::{
    default_config_toml, directory_ancestors, load_config, load_config_from,
    load_config_from_path, parse_and_validate_config, CONFIG_FILE_NAME,
};
pub use thresholds::SmellThresholds;
pub use validation::{validate_analysis_config, validate_config, validate_training_config};
