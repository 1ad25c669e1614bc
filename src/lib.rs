//! Static quality analysis and defect prediction for Python source.
//!
//! A source unit flows through parsing, structure extraction, metrics, smell
//! detection, feature building, prediction and test synthesis. [`analyze`]
//! runs the whole pipeline for one unit and [`analyze_batch`] for many.

pub mod cli;
pub mod commands;
pub mod complexity;
pub mod config;
pub mod core;
pub mod debt;
pub mod errors;
pub mod extraction;
pub mod io;
pub mod metrics;
pub mod observability;
pub mod pipeline;
pub mod prediction;
pub mod testing;

pub use crate::config::{AnalysisConfig, ConfigOverrides, DefectscopeConfig, TrainingConfig};
pub use crate::core::{parse_source, RiskLevel, Severity, SourceUnit};
pub use crate::debt::{CodeSmellFinding, SmellCategory, SmellDetector};
pub use crate::errors::{
    AnalysisError, ConfigError, FeatureBuildError, FeatureMismatchError, ModelFormatError,
    ParseError, TrainingError,
};
pub use crate::metrics::{compute_metrics, MetricsReport};
pub use crate::pipeline::{
    analyze, analyze_batch, AnalysisResult, BatchSummary, SourceInput, UnitOutcome,
};
pub use crate::prediction::{
    build_vector, synthetic_dataset, train_model, DefectPrediction, FeatureVector,
    LabeledDataset, ModelSlot, TrainedModelHandle, FEATURE_NAMES,
};
pub use crate::testing::{synthesize, GeneratedTestCase, TestKind};
