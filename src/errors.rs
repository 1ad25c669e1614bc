//! Error taxonomy for the analysis pipeline.
//!
//! Every stage either returns a complete result or one of the typed failures
//! below. Nothing is swallowed inside the pipeline: [`AnalysisError`] wraps the
//! stage errors so callers can report a failed unit verbatim while sibling
//! units in a batch continue.
//!
//! | Error | Raised by | Meaning |
//! |---|---|---|
//! | [`ParseError`] | syntax parser | malformed input, carries location |
//! | [`FeatureBuildError`] | feature builder | metrics report violates the contract |
//! | [`FeatureMismatchError`] | predictor | vector shape differs from the model |
//! | [`TrainingError`] | trainer | empty or malformed dataset |
//! | [`ModelFormatError`] | model codec | blob is not a serialized model |
//! | [`ConfigError`] | config loader/validation | invalid settings |

use thiserror::Error;

/// Source text could not be turned into a syntax tree.
///
/// Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error in {unit}:{line}:{column}: {message}")]
pub struct ParseError {
    pub unit: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(
        unit: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            unit: unit.into(),
            line,
            column,
            message: message.into(),
        }
    }
}

/// A metrics report is missing a field the feature vector requires, or the
/// field holds a non-finite value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Feature build error: required field `{field}` {reason}")]
pub struct FeatureBuildError {
    pub field: String,
    pub reason: String,
}

impl FeatureBuildError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: "is missing".to_string(),
        }
    }

    pub fn non_finite(field: impl Into<String>, value: f64) -> Self {
        Self {
            field: field.into(),
            reason: format!("is not finite ({value})"),
        }
    }
}

/// Feature vector length does not match the trained feature order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Feature mismatch: model expects {expected} features, got {actual}")]
pub struct FeatureMismatchError {
    pub expected: usize,
    pub actual: usize,
}

/// Training could not run on the supplied dataset or configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    #[error("Training dataset is empty")]
    EmptyDataset,

    #[error("Training dataset contains a single class ({label}); {records} records")]
    SingleClass { label: bool, records: usize },

    #[error("{records} training records do not have {expected} features")]
    RaggedFeatures { expected: usize, records: usize },

    #[error("{records} training records contain non-finite feature values")]
    NonFiniteFeatures { records: usize },

    #[error("Invalid training configuration: {0}")]
    InvalidConfig(String),
}

/// A serialized model blob could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelFormatError {
    #[error("Model blob could not be decoded: {0}")]
    Decode(String),

    #[error("Model could not be encoded: {0}")]
    Encode(String),

    #[error("Unsupported model format version {found} (expected {expected})")]
    Version { found: u16, expected: u16 },

    #[error("Model blob is malformed: {0}")]
    Shape(String),
}

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid value for `{field}`: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Umbrella error for one analysis request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    FeatureBuild(#[from] FeatureBuildError),

    #[error(transparent)]
    FeatureMismatch(#[from] FeatureMismatchError),

    #[error(transparent)]
    Training(#[from] TrainingError),

    #[error(transparent)]
    ModelFormat(#[from] ModelFormatError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AnalysisError {
    /// Short machine-readable category name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::FeatureBuild(_) => "feature_build",
            Self::FeatureMismatch(_) => "feature_mismatch",
            Self::Training(_) => "training",
            Self::ModelFormat(_) => "model_format",
            Self::Config(_) => "config",
        }
    }
}

/// Result type alias using the umbrella error.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_includes_location() {
        let err = ParseError::new("app.py", 3, 7, "unexpected token `)`");
        assert_eq!(
            err.to_string(),
            "Parse error in app.py:3:7: unexpected token `)`"
        );
    }

    #[test]
    fn test_training_error_reports_record_count() {
        let err = TrainingError::RaggedFeatures {
            expected: 9,
            records: 4,
        };
        assert!(err.to_string().contains("4 training records"));
    }

    #[test]
    fn test_analysis_error_kind() {
        let err: AnalysisError = FeatureMismatchError {
            expected: 9,
            actual: 8,
        }
        .into();
        assert_eq!(err.kind(), "feature_mismatch");
        assert!(err.to_string().contains("expects 9 features, got 8"));
    }
}
