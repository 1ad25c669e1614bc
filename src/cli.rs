use crate::config::Granularity;
use crate::io::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GranularityArg {
    /// One prediction per file
    Unit,
    /// Additionally one prediction per function
    Function,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Unit => Granularity::Unit,
            GranularityArg::Function => Granularity::Function,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "defectscope")]
#[command(
    about = "Static quality analyzer and defect predictor for Python code",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze Python files for metrics, code smells and defect risk
    Analyze {
        /// Files or directories to analyze
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (defaults to the nearest .defectscope.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Trained model blob; a model is trained on synthetic data when omitted
        #[arg(short, long, env = "DEFECTSCOPE_MODEL")]
        model: Option<PathBuf>,

        /// Prediction granularity
        #[arg(long, value_enum)]
        granularity: Option<GranularityArg>,

        /// Probability at which a unit is labeled defective
        #[arg(long)]
        decision_threshold: Option<f64>,

        /// Long method threshold (code lines)
        #[arg(long)]
        max_method_lines: Option<usize>,

        /// Long parameter list threshold
        #[arg(long)]
        max_parameters: Option<usize>,

        /// High complexity threshold (cyclomatic)
        #[arg(long)]
        max_complexity: Option<u32>,

        /// Deep nesting threshold
        #[arg(long)]
        max_nesting: Option<u32>,

        /// Write generated pytest modules into this directory
        #[arg(long)]
        emit_tests: Option<PathBuf>,

        /// Also generate tests for _private functions
        #[arg(long)]
        include_private: bool,

        /// Treat empty files as parse errors
        #[arg(long)]
        strict_empty: bool,

        /// Number of worker threads (defaults to all cores)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Train a defect model and write it as a binary blob
    Train {
        /// Labeled dataset (JSON); synthetic data is used when omitted
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Number of synthetic records when no dataset is given
        #[arg(long, default_value = "1000")]
        samples: usize,

        /// Where to write the model
        #[arg(short, long, default_value = "defectscope.model")]
        output: PathBuf,

        /// Configuration file (defaults to the nearest .defectscope.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random seed (overrides the configured one)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,

        /// Directory to write .defectscope.toml into
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_arguments() {
        let cli = Cli::try_parse_from([
            "defectscope",
            "-vv",
            "analyze",
            "src",
            "lib.py",
            "--format",
            "json",
            "--granularity",
            "function",
            "--max-parameters",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.verbosity, 2);
        match cli.command {
            Commands::Analyze {
                paths,
                format,
                granularity,
                max_parameters,
                ..
            } => {
                assert_eq!(paths, vec![PathBuf::from("src"), PathBuf::from("lib.py")]);
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(granularity, Some(GranularityArg::Function));
                assert_eq!(max_parameters, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_analyze_requires_paths() {
        assert!(Cli::try_parse_from(["defectscope", "analyze"]).is_err());
    }

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["defectscope", "train"]).unwrap();
        match cli.command {
            Commands::Train {
                samples, output, ..
            } => {
                assert_eq!(samples, 1000);
                assert_eq!(output, PathBuf::from("defectscope.model"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
