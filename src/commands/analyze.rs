use super::resolve_config;
use crate::config::{ConfigOverrides, TrainingConfig};
use crate::io::{self, create_writer, find_python_files, OutputFormat};
use crate::pipeline::{analyze_batch, summarize, BatchSummary, SourceInput, UnitOutcome};
use crate::prediction::{synthetic_dataset, train_model, TrainedModelHandle};
use crate::testing::{module_name, render_module};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Records used for the fallback model when no blob is supplied.
const FALLBACK_SAMPLES: usize = 1000;

pub struct AnalyzeConfig {
    pub paths: Vec<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
    pub emit_tests: Option<PathBuf>,
    pub jobs: Option<usize>,
}

pub fn handle_analyze(config: AnalyzeConfig) -> Result<BatchSummary> {
    let settings = resolve_config(config.config_path.as_deref())?;
    let analysis = settings.analysis.with_overrides(&config.overrides);

    if let Some(jobs) = config.jobs.filter(|n| *n > 0) {
        // The global pool can only be configured once per process.
        if rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .is_err()
        {
            log::debug!("Thread pool already initialized; ignoring --jobs {jobs}");
        }
    }

    let model = load_model(config.model_path.as_deref(), &settings.training)?;
    let inputs = collect_inputs(&config.paths)?;
    log::info!("Analyzing {} Python files", inputs.len());

    let outcomes = analyze_batch(&inputs, &analysis, &model);
    write_report(&outcomes, config.format, config.output.as_deref())?;

    if let Some(dir) = &config.emit_tests {
        let written = emit_tests(&outcomes, dir)?;
        log::info!("Wrote {written} test modules to {}", dir.display());
    }

    Ok(summarize(&outcomes))
}

/// Load a model blob, or train one on synthetic data when no path is given.
pub fn load_model(path: Option<&Path>, training: &TrainingConfig) -> Result<TrainedModelHandle> {
    match path {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read model {}", path.display()))?;
            TrainedModelHandle::from_bytes(&bytes)
                .with_context(|| format!("{} is not a usable model", path.display()))
        }
        None => {
            log::info!(
                "No model supplied; training on {FALLBACK_SAMPLES} synthetic records (seed {})",
                training.seed
            );
            let dataset = synthetic_dataset(FALLBACK_SAMPLES, training.seed);
            Ok(train_model(&dataset, training)?)
        }
    }
}

fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<SourceInput>> {
    let mut inputs = Vec::new();
    for root in paths {
        for file in find_python_files(root)? {
            let source = io::read_file(&file)?;
            inputs.push(SourceInput::new(file.display().to_string(), source));
        }
    }
    Ok(inputs)
}

fn write_report(
    outcomes: &[UnitOutcome],
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                io::ensure_dir(parent)?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            create_writer(format, Box::new(std::io::BufWriter::new(file))).write_outcomes(outcomes)
        }
        None => create_writer(format, Box::new(std::io::stdout().lock())).write_outcomes(outcomes),
    }
}

fn emit_tests(outcomes: &[UnitOutcome], dir: &Path) -> Result<usize> {
    let mut written = 0;
    for result in outcomes.iter().filter_map(|o| o.result.as_ref().ok()) {
        if result.tests.is_empty() {
            continue;
        }
        let module = module_name(&result.unit_id);
        let path = dir.join(format!("test_{module}.py"));
        io::write_file(&path, &render_module(&module, &result.tests))?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fast_training() -> TrainingConfig {
        TrainingConfig {
            ensemble_size: 2,
            epochs: 40,
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_collect_inputs_reads_python_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.py"), "x = 1\n").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "hi").unwrap();

        let inputs = collect_inputs(&[temp.path().to_path_buf()]).unwrap();
        assert_eq!(inputs.len(), 1);
        assert!(inputs[0].unit_id.ends_with("a.py"));
        assert_eq!(inputs[0].source, "x = 1\n");
    }

    #[test]
    fn test_load_model_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.model");
        std::fs::write(&path, b"not a model").unwrap();
        assert!(load_model(Some(&path), &fast_training()).is_err());
    }

    #[test]
    fn test_handle_analyze_writes_json_and_tests() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("calc.py"), "def add(a, b):\n    return a + b\n").unwrap();
        std::fs::write(src.join("broken.py"), "def (:\n").unwrap();

        let model_path = temp.path().join("m.model");
        let model = load_model(None, &fast_training()).unwrap();
        std::fs::write(&model_path, model.to_bytes().unwrap()).unwrap();

        let report = temp.path().join("out/report.json");
        let tests_dir = temp.path().join("generated");
        let summary = handle_analyze(AnalyzeConfig {
            paths: vec![src],
            format: OutputFormat::Json,
            output: Some(report.clone()),
            config_path: None,
            model_path: Some(model_path),
            overrides: ConfigOverrides::default(),
            emit_tests: Some(tests_dir.clone()),
            jobs: None,
        })
        .unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
        assert_eq!(json["summary"]["failed"], 1);
        let generated = std::fs::read_to_string(tests_dir.join("test_calc.py")).unwrap();
        assert!(generated.contains("def test_add"));
    }
}
