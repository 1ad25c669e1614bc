use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use defectscope::cli::{Cli, Commands};
use defectscope::commands::{self, AnalyzeConfig, TrainConfig};
use defectscope::config::ConfigOverrides;
use defectscope::observability::{init_tracing, install_panic_hook};

fn main() -> Result<()> {
    install_panic_hook();
    let cli = Cli::parse();
    init_tracing(cli.verbosity);

    match cli.command {
        Commands::Analyze {
            paths,
            format,
            output,
            config,
            model,
            granularity,
            decision_threshold,
            max_method_lines,
            max_parameters,
            max_complexity,
            max_nesting,
            emit_tests,
            include_private,
            strict_empty,
            jobs,
        } => {
            let overrides = ConfigOverrides {
                long_method_lines: max_method_lines,
                max_parameters,
                max_complexity,
                max_nesting,
                decision_threshold,
                granularity: granularity.map(Into::into),
                include_private: include_private.then_some(true),
                allow_empty: strict_empty.then_some(false),
                ..ConfigOverrides::default()
            };
            let summary = commands::handle_analyze(AnalyzeConfig {
                paths,
                format,
                output,
                config_path: config,
                model_path: model,
                overrides,
                emit_tests,
                jobs,
            })?;
            if summary.failed > 0 {
                std::process::exit(1);
            }
        }
        Commands::Train {
            dataset,
            samples,
            output,
            config,
            seed,
        } => {
            let destination = output.clone();
            let quality = commands::handle_train(TrainConfig {
                dataset,
                samples,
                output,
                config,
                seed,
            })?;
            println!(
                "{} {} (accuracy {:.3}, precision {:.3}, recall {:.3}, f1 {:.3}, \
                 {} train / {} holdout)",
                "Model written to".green(),
                destination.display(),
                quality.accuracy,
                quality.precision,
                quality.recall,
                quality.f1,
                quality.train_size,
                quality.holdout_size
            );
        }
        Commands::Init { force, path } => {
            let written = commands::init_config(&path, force)?;
            println!("{} {}", "Created".green(), written.display());
        }
    }

    Ok(())
}
