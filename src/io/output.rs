use crate::core::{RiskLevel, Severity};
use crate::pipeline::{summarize, AnalysisResult, BatchSummary, UnitOutcome};
use crate::prediction::DefectPrediction;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

pub trait OutputWriter {
    fn write_outcomes(&mut self, outcomes: &[UnitOutcome]) -> anyhow::Result<()>;
}

pub fn create_writer<'a>(
    format: OutputFormat,
    writer: Box<dyn Write + 'a>,
) -> Box<dyn OutputWriter + 'a> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: BatchSummary,
    results: Vec<&'a AnalysisResult>,
    failures: Vec<JsonFailure<'a>>,
}

#[derive(Serialize)]
struct JsonFailure<'a> {
    unit_id: &'a str,
    kind: &'static str,
    message: String,
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_outcomes(&mut self, outcomes: &[UnitOutcome]) -> anyhow::Result<()> {
        let report = JsonReport {
            summary: summarize(outcomes),
            results: outcomes.iter().filter_map(|o| o.result.as_ref().ok()).collect(),
            failures: outcomes
                .iter()
                .filter_map(|o| {
                    o.result.as_ref().err().map(|e| JsonFailure {
                        unit_id: &o.unit_id,
                        kind: e.kind(),
                        message: e.to_string(),
                    })
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&report)?;
        writeln!(self.writer, "{json}")?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_unit(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        let unit = &result.metrics.unit;
        writeln!(self.writer, "## `{}`", result.unit_id)?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Metric | Value |")?;
        writeln!(self.writer, "|--------|-------|")?;
        writeln!(self.writer, "| Quality score | {:.1} |", result.quality_score)?;
        writeln!(self.writer, "| Lines of code | {} |", unit.lines_of_code)?;
        writeln!(self.writer, "| Cyclomatic complexity | {} |", unit.cyclomatic)?;
        writeln!(self.writer, "| Maintainability index | {} |", unit.maintainability)?;
        writeln!(
            self.writer,
            "| Defect probability | {:.2} ({}) |",
            result.prediction.probability, result.prediction.risk_level
        )?;
        writeln!(self.writer)?;

        if !result.findings.is_empty() {
            writeln!(self.writer, "### Code smells")?;
            writeln!(self.writer)?;
            for finding in &result.findings {
                writeln!(
                    self.writer,
                    "- [ ] **{}** `{}` line {} ({}, confidence {:.2}): {}",
                    finding.category,
                    finding.target,
                    finding.location,
                    finding.severity,
                    finding.confidence,
                    finding.message
                )?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_outcomes(&mut self, outcomes: &[UnitOutcome]) -> anyhow::Result<()> {
        let summary = summarize(outcomes);
        writeln!(self.writer, "# Defectscope Report")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "Units analyzed: {} ({} failed)",
            summary.succeeded + summary.failed,
            summary.failed
        )?;
        writeln!(self.writer)?;

        for outcome in outcomes {
            match &outcome.result {
                Ok(result) => self.write_unit(result)?,
                Err(error) => {
                    writeln!(self.writer, "## `{}`", outcome.unit_id)?;
                    writeln!(self.writer)?;
                    writeln!(self.writer, "Analysis failed: {error}")?;
                    writeln!(self.writer)?;
                }
            }
        }
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_unit(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        let unit = &result.metrics.unit;
        writeln!(self.writer, "{}", result.unit_id.bold().underline())?;
        writeln!(
            self.writer,
            "  quality {}  loc {}  complexity {}  MI {}  functions {}  classes {}",
            score_label(result.quality_score),
            unit.lines_of_code,
            unit.cyclomatic,
            unit.maintainability,
            unit.function_count,
            unit.class_count
        )?;
        writeln!(self.writer, "  {}", prediction_line(&result.prediction))?;
        for prediction in &result.function_predictions {
            writeln!(self.writer, "    {}", prediction_line(prediction))?;
        }

        if !result.findings.is_empty() {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["Severity", "Smell", "Target", "Lines", "Confidence", "Detail"]);
            for finding in &result.findings {
                table.add_row(vec![
                    Cell::new(finding.severity),
                    Cell::new(finding.category),
                    Cell::new(&finding.target),
                    Cell::new(finding.location),
                    Cell::new(format!("{:.2}", finding.confidence)),
                    Cell::new(&finding.message),
                ]);
            }
            writeln!(self.writer, "{table}")?;
        }

        if !result.tests.is_empty() {
            writeln!(self.writer, "  {} suggested tests:", result.tests.len())?;
            for case in &result.tests {
                writeln!(
                    self.writer,
                    "    {} {} ({})",
                    severity_dot(case.priority),
                    case.test_name,
                    case.kind
                )?;
            }
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_outcomes(&mut self, outcomes: &[UnitOutcome]) -> anyhow::Result<()> {
        for outcome in outcomes {
            match &outcome.result {
                Ok(result) => self.write_unit(result)?,
                Err(error) => writeln!(
                    self.writer,
                    "{} {}: {}\n",
                    "✗".red().bold(),
                    outcome.unit_id.bold(),
                    error.to_string().red()
                )?,
            }
        }

        let summary = summarize(outcomes);
        let status = if summary.failed == 0 {
            format!("{} units analyzed", summary.succeeded).green()
        } else {
            format!(
                "{} units analyzed, {} failed",
                summary.succeeded + summary.failed,
                summary.failed
            )
            .yellow()
        };
        writeln!(self.writer, "{status}")?;
        Ok(())
    }
}

fn score_label(score: f64) -> ColoredString {
    let text = format!("{score:.1}");
    match score {
        s if s >= 80.0 => text.green(),
        s if s >= 50.0 => text.yellow(),
        _ => text.red(),
    }
}

fn prediction_line(prediction: &DefectPrediction) -> String {
    let risk = match prediction.risk_level {
        RiskLevel::Low => prediction.risk_level.to_string().green(),
        RiskLevel::Medium => prediction.risk_level.to_string().yellow(),
        RiskLevel::High | RiskLevel::Critical => prediction.risk_level.to_string().red().bold(),
    };
    let factors = prediction
        .top_factors
        .iter()
        .map(|f| f.feature.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{}: defect risk {} (p={:.2}, confidence {:.2}) [{}]",
        prediction.target, risk, prediction.probability, prediction.confidence, factors
    )
}

fn severity_dot(priority: f64) -> ColoredString {
    let severity = match priority {
        p if p >= 4.0 => Severity::High,
        p if p >= 2.0 => Severity::Medium,
        _ => Severity::Low,
    };
    match severity {
        Severity::High => "●".red(),
        Severity::Medium => "●".yellow(),
        Severity::Low => "●".dimmed(),
    }
}
