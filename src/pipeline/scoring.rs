//! Overall 0-100 quality score for a unit.

use crate::core::RiskLevel;
use crate::debt::CodeSmellFinding;
use crate::metrics::MetricsReport;
use crate::prediction::DefectPrediction;

const COMPLEXITY_ALLOWANCE: u32 = 10;
const COMPLEXITY_PENALTY: f64 = 2.0;
const RISK_PENALTY: f64 = 8.0;

/// Start at 100 and deduct for unit complexity above 10, for each finding by
/// severity, and for each HIGH or CRITICAL prediction. Clamped to 0-100.
pub fn quality_score<'a>(
    metrics: &MetricsReport,
    findings: &[CodeSmellFinding],
    predictions: impl IntoIterator<Item = &'a DefectPrediction>,
) -> f64 {
    let excess = metrics.unit.cyclomatic.saturating_sub(COMPLEXITY_ALLOWANCE);
    let complexity = COMPLEXITY_PENALTY * f64::from(excess);
    let smells: f64 = findings.iter().map(|f| f.severity.quality_penalty()).sum();
    let risky = predictions
        .into_iter()
        .filter(|p| p.risk_level >= RiskLevel::High)
        .count();

    (100.0 - complexity - smells - RISK_PENALTY * risky as f64).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::core::{parse_source, LineRange, Severity};
    use crate::debt::SmellCategory;
    use crate::extraction::extract_structure;
    use crate::metrics::compute_metrics;

    fn metrics(source: &str) -> MetricsReport {
        let unit = parse_source(source, "q.py", &ParserConfig::default()).unwrap();
        compute_metrics(&unit, &extract_structure(&unit))
    }

    fn finding(severity: Severity) -> CodeSmellFinding {
        CodeSmellFinding {
            category: SmellCategory::LongMethod,
            severity,
            confidence: 0.9,
            location: LineRange::new(1, 2),
            target: "f".to_string(),
            message: String::new(),
            value: 30.0,
            threshold: 25.0,
            suggestion: String::new(),
        }
    }

    fn prediction(probability: f64) -> DefectPrediction {
        DefectPrediction {
            target: "q.py".to_string(),
            probability,
            is_defective: probability >= 0.5,
            confidence: probability.max(1.0 - probability),
            variance: 0.0,
            risk_level: RiskLevel::from_probability(probability),
            top_factors: Vec::new(),
        }
    }

    #[test]
    fn test_clean_unit_scores_full() {
        let report = metrics("x = 1\n");
        assert_eq!(quality_score(&report, &[], [&prediction(0.1)]), 100.0);
    }

    #[test]
    fn test_deductions_add_up() {
        let checks = (0..12)
            .map(|i| format!("    if x == {i}:\n        return {i}\n"))
            .collect::<String>();
        let report = metrics(&format!("def f(x):\n{checks}    return -1\n"));
        assert_eq!(report.unit.cyclomatic, 13);

        let findings = [finding(Severity::High), finding(Severity::Low)];
        let predictions = [prediction(0.85), prediction(0.2)];
        // 100 - 2*3 - (10 + 2) - 8
        assert_eq!(quality_score(&report, &findings, &predictions), 74.0);
    }

    #[test]
    fn test_score_is_clamped() {
        let report = metrics("x = 1\n");
        let findings = vec![finding(Severity::High); 20];
        assert_eq!(quality_score(&report, &findings, []), 0.0);
    }
}
