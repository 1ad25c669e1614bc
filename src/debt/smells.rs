use super::duplication::{detect_duplicate_functions, twins_by_function};
use super::rules::{SmellRule, Subject, DEFAULT_RULES};
use crate::config::SmellThresholds;
use crate::core::{LineRange, Severity, SourceUnit};
use crate::extraction::UnitStructure;
use crate::metrics::MetricsReport;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Kinds of code smell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SmellCategory {
    LongMethod,
    LongParameterList,
    HighComplexity,
    DeepNesting,
    DuplicateCode,
    LargeClass,
    GodObject,
}

impl SmellCategory {
    pub const ALL: [SmellCategory; 7] = [
        SmellCategory::LongMethod,
        SmellCategory::LongParameterList,
        SmellCategory::HighComplexity,
        SmellCategory::DeepNesting,
        SmellCategory::DuplicateCode,
        SmellCategory::LargeClass,
        SmellCategory::GodObject,
    ];

    /// Name used in configuration keys and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            SmellCategory::LongMethod => "LONG_METHOD",
            SmellCategory::LongParameterList => "LONG_PARAMETER_LIST",
            SmellCategory::HighComplexity => "HIGH_COMPLEXITY",
            SmellCategory::DeepNesting => "DEEP_NESTING",
            SmellCategory::DuplicateCode => "DUPLICATE_CODE",
            SmellCategory::LargeClass => "LARGE_CLASS",
            SmellCategory::GodObject => "GOD_OBJECT",
        }
    }
}

impl std::fmt::Display for SmellCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected code smell with its location and details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSmellFinding {
    pub category: SmellCategory,
    pub severity: Severity,
    /// 0.0-1.0
    pub confidence: f64,
    pub location: LineRange,
    /// Qualified function name or class name
    pub target: String,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
    pub suggestion: String,
}

/// Applies a rule registry to one unit.
#[derive(Debug, Clone)]
pub struct SmellDetector {
    thresholds: SmellThresholds,
    rules: Vec<SmellRule>,
}

impl SmellDetector {
    /// Detector over the built-in catalogue.
    pub fn new(thresholds: SmellThresholds) -> Self {
        Self::with_rules(thresholds, DEFAULT_RULES.clone())
    }

    pub fn with_rules(thresholds: SmellThresholds, rules: Vec<SmellRule>) -> Self {
        Self { thresholds, rules }
    }

    pub fn thresholds(&self) -> &SmellThresholds {
        &self.thresholds
    }

    pub fn rules(&self) -> &[SmellRule] {
        &self.rules
    }

    /// All findings for the unit, sorted by severity (highest first), then
    /// location, then category.
    pub fn detect(
        &self,
        unit: &SourceUnit,
        structure: &UnitStructure<'_>,
        metrics: &MetricsReport,
    ) -> Vec<CodeSmellFinding> {
        let groups =
            detect_duplicate_functions(unit, structure, self.thresholds.duplicate_min_lines);
        let twins = twins_by_function(&groups, structure);

        let functions = metrics.functions.iter().enumerate().map(|(idx, f)| Subject::Function {
            metrics: f,
            twins: twins.get(&idx),
        });
        let classes = metrics.classes.iter().map(Subject::Class);

        let mut findings: Vec<_> = functions
            .chain(classes)
            .flat_map(|subject| {
                self.rules
                    .iter()
                    .filter_map(move |rule| rule.evaluate(&subject, &self.thresholds))
            })
            .collect();
        sort_findings(&mut findings);

        log::debug!("{}: {} smell findings", unit.id(), findings.len());
        findings
    }
}

/// Deterministic report order: severity desc, location asc, category, target.
pub fn sort_findings(findings: &mut [CodeSmellFinding]) {
    findings.sort_by(|a, b| {
        (Reverse(a.severity), a.location, a.category, &a.target).cmp(&(
            Reverse(b.severity),
            b.location,
            b.category,
            &b.target,
        ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::core::parse_source;
    use crate::extraction::extract_structure;
    use crate::metrics::compute_metrics;
    use indoc::indoc;

    fn detect(source: &str, thresholds: SmellThresholds) -> Vec<CodeSmellFinding> {
        let unit = parse_source(source, "t.py", &ParserConfig::default()).unwrap();
        let structure = extract_structure(&unit);
        let metrics = compute_metrics(&unit, &structure);
        SmellDetector::new(thresholds).detect(&unit, &structure, &metrics)
    }

    #[test]
    fn test_clean_function_has_no_findings() {
        let findings = detect("def add(a, b):\n    return a + b\n", SmellThresholds::default());
        assert!(findings.is_empty());
    }

    #[test]
    fn test_findings_are_sorted() {
        let source = indoc! {"
            def wide(a, b, c, d, e):
                return a

            def deep(x):
                if x:
                    for i in x:
                        while i:
                            if i > 1:
                                i -= 1
                return x
        "};
        let thresholds = SmellThresholds {
            escalation_ratio: 1.3,
            ..SmellThresholds::default()
        };
        let findings = detect(source, thresholds);
        let summary: Vec<_> = findings
            .iter()
            .map(|f| (f.category, f.severity, f.location.start))
            .collect();
        assert_eq!(
            summary,
            vec![
                (SmellCategory::DeepNesting, Severity::High, 4),
                (SmellCategory::LongParameterList, Severity::Medium, 1),
            ]
        );
        assert!(findings.iter().all(|f| (0.0..=1.0).contains(&f.confidence)));
    }

    #[test]
    fn test_categories_co_occur_on_one_function() {
        let mut thresholds = SmellThresholds::default();
        thresholds.max_complexity = 1;
        thresholds.max_parameters = 0;
        let findings = detect("def f(a):\n    return a if a else 0\n", thresholds);
        let categories: Vec<_> = findings.iter().map(|f| f.category).collect();
        assert_eq!(
            categories,
            vec![SmellCategory::LongParameterList, SmellCategory::HighComplexity]
        );
    }

    #[test]
    fn test_duplicate_bodies_are_flagged_on_both() {
        let body = concat!(
            "    total = 0\n",
            "    for x in xs:\n",
            "        total += x\n",
            "    total *= 2\n",
            "    return total\n",
        );
        let source = format!("def a(xs):\n{body}\ndef b(xs):\n{body}");
        let findings = detect(&source, SmellThresholds::default());
        let duplicates: Vec<_> = findings
            .iter()
            .filter(|f| f.category == SmellCategory::DuplicateCode)
            .map(|f| f.target.as_str())
            .collect();
        assert_eq!(duplicates, vec!["a", "b"]);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(SmellCategory::LongParameterList.as_str(), "LONG_PARAMETER_LIST");
        assert_eq!(
            serde_json::to_string(&SmellCategory::GodObject).unwrap(),
            "\"GOD_OBJECT\""
        );
    }
}
