//! Code smell detection.

pub mod duplication;
pub mod rules;
pub mod smells;

pub use rules::{Anchor, Measurement, RuleScope, SmellRule, Subject, DEFAULT_RULES};
pub use smells::{sort_findings, CodeSmellFinding, SmellCategory, SmellDetector};

use crate::core::Severity;
use std::collections::BTreeMap;

pub fn categorize_findings(
    findings: &[CodeSmellFinding],
) -> BTreeMap<SmellCategory, Vec<&CodeSmellFinding>> {
    findings.iter().fold(BTreeMap::new(), |mut acc, finding| {
        acc.entry(finding.category).or_default().push(finding);
        acc
    })
}

pub fn filter_by_severity(
    findings: Vec<CodeSmellFinding>,
    min_severity: Severity,
) -> Vec<CodeSmellFinding> {
    findings
        .into_iter()
        .filter(|finding| finding.severity >= min_severity)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LineRange;

    fn finding(category: SmellCategory, severity: Severity) -> CodeSmellFinding {
        CodeSmellFinding {
            category,
            severity,
            confidence: 0.8,
            location: LineRange::single(1),
            target: "f".to_string(),
            message: String::new(),
            value: 0.0,
            threshold: 0.0,
            suggestion: String::new(),
        }
    }

    #[test]
    fn test_categorize_and_filter() {
        let findings = vec![
            finding(SmellCategory::LongMethod, Severity::High),
            finding(SmellCategory::LongMethod, Severity::Low),
            finding(SmellCategory::DeepNesting, Severity::Medium),
        ];
        let by_category = categorize_findings(&findings);
        assert_eq!(by_category[&SmellCategory::LongMethod].len(), 2);

        let kept = filter_by_severity(findings, Severity::Medium);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|f| f.severity >= Severity::Medium));
    }
}
