pub mod ast;
pub mod parsing;
pub mod visitor;

use serde::{Deserialize, Serialize};

pub use ast::SourceUnit;
pub use parsing::parse_source;

/// Severity of a code smell finding.
///
/// Ordered so that `High > Medium > Low`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Ord, PartialOrd)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Points deducted from the overall quality score per finding.
    pub fn quality_penalty(&self) -> f64 {
        match self {
            Severity::Low => 2.0,
            Severity::Medium => 5.0,
            Severity::High => 10.0,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let display_str = match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        };
        write!(f, "{}", display_str)
    }
}

/// Risk band derived from a defect probability.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Ord, PartialOrd)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_probability(probability: f64) -> Self {
        match probability {
            p if p >= 0.8 => RiskLevel::Critical,
            p if p >= 0.6 => RiskLevel::High,
            p if p >= 0.4 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let display_str = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        };
        write!(f, "{}", display_str)
    }
}

/// Inclusive, 1-based line range in a source unit.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn single(line: usize) -> Self {
        Self::new(line, line)
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, line: usize) -> bool {
        (self.start..=self.end).contains(&line)
    }
}

impl std::fmt::Display for LineRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_probability(0.1), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.4), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.65), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(0.8), RiskLevel::Critical);
    }

    #[test]
    fn test_line_range() {
        let range = LineRange::new(3, 7);
        assert_eq!(range.len(), 5);
        assert!(range.contains(3));
        assert!(range.contains(7));
        assert!(!range.contains(8));
        assert_eq!(range.to_string(), "3-7");
        assert_eq!(LineRange::single(4).to_string(), "4");
    }
}
