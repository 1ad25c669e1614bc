//! Smell rule registry.
//!
//! Each rule is a data record: which subjects it looks at, how it measures
//! them against the configured thresholds, its base confidence and severity,
//! and how to phrase the finding. Adding a rule means adding a record to
//! [`DEFAULT_RULES`]; the detector's dispatch does not change.

use super::duplication::DuplicateTwins;
use super::smells::{CodeSmellFinding, SmellCategory};
use crate::config::SmellThresholds;
use crate::core::{LineRange, Severity};
use crate::metrics::{ClassMetrics, FunctionMetrics};
use once_cell::sync::Lazy;

/// What a rule is evaluated against.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Function {
        metrics: &'a FunctionMetrics,
        /// Functions with the same body, if any
        twins: Option<&'a DuplicateTwins>,
    },
    Class(&'a ClassMetrics),
}

impl Subject<'_> {
    pub fn name(&self) -> &str {
        match self {
            Subject::Function { metrics, .. } => &metrics.qualified_name,
            Subject::Class(class) => &class.name,
        }
    }

    pub fn span(&self) -> LineRange {
        match self {
            Subject::Function { metrics, .. } => metrics.span,
            Subject::Class(class) => class.span,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Subject::Function { metrics, .. } if metrics.class_name.is_some() => "Method",
            Subject::Function { .. } => "Function",
            Subject::Class(_) => "Class",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Function,
    Class,
}

/// Where a finding is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The whole definition
    Span,
    /// The definition's first line
    Header,
}

/// A measured value and the threshold it was compared with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub threshold: f64,
}

pub type MeasureFn = fn(&Subject<'_>, &SmellThresholds) -> Option<Measurement>;
pub type DescribeFn = fn(&Subject<'_>, &Measurement) -> String;

#[derive(Clone)]
pub struct SmellRule {
    pub category: SmellCategory,
    pub scope: RuleScope,
    pub anchor: Anchor,
    pub base_confidence: f64,
    pub base_severity: Severity,
    /// Returns a measurement only when the rule fires
    pub measure: MeasureFn,
    pub describe: DescribeFn,
    pub suggestion: &'static str,
}

impl std::fmt::Debug for SmellRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmellRule")
            .field("category", &self.category)
            .field("scope", &self.scope)
            .field("base_confidence", &self.base_confidence)
            .field("base_severity", &self.base_severity)
            .finish()
    }
}

impl SmellRule {
    pub fn applies_to(&self, subject: &Subject<'_>) -> bool {
        matches!(
            (self.scope, subject),
            (RuleScope::Function, Subject::Function { .. }) | (RuleScope::Class, Subject::Class(_))
        )
    }

    pub fn evaluate(
        &self,
        subject: &Subject<'_>,
        thresholds: &SmellThresholds,
    ) -> Option<CodeSmellFinding> {
        if !self.applies_to(subject) {
            return None;
        }
        let measurement = (self.measure)(subject, thresholds)?;
        let span = subject.span();

        Some(CodeSmellFinding {
            category: self.category,
            severity: self.severity(&measurement, thresholds),
            confidence: self.confidence(&measurement, thresholds),
            location: match self.anchor {
                Anchor::Span => span,
                Anchor::Header => LineRange::single(span.start),
            },
            target: subject.name().to_string(),
            message: (self.describe)(subject, &measurement),
            value: measurement.value,
            threshold: measurement.threshold,
            suggestion: self.suggestion.to_string(),
        })
    }

    /// `min(1, base + scale * overshoot)`, overshoot relative to the threshold.
    pub fn confidence(&self, measurement: &Measurement, thresholds: &SmellThresholds) -> f64 {
        let base = thresholds
            .base_confidence
            .get(self.category.as_str())
            .copied()
            .unwrap_or(self.base_confidence);
        let overshoot =
            (measurement.value - measurement.threshold).max(0.0) / measurement.threshold.max(1.0);
        (base + thresholds.confidence_scale * overshoot).clamp(0.0, 1.0)
    }

    pub fn severity(&self, measurement: &Measurement, thresholds: &SmellThresholds) -> Severity {
        if measurement.value >= measurement.threshold * thresholds.escalation_ratio {
            Severity::High
        } else {
            self.base_severity
        }
    }
}

/// Fires when `value > threshold`.
fn exceeds(value: f64, threshold: f64) -> Option<Measurement> {
    (value > threshold).then_some(Measurement { value, threshold })
}

fn function_metrics<'a>(subject: &Subject<'a>) -> Option<&'a FunctionMetrics> {
    match subject {
        Subject::Function { metrics, .. } => Some(*metrics),
        Subject::Class(_) => None,
    }
}

fn class_metrics<'a>(subject: &Subject<'a>) -> Option<&'a ClassMetrics> {
    match subject {
        Subject::Class(class) => Some(*class),
        Subject::Function { .. } => None,
    }
}

fn measure_long_method(subject: &Subject<'_>, t: &SmellThresholds) -> Option<Measurement> {
    let f = function_metrics(subject)?;
    exceeds(f.lines_of_code as f64, t.long_method_lines as f64)
}

fn measure_long_parameter_list(subject: &Subject<'_>, t: &SmellThresholds) -> Option<Measurement> {
    let f = function_metrics(subject)?;
    exceeds(f.parameter_count as f64, t.max_parameters as f64)
}

fn measure_high_complexity(subject: &Subject<'_>, t: &SmellThresholds) -> Option<Measurement> {
    let f = function_metrics(subject)?;
    exceeds(f64::from(f.cyclomatic), f64::from(t.max_complexity))
}

fn measure_deep_nesting(subject: &Subject<'_>, t: &SmellThresholds) -> Option<Measurement> {
    let f = function_metrics(subject)?;
    exceeds(f64::from(f.max_nesting), f64::from(t.max_nesting))
}

/// Method count, or code lines when only those exceed.
fn measure_large_class(subject: &Subject<'_>, t: &SmellThresholds) -> Option<Measurement> {
    let class = class_metrics(subject)?;
    exceeds(class.method_count as f64, t.large_class_methods as f64)
        .or_else(|| exceeds(class.lines_of_code as f64, t.large_class_lines as f64))
}

fn measure_god_object(subject: &Subject<'_>, t: &SmellThresholds) -> Option<Measurement> {
    let class = class_metrics(subject)?;
    if class.responsibilities <= t.god_object_responsibilities {
        return None;
    }
    exceeds(class.method_count as f64, t.god_object_methods as f64)
}

fn measure_duplicate_code(subject: &Subject<'_>, t: &SmellThresholds) -> Option<Measurement> {
    match subject {
        Subject::Function {
            twins: Some(twins), ..
        } if !twins.names.is_empty() => {
            let value = twins.body_lines as f64;
            let threshold = t.duplicate_min_lines as f64;
            (value >= threshold).then_some(Measurement { value, threshold })
        }
        _ => None,
    }
}

fn describe_long_method(subject: &Subject<'_>, m: &Measurement) -> String {
    format!(
        "{} '{}' is too long ({} code lines, threshold {})",
        subject.kind(),
        subject.name(),
        m.value,
        m.threshold
    )
}

fn describe_long_parameter_list(subject: &Subject<'_>, m: &Measurement) -> String {
    format!(
        "{} '{}' has too many parameters ({}, threshold {})",
        subject.kind(),
        subject.name(),
        m.value,
        m.threshold
    )
}

fn describe_high_complexity(subject: &Subject<'_>, m: &Measurement) -> String {
    format!(
        "{} '{}' has high cyclomatic complexity ({}, threshold {})",
        subject.kind(),
        subject.name(),
        m.value,
        m.threshold
    )
}

fn describe_deep_nesting(subject: &Subject<'_>, m: &Measurement) -> String {
    let deepest = function_metrics(subject)
        .and_then(|f| f.deepest_line)
        .map(|line| format!(" at line {line}"))
        .unwrap_or_default();
    format!(
        "{} '{}' nests blocks {} levels deep{} (threshold {})",
        subject.kind(),
        subject.name(),
        m.value,
        deepest,
        m.threshold
    )
}

fn describe_large_class(subject: &Subject<'_>, m: &Measurement) -> String {
    let unit = match class_metrics(subject) {
        Some(class) if (class.method_count as f64 - m.value).abs() < f64::EPSILON => "methods",
        _ => "code lines",
    };
    format!(
        "Class '{}' is too large ({} {}, threshold {})",
        subject.name(),
        m.value,
        unit,
        m.threshold
    )
}

fn describe_god_object(subject: &Subject<'_>, m: &Measurement) -> String {
    let responsibilities = class_metrics(subject).map_or(0, |c| c.responsibilities);
    format!(
        "Class '{}' appears to be a God Object ({} methods across {} responsibilities)",
        subject.name(),
        m.value,
        responsibilities
    )
}

fn describe_duplicate_code(subject: &Subject<'_>, m: &Measurement) -> String {
    let twins = match subject {
        Subject::Function {
            twins: Some(twins), ..
        } => twins.names.join(", "),
        _ => String::new(),
    };
    format!(
        "{} '{}' duplicates the body of {} ({} code lines)",
        subject.kind(),
        subject.name(),
        twins,
        m.value
    )
}

/// The built-in rule catalogue, in evaluation order.
pub static DEFAULT_RULES: Lazy<Vec<SmellRule>> = Lazy::new(|| {
    vec![
        SmellRule {
            category: SmellCategory::LongMethod,
            scope: RuleScope::Function,
            anchor: Anchor::Span,
            base_confidence: 0.85,
            base_severity: Severity::Medium,
            measure: measure_long_method,
            describe: describe_long_method,
            suggestion: "Extract cohesive blocks into smaller, well-named functions",
        },
        SmellRule {
            category: SmellCategory::LongParameterList,
            scope: RuleScope::Function,
            anchor: Anchor::Header,
            base_confidence: 0.90,
            base_severity: Severity::Medium,
            measure: measure_long_parameter_list,
            describe: describe_long_parameter_list,
            suggestion: "Group related parameters into a dataclass or parameter object",
        },
        SmellRule {
            category: SmellCategory::HighComplexity,
            scope: RuleScope::Function,
            anchor: Anchor::Span,
            base_confidence: 0.88,
            base_severity: Severity::Medium,
            measure: measure_high_complexity,
            describe: describe_high_complexity,
            suggestion: "Replace conditional chains with guard clauses, lookup tables \
                         or polymorphism",
        },
        SmellRule {
            category: SmellCategory::DeepNesting,
            scope: RuleScope::Function,
            anchor: Anchor::Span,
            base_confidence: 0.75,
            base_severity: Severity::Low,
            measure: measure_deep_nesting,
            describe: describe_deep_nesting,
            suggestion: "Flatten nested blocks with early returns or extracted helpers",
        },
        SmellRule {
            category: SmellCategory::DuplicateCode,
            scope: RuleScope::Function,
            anchor: Anchor::Span,
            base_confidence: 0.70,
            base_severity: Severity::Medium,
            measure: measure_duplicate_code,
            describe: describe_duplicate_code,
            suggestion: "Move the shared body into a single helper and call it from both places",
        },
        SmellRule {
            category: SmellCategory::LargeClass,
            scope: RuleScope::Class,
            anchor: Anchor::Span,
            base_confidence: 0.80,
            base_severity: Severity::Medium,
            measure: measure_large_class,
            describe: describe_large_class,
            suggestion: "Split the class along its responsibilities",
        },
        SmellRule {
            category: SmellCategory::GodObject,
            scope: RuleScope::Class,
            anchor: Anchor::Span,
            base_confidence: 0.70,
            base_severity: Severity::High,
            measure: measure_god_object,
            describe: describe_god_object,
            suggestion: "Extract each group of related methods into its own class",
        },
    ]
});
