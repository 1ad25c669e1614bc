use crate::complexity::{HalsteadMetrics, MaintainabilityIndex};
use crate::core::LineRange;
use serde::{Deserialize, Serialize};

use super::loc_counter::LocCount;

/// Unit-level metrics. On an empty unit every count is at its base value:
/// cyclomatic 1, everything else 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitMetrics {
    /// Code lines
    pub lines_of_code: usize,
    pub loc: LocCount,
    pub cyclomatic: u32,
    /// Functions and methods, nested ones included
    pub function_count: usize,
    pub class_count: usize,
    pub attribute_count: usize,
    pub max_parameters: usize,
    pub max_nesting: u32,
    pub halstead: HalsteadMetrics,
    pub maintainability: MaintainabilityIndex,
    /// Distinct imported modules
    pub coupling: usize,
    /// Mean LCOM ratio over classes, 0-1
    pub cohesion_lack: f64,
    /// Deepest inheritance chain of any class
    pub inheritance_depth: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionMetrics {
    pub name: String,
    pub qualified_name: String,
    pub class_name: Option<String>,
    pub span: LineRange,
    pub lines_of_code: usize,
    pub parameter_count: usize,
    pub cyclomatic: u32,
    pub max_nesting: u32,
    /// Line where `max_nesting` is first reached
    pub deepest_line: Option<usize>,
    pub halstead: HalsteadMetrics,
    pub maintainability: MaintainabilityIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub name: String,
    pub span: LineRange,
    pub bases: Vec<String>,
    pub method_count: usize,
    pub lines_of_code: usize,
    pub attribute_count: usize,
    /// Distinct method-name prefixes
    pub responsibilities: usize,
    pub cohesion_lack: f64,
    pub inheritance_depth: u32,
}

/// Metrics for one unit, its functions (source order) and its classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub unit: UnitMetrics,
    pub functions: Vec<FunctionMetrics>,
    pub classes: Vec<ClassMetrics>,
}

impl MetricsReport {
    pub fn function(&self, qualified_name: &str) -> Option<&FunctionMetrics> {
        self.functions
            .iter()
            .find(|f| f.qualified_name == qualified_name)
    }

    pub fn average_function_complexity(&self) -> f64 {
        if self.functions.is_empty() {
            return 0.0;
        }
        let total: u32 = self.functions.iter().map(|f| f.cyclomatic).sum();
        f64::from(total) / self.functions.len() as f64
    }

    pub fn max_function_complexity(&self) -> u32 {
        self.functions.iter().map(|f| f.cyclomatic).max().unwrap_or(0)
    }

    pub fn count_complex_functions(&self, threshold: u32) -> usize {
        self.functions
            .iter()
            .filter(|f| f.cyclomatic > threshold)
            .count()
    }
}
