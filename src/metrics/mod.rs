//! Size, complexity and design metrics for a unit and each of its functions.

pub mod loc_counter;
pub mod oo;
mod report;

pub use loc_counter::{LocCount, LocCounter};
pub use report::{ClassMetrics, FunctionMetrics, MetricsReport, UnitMetrics};

use crate::complexity::{
    calculate_cyclomatic, calculate_halstead, calculate_maintainability, calculate_nesting,
};
use crate::core::visitor::WalkScope;
use crate::core::SourceUnit;
use crate::extraction::{ClassInfo, FunctionInfo, UnitStructure};

/// Compute the full report for a unit.
pub fn compute_metrics(unit: &SourceUnit, structure: &UnitStructure<'_>) -> MetricsReport {
    let loc = LocCounter::new(unit);

    let functions: Vec<_> = structure
        .functions
        .iter()
        .map(|function| compute_function_metrics(unit, function, &loc))
        .collect();
    let classes = compute_class_metrics(&structure.classes, &loc);
    let unit_metrics = compute_unit_metrics(unit, structure, &loc, &functions, &classes);

    log::debug!(
        "{}: {} code lines, cyclomatic {}, {} functions, {} classes",
        unit.id(),
        unit_metrics.lines_of_code,
        unit_metrics.cyclomatic,
        unit_metrics.function_count,
        unit_metrics.class_count
    );

    MetricsReport {
        unit: unit_metrics,
        functions,
        classes,
    }
}

/// Metrics of one function, nested definitions excluded.
pub fn compute_function_metrics(
    unit: &SourceUnit,
    function: &FunctionInfo<'_>,
    loc: &LocCounter,
) -> FunctionMetrics {
    let cyclomatic = calculate_cyclomatic(function.node, WalkScope::Local);
    let halstead = calculate_halstead(function.node, unit.source(), WalkScope::Local);
    let nesting = calculate_nesting(function.node, WalkScope::Local);
    let lines_of_code = loc.count_range(function.span).code_lines;

    FunctionMetrics {
        name: function.name.clone(),
        qualified_name: function.qualified_name.clone(),
        class_name: function.class_name.clone(),
        span: function.span,
        lines_of_code,
        parameter_count: function.parameter_count(),
        cyclomatic,
        max_nesting: nesting.max_depth,
        deepest_line: nesting.deepest_line,
        halstead,
        maintainability: calculate_maintainability(halstead.volume, cyclomatic, lines_of_code),
    }
}

pub fn compute_class_metrics(classes: &[ClassInfo], loc: &LocCounter) -> Vec<ClassMetrics> {
    let depths = oo::inheritance_depths(classes);

    classes
        .iter()
        .map(|class| ClassMetrics {
            name: class.name.clone(),
            span: class.span,
            bases: class.bases.clone(),
            method_count: class.methods.len(),
            lines_of_code: loc.count_range(class.span).code_lines,
            attribute_count: class.attributes.len(),
            responsibilities: oo::method_prefixes(class).len(),
            cohesion_lack: oo::lack_of_cohesion(class),
            inheritance_depth: depths.get(class.name.as_str()).copied().unwrap_or(0),
        })
        .collect()
}

fn compute_unit_metrics(
    unit: &SourceUnit,
    structure: &UnitStructure<'_>,
    loc: &LocCounter,
    functions: &[FunctionMetrics],
    classes: &[ClassMetrics],
) -> UnitMetrics {
    let root = unit.root();
    let loc_count = loc.count();
    let cyclomatic = calculate_cyclomatic(root, WalkScope::Full);
    let halstead = calculate_halstead(root, unit.source(), WalkScope::Full);

    UnitMetrics {
        lines_of_code: loc_count.code_lines,
        loc: loc_count,
        cyclomatic,
        function_count: functions.len(),
        class_count: classes.len(),
        attribute_count: classes.iter().map(|c| c.attribute_count).sum(),
        max_parameters: functions.iter().map(|f| f.parameter_count).max().unwrap_or(0),
        max_nesting: calculate_nesting(root, WalkScope::Full).max_depth,
        halstead,
        maintainability: calculate_maintainability(
            halstead.volume,
            cyclomatic,
            loc_count.code_lines,
        ),
        coupling: oo::coupling(structure),
        cohesion_lack: oo::mean_lack_of_cohesion(&structure.classes),
        inheritance_depth: classes.iter().map(|c| c.inheritance_depth).max().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::core::parse_source;
    use crate::extraction::extract_structure;
    use indoc::indoc;

    fn report(source: &str) -> MetricsReport {
        let unit = parse_source(source, "t.py", &ParserConfig::default()).unwrap();
        let structure = extract_structure(&unit);
        compute_metrics(&unit, &structure)
    }

    #[test]
    fn test_empty_unit_has_base_values() {
        let report = report("");
        assert!(report.functions.is_empty());
        assert!(report.classes.is_empty());
        assert_eq!(report.unit.cyclomatic, 1);
        assert_eq!(report.unit.lines_of_code, 0);
        assert_eq!(report.unit.function_count, 0);
        assert_eq!(report.unit.halstead.volume, 0.0);
        assert!(report.unit.maintainability.raw().is_finite());
    }

    #[test]
    fn test_add_function() {
        let report = report("def add(a, b):\n    return a + b\n");
        let add = report.function("add").unwrap();
        assert_eq!(add.cyclomatic, 1);
        assert_eq!(add.parameter_count, 2);
        assert_eq!(add.lines_of_code, 2);
        assert_eq!(add.max_nesting, 0);
        assert!(add.halstead.volume > 0.0);
    }

    #[test]
    fn test_unit_aggregates() {
        let report = report(indoc! {"
            import os
            from typing import List

            class Repo(Base):
                def __init__(self, path):
                    self.path = path

                def load(self, name, mode, strict):
                    if strict and not os.path.exists(self.path):
                        raise FileNotFoundError(self.path)
                    return open(self.path, mode)

            def helper(x):
                for item in x:
                    if item:
                        return item
                return None
        "});
        assert_eq!(report.unit.function_count, 3);
        assert_eq!(report.unit.class_count, 1);
        assert_eq!(report.unit.attribute_count, 1);
        assert_eq!(report.unit.max_parameters, 3);
        assert_eq!(report.unit.coupling, 2);
        assert_eq!(report.unit.inheritance_depth, 1);
        assert_eq!(report.unit.max_nesting, 2);
        // if, and, for, if
        assert_eq!(report.unit.cyclomatic, 5);
        assert_eq!(report.unit.cohesion_lack, 0.0);

        let load = report.function("Repo.load").unwrap();
        assert_eq!(load.cyclomatic, 3);
        assert_eq!(report.max_function_complexity(), 3);
        assert_eq!(report.count_complex_functions(2), 2);

        let repo = &report.classes[0];
        assert_eq!(repo.method_count, 2);
        assert_eq!(repo.lines_of_code, 7);
    }

    #[test]
    fn test_function_loc_excludes_comments_and_docstrings() {
        let report = report(indoc! {r#"
            def f(x):
                """Explain f.

                More detail.
                """
                # step one
                y = x * 2

                return y
        "#});
        assert_eq!(report.function("f").unwrap().lines_of_code, 3);
    }
}
