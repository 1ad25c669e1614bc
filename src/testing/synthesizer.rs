//! Structural test case synthesis.
//!
//! Cases are inferred from signatures and branching structure alone. The
//! target is never executed, so every expectation is a hypothesis about
//! behavior that a developer must confirm, not a verified oracle.

use super::inputs::{apply_binary, fold_expression, happy_inputs, parse_literal, PyValue, TestInput};
use crate::config::SynthesisConfig;
use crate::core::ast::{children, named_children, node_line, node_text, strip_parens};
use crate::core::visitor::{collect_kinds, WalkScope};
use crate::core::SourceUnit;
use crate::extraction::{FunctionInfo, UnitStructure};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestKind {
    HappyPath,
    EdgeCase,
    ErrorHandling,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TestKind::HappyPath => "HAPPY_PATH",
            TestKind::EdgeCase => "EDGE_CASE",
            TestKind::ErrorHandling => "ERROR_HANDLING",
        };
        write!(f, "{label}")
    }
}

/// Expected outcome shape of a generated case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Expectation {
    /// Result folded from the sample inputs
    Equals(PyValue),
    /// Literal returned by a boundary guard
    ReturnsDefault(PyValue),
    /// Exception type name
    Raises(String),
    NotNone,
    /// The function never returns a value
    ReturnsNone,
}

/// One synthesized test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedTestCase {
    /// Qualified name of the function under test
    pub target: String,
    pub test_name: String,
    pub kind: TestKind,
    pub inputs: Vec<TestInput>,
    /// Call expression, e.g. `Cart().total(items)`
    pub call: String,
    pub is_async: bool,
    pub expectation: Expectation,
    pub estimated_assertions: u32,
    /// Test-complexity estimate; higher means test this first
    pub priority: f64,
    /// Why the case exists, rendered as a comment
    pub rationale: String,
}

/// A condition that singles out a boundary value of one name.
#[derive(Debug, Clone, PartialEq)]
enum Boundary {
    Empty(String),
    Zero(String),
    NoneValue(String),
    Negative(String),
    WrongType(String, String),
}

impl Boundary {
    fn name(&self) -> &str {
        match self {
            Boundary::Empty(n)
            | Boundary::Zero(n)
            | Boundary::NoneValue(n)
            | Boundary::Negative(n)
            | Boundary::WrongType(n, _) => n,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Boundary::Empty(_) => "empty",
            Boundary::Zero(_) => "zero",
            Boundary::NoneValue(_) => "none",
            Boundary::Negative(_) => "negative",
            Boundary::WrongType(..) => "wrong_type",
        }
    }

    /// Value that satisfies the guard, given the happy-path sample.
    fn trigger(&self, sample: &PyValue) -> PyValue {
        match self {
            Boundary::Empty(_) => sample.empty_like(),
            Boundary::Zero(_) if sample.is_float() => PyValue::Float(0.0),
            Boundary::Zero(_) => PyValue::Int(0),
            Boundary::NoneValue(_) => PyValue::None,
            Boundary::Negative(_) => PyValue::Int(-1),
            Boundary::WrongType(_, expected) if expected == "str" => PyValue::Int(1),
            Boundary::WrongType(..) => PyValue::Str("invalid".to_string()),
        }
    }
}

/// Generate cases for every public function in a unit, highest priority
/// first (source order among equals).
pub fn synthesize_unit(
    unit: &SourceUnit,
    structure: &UnitStructure<'_>,
    config: &SynthesisConfig,
) -> Vec<GeneratedTestCase> {
    let mut cases: Vec<_> = structure
        .functions
        .iter()
        .flat_map(|function| synthesize(function, unit, config))
        .collect();
    cases.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    cases
}

/// Generate test cases for one function.
///
/// Always one happy path; one edge case for the first boundary guard that
/// does not raise; one error case per raise site, where raises of the
/// same exception under the same guard count as one site.
/// Private, dunder and nested functions produce nothing.
pub fn synthesize(
    function: &FunctionInfo<'_>,
    unit: &SourceUnit,
    config: &SynthesisConfig,
) -> Vec<GeneratedTestCase> {
    if !is_testable(function, config) {
        return Vec::new();
    }

    let source = unit.source();
    let inputs = happy_inputs(
        &function.parameters,
        function.node.child_by_field_name("parameters"),
        function.body,
        source,
    );
    let base = CaseBuilder {
        function,
        priority: priority(function),
        inputs: &inputs,
    };

    let mut cases = vec![base.build(
        TestKind::HappyPath,
        happy_name(function),
        inputs.clone(),
        happy_expectation(function, &inputs, source),
        happy_assertions(function, config.max_assertions),
        "happy path with representative inputs".to_string(),
    )];

    let guards = boundary_guards(function.body, source);
    if let Some((boundary, consequence)) = guards.iter().find(|(_, block)| !raises_within(*block)) {
        let expectation = guard_return(*consequence, source)
            .map(Expectation::ReturnsDefault)
            .unwrap_or_else(|| fallback_expectation(function));
        cases.push(base.build(
            TestKind::EdgeCase,
            format!(
                "{}_{}_{}",
                happy_name(function),
                boundary.name().replace('.', "_"),
                boundary.label()
            ),
            base.with_boundary(boundary),
            expectation,
            1,
            format!(
                "boundary: `{}` is {}",
                boundary.name(),
                boundary.label().replace('_', " ")
            ),
        ));
    }

    // Raises sharing an exception and a guard need the same inputs.
    let mut seen = BTreeSet::new();
    let sites: Vec<_> = collect_kinds(function.body, WalkScope::Local, &["raise_statement"])
        .into_iter()
        .filter_map(|raise| {
            let exception = raised_type(raise, source)?;
            let trigger = enclosing_guard(raise, function.node, source);
            let site = match &trigger {
                Some(boundary) => {
                    format!("{}_{}", boundary.name().replace('.', "_"), boundary.label())
                }
                None => format!("line_{}", node_line(&raise)),
            };
            seen.insert((exception.clone(), site.clone()))
                .then_some((raise, exception, trigger, site))
        })
        .collect();
    let mut per_exception: HashMap<&str, usize> = HashMap::new();
    for (_, exception, _, _) in &sites {
        *per_exception.entry(exception.as_str()).or_default() += 1;
    }

    for (raise, exception, trigger, site) in &sites {
        let line = node_line(raise);
        let (inputs, rationale) = match trigger {
            Some(boundary) => (
                base.with_boundary(boundary),
                format!(
                    "`{}` is {} (line {line})",
                    boundary.name(),
                    boundary.label().replace('_', " ")
                ),
            ),
            None => (
                inputs.clone(),
                format!("raise at line {line}; trigger not inferred"),
            ),
        };
        let mut name = format!("{}_raises_{}", happy_name(function), snake_case(exception));
        if per_exception.get(exception.as_str()).copied().unwrap_or(0) > 1 {
            name = format!("{name}_{site}");
        }
        cases.push(base.build(
            TestKind::ErrorHandling,
            name,
            inputs,
            Expectation::Raises(exception.clone()),
            1,
            rationale,
        ));
    }

    log::debug!(
        "synthesized {} test cases for {}",
        cases.len(),
        function.qualified_name
    );
    cases
}

struct CaseBuilder<'a, 'tree> {
    function: &'a FunctionInfo<'tree>,
    priority: f64,
    inputs: &'a [TestInput],
}

impl CaseBuilder<'_, '_> {
    fn build(
        &self,
        kind: TestKind,
        test_name: String,
        inputs: Vec<TestInput>,
        expectation: Expectation,
        estimated_assertions: u32,
        rationale: String,
    ) -> GeneratedTestCase {
        GeneratedTestCase {
            target: self.function.qualified_name.clone(),
            test_name: format!("test_{test_name}"),
            kind,
            call: call_expression(self.function, &inputs),
            inputs,
            is_async: self.function.is_async,
            expectation,
            estimated_assertions,
            priority: self.priority,
            rationale,
        }
    }

    /// Happy inputs with the guarded parameter (if any) moved to its boundary.
    fn with_boundary(&self, boundary: &Boundary) -> Vec<TestInput> {
        self.inputs
            .iter()
            .map(|input| {
                if input.name == boundary.name() {
                    TestInput {
                        value: boundary.trigger(&input.value),
                        ..input.clone()
                    }
                } else {
                    input.clone()
                }
            })
            .collect()
    }
}

fn is_testable(function: &FunctionInfo<'_>, config: &SynthesisConfig) -> bool {
    let dunder = function.name.starts_with("__") && function.name.ends_with("__");
    !dunder && !function.is_nested() && (config.include_private || !function.is_private())
}

fn happy_name(function: &FunctionInfo<'_>) -> String {
    match &function.class_name {
        Some(class) => format!("{}_{}", snake_case(class), function.name.trim_start_matches('_')),
        None => function.name.trim_start_matches('_').to_string(),
    }
}

fn call_expression(function: &FunctionInfo<'_>, inputs: &[TestInput]) -> String {
    let args = inputs
        .iter()
        .map(|input| {
            if input.keyword {
                format!("{0}={0}", input.name)
            } else {
                input.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    let is_classmethod = function.decorators.iter().any(|d| d == "classmethod");
    match &function.class_name {
        Some(class) if function.is_static() || is_classmethod => {
            format!("{class}.{}({args})", function.name)
        }
        Some(class) => format!("{class}().{}({args})", function.name),
        None => format!("{}({args})", function.name),
    }
}

/// 1 + 0.5 per decision point + 1 per `try` + 0.2 per parameter.
fn priority(function: &FunctionInfo<'_>) -> f64 {
    let tries = collect_kinds(function.body, WalkScope::Local, &["try_statement"]).len();
    1.0 + 0.5 * f64::from(function.branch_count)
        + tries as f64
        + 0.2 * function.parameter_count() as f64
}

fn happy_assertions(function: &FunctionInfo<'_>, cap: u32) -> u32 {
    let counted = collect_kinds(
        function.body,
        WalkScope::Local,
        &["if_statement", "return_statement"],
    )
    .len();
    (1 + counted as u32).min(cap.max(1))
}

fn valued_returns<'tree>(function: &FunctionInfo<'tree>) -> Vec<Node<'tree>> {
    collect_kinds(function.body, WalkScope::Local, &["return_statement"])
        .into_iter()
        .filter(|ret| ret.named_child(0).is_some())
        .collect()
}

fn fallback_expectation(function: &FunctionInfo<'_>) -> Expectation {
    if valued_returns(function).is_empty() {
        Expectation::ReturnsNone
    } else {
        Expectation::NotNone
    }
}

/// Fold straight-line code with the sample inputs when there is no branching
/// and a single valued return.
fn happy_expectation(
    function: &FunctionInfo<'_>,
    inputs: &[TestInput],
    source: &str,
) -> Expectation {
    let returns = valued_returns(function);
    if function.branch_count == 0 && returns.len() == 1 {
        let mut env: HashMap<String, PyValue> = inputs
            .iter()
            .map(|input| (input.name.clone(), input.value.clone()))
            .collect();

        for statement in named_children(&function.body) {
            match statement.kind() {
                "expression_statement" => {
                    if let Some(assignment) = statement.named_child(0) {
                        bind_assignment(assignment, source, &mut env);
                    }
                }
                "return_statement" => {
                    if let Some(value) = statement
                        .named_child(0)
                        .and_then(|expr| fold_expression(expr, source, &env))
                    {
                        return Expectation::Equals(value);
                    }
                    break;
                }
                _ => {}
            }
        }
    }
    fallback_expectation(function)
}

fn bind_assignment(node: Node<'_>, source: &str, env: &mut HashMap<String, PyValue>) {
    let Some(left) = node.child_by_field_name("left").filter(|l| l.kind() == "identifier") else {
        return;
    };
    let name = node_text(&left, source).to_string();
    let value = match node.kind() {
        "assignment" => node
            .child_by_field_name("right")
            .and_then(|right| fold_expression(right, source, env)),
        "augmented_assignment" => {
            let operator = node
                .child_by_field_name("operator")
                .map(|op| node_text(&op, source).trim_end_matches('='));
            match (env.get(&name), node.child_by_field_name("right"), operator) {
                (Some(current), Some(right), Some(op)) => fold_expression(right, source, env)
                    .and_then(|rhs| apply_binary(op, current, &rhs)),
                _ => None,
            }
        }
        _ => return,
    };
    match value {
        Some(value) => env.insert(name, value),
        None => env.remove(&name),
    };
}

/// `if` / `elif` conditions that isolate a boundary value, with their
/// consequence blocks, in source order.
fn boundary_guards<'tree>(body: Node<'tree>, source: &str) -> Vec<(Boundary, Node<'tree>)> {
    collect_kinds(body, WalkScope::Local, &["if_statement", "elif_clause"])
        .into_iter()
        .filter_map(|node| {
            let boundary = classify_guard(node.child_by_field_name("condition")?, source)?;
            Some((boundary, node.child_by_field_name("consequence")?))
        })
        .collect()
}

fn classify_guard(condition: Node<'_>, source: &str) -> Option<Boundary> {
    let condition = strip_parens(condition);
    match condition.kind() {
        "not_operator" => {
            let argument = strip_parens(condition.child_by_field_name("argument")?);
            match argument.kind() {
                "identifier" | "attribute" => {
                    Some(Boundary::Empty(node_text(&argument, source).to_string()))
                }
                "call" => {
                    let (callee, args) = call_parts(argument, source)?;
                    match (callee, args.as_slice()) {
                        ("isinstance", [target, expected]) => Some(Boundary::WrongType(
                            node_text(target, source).to_string(),
                            node_text(expected, source).to_string(),
                        )),
                        ("len", [target]) => {
                            Some(Boundary::Empty(node_text(target, source).to_string()))
                        }
                        _ => None,
                    }
                }
                _ => None,
            }
        }
        "comparison_operator" => classify_comparison(condition, source),
        "boolean_operator" => condition
            .child_by_field_name("left")
            .and_then(|left| classify_guard(left, source))
            .or_else(|| {
                condition
                    .child_by_field_name("right")
                    .and_then(|right| classify_guard(right, source))
            }),
        _ => None,
    }
}

fn classify_comparison(node: Node<'_>, source: &str) -> Option<Boundary> {
    let operands: Vec<_> = named_children(&node).into_iter().map(strip_parens).collect();
    let operator = children(&node)
        .into_iter()
        .filter(|child| !child.is_named())
        .map(|child| node_text(&child, source))
        .collect::<Vec<_>>()
        .join(" ");
    let [left, right] = operands.as_slice() else {
        return None;
    };

    // subject on the left; flip literal-first comparisons
    let (subject, literal, operator) = if parse_literal(*left, source).is_some() {
        (*right, *left, flip(&operator))
    } else {
        (*left, *right, operator)
    };
    let value = parse_literal(literal, source)?;

    let (name, measured_len) = match subject.kind() {
        "identifier" | "attribute" => (node_text(&subject, source).to_string(), false),
        "call" => match call_parts(subject, source)? {
            ("len", args) if args.len() == 1 => (node_text(&args[0], source).to_string(), true),
            _ => return None,
        },
        _ => return None,
    };

    let zero = matches!(value, PyValue::Int(0)) || value == PyValue::Float(0.0);
    match (operator.as_str(), &value) {
        ("is" | "==", PyValue::None) => Some(Boundary::NoneValue(name)),
        ("==" | "<=", _) if zero && measured_len => Some(Boundary::Empty(name)),
        ("<", PyValue::Int(1)) if measured_len => Some(Boundary::Empty(name)),
        ("==" | "<=", _) if zero => Some(Boundary::Zero(name)),
        ("<", _) if zero => Some(Boundary::Negative(name)),
        ("==", PyValue::Str(s)) if s.is_empty() => Some(Boundary::Empty(name)),
        ("==", PyValue::List(items)) if items.is_empty() => Some(Boundary::Empty(name)),
        ("==", PyValue::Dict(pairs)) if pairs.is_empty() => Some(Boundary::Empty(name)),
        _ => None,
    }
}

fn flip(operator: &str) -> String {
    match operator {
        "<" => ">",
        ">" => "<",
        "<=" => ">=",
        ">=" => "<=",
        other => other,
    }
    .to_string()
}

fn call_parts<'tree>(
    call: Node<'tree>,
    source: &'tree str,
) -> Option<(&'tree str, Vec<Node<'tree>>)> {
    let callee = node_text(&call.child_by_field_name("function")?, source);
    let args = named_children(&call.child_by_field_name("arguments")?)
        .into_iter()
        .filter(|arg| arg.kind() != "comment")
        .collect();
    Some((callee, args))
}

/// Literal returned directly by a guard block (`return` alone is `None`).
fn guard_return(block: Node<'_>, source: &str) -> Option<PyValue> {
    let first = named_children(&block)
        .into_iter()
        .find(|statement| statement.kind() != "comment")?;
    if first.kind() != "return_statement" {
        return None;
    }
    match first.named_child(0) {
        Some(value) => parse_literal(value, source),
        None => Some(PyValue::None),
    }
}

fn raises_within(block: Node<'_>) -> bool {
    !collect_kinds(block, WalkScope::Local, &["raise_statement"]).is_empty()
}

/// Exception type of `raise X(...)` / `raise X`; bare re-raises have none.
fn raised_type(raise: Node<'_>, source: &str) -> Option<String> {
    let raised = raise.named_child(0)?;
    let target = match raised.kind() {
        "call" => raised.child_by_field_name("function")?,
        _ => raised,
    };
    matches!(target.kind(), "identifier" | "attribute")
        .then(|| node_text(&target, source).to_string())
}

/// The boundary guard of the nearest `if`/`elif` whose consequence holds
/// the raise.
fn enclosing_guard(raise: Node<'_>, function: Node<'_>, source: &str) -> Option<Boundary> {
    let mut current = raise;
    while let Some(parent) = current.parent() {
        if parent == function {
            break;
        }
        if matches!(parent.kind(), "if_statement" | "elif_clause")
            && parent.child_by_field_name("consequence") == Some(current)
        {
            if let Some(boundary) = parent
                .child_by_field_name("condition")
                .and_then(|condition| classify_guard(condition, source))
            {
                return Some(boundary);
            }
        }
        current = parent;
    }
    None
}

fn snake_case(name: &str) -> String {
    let name = name.rsplit('.').next().unwrap_or(name);
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
