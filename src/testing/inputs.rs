//! Sample input selection and constant folding over Python literals.

use crate::core::ast::{children, named_children, node_text, strip_parens};
use crate::core::visitor::{for_each_node, WalkScope};
use crate::extraction::{ParameterInfo, ParameterKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tree_sitter::Node;

/// A Python literal used as a test input or expected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PyValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<PyValue>),
    Dict(Vec<(PyValue, PyValue)>),
}

impl PyValue {
    /// The "empty" value of the same type, used for boundary inputs.
    pub fn empty_like(&self) -> PyValue {
        match self {
            PyValue::None => PyValue::None,
            PyValue::Bool(_) => PyValue::Bool(false),
            PyValue::Int(_) => PyValue::Int(0),
            PyValue::Float(_) => PyValue::Float(0.0),
            PyValue::Str(_) => PyValue::Str(String::new()),
            PyValue::List(_) => PyValue::List(Vec::new()),
            PyValue::Dict(_) => PyValue::Dict(Vec::new()),
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, PyValue::Float(_))
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            PyValue::Int(i) => Some(*i as f64),
            PyValue::Float(f) => Some(*f),
            PyValue::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            PyValue::Int(i) => Some(*i),
            PyValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }
}

impl fmt::Display for PyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PyValue::None => write!(f, "None"),
            PyValue::Bool(true) => write!(f, "True"),
            PyValue::Bool(false) => write!(f, "False"),
            PyValue::Int(i) => write!(f, "{i}"),
            PyValue::Float(x) if x.is_nan() => write!(f, "float(\"nan\")"),
            PyValue::Float(x) if x.is_infinite() => {
                let sign = if x.is_sign_negative() { "-" } else { "" };
                write!(f, "float(\"{sign}inf\")")
            }
            PyValue::Float(x) => write!(f, "{x:?}"),
            PyValue::Str(s) => write!(f, "\"{}\"", escape_str(s)),
            PyValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            PyValue::Dict(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Read a literal expression (numbers, simple strings, booleans, `None`,
/// lists and dicts of literals, negated numbers).
pub fn parse_literal(node: Node<'_>, source: &str) -> Option<PyValue> {
    let node = strip_parens(node);
    let text = node_text(&node, source);
    match node.kind() {
        "integer" => parse_int(text).map(PyValue::Int),
        "float" => text.replace('_', "").parse().ok().map(PyValue::Float),
        "true" => Some(PyValue::Bool(true)),
        "false" => Some(PyValue::Bool(false)),
        "none" => Some(PyValue::None),
        "string" => parse_string(text).map(PyValue::Str),
        "list" => named_children(&node)
            .into_iter()
            .filter(|child| child.kind() != "comment")
            .map(|child| parse_literal(child, source))
            .collect::<Option<Vec<_>>>()
            .map(PyValue::List),
        "dictionary" => named_children(&node)
            .into_iter()
            .filter(|child| child.kind() != "comment")
            .map(|pair| {
                if pair.kind() != "pair" {
                    return None;
                }
                let key = parse_literal(pair.child_by_field_name("key")?, source)?;
                let value = parse_literal(pair.child_by_field_name("value")?, source)?;
                Some((key, value))
            })
            .collect::<Option<Vec<_>>>()
            .map(PyValue::Dict),
        "unary_operator" => {
            let operator = node.child_by_field_name("operator")?;
            let argument = parse_literal(node.child_by_field_name("argument")?, source)?;
            match (node_text(&operator, source), argument) {
                ("-", PyValue::Int(i)) => i.checked_neg().map(PyValue::Int),
                ("-", PyValue::Float(x)) => Some(PyValue::Float(-x)),
                ("+", value @ (PyValue::Int(_) | PyValue::Float(_))) => Some(value),
                _ => None,
            }
        }
        _ => None,
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let digits = text.replace('_', "");
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else {
        lower.parse().ok()
    }
}

/// Plain (non-f, non-bytes) string literals without escapes.
fn parse_string(text: &str) -> Option<String> {
    let prefix_len = text.find(['"', '\'']).unwrap_or(0);
    let (prefix, quoted) = text.split_at(prefix_len);
    if prefix.chars().any(|c| matches!(c, 'f' | 'F' | 'b' | 'B')) {
        return None;
    }
    let raw = prefix.chars().any(|c| matches!(c, 'r' | 'R'));
    let inner = ["\"\"\"", "'''", "\"", "'"].iter().find_map(|quote| {
        quoted
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })?;
    if inner.contains('\\') && !raw {
        return None;
    }
    Some(inner.to_string())
}

/// Evaluate an expression over literals and bound names.
///
/// Supports `+`, `-` and `*` on numbers, `+` on strings and lists, and
/// unary minus. Anything else (calls, attribute access, unknown names) does
/// not fold.
pub fn fold_expression(
    node: Node<'_>,
    source: &str,
    env: &HashMap<String, PyValue>,
) -> Option<PyValue> {
    let node = strip_parens(node);
    match node.kind() {
        "identifier" => env.get(node_text(&node, source)).cloned(),
        "binary_operator" => {
            let left = fold_expression(node.child_by_field_name("left")?, source, env)?;
            let right = fold_expression(node.child_by_field_name("right")?, source, env)?;
            let operator = node.child_by_field_name("operator")?;
            apply_binary(node_text(&operator, source), &left, &right)
        }
        "unary_operator" => {
            let operator = node.child_by_field_name("operator")?;
            let value = fold_expression(node.child_by_field_name("argument")?, source, env)?;
            match (node_text(&operator, source), value) {
                ("-", PyValue::Int(i)) => i.checked_neg().map(PyValue::Int),
                ("-", PyValue::Float(x)) => Some(PyValue::Float(-x)),
                ("+", value @ (PyValue::Int(_) | PyValue::Float(_))) => Some(value),
                _ => None,
            }
        }
        _ => parse_literal(node, source),
    }
}

pub(crate) fn apply_binary(operator: &str, left: &PyValue, right: &PyValue) -> Option<PyValue> {
    match (operator, left, right) {
        ("+", PyValue::Str(a), PyValue::Str(b)) => Some(PyValue::Str(format!("{a}{b}"))),
        ("+", PyValue::List(a), PyValue::List(b)) => {
            Some(PyValue::List(a.iter().chain(b).cloned().collect()))
        }
        _ if left.is_float() || right.is_float() => {
            let (a, b) = (left.as_f64()?, right.as_f64()?);
            let value = match operator {
                "+" => a + b,
                "-" => a - b,
                "*" => a * b,
                _ => return None,
            };
            value.is_finite().then_some(PyValue::Float(value))
        }
        _ => {
            let (a, b) = (left.as_i64()?, right.as_i64()?);
            match operator {
                "+" => a.checked_add(b),
                "-" => a.checked_sub(b),
                "*" => a.checked_mul(b),
                _ => None,
            }
            .map(PyValue::Int)
        }
    }
}

const ARITHMETIC_OPERATORS: [&str; 7] = ["+", "-", "*", "/", "//", "%", "**"];

/// Names used as numeric operands in the body: arithmetic operands,
/// augmented-assignment targets, and comparisons against numeric literals.
pub fn arithmetic_names(body: Node<'_>, source: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut note = |node: Node<'_>| {
        let node = strip_parens(node);
        if node.kind() == "identifier" {
            names.insert(node_text(&node, source).to_string());
        }
    };

    for_each_node(body, WalkScope::Local, |node, _| match node.kind() {
        "binary_operator" => {
            let is_arithmetic = node
                .child_by_field_name("operator")
                .is_some_and(|op| ARITHMETIC_OPERATORS.contains(&node_text(&op, source)));
            if is_arithmetic {
                node.child_by_field_name("left").into_iter().for_each(&mut note);
                node.child_by_field_name("right").into_iter().for_each(&mut note);
            }
        }
        "augmented_assignment" => {
            node.child_by_field_name("left").into_iter().for_each(&mut note);
        }
        "comparison_operator" => {
            let operands: Vec<_> = named_children(&node)
                .into_iter()
                .map(strip_parens)
                .collect();
            if operands.iter().any(|o| matches!(o.kind(), "integer" | "float")) {
                operands.into_iter().for_each(&mut note);
            }
        }
        _ => {}
    });
    names
}

/// Sample value for a parameter.
///
/// Tried in order: annotation, default value, numeric use in the body, name
/// heuristics, then a canonical `0`.
pub fn sample_input(
    param: &ParameterInfo,
    position: usize,
    source: &str,
    default: Option<Node<'_>>,
    numeric_names: &BTreeSet<String>,
) -> PyValue {
    param
        .annotation
        .as_deref()
        .and_then(|annotation| sample_for_annotation(annotation, position))
        .or_else(|| default.and_then(|node| parse_literal(node, source)))
        .or_else(|| numeric_names.contains(&param.name).then(|| numeric_sample(position)))
        .or_else(|| sample_for_name(&param.name, position))
        .unwrap_or(PyValue::Int(0))
}

/// Distinct small integers per position so folded results are informative.
fn numeric_sample(position: usize) -> PyValue {
    PyValue::Int(2 + position as i64)
}

fn sample_for_annotation(annotation: &str, position: usize) -> Option<PyValue> {
    let annotation = annotation.trim().trim_matches(|c| c == '"' || c == '\'');
    let (head, inner) = match annotation.split_once('[') {
        Some((head, rest)) => (head.trim(), rest.strip_suffix(']').map(str::trim)),
        None => (annotation, None),
    };
    let head = head.rsplit('.').next().unwrap_or(head);

    match head {
        "int" => Some(numeric_sample(position)),
        "float" => Some(PyValue::Float(1.5 + position as f64)),
        "str" => Some(PyValue::Str("sample".to_string())),
        "bool" => Some(PyValue::Bool(true)),
        "bytes" => None,
        "list" | "List" | "Sequence" | "Iterable" | "set" | "Set" | "tuple" | "Tuple" => {
            let element = inner
                .and_then(|inner| sample_for_annotation(inner.split(',').next()?, 0))
                .unwrap_or(PyValue::Int(1));
            Some(PyValue::List(vec![element.clone(), element]))
        }
        "dict" | "Dict" | "Mapping" => Some(PyValue::Dict(vec![(
            PyValue::Str("key".to_string()),
            PyValue::Int(1),
        )])),
        "Optional" => inner.and_then(|inner| sample_for_annotation(inner, position)),
        "None" => Some(PyValue::None),
        _ => annotation
            .split('|')
            .map(str::trim)
            .find(|part| *part != "None" && *part != annotation)
            .and_then(|part| sample_for_annotation(part, position)),
    }
}

fn sample_for_name(name: &str, position: usize) -> Option<PyValue> {
    let name = name.trim_start_matches('_').to_ascii_lowercase();
    let has = |parts: &[&str]| {
        parts
            .iter()
            .any(|p| name == *p || name.ends_with(&format!("_{p}")))
    };

    if name.starts_with("is_")
        || name.starts_with("has_")
        || has(&["flag", "enabled", "verbose", "strict"])
    {
        Some(PyValue::Bool(true))
    } else if has(&[
        "count", "n", "num", "size", "index", "idx", "i", "limit", "age", "length", "total", "x",
        "y",
    ]) {
        Some(numeric_sample(position))
    } else if has(&["rate", "ratio", "price", "amount", "score", "weight", "threshold"]) {
        Some(PyValue::Float(1.5))
    } else if has(&[
        "name", "text", "path", "message", "msg", "key", "label", "title", "s", "url", "word",
    ]) {
        Some(PyValue::Str("sample".to_string()))
    } else if has(&["items", "values", "list", "elements", "data", "numbers", "records", "rows"]) {
        Some(PyValue::List(vec![PyValue::Int(1), PyValue::Int(2), PyValue::Int(3)]))
    } else if has(&["config", "options", "mapping", "settings", "params", "kwargs"]) {
        Some(PyValue::Dict(vec![(
            PyValue::Str("key".to_string()),
            PyValue::Str("value".to_string()),
        )]))
    } else {
        None
    }
}

/// A bound test input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestInput {
    pub name: String,
    pub value: PyValue,
    /// Passed as `name=name` rather than positionally
    pub keyword: bool,
}

/// Happy-path inputs for every parameter a caller must bind.
///
/// `*args` and `**kwargs` are left empty.
pub fn happy_inputs(
    params: &[ParameterInfo],
    params_node: Option<Node<'_>>,
    body: Node<'_>,
    source: &str,
) -> Vec<TestInput> {
    let numeric = arithmetic_names(body, source);
    let defaults = params_node.map(|node| default_nodes(node, source)).unwrap_or_default();

    params
        .iter()
        .filter(|p| matches!(p.kind, ParameterKind::Positional | ParameterKind::KeywordOnly))
        .enumerate()
        .map(|(position, param)| TestInput {
            name: param.name.clone(),
            value: sample_input(
                param,
                position,
                source,
                defaults.get(&param.name).copied(),
                &numeric,
            ),
            keyword: param.kind == ParameterKind::KeywordOnly,
        })
        .collect()
}

fn default_nodes<'tree>(params: Node<'tree>, source: &str) -> HashMap<String, Node<'tree>> {
    children(&params)
        .into_iter()
        .filter(|p| matches!(p.kind(), "default_parameter" | "typed_default_parameter"))
        .filter_map(|p| {
            let name = p.child_by_field_name("name")?;
            let value = p.child_by_field_name("value")?;
            Some((node_text(&name, source).to_string(), value))
        })
        .collect()
}
