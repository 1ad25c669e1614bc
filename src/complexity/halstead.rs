//! Halstead software science measures.
//!
//! Operands are identifiers, numeric literals, `True`/`False`/`None`,
//! `...` and whole string literals (an f-string is one operand). Every other
//! anonymous leaf token is an operator, keyed by its text, except closing
//! brackets so a bracket pair counts once. Comments and zero-width tokens
//! are ignored.

use crate::core::ast::node_text;
use crate::core::visitor::{walk, Descend, SyntaxVisitor, WalkScope};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tree_sitter::Node;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HalsteadMetrics {
    /// n1
    pub distinct_operators: u32,
    /// n2
    pub distinct_operands: u32,
    /// N1
    pub total_operators: u32,
    /// N2
    pub total_operands: u32,
    pub vocabulary: u32,
    pub length: u32,
    pub volume: f64,
    pub difficulty: f64,
    pub effort: f64,
    /// Seconds, `effort / 18`
    pub time: f64,
    /// Delivered bugs estimate, `volume / 3000`
    pub bugs: f64,
}

impl HalsteadMetrics {
    pub fn from_counts(
        distinct_operators: u32,
        distinct_operands: u32,
        total_operators: u32,
        total_operands: u32,
    ) -> Self {
        let vocabulary = distinct_operators + distinct_operands;
        let length = total_operators + total_operands;
        let volume = if vocabulary > 0 {
            f64::from(length) * f64::from(vocabulary).log2()
        } else {
            0.0
        };
        let difficulty = if distinct_operands > 0 {
            (f64::from(distinct_operators) / 2.0)
                * (f64::from(total_operands) / f64::from(distinct_operands))
        } else {
            0.0
        };
        let effort = difficulty * volume;

        Self {
            distinct_operators,
            distinct_operands,
            total_operators,
            total_operands,
            vocabulary,
            length,
            volume,
            difficulty,
            effort,
            time: effort / 18.0,
            bugs: volume / 3000.0,
        }
    }
}

/// Count operators and operands below `root`.
pub fn calculate_halstead(root: Node<'_>, source: &str, scope: WalkScope) -> HalsteadMetrics {
    let mut counter = TokenCounter {
        source,
        operators: HashSet::new(),
        operands: HashSet::new(),
        total_operators: 0,
        total_operands: 0,
    };
    walk(root, scope, &mut counter);

    HalsteadMetrics::from_counts(
        counter.operators.len() as u32,
        counter.operands.len() as u32,
        counter.total_operators,
        counter.total_operands,
    )
}

enum Token {
    Operator,
    Operand,
    Ignored,
}

fn classify_token(node: &Node, text: &str) -> Token {
    match node.kind() {
        "identifier" | "integer" | "float" | "true" | "false" | "none" | "ellipsis" | "string"
        | "concatenated_string" => Token::Operand,
        "comment" | "line_continuation" => Token::Ignored,
        _ if node.is_named() => Token::Ignored,
        _ if text.is_empty() || matches!(text, ")" | "]" | "}") => Token::Ignored,
        _ => Token::Operator,
    }
}

struct TokenCounter<'s> {
    source: &'s str,
    operators: HashSet<&'s str>,
    operands: HashSet<&'s str>,
    total_operators: u32,
    total_operands: u32,
}

impl<'tree> SyntaxVisitor<'tree> for TokenCounter<'_> {
    fn enter(&mut self, node: Node<'tree>, _depth: u32) -> Descend {
        let is_string = matches!(node.kind(), "string" | "concatenated_string");
        if node.child_count() > 0 && !is_string {
            return Descend::Continue;
        }

        let text = node_text(&node, self.source);
        match classify_token(&node, text) {
            Token::Operator => {
                self.operators.insert(text);
                self.total_operators += 1;
            }
            Token::Operand => {
                self.operands.insert(text);
                self.total_operands += 1;
            }
            Token::Ignored => {}
        }
        Descend::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::core::parse_source;

    fn unit_halstead(source: &str) -> HalsteadMetrics {
        let unit = parse_source(source, "test.py", &ParserConfig::default()).unwrap();
        calculate_halstead(unit.root(), unit.source(), WalkScope::Full)
    }

    #[test]
    fn test_simple_assignment() {
        // operators: `=`, `+`; operands: x, a, 1
        let metrics = unit_halstead("x = a + 1\n");
        assert_eq!(metrics.distinct_operators, 2);
        assert_eq!(metrics.distinct_operands, 3);
        assert_eq!(metrics.total_operators, 2);
        assert_eq!(metrics.total_operands, 3);
        assert_eq!(metrics.vocabulary, 5);
        assert_eq!(metrics.length, 5);
        assert!((metrics.volume - 5.0 * 5f64.log2()).abs() < 1e-9);
        assert!((metrics.difficulty - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bracket_pair_counts_once() {
        let metrics = unit_halstead("f(x)\n");
        assert_eq!(metrics.total_operators, 1);
        assert_eq!(metrics.total_operands, 2);
    }

    #[test]
    fn test_string_is_single_operand() {
        let metrics = unit_halstead("name = f\"hello {who}\"\n");
        assert_eq!(metrics.distinct_operands, 2);
        assert_eq!(metrics.total_operators, 1);
    }

    #[test]
    fn test_empty_source_is_all_zero() {
        let metrics = unit_halstead("");
        assert_eq!(metrics, HalsteadMetrics::default());
    }

    #[test]
    fn test_comments_are_ignored() {
        assert_eq!(unit_halstead("# only a note\n"), HalsteadMetrics::default());
    }

    #[test]
    fn test_difficulty_zero_without_operands() {
        let metrics = HalsteadMetrics::from_counts(3, 0, 4, 0);
        assert_eq!(metrics.difficulty, 0.0);
        assert_eq!(metrics.effort, 0.0);
        assert!(metrics.volume > 0.0);
    }

    #[test]
    fn test_derived_measures() {
        let metrics = HalsteadMetrics::from_counts(4, 4, 10, 8);
        assert!((metrics.volume - 54.0).abs() < 1e-9);
        assert!((metrics.difficulty - 4.0).abs() < 1e-9);
        assert!((metrics.effort - 216.0).abs() < 1e-9);
        assert!((metrics.time - 12.0).abs() < 1e-9);
        assert!((metrics.bugs - 0.018).abs() < 1e-9);
    }
}
