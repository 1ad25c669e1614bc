//! Tree-sitter parser integration for Python.
//!
//! The parser is the sole entry point for downstream analysis. It never
//! recovers partially: a tree containing any `ERROR` or `MISSING` node is
//! rejected as a whole with a located [`ParseError`].

use crate::config::ParserConfig;
use crate::core::ast::{node_column, node_line, node_text, SourceUnit};
use crate::errors::ParseError;
use tree_sitter::{Node, Parser};

/// Longest snippet of offending source quoted in a parse error message.
const MAX_SNIPPET_CHARS: usize = 40;

/// Parse Python source into a [`SourceUnit`].
pub fn parse_source(
    source: &str,
    unit_id: &str,
    config: &ParserConfig,
) -> Result<SourceUnit, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| ParseError::new(unit_id, 1, 1, format!("grammar unavailable: {e}")))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::new(unit_id, 1, 1, "parser produced no tree"))?;

    let root = tree.root_node();
    if root.has_error() {
        let err = match first_error_node(root) {
            Some(node) => describe_error(node, source, unit_id),
            None => ParseError::new(unit_id, 1, 1, "invalid syntax"),
        };
        log::debug!("{err}");
        return Err(err);
    }

    let unit = SourceUnit::new(unit_id.to_string(), source.to_string(), tree);
    if !config.allow_empty && unit.is_empty() {
        return Err(ParseError::new(
            unit_id,
            1,
            1,
            "source unit has no top-level statements",
        ));
    }

    Ok(unit)
}

/// Check whether text parses cleanly without building a unit.
pub fn is_valid_python(source: &str) -> bool {
    parse_source(source, "<check>", &ParserConfig::default()).is_ok()
}

/// Depth-first search for the earliest error or missing node.
fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_node)
}

fn describe_error(node: Node<'_>, source: &str, unit_id: &str) -> ParseError {
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        let snippet: String = node_text(&node, source)
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .chars()
            .take(MAX_SNIPPET_CHARS)
            .collect();
        if snippet.is_empty() {
            "invalid syntax".to_string()
        } else {
            format!("invalid syntax near `{snippet}`")
        }
    };
    ParseError::new(unit_id, node_line(&node), node_column(&node), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient() -> ParserConfig {
        ParserConfig::default()
    }

    fn strict() -> ParserConfig {
        ParserConfig { allow_empty: false }
    }

    #[test]
    fn test_parse_simple_function() {
        let unit = parse_source("def add(a, b):\n    return a + b\n", "add.py", &lenient())
            .expect("valid python");
        assert_eq!(unit.id(), "add.py");
        assert_eq!(unit.root().kind(), "module");
        assert!(!unit.is_empty());
    }

    #[test]
    fn test_syntax_error_reports_location() {
        let err = parse_source("def broken(:\n    pass\n", "bad.py", &lenient()).unwrap_err();
        assert_eq!(err.unit, "bad.py");
        assert_eq!(err.line, 1);
        assert!(err.column >= 1);
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_error_on_later_line() {
        let source = "x = 1\ny = (2 +\n";
        let err = parse_source(source, "later.py", &lenient()).unwrap_err();
        assert!(err.line >= 2, "error should point past the first line: {err}");
    }

    #[test]
    fn test_empty_text_is_legal_by_default() {
        let unit = parse_source("", "empty.py", &lenient()).expect("empty is legal");
        assert!(unit.is_empty());
    }

    #[test]
    fn test_empty_text_rejected_by_strict_policy() {
        let err = parse_source("", "empty.py", &strict()).unwrap_err();
        assert_eq!((err.line, err.column), (1, 1));
        assert!(parse_source("# only a comment\n", "c.py", &strict()).is_err());
        assert!(parse_source("x = 1\n", "x.py", &strict()).is_ok());
    }

    #[test]
    fn test_is_valid_python() {
        assert!(is_valid_python("print('hi')\n"));
        assert!(!is_valid_python("if True print('hi')\n"));
    }
}
