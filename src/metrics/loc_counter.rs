//! Lines-of-code counting for Python units.
//!
//! - **Physical lines**: raw line count
//! - **Code lines**: everything that is not blank, a `#` comment or a docstring
//! - **Comment lines**: lines holding only a `#` comment
//! - **Docstring lines**: lines covered by a string-only expression statement
//! - **Blank lines**: whitespace only
//!
//! The invariant `physical == code + comment + docstring + blank` always holds.
//!
//! Comment and docstring detection uses the syntax tree, so `#` inside a
//! multi-line string literal is still code.

use crate::core::ast::{named_children, node_end_line, node_line};
use crate::core::visitor::{for_each_node, WalkScope};
use crate::core::{LineRange, SourceUnit};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocCount {
    pub physical_lines: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    pub docstring_lines: usize,
    pub blank_lines: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineType {
    Blank,
    Comment,
    Docstring,
    Code,
}

/// Per-line classification of one unit, queried for the whole unit or for
/// a function's span.
#[derive(Debug, Clone)]
pub struct LocCounter {
    lines: Vec<LineType>,
}

impl LocCounter {
    pub fn new(unit: &SourceUnit) -> Self {
        let mut comment_lines = HashSet::new();
        let mut docstring_lines = HashSet::new();

        for_each_node(unit.root(), WalkScope::Full, |node, _| match node.kind() {
            "comment" => {
                comment_lines.insert(node_line(&node));
            }
            "expression_statement" if is_docstring(&node) => {
                docstring_lines.extend(node_line(&node)..=node_end_line(&node));
            }
            _ => {}
        });

        let lines = unit
            .source()
            .lines()
            .enumerate()
            .map(|(idx, line)| {
                classify_line(line.trim(), idx + 1, &comment_lines, &docstring_lines)
            })
            .collect();

        Self { lines }
    }

    pub fn count(&self) -> LocCount {
        tally(self.lines.iter())
    }

    /// Count lines within an inclusive 1-based range.
    pub fn count_range(&self, range: LineRange) -> LocCount {
        let start = range.start.saturating_sub(1).min(self.lines.len());
        let end = range.end.min(self.lines.len()).max(start);
        tally(self.lines[start..end].iter())
    }

    /// Trimmed source of the code lines within `range`.
    pub fn code_lines<'s>(&self, source: &'s str, range: LineRange) -> Vec<&'s str> {
        source
            .lines()
            .enumerate()
            .filter(|(idx, _)| range.contains(idx + 1))
            .filter(|(idx, _)| self.lines.get(*idx) == Some(&LineType::Code))
            .map(|(_, line)| line.trim())
            .collect()
    }
}

fn classify_line(
    trimmed: &str,
    line: usize,
    comment_lines: &HashSet<usize>,
    docstring_lines: &HashSet<usize>,
) -> LineType {
    if trimmed.is_empty() {
        LineType::Blank
    } else if trimmed.starts_with('#') && comment_lines.contains(&line) {
        LineType::Comment
    } else if docstring_lines.contains(&line) {
        LineType::Docstring
    } else {
        LineType::Code
    }
}

fn tally<'a>(lines: impl Iterator<Item = &'a LineType>) -> LocCount {
    lines.fold(LocCount::default(), |mut count, line| {
        count.physical_lines += 1;
        match line {
            LineType::Blank => count.blank_lines += 1,
            LineType::Comment => count.comment_lines += 1,
            LineType::Docstring => count.docstring_lines += 1,
            LineType::Code => count.code_lines += 1,
        }
        count
    })
}

/// A statement consisting only of a string literal.
fn is_docstring(node: &tree_sitter::Node) -> bool {
    let children = named_children(node);
    matches!(children.as_slice(), [only] if matches!(only.kind(), "string" | "concatenated_string"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::core::parse_source;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn counter(source: &str) -> LocCounter {
        let unit = parse_source(source, "t.py", &ParserConfig::default()).unwrap();
        LocCounter::new(&unit)
    }

    #[test]
    fn test_counts_each_line_type() {
        let count = counter(indoc! {r#"
            """Module docstring
            spanning two lines."""
            # a comment

            def f(x):
                """Doc."""
                return x  # trailing comment
        "#})
        .count();
        assert_eq!(
            count,
            LocCount {
                physical_lines: 7,
                code_lines: 2,
                comment_lines: 1,
                docstring_lines: 3,
                blank_lines: 1,
            }
        );
    }

    #[test]
    fn test_hash_inside_string_is_code() {
        let count = counter("text = '''\n# not a comment\n'''\n").count();
        assert_eq!(count.code_lines, 3);
        assert_eq!(count.comment_lines, 0);
    }

    #[test]
    fn test_count_range() {
        let loc = counter("a = 1\n\ndef f():\n    # note\n    return 2\n");
        let count = loc.count_range(LineRange::new(3, 5));
        assert_eq!(count.code_lines, 2);
        assert_eq!(count.comment_lines, 1);
        assert_eq!(loc.count_range(LineRange::new(10, 12)), LocCount::default());
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(counter("").count(), LocCount::default());
    }

    #[test]
    fn test_code_lines_are_trimmed() {
        let source = "def f():\n    # c\n    return 1\n";
        let loc = counter(source);
        assert_eq!(
            loc.code_lines(source, LineRange::new(1, 3)),
            vec!["def f():", "return 1"]
        );
    }
}
