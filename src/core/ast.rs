//! Parsed source units and tree-sitter node helpers.

use tree_sitter::{Node, Tree};

/// One analyzable compilation unit: the raw text, its syntax tree and an
/// identifier (path or name).
///
/// Immutable after construction. Everything derived from the tree
/// (`FunctionInfo`, body nodes) borrows from the unit and cannot outlive it.
#[derive(Debug)]
pub struct SourceUnit {
    id: String,
    source: String,
    tree: Tree,
}

impl SourceUnit {
    pub(crate) fn new(id: String, source: String, tree: Tree) -> Self {
        Self { id, source, tree }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Text covered by a node of this unit's tree.
    pub fn text(&self, node: Node<'_>) -> &str {
        node_text(&node, &self.source)
    }

    /// Number of physical lines in the unit.
    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }

    /// True when the module has no statements (empty or comment-only text).
    pub fn is_empty(&self) -> bool {
        let root = self.root();
        let mut cursor = root.walk();
        let is_empty = root
            .named_children(&mut cursor)
            .all(|child| child.kind() == "comment");
        is_empty
    }
}

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Get the line number for a tree-sitter node (1-indexed)
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Get the last line covered by a tree-sitter node (1-indexed)
pub fn node_end_line(node: &Node) -> usize {
    let end = node.end_position();
    // A node ending at column 0 stops before that row's content.
    if end.column == 0 && end.row > node.start_position().row {
        end.row
    } else {
        end.row + 1
    }
}

/// Get the column number for a tree-sitter node (1-indexed)
pub fn node_column(node: &Node) -> usize {
    node.start_position().column + 1
}

/// Named children of a node, collected.
pub fn named_children<'tree>(node: &Node<'tree>) -> Vec<Node<'tree>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// All children (named and anonymous) of a node, collected.
pub fn children<'tree>(node: &Node<'tree>) -> Vec<Node<'tree>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Unwrap parentheses around an expression.
pub fn strip_parens<'tree>(node: Node<'tree>) -> Node<'tree> {
    let mut current = node;
    while current.kind() == "parenthesized_expression" {
        match current.named_child(0) {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
}
