use crate::core::ast::node_line;
use crate::core::visitor::{for_each_node, WalkScope};
use serde::{Deserialize, Serialize};
use tree_sitter::Node;

/// Deepest block nesting and where it first occurs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestingDepth {
    pub max_depth: u32,
    /// 1-based line of the first block reaching `max_depth`
    pub deepest_line: Option<usize>,
}

/// Maximum depth of nested `if`/`for`/`while`/`try`/`with`/`match` blocks.
pub fn calculate_nesting(root: Node<'_>, scope: WalkScope) -> NestingDepth {
    let mut result = NestingDepth::default();
    for_each_node(root, scope, |node, depth| {
        if depth > result.max_depth {
            result.max_depth = depth;
            result.deepest_line = Some(node_line(&node));
        }
    });
    result
}
