use crate::core::visitor::{
    classify_decision, count_decisions, for_each_node, DecisionKind, WalkScope,
};
use std::collections::HashMap;
use tree_sitter::Node;

/// McCabe complexity: 1 plus one per decision point.
///
/// Nested decisions count independently; depth only matters to the
/// nesting smell.
pub fn calculate_cyclomatic(root: Node<'_>, scope: WalkScope) -> u32 {
    1 + count_decisions(root, scope)
}

/// Number of decision points of each kind.
pub fn decision_breakdown(root: Node<'_>, scope: WalkScope) -> HashMap<DecisionKind, u32> {
    let mut counts = HashMap::new();
    for_each_node(root, scope, |node, _| {
        if let Some(kind) = classify_decision(&node) {
            *counts.entry(kind).or_insert(0) += 1;
        }
    });
    counts
}

/// Complexity of a path set whose branch counts are already known.
pub fn combine_cyclomatic(branches: &[u32]) -> u32 {
    branches.iter().sum::<u32>() + 1
}
