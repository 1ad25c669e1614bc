//! Shared traversal over Python syntax trees.
//!
//! Metrics, smell fingerprints, extraction and test synthesis must agree on
//! what a decision point, a nesting block and a function scope are. They all
//! go through [`classify_decision`], [`is_nesting_block`] and [`walk`] here
//! instead of matching node kinds on their own.
//!
//! The walk is iterative (explicit stack) so deeply nested sources cannot
//! overflow the thread stack.

use tree_sitter::Node;

/// A construct that adds one independent path through a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionKind {
    If,
    Elif,
    For,
    While,
    BooleanOperator,
    Except,
    Conditional,
    Case,
    ComprehensionFor,
    ComprehensionIf,
}

/// Classify a node as a decision point.
pub fn classify_decision(node: &Node) -> Option<DecisionKind> {
    match node.kind() {
        "if_statement" => Some(DecisionKind::If),
        "elif_clause" => Some(DecisionKind::Elif),
        "for_statement" => Some(DecisionKind::For),
        "while_statement" => Some(DecisionKind::While),
        "boolean_operator" => Some(DecisionKind::BooleanOperator),
        "except_clause" | "except_group_clause" => Some(DecisionKind::Except),
        "conditional_expression" => Some(DecisionKind::Conditional),
        "case_clause" => Some(DecisionKind::Case),
        "for_in_clause" => Some(DecisionKind::ComprehensionFor),
        "if_clause" => Some(DecisionKind::ComprehensionIf),
        _ => None,
    }
}

/// Statements that open a new level of lexical block nesting.
///
/// Clauses (`elif`, `else`, `except`, `finally`, `case`) share the depth of
/// their statement.
pub fn is_nesting_block(kind: &str) -> bool {
    matches!(
        kind,
        "if_statement"
            | "for_statement"
            | "while_statement"
            | "try_statement"
            | "with_statement"
            | "match_statement"
    )
}

pub fn is_function_definition(kind: &str) -> bool {
    kind == "function_definition"
}

pub fn is_class_definition(kind: &str) -> bool {
    kind == "class_definition"
}

/// Definitions that start their own analysis scope.
pub fn is_scope_boundary(kind: &str) -> bool {
    is_function_definition(kind) || is_class_definition(kind)
}

/// Whether the walker should descend into a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    Continue,
    Skip,
}

/// Callbacks for [`walk`].
///
/// `depth` is the number of nesting blocks enclosing the node, counting the
/// node itself when it is a block.
pub trait SyntaxVisitor<'tree> {
    fn enter(&mut self, node: Node<'tree>, depth: u32) -> Descend;

    fn leave(&mut self, _node: Node<'tree>, _depth: u32) {}
}

/// How far a walk reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkScope {
    /// Visit every descendant.
    Full,
    /// Do not enter nested function or class definitions below the root.
    Local,
}

enum Frame<'tree> {
    Enter(Node<'tree>, u32),
    Leave(Node<'tree>, u32),
}

/// Depth-first, source-ordered traversal.
pub fn walk<'tree, V>(root: Node<'tree>, scope: WalkScope, visitor: &mut V)
where
    V: SyntaxVisitor<'tree>,
{
    let mut stack = vec![Frame::Enter(root, 0)];

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(node, outer_depth) => {
                if scope == WalkScope::Local && node != root && is_scope_boundary(node.kind()) {
                    continue;
                }
                let depth = if is_nesting_block(node.kind()) {
                    outer_depth + 1
                } else {
                    outer_depth
                };
                let descend = visitor.enter(node, depth);
                stack.push(Frame::Leave(node, depth));
                if descend == Descend::Continue {
                    let mut cursor = node.walk();
                    let kids: Vec<_> = node.children(&mut cursor).collect();
                    stack.extend(kids.into_iter().rev().map(|kid| Frame::Enter(kid, depth)));
                }
            }
            Frame::Leave(node, depth) => visitor.leave(node, depth),
        }
    }
}

/// Visit nodes with a closure.
pub fn for_each_node<'tree, F>(root: Node<'tree>, scope: WalkScope, mut f: F)
where
    F: FnMut(Node<'tree>, u32),
{
    struct ClosureVisitor<F>(F);

    impl<'tree, F> SyntaxVisitor<'tree> for ClosureVisitor<F>
    where
        F: FnMut(Node<'tree>, u32),
    {
        fn enter(&mut self, node: Node<'tree>, depth: u32) -> Descend {
            (self.0)(node, depth);
            Descend::Continue
        }
    }

    walk(root, scope, &mut ClosureVisitor(&mut f));
}

/// Collect every node of the given kinds.
pub fn collect_kinds<'tree>(
    root: Node<'tree>,
    scope: WalkScope,
    kinds: &[&str],
) -> Vec<Node<'tree>> {
    let mut found = Vec::new();
    for_each_node(root, scope, |node, _| {
        if kinds.contains(&node.kind()) {
            found.push(node);
        }
    });
    found
}

/// Number of decision points below (and including) `root`.
pub fn count_decisions(root: Node<'_>, scope: WalkScope) -> u32 {
    let mut count = 0;
    for_each_node(root, scope, |node, _| {
        if classify_decision(&node).is_some() {
            count += 1;
        }
    });
    count
}

/// Maximum lexical block nesting below `root`.
pub fn max_nesting(root: Node<'_>, scope: WalkScope) -> u32 {
    let mut max_depth = 0;
    for_each_node(root, scope, |_, depth| max_depth = max_depth.max(depth));
    max_depth
}
