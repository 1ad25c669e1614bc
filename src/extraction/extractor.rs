//! Single-pass structural extraction.
//!
//! Walks the unit once with the shared [`SyntaxVisitor`] and collects
//! functions (with parameters and `self` attribute usage), classes and
//! imports. Metrics, smell rules and the test synthesizer all consume the
//! resulting [`UnitStructure`] instead of re-walking the tree.

use crate::core::ast::{named_children, node_end_line, node_line, node_text};
use crate::core::visitor::{count_decisions, for_each_node, walk, Descend, SyntaxVisitor, WalkScope};
use crate::core::{LineRange, SourceUnit};
use crate::extraction::types::{
    ClassInfo, FunctionInfo, ImportInfo, ParameterInfo, ParameterKind, UnitStructure,
};
use std::collections::BTreeSet;
use tree_sitter::Node;

/// Extract functions, classes and imports from a parsed unit.
pub fn extract_structure(unit: &SourceUnit) -> UnitStructure<'_> {
    let mut visitor = StructureVisitor {
        source: unit.source(),
        scopes: Vec::new(),
        functions: Vec::new(),
        classes: Vec::new(),
        imports: Vec::new(),
    };
    walk(unit.root(), WalkScope::Full, &mut visitor);

    log::trace!(
        "{}: extracted {} functions, {} classes, {} imports",
        unit.id(),
        visitor.functions.len(),
        visitor.classes.len(),
        visitor.imports.len()
    );

    UnitStructure {
        functions: visitor.functions,
        classes: visitor.classes,
        imports: visitor.imports,
    }
}

enum ScopeKind {
    Class(usize),
    Function,
}

struct Scope<'tree> {
    node: Node<'tree>,
    name: String,
    kind: ScopeKind,
}

struct StructureVisitor<'tree> {
    source: &'tree str,
    scopes: Vec<Scope<'tree>>,
    functions: Vec<FunctionInfo<'tree>>,
    classes: Vec<ClassInfo>,
    imports: Vec<ImportInfo>,
}

impl<'tree> StructureVisitor<'tree> {
    fn qualified(&self, name: &str) -> String {
        self.scopes
            .iter()
            .map(|s| s.name.as_str())
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn enclosing_class(&self) -> Option<usize> {
        match self.scopes.last() {
            Some(Scope {
                kind: ScopeKind::Class(idx),
                ..
            }) => Some(*idx),
            _ => None,
        }
    }

    fn enter_function(&mut self, node: Node<'tree>) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let class_idx = self.enclosing_class();
        let decorators = decorators_of(node, self.source);
        let has_receiver =
            class_idx.is_some() && !decorators.iter().any(|d| d == "staticmethod");
        let parameters = node
            .child_by_field_name("parameters")
            .map(|params| extract_parameters(params, self.source, has_receiver))
            .unwrap_or_default();

        let receiver = parameters
            .iter()
            .find(|p| p.is_receiver())
            .map(|p| p.name.clone());
        let (self_attributes, assigned) = match &receiver {
            Some(receiver) => receiver_attributes(node, receiver, self.source),
            None => (BTreeSet::new(), BTreeSet::new()),
        };

        let class_name = class_idx.map(|idx| self.classes[idx].name.clone());
        if let Some(idx) = class_idx {
            let class = &mut self.classes[idx];
            class.methods.push(name.clone());
            class.method_attribute_usage.push(self_attributes.clone());
            class.attributes.extend(assigned);
        }

        self.functions.push(FunctionInfo {
            qualified_name: self.qualified(&name),
            name: name.clone(),
            class_name,
            parameters,
            return_annotation: field_text(node, "return_type", self.source),
            span: LineRange::new(node_line(&node), node_end_line(&node)),
            decorators,
            is_async: node.child(0).is_some_and(|c| c.kind() == "async"),
            branch_count: count_decisions(body, WalkScope::Local),
            self_attributes,
            node,
            body,
        });

        self.scopes.push(Scope {
            node,
            name,
            kind: ScopeKind::Function,
        });
    }

    fn enter_class(&mut self, node: Node<'tree>) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let bases = node
            .child_by_field_name("superclasses")
            .map(|args| {
                named_children(&args)
                    .into_iter()
                    .filter(|arg| matches!(arg.kind(), "identifier" | "attribute"))
                    .map(|arg| node_text(&arg, self.source).to_string())
                    .collect()
            })
            .unwrap_or_default();
        let attributes = node
            .child_by_field_name("body")
            .map(|body| class_level_assignments(body, self.source))
            .unwrap_or_default();

        self.classes.push(ClassInfo {
            name: name.clone(),
            bases,
            span: LineRange::new(node_line(&node), node_end_line(&node)),
            methods: Vec::new(),
            attributes,
            method_attribute_usage: Vec::new(),
        });
        self.scopes.push(Scope {
            node,
            name,
            kind: ScopeKind::Class(self.classes.len() - 1),
        });
    }

    fn record_import(&mut self, node: Node<'tree>) {
        let line = node_line(&node);
        match node.kind() {
            "import_statement" => {
                for child in named_children(&node) {
                    if let Some((module, binding)) = import_binding(child, self.source) {
                        self.imports.push(ImportInfo {
                            module,
                            bindings: vec![binding],
                            line,
                        });
                    }
                }
            }
            "import_from_statement" => {
                let Some(module) = field_text(node, "module_name", self.source) else {
                    return;
                };
                let mut cursor = node.walk();
                let bindings = node
                    .children_by_field_name("name", &mut cursor)
                    .filter_map(|name| import_binding(name, self.source).map(|(_, b)| b))
                    .collect();
                self.imports.push(ImportInfo {
                    module,
                    bindings,
                    line,
                });
            }
            _ => {}
        }
    }
}

impl<'tree> SyntaxVisitor<'tree> for StructureVisitor<'tree> {
    fn enter(&mut self, node: Node<'tree>, _depth: u32) -> Descend {
        match node.kind() {
            "function_definition" => self.enter_function(node),
            "class_definition" => self.enter_class(node),
            "import_statement" | "import_from_statement" => {
                self.record_import(node);
                return Descend::Skip;
            }
            _ => {}
        }
        Descend::Continue
    }

    fn leave(&mut self, node: Node<'tree>, _depth: u32) {
        if self.scopes.last().is_some_and(|scope| scope.node == node) {
            self.scopes.pop();
        }
    }
}

fn field_text(node: Node<'_>, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|child| node_text(&child, source).to_string())
}

/// Decorator names without `@` and call arguments.
fn decorators_of(node: Node<'_>, source: &str) -> Vec<String> {
    let Some(parent) = node.parent().filter(|p| p.kind() == "decorated_definition") else {
        return Vec::new();
    };
    named_children(&parent)
        .into_iter()
        .filter(|child| child.kind() == "decorator")
        .map(|decorator| {
            let text = node_text(&decorator, source).trim_start_matches('@').trim();
            text.split('(').next().unwrap_or(text).trim().to_string()
        })
        .collect()
}

/// Parse a `parameters` node.
///
/// The first positional parameter of a method becomes the receiver.
pub fn extract_parameters(
    params: Node<'_>,
    source: &str,
    has_receiver: bool,
) -> Vec<ParameterInfo> {
    let mut parameters = Vec::new();
    let mut keyword_only = false;

    for child in named_children(&params) {
        let parsed = match child.kind() {
            "identifier" => Some((node_text(&child, source).to_string(), None, None)),
            "typed_parameter" => child.named_child(0).and_then(|inner| {
                let annotation = field_text(child, "type", source);
                match inner.kind() {
                    "identifier" => Some((node_text(&inner, source).to_string(), annotation, None)),
                    "list_splat_pattern" | "dictionary_splat_pattern" => {
                        push_splat(&mut parameters, inner, source, annotation);
                        keyword_only |= inner.kind() == "list_splat_pattern";
                        None
                    }
                    _ => None,
                }
            }),
            "default_parameter" | "typed_default_parameter" => field_text(child, "name", source)
                .map(|name| {
                    (
                        name,
                        field_text(child, "type", source),
                        field_text(child, "value", source),
                    )
                }),
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                push_splat(&mut parameters, child, source, None);
                keyword_only |= child.kind() == "list_splat_pattern";
                None
            }
            "keyword_separator" => {
                keyword_only = true;
                None
            }
            _ => None,
        };

        if let Some((name, annotation, default)) = parsed {
            let kind = if has_receiver && parameters.is_empty() && default.is_none() {
                ParameterKind::Receiver
            } else if keyword_only {
                ParameterKind::KeywordOnly
            } else {
                ParameterKind::Positional
            };
            parameters.push(ParameterInfo {
                name,
                annotation,
                default,
                kind,
            });
        }
    }

    parameters
}

fn push_splat(
    parameters: &mut Vec<ParameterInfo>,
    node: Node<'_>,
    source: &str,
    annotation: Option<String>,
) {
    let kind = if node.kind() == "list_splat_pattern" {
        ParameterKind::VarArgs
    } else {
        ParameterKind::KwArgs
    };
    if let Some(name) = node.named_child(0) {
        parameters.push(ParameterInfo {
            name: node_text(&name, source).to_string(),
            annotation,
            default: None,
            kind,
        });
    }
}

/// Attributes used through the receiver, and the subset assigned.
fn receiver_attributes(
    function: Node<'_>,
    receiver: &str,
    source: &str,
) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut used = BTreeSet::new();
    let mut assigned = BTreeSet::new();

    for_each_node(function, WalkScope::Local, |node, _| match node.kind() {
        "attribute" => {
            if let Some(attr) = receiver_attribute(node, receiver, source) {
                used.insert(attr);
            }
        }
        "assignment" | "augmented_assignment" => {
            if let Some(attr) = node
                .child_by_field_name("left")
                .and_then(|left| receiver_attribute(left, receiver, source))
            {
                assigned.insert(attr);
            }
        }
        _ => {}
    });

    (used, assigned)
}

fn receiver_attribute(node: Node<'_>, receiver: &str, source: &str) -> Option<String> {
    if node.kind() != "attribute" {
        return None;
    }
    let object = node.child_by_field_name("object")?;
    if object.kind() != "identifier" || node_text(&object, source) != receiver {
        return None;
    }
    field_text(node, "attribute", source)
}

/// Names assigned directly in a class body.
fn class_level_assignments(body: Node<'_>, source: &str) -> BTreeSet<String> {
    named_children(&body)
        .into_iter()
        .filter(|stmt| stmt.kind() == "expression_statement")
        .filter_map(|stmt| stmt.named_child(0))
        .filter(|expr| expr.kind() == "assignment")
        .filter_map(|assignment| assignment.child_by_field_name("left"))
        .filter(|left| left.kind() == "identifier")
        .map(|left| node_text(&left, source).to_string())
        .collect()
}

/// Module and bound name of one imported item.
fn import_binding(node: Node<'_>, source: &str) -> Option<(String, String)> {
    match node.kind() {
        "dotted_name" => {
            let module = node_text(&node, source).to_string();
            let binding = module.split('.').next().unwrap_or(&module).to_string();
            Some((module, binding))
        }
        "aliased_import" => {
            let module = field_text(node, "name", source)?;
            let alias = field_text(node, "alias", source)?;
            Some((module, alias))
        }
        _ => None,
    }
}
