//! Structural facts extracted from a source unit.

use crate::core::LineRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tree_sitter::Node;

/// How a parameter binds its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// `self` / `cls` of a method; not counted as a parameter
    Receiver,
    Positional,
    /// `*args`
    VarArgs,
    /// declared after `*` or `*args`
    KeywordOnly,
    /// `**kwargs`
    KwArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    pub annotation: Option<String>,
    /// Source text of the default value
    pub default: Option<String>,
    pub kind: ParameterKind,
}

impl ParameterInfo {
    pub fn is_receiver(&self) -> bool {
        self.kind == ParameterKind::Receiver
    }
}

/// A function or method definition.
///
/// `node` and `body` point into the owning [`SourceUnit`](crate::core::SourceUnit)'s
/// tree; the `'tree` lifetime keeps them from outliving it.
#[derive(Debug, Clone)]
pub struct FunctionInfo<'tree> {
    pub name: String,
    /// `Class.method` or `outer.inner` for nested definitions
    pub qualified_name: String,
    /// Enclosing class when this is a method
    pub class_name: Option<String>,
    pub parameters: Vec<ParameterInfo>,
    pub return_annotation: Option<String>,
    pub span: LineRange,
    pub decorators: Vec<String>,
    pub is_async: bool,
    /// Decision points in the body, nested definitions excluded
    pub branch_count: u32,
    /// Attributes read or written through `self`
    pub self_attributes: BTreeSet<String>,
    pub node: Node<'tree>,
    pub body: Node<'tree>,
}

impl FunctionInfo<'_> {
    /// Parameters a caller must supply, receivers excluded.
    pub fn inputs(&self) -> impl Iterator<Item = &ParameterInfo> {
        self.parameters.iter().filter(|p| !p.is_receiver())
    }

    pub fn parameter_count(&self) -> usize {
        self.inputs().count()
    }

    pub fn is_method(&self) -> bool {
        self.class_name.is_some()
    }

    /// Leading underscore, dunder methods excluded.
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_') && !(self.name.starts_with("__") && self.name.ends_with("__"))
    }

    pub fn is_static(&self) -> bool {
        self.decorators.iter().any(|d| d == "staticmethod")
    }

    pub fn is_nested(&self) -> bool {
        self.qualified_name.matches('.').count() > usize::from(self.is_method())
    }
}

/// A class definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub bases: Vec<String>,
    pub span: LineRange,
    /// Method names in definition order
    pub methods: Vec<String>,
    /// Attributes assigned through `self` or at class level
    pub attributes: BTreeSet<String>,
    /// `self` attributes used per method, in method order
    pub method_attribute_usage: Vec<BTreeSet<String>>,
}

/// One `import` / `from ... import` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportInfo {
    pub module: String,
    /// Names bound in the importing scope
    pub bindings: Vec<String>,
    pub line: usize,
}

/// Everything extracted from one unit in a single pass.
#[derive(Debug, Clone)]
pub struct UnitStructure<'tree> {
    /// Functions in source order (outer before nested)
    pub functions: Vec<FunctionInfo<'tree>>,
    pub classes: Vec<ClassInfo>,
    pub imports: Vec<ImportInfo>,
}

impl UnitStructure<'_> {
    /// Distinct imported modules.
    pub fn imported_modules(&self) -> BTreeSet<&str> {
        self.imports.iter().map(|i| i.module.as_str()).collect()
    }

    /// Distinct names bound by imports.
    pub fn imported_bindings(&self) -> BTreeSet<&str> {
        self.imports
            .iter()
            .flat_map(|i| i.bindings.iter().map(String::as_str))
            .collect()
    }

    pub fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.iter().find(|c| c.name == name)
    }
}
