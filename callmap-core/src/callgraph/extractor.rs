//! Function catalog construction.
//!
//! Registers every function-like construct that has a stable name:
//! - Function declarations: `function foo() {}` and `function* gen() {}`
//! - Variables bound to an anonymous function: `const f = () => {}`,
//!   `var g = function () {}`, `let h = function* () {}`
//!
//! Anonymous functions that are not bound to a variable (inline callbacks,
//! IIFEs, `export default function () {}`) are not catalogued, and neither are
//! named function expressions or class/object methods. A binding that is not a
//! plain identifier (destructuring) is skipped silently.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tree_sitter::Node;

use super::extent::line_extent;
use crate::config::DuplicatePolicy;
use crate::error::{CallmapError, CallmapResult};
use crate::parse::{SyntaxRef, SyntaxTree};

/// Syntactic form a catalogued function was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    /// `function foo() {}`
    Declaration,
    /// `function* foo() {}` or `const foo = function* () {}`
    Generator,
    /// `const foo = function () {}`
    Expression,
    /// `const foo = () => {}`
    Arrow,
}

/// A catalogued function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Declared identifier, or the bound variable's identifier
    pub name: String,
    /// Line the function starts on (1-indexed)
    pub defining_line: usize,
    /// Non-blank lines in the function's span (always >= 1)
    pub line_count: usize,
    pub kind: FunctionKind,
    /// The declaration node, or the initializer expression for bound functions
    pub node: SyntaxRef,
}

/// Name-keyed table of catalogued functions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    records: BTreeMap<String, FunctionRecord>,
}

impl Catalog {
    pub fn get(&self, name: &str) -> Option<&FunctionRecord> {
        self.records.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Catalogued names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Records in name order.
    pub fn records(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.records.values()
    }
}

/// True for node kinds that introduce a function scope.
///
/// Methods are included so that calls inside them are attributed to the
/// method (which is never catalogued) rather than to an outer function.
pub fn is_function_like(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "generator_function_declaration"
            | "function_expression"
            | "function"
            | "generator_function"
            | "arrow_function"
            | "method_definition"
    )
}

/// Name under which a function-like node would be catalogued, if any.
///
/// Declarations use their own identifier; an anonymous function or arrow that
/// is the initializer of a `variable_declarator` uses the declarator's
/// identifier. Everything else has no catalog name.
pub fn catalog_name<'t>(tree: &'t SyntaxTree, func: &Node<'t>) -> Option<(&'t str, FunctionKind)> {
    match func.kind() {
        "function_declaration" => {
            let name = func.child_by_field_name("name")?;
            Some((tree.text(&name), FunctionKind::Declaration))
        }
        "generator_function_declaration" => {
            let name = func.child_by_field_name("name")?;
            Some((tree.text(&name), FunctionKind::Generator))
        }
        "function_expression" | "function" | "generator_function" | "arrow_function" => {
            let kind = match func.kind() {
                "arrow_function" => FunctionKind::Arrow,
                "generator_function" => FunctionKind::Generator,
                _ => FunctionKind::Expression,
            };
            // A function expression with its own name is not bound anonymously
            if kind != FunctionKind::Arrow && func.child_by_field_name("name").is_some() {
                return None;
            }
            let declarator = func.parent()?;
            if declarator.kind() != "variable_declarator" {
                return None;
            }
            let value = declarator.child_by_field_name("value")?;
            if value.id() != func.id() {
                return None;
            }
            let binding = declarator.child_by_field_name("name")?;
            if binding.kind() != "identifier" {
                return None;
            }
            Some((tree.text(&binding), kind))
        }
        _ => None,
    }
}

/// Walks the tree once and builds the catalog.
struct CatalogBuilder<'t> {
    tree: &'t SyntaxTree,
    policy: DuplicatePolicy,
    records: BTreeMap<String, FunctionRecord>,
    conflict: Option<CallmapError>,
}

impl<'t> CatalogBuilder<'t> {
    fn new(tree: &'t SyntaxTree, policy: DuplicatePolicy) -> Self {
        Self {
            tree,
            policy,
            records: BTreeMap::new(),
            conflict: None,
        }
    }

    fn visit(&mut self, node: Node<'t>) {
        if self.conflict.is_some() || !node.is_named() || !is_function_like(node.kind()) {
            return;
        }
        let Some((name, kind)) = catalog_name(self.tree, &node) else {
            return;
        };

        let span = self.tree.syntax_ref(&node);
        let record = FunctionRecord {
            name: name.to_string(),
            defining_line: span.start_line,
            line_count: line_extent(self.tree.source(), &span).max(1),
            kind,
            node: span,
        };

        if let Some(previous) = self.records.get(name) {
            match self.policy {
                DuplicatePolicy::Reject => {
                    self.conflict = Some(CallmapError::DuplicateName {
                        name: name.to_string(),
                        first_line: previous.defining_line,
                        second_line: record.defining_line,
                    });
                    return;
                }
                DuplicatePolicy::LastWriterWins => {
                    tracing::debug!(
                        name = %name,
                        replaced_line = previous.defining_line,
                        line = record.defining_line,
                        "duplicate function name, keeping later definition"
                    );
                }
            }
        }

        self.records.insert(name.to_string(), record);
    }

    fn finish(self) -> CallmapResult<Catalog> {
        match self.conflict {
            Some(err) => Err(err),
            None => Ok(Catalog {
                records: self.records,
            }),
        }
    }
}

/// Build the function catalog for a parsed source file.
pub fn build_catalog(tree: &SyntaxTree, policy: DuplicatePolicy) -> CallmapResult<Catalog> {
    let mut builder = CatalogBuilder::new(tree, policy);
    tree.for_each_node(|node| builder.visit(node));
    let catalog = builder.finish()?;
    tracing::debug!(functions = catalog.len(), "catalog pass complete");
    Ok(catalog)
}
