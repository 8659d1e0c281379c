//! Syntax tree construction for JavaScript-family sources.
//!
//! Sources are parsed with the tree-sitter TSX grammar, a superset that accepts
//! plain JavaScript together with type annotations, JSX markup, decorators and
//! optional chaining. tree-sitter recovers from syntax errors on its own, so the
//! builder rejects any tree containing an `ERROR` or `MISSING` node instead of
//! handing a partial tree to later stages.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{CallmapError, CallmapResult};

/// Longest source excerpt quoted in a parse error message.
const MAX_EXCERPT_CHARS: usize = 24;

/// Opaque, position-based reference to a node of a [`SyntaxTree`].
///
/// Unlike a `tree_sitter::Node` it owns no borrow of the tree, and unlike a
/// node id it does not depend on memory addresses, so two parses of the same
/// text produce equal references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SyntaxRef {
    pub start_byte: usize,
    pub end_byte: usize,
    /// First line of the node (1-indexed)
    pub start_line: usize,
    /// Last line of the node (1-indexed, inclusive)
    pub end_line: usize,
}

impl SyntaxRef {
    /// Byte range of the referenced node in the source text.
    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte..self.end_byte
    }

    /// Number of source lines the node touches.
    pub fn line_span(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// A parsed source file: the text together with its syntax tree.
pub struct SyntaxTree {
    source: String,
    tree: Tree,
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("bytes", &self.source.len())
            .field("root", &self.tree.root_node().kind())
            .finish()
    }
}

impl SyntaxTree {
    /// The source text the tree was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root node (`program`).
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by a node.
    pub fn text(&self, node: &Node<'_>) -> &str {
        node_text(node, &self.source)
    }

    /// Build the opaque reference for a node.
    pub fn syntax_ref(&self, node: &Node<'_>) -> SyntaxRef {
        SyntaxRef {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start_line(node),
            end_line: end_line(node),
        }
    }

    /// Resolve a reference back to the node it was taken from.
    ///
    /// Returns the smallest node covering exactly the referenced byte range.
    pub fn resolve(&self, r: &SyntaxRef) -> Option<Node<'_>> {
        let mut node = self
            .root()
            .descendant_for_byte_range(r.start_byte, r.end_byte)?;
        while node.byte_range() != r.byte_range() {
            node = node.parent()?;
        }
        Some(node)
    }

    /// Visit every node of the tree in document (pre-)order.
    pub fn for_each_node<'t>(&'t self, visit: impl FnMut(Node<'t>)) {
        walk_preorder(self.tree.root_node(), visit);
    }
}

/// Reusable parser configured with the permissive TSX grammar.
pub struct SourceParser {
    parser: Parser,
}

impl SourceParser {
    pub fn new() -> CallmapResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())
            .map_err(|e| CallmapError::internal(format!("failed to load TSX grammar: {}", e)))?;
        Ok(Self { parser })
    }

    /// Parse source text, failing on the first syntax error.
    pub fn parse(&mut self, source: &str) -> CallmapResult<SyntaxTree> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| CallmapError::internal("tree-sitter returned no tree"))?;

        if tree.root_node().has_error() {
            return Err(first_syntax_error(tree.root_node(), source));
        }

        Ok(SyntaxTree {
            source: source.to_string(),
            tree,
        })
    }
}

/// Parse source text into a [`SyntaxTree`].
pub fn parse_source(source: &str) -> CallmapResult<SyntaxTree> {
    let tree = SourceParser::new()?.parse(source)?;
    tracing::debug!(bytes = source.len(), "parsed source");
    Ok(tree)
}

/// Get text for a tree-sitter node.
pub fn node_text<'a>(node: &Node<'_>, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// First line of a node (1-indexed).
pub fn start_line(node: &Node<'_>) -> usize {
    node.start_position().row + 1
}

/// Last line of a node (1-indexed, inclusive).
///
/// A node whose end position sits at column 0 of a later row stops before
/// that row's first character, so that row is not counted.
pub fn end_line(node: &Node<'_>) -> usize {
    let start = node.start_position();
    let end = node.end_position();
    if end.column == 0 && end.row > start.row {
        end.row
    } else {
        end.row + 1
    }
}

/// Iterative pre-order walk using a tree cursor (no recursion depth limit).
fn walk_preorder<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Locate the first `ERROR`/`MISSING` node in document order.
fn first_syntax_error(root: Node<'_>, source: &str) -> CallmapError {
    let mut found: Option<Node<'_>> = None;
    walk_preorder(root, |node| {
        if found.is_none() && (node.is_error() || node.is_missing()) {
            found = Some(node);
        }
    });

    let Some(node) = found else {
        let pos = root.start_position();
        return CallmapError::parse_at("syntax error", pos.row + 1, pos.column + 1);
    };

    let pos = node.start_position();
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        let excerpt: String = node_text(&node, source)
            .chars()
            .take(MAX_EXCERPT_CHARS)
            .collect();
        if excerpt.trim().is_empty() {
            "unexpected end of input".to_string()
        } else {
            format!("unexpected `{}`", excerpt.trim())
        }
    };

    CallmapError::parse_at(message, pos.row + 1, pos.column + 1)
}
