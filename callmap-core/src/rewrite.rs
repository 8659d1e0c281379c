//! Removal of named functions from source text.
//!
//! Runs after analysis on the already parsed tree and finished catalog, and
//! returns new text; the analysis itself never changes the source.
//!
//! What gets cut for a catalogued function:
//! - a declaration, together with an enclosing `export`
//! - a variable-bound function whose declaration has a single declarator: the
//!   whole `const`/`let`/`var` statement (and its `export`)
//! - otherwise only the declarator and its separating comma
//!
//! Lines left holding nothing but whitespace are dropped, then runs of blank
//! lines are collapsed to a single blank line.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::sync::OnceLock;
use tree_sitter::Node;

use crate::callgraph::Catalog;
use crate::error::{CallmapError, CallmapResult};
use crate::parse::SyntaxTree;

/// Result of a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteResult {
    /// The rewritten source text.
    pub source: String,
    /// Names that were removed, sorted.
    pub removed: Vec<String>,
    /// Requested names with no catalogued function, sorted.
    pub not_found: Vec<String>,
}

impl RewriteResult {
    pub fn changed(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// Regex for runs of three or more line breaks (blank lines may hold spaces).
fn blank_run_regex() -> CallmapResult<&'static Regex> {
    static REGEX: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    REGEX
        .get_or_init(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+"))
        .as_ref()
        .map_err(|e| CallmapError::rewrite(format!("blank line pattern: {}", e)))
}

/// The node to cut for a declaration, widened to an enclosing `export`.
fn with_export<'t>(node: Node<'t>) -> Node<'t> {
    match node.parent() {
        Some(parent) if parent.kind() == "export_statement" => parent,
        _ => node,
    }
}

fn declarators<'t>(declaration: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = declaration.walk();
    declaration
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "variable_declarator")
        .collect()
}

/// Byte range of one declarator plus the comma that separates it from its
/// neighbour.
fn declarator_range(source: &str, declarator: &Node<'_>) -> Range<usize> {
    if let Some(next) = declarator.next_sibling().filter(|n| n.kind() == ",") {
        let bytes = source.as_bytes();
        let mut end = next.end_byte();
        while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
            end += 1;
        }
        return declarator.start_byte()..end;
    }
    if let Some(prev) = declarator.prev_sibling().filter(|n| n.kind() == ",") {
        return prev.start_byte()..declarator.end_byte();
    }
    declarator.byte_range()
}

/// Widen a range to whole lines when nothing else is left on them.
fn widen_to_lines(source: &str, range: Range<usize>) -> Range<usize> {
    let line_start = source[..range.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[range.end..]
        .find('\n')
        .map_or(source.len(), |i| range.end + i + 1);

    let before = &source[line_start..range.start];
    let after = &source[range.end..line_end];
    if before.trim().is_empty() && after.trim().is_empty() {
        line_start..line_end
    } else {
        range
    }
}

/// Sort ranges and merge the overlapping ones (nested removals).
fn merge_ranges(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match merged.last_mut() {
            Some(last) if r.start < last.end => last.end = last.end.max(r.end),
            _ => merged.push(r),
        }
    }
    merged
}

/// Remove the named catalogued functions from the tree's source text.
pub fn remove_functions<S: AsRef<str>>(
    tree: &SyntaxTree,
    catalog: &Catalog,
    names: &[S],
) -> CallmapResult<RewriteResult> {
    let source = tree.source();
    let requested: BTreeSet<&str> = names.iter().map(AsRef::as_ref).collect();

    let mut result = RewriteResult::default();
    let mut ranges = Vec::new();
    // declaration start byte -> (declaration, declarators to drop)
    let mut bound: BTreeMap<usize, (Node<'_>, Vec<Node<'_>>)> = BTreeMap::new();

    for name in requested {
        let Some(record) = catalog.get(name) else {
            result.not_found.push(name.to_string());
            continue;
        };
        let node = tree.resolve(&record.node).ok_or_else(|| {
            CallmapError::rewrite(format!(
                "no syntax node for `{}` at line {}",
                name, record.defining_line
            ))
        })?;

        let is_declaration = matches!(
            node.kind(),
            "function_declaration" | "generator_function_declaration"
        );
        if is_declaration {
            ranges.push(with_export(node).byte_range());
        } else {
            let declarator = node
                .parent()
                .filter(|p| p.kind() == "variable_declarator")
                .ok_or_else(|| CallmapError::rewrite(format!("`{}` is not variable-bound", name)))?;
            let declaration = declarator
                .parent()
                .ok_or_else(|| CallmapError::rewrite(format!("`{}` has no declaration", name)))?;
            bound
                .entry(declaration.start_byte())
                .or_insert_with(|| (declaration, Vec::new()))
                .1
                .push(declarator);
        }
        result.removed.push(name.to_string());
    }

    for (declaration, dropped) in bound.into_values() {
        if dropped.len() == declarators(&declaration).len() {
            ranges.push(with_export(declaration).byte_range());
        } else {
            ranges.extend(dropped.iter().map(|d| declarator_range(source, d)));
        }
    }

    let ranges = merge_ranges(
        ranges
            .into_iter()
            .map(|r| widen_to_lines(source, r))
            .collect(),
    );

    let mut text = source.to_string();
    for r in ranges.into_iter().rev() {
        text.replace_range(r, "");
    }
    if result.changed() {
        text = blank_run_regex()?.replace_all(&text, "\n\n").into_owned();
    }
    result.source = text;

    tracing::info!(
        removed = result.removed.len(),
        not_found = result.not_found.len(),
        "rewrite complete"
    );
    for name in &result.not_found {
        tracing::warn!(name = %name, "requested function not found in catalog");
    }

    Ok(result)
}
