//! Graphviz DOT generation for function call graphs.
//!
//! Built from an [`ExportGraph`] with a pre-allocated buffer and the
//! `std::fmt::Write` trait.

use crate::callgraph::{ExportGraph, ExportNode};
use std::fmt::Write;

/// Escape a label for use inside a double-quoted DOT string.
///
/// Newlines become the `\n` escape Graphviz centers lines with.
pub fn escape_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len() + 8);
    for c in label.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Generate a Graphviz DOT representation of the call graph.
///
/// - every caller is a node labeled with name, line count and defining line
/// - callee-only functions appear through their edges, with the same label
/// - roots that call something are highlighted (gold)
pub fn generate_dot(graph: &ExportGraph) -> String {
    // ~90 bytes/node + ~120 bytes/edge + header/footer
    let estimated_capacity =
        (graph.nodes.len() + graph.isolated.len()) * 90 + graph.edges.len() * 120 + 200;
    let mut dot = String::with_capacity(estimated_capacity);

    if let Err(e) = write_dot_content(&mut dot, graph) {
        tracing::error!(error = %e, "failed to generate DOT text");
        return "digraph callmap {\n}\n".to_string();
    }

    dot
}

/// Node ids are the full labels, so edges and node statements line up.
fn write_node(dot: &mut String, node: &ExportNode, attrs: &str) -> std::fmt::Result {
    writeln!(dot, "  \"{}\"{};", escape_label(&node.label), attrs)
}

fn write_dot_content(dot: &mut String, graph: &ExportGraph) -> std::fmt::Result {
    writeln!(dot, "digraph callmap {{")?;
    writeln!(dot, "  rankdir=LR;")?;
    writeln!(
        dot,
        "  node [shape=box, style=filled, fillcolor=lightblue, fontname=\"JetBrains Mono\"];"
    )?;
    writeln!(dot)?;

    for node in &graph.nodes {
        write_node(dot, node, "")?;
    }

    if !graph.isolated.is_empty() {
        writeln!(dot)?;
        for node in &graph.isolated {
            write_node(dot, node, " [fillcolor=gold]")?;
        }
    }

    writeln!(dot)?;
    for edge in &graph.edges {
        writeln!(
            dot,
            "  \"{}\" -> \"{}\";",
            escape_label(&edge.from_label),
            escape_label(&edge.to_label)
        )?;
    }

    writeln!(dot, "}}")?;
    Ok(())
}
