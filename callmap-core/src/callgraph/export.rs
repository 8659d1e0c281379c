//! Generic node/edge export of an analysis.
//!
//! The export keeps only functions that take part in at least one call as the
//! caller. A function with no outgoing edges never gets a node of its own; it
//! only shows up as the target of an edge. Roots that do have outgoing edges
//! are listed again under `isolated` so a renderer can highlight them.
//! Functions with neither incoming nor outgoing edges are omitted entirely.

use serde::Serialize;
use std::collections::BTreeSet;

use super::extractor::{Catalog, FunctionRecord};
use super::usage::CallRelation;

/// A labeled function node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportNode {
    pub name: String,
    pub label: String,
}

/// A labeled caller -> callee edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportEdge {
    pub from: String,
    pub to: String,
    pub from_label: String,
    pub to_label: String,
}

/// Renderer-agnostic view of the call graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportGraph {
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
    pub isolated: Vec<ExportNode>,
}

impl ExportGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.isolated.is_empty()
    }
}

/// Three-line label: name, non-blank line count, defining line.
pub fn function_label(record: &FunctionRecord) -> String {
    format!(
        "{}\n{} lines\nline {}",
        record.name, record.line_count, record.defining_line
    )
}

fn node_for(catalog: &Catalog, name: &str) -> Option<ExportNode> {
    catalog.get(name).map(|record| ExportNode {
        name: name.to_string(),
        label: function_label(record),
    })
}

/// Build the export structure. Node, edge and isolated lists are sorted by name.
pub fn export_graph(
    catalog: &Catalog,
    relation: &CallRelation,
    roots: &BTreeSet<String>,
) -> ExportGraph {
    let mut graph = ExportGraph::default();

    for (caller, callees) in relation {
        if callees.is_empty() {
            continue;
        }
        let Some(from) = node_for(catalog, caller) else {
            continue;
        };

        for callee in callees {
            if let Some(to) = node_for(catalog, callee) {
                graph.edges.push(ExportEdge {
                    from: from.name.clone(),
                    to: to.name,
                    from_label: from.label.clone(),
                    to_label: to.label,
                });
            }
        }

        if roots.contains(caller) {
            graph.isolated.push(from.clone());
        }
        graph.nodes.push(from);
    }

    tracing::debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        isolated = graph.isolated.len(),
        "export built"
    );

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callgraph::analyze;

    #[test]
    fn test_label_format() {
        let analysis = analyze("\nfunction a() {\n  b();\n}\nfunction b() {}").unwrap();
        let label = function_label(analysis.catalog.get("a").unwrap());
        assert_eq!(label, "a\n3 lines\nline 2");
    }

    #[test]
    fn test_simple_chain() {
        let analysis = analyze("function a(){ b(); }\nfunction b(){ console.log(1); }").unwrap();
        let graph = analysis.export();

        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].name, "a");
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].from, "a");
        assert_eq!(graph.edges[0].to, "b");
        assert_eq!(graph.edges[0].to_label, "b\n1 lines\nline 2");
        assert_eq!(graph.isolated.len(), 1);
        assert_eq!(graph.isolated[0].name, "a");
    }

    #[test]
    fn test_functions_without_edges_omitted() {
        let analysis = analyze("function lonely() {}\nfunction other() {}").unwrap();
        let graph = analysis.export();
        assert!(graph.is_empty());
    }

    #[test]
    fn test_cycle_has_no_isolated_roots() {
        let analysis = analyze("function x(){ y(); }\nfunction y(){ x(); }").unwrap();
        let graph = analysis.export();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 2);
        assert!(graph.isolated.is_empty());
    }

    #[test]
    fn test_sorted_output() {
        let src = "function main(){ zeta(); alpha(); }\nfunction zeta(){}\nfunction alpha(){}";
        let graph = analyze(src).unwrap().export();
        let targets: Vec<_> = graph.edges.iter().map(|e| e.to.as_str()).collect();
        assert_eq!(targets, vec!["alpha", "zeta"]);
    }
}
