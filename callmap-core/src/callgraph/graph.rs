//! Root and dead function derivation.
//!
//! A root is a catalogued function that never appears as a callee. Under the
//! default [`DeadCodePolicy::NeverCalled`] the dead set uses the very same
//! predicate, so roots and dead functions are always set-equal. The
//! [`DeadCodePolicy::UnreachableFromRoots`] policy is a deliberate deviation
//! that marks functions no root can reach through call edges, which catches
//! cycles nothing else calls into.
//!
//! Performance characteristics:
//! - Roots: O(|F| + |E|) single pass over the relation
//! - Reachability: O(|F| + |E|) multi-source BFS over a `DiGraphMap`

use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};

use super::extractor::Catalog;
use super::usage::CallRelation;
use crate::config::DeadCodePolicy;

/// Statistics about the analyzed call graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallGraphStats {
    pub total_functions: usize,
    pub total_edges: usize,
    pub roots: usize,
    pub dead: usize,
}

/// Derived root and dead sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphAnalysis {
    pub roots: BTreeSet<String>,
    pub dead: BTreeSet<String>,
    pub stats: CallGraphStats,
}

/// Every name that appears as a callee anywhere in the relation.
fn called_names(relation: &CallRelation) -> HashSet<&str> {
    relation
        .values()
        .flat_map(|callees| callees.iter().map(String::as_str))
        .collect()
}

/// Catalogued functions that never appear as a callee.
pub fn find_roots(catalog: &Catalog, relation: &CallRelation) -> BTreeSet<String> {
    let called = called_names(relation);
    catalog
        .names()
        .filter(|name| !called.contains(name))
        .map(str::to_string)
        .collect()
}

/// Builds the call graph as a `DiGraphMap` over catalogued names.
pub fn build_graph<'a>(
    catalog: &'a Catalog,
    relation: &'a CallRelation,
) -> DiGraphMap<&'a str, ()> {
    let mut g = DiGraphMap::new();

    for name in catalog.names() {
        g.add_node(name);
    }
    for (caller, callees) in relation {
        for callee in callees {
            if catalog.contains(caller) && catalog.contains(callee) {
                g.add_edge(caller.as_str(), callee.as_str(), ());
            }
        }
    }

    g
}

/// Multi-source BFS: every node reachable from any of `roots`.
pub fn reachable_from_roots<'a>(
    g: &DiGraphMap<&'a str, ()>,
    roots: impl IntoIterator<Item = &'a str>,
) -> HashSet<&'a str> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    for root in roots {
        if g.contains_node(root) && visited.insert(root) {
            queue.push_back(root);
        }
    }

    while let Some(node) = queue.pop_front() {
        for n in g.neighbors(node) {
            if visited.insert(n) {
                queue.push_back(n);
            }
        }
    }

    visited
}

/// Dead functions under the given policy.
pub fn find_dead(
    catalog: &Catalog,
    relation: &CallRelation,
    policy: DeadCodePolicy,
) -> BTreeSet<String> {
    match policy {
        DeadCodePolicy::NeverCalled => find_roots(catalog, relation),
        DeadCodePolicy::UnreachableFromRoots => {
            let roots = find_roots(catalog, relation);
            let g = build_graph(catalog, relation);
            let reachable = reachable_from_roots(&g, roots.iter().map(String::as_str));
            catalog
                .names()
                .filter(|name| !reachable.contains(name))
                .map(str::to_string)
                .collect()
        }
    }
}

/// Derive roots, dead functions and statistics.
pub fn analyze_graph(
    catalog: &Catalog,
    relation: &CallRelation,
    policy: DeadCodePolicy,
) -> GraphAnalysis {
    let roots = find_roots(catalog, relation);
    let dead = find_dead(catalog, relation, policy);

    let stats = CallGraphStats {
        total_functions: catalog.len(),
        total_edges: relation.values().map(|callees| callees.len()).sum(),
        roots: roots.len(),
        dead: dead.len(),
    };

    tracing::debug!(
        functions = stats.total_functions,
        edges = stats.total_edges,
        roots = stats.roots,
        dead = stats.dead,
        ?policy,
        "graph analysis complete"
    );

    GraphAnalysis { roots, dead, stats }
}
