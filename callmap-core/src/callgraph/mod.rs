//! Function call graph analysis for a single source file.
//!
//! The pipeline runs strictly forward, each stage consuming the immutable
//! output of the previous one:
//!
//! ```text
//! source text
//!     │  parse.rs        tree-sitter (TSX grammar)
//!     ▼
//! SyntaxTree
//!     │  extractor.rs    pass 1: name -> FunctionRecord (extent.rs for line counts)
//!     ▼
//! Catalog
//!     │  usage.rs        pass 2: caller -> {callee}, denylist.rs filters built-ins
//!     ▼
//! CallRelation
//!     │  graph.rs        roots, dead set, statistics
//!     ▼
//! Analysis ──► export.rs  labeled nodes/edges for renderers
//! ```
//!
//! # Example
//!
//! ```ignore
//! use callmap_core::callgraph::analyze;
//!
//! let analysis = analyze("function a(){ b(); }\nfunction b(){}")?;
//! assert!(analysis.roots.contains("a"));
//! for edge in analysis.export().edges {
//!     println!("{} -> {}", edge.from, edge.to);
//! }
//! ```

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub mod denylist;
pub mod export;
pub mod extent;
pub mod extractor;
pub mod graph;
pub mod usage;

pub use denylist::Denylist;
pub use export::{export_graph, function_label, ExportEdge, ExportGraph, ExportNode};
pub use extent::{count_non_blank_lines, line_extent};
pub use extractor::{build_catalog, Catalog, FunctionKind, FunctionRecord};
pub use graph::{analyze_graph, find_dead, find_roots, CallGraphStats, GraphAnalysis};
pub use usage::{
    callee_name, extract_call_usages, resolve_call, CallRelation, CallUsageResult, DropReason,
    ResolutionStats,
};

use crate::config::AnalysisConfig;
use crate::error::{CallmapResult, IoResultExt};
use crate::parse::{parse_source, SyntaxTree};

/// Result of analyzing one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub catalog: Catalog,
    pub relation: CallRelation,
    pub roots: BTreeSet<String>,
    pub dead: BTreeSet<String>,
    pub stats: CallGraphStats,
}

impl Analysis {
    /// Labeled node/edge view for renderers.
    pub fn export(&self) -> ExportGraph {
        export_graph(&self.catalog, &self.relation, &self.roots)
    }

    /// Roots that call at least one catalogued function.
    pub fn roots_with_calls(&self) -> impl Iterator<Item = &str> {
        self.roots
            .iter()
            .filter(|name| self.relation.get(*name).is_some_and(|c| !c.is_empty()))
            .map(String::as_str)
    }
}

/// Analyze source text with the default configuration.
pub fn analyze(source: &str) -> CallmapResult<Analysis> {
    analyze_with(source, &AnalysisConfig::default())
}

/// Analyze source text with explicit settings.
pub fn analyze_with(source: &str, config: &AnalysisConfig) -> CallmapResult<Analysis> {
    let tree = parse_source(source)?;
    analyze_tree(&tree, config)
}

/// Run the catalog, resolution and graph passes over an already parsed tree.
pub fn analyze_tree(tree: &SyntaxTree, config: &AnalysisConfig) -> CallmapResult<Analysis> {
    let catalog = build_catalog(tree, config.duplicates)?;
    let usages = extract_call_usages(tree, &catalog, &config.denylist);
    let graph = analyze_graph(&catalog, &usages.relation, config.dead_code);

    Ok(Analysis {
        catalog,
        relation: usages.relation,
        roots: graph.roots,
        dead: graph.dead,
        stats: graph.stats,
    })
}

/// Analysis outcome for one file of a batch.
#[derive(Debug)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub result: CallmapResult<Analysis>,
}

/// Read and analyze a single file.
pub fn analyze_file(path: &Path, config: &AnalysisConfig) -> CallmapResult<Analysis> {
    let source = fs::read_to_string(path).with_path(path)?;
    analyze_with(&source, config)
}

/// Analyze many files independently in parallel.
///
/// Every file gets its own outcome; a failure in one file never affects the
/// others. Results come back in input order.
pub fn analyze_files_parallel(files: &[PathBuf], config: &AnalysisConfig) -> Vec<FileAnalysis> {
    files
        .par_iter()
        .map(|path| {
            let result = analyze_file(path, config);
            if let Err(e) = &result {
                tracing::warn!(path = %path.display(), error = %e, "analysis failed");
            }
            FileAnalysis {
                path: path.clone(),
                result,
            }
        })
        .collect()
}
