//! callmap-core: call graph and dead function analysis for JavaScript-family
//! source files.
//!
//! One source file (JavaScript, TypeScript, JSX or TSX) goes in; out comes the
//! catalog of its named functions with line counts, the caller -> callee
//! relation between them, the root functions nobody calls, and the dead set.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use callmap_core::prelude::*;
//!
//! let analysis = analyze("function a(){ b(); }\nfunction b(){}")?;
//! assert_eq!(analysis.roots.iter().next().map(String::as_str), Some("a"));
//! print_plain(&analysis);
//! ```
//!
//! # Module Organization
//!
//! - [`parse`]: tree-sitter syntax tree construction
//! - [`callgraph`]: catalog, line extents, call resolution, roots/dead, export
//! - [`visualize`]: Graphviz DOT text from the export structure
//! - [`report`]: plain text and JSON console reports
//! - [`scan`]: parallel source file discovery
//! - [`builder`]: fluent batch API
//! - [`config`]: analysis settings and `callmap.toml`
//! - [`error`]: typed error handling
//!
//! # Cargo Features
//!
//! - `rewrite` (default): remove named functions from a copy of the source
//! - `render` (default): invoke Graphviz to render DOT into an image
//! - `full`: enable all optional features

pub mod builder;
pub mod callgraph;
pub mod config;
pub mod error;
pub mod logging;
pub mod parse;
pub mod prelude;
pub mod report;
pub mod scan;
pub mod visualize;

#[cfg(feature = "render")]
pub mod render;

#[cfg(feature = "rewrite")]
pub mod rewrite;

// ============================================================================
// Explicit Re-exports
// ============================================================================

// Error types
pub use error::{CallmapError, CallmapResult, IoResultExt};

// Builder API
pub use builder::{Callmap, CallmapRun};

// Configuration
pub use config::{
    load_config, load_config_file, AnalysisConfig, CallmapConfig, DeadCodePolicy,
    DuplicatePolicy, OutputConfig, RenderConfig, CONFIG_FILE_NAME,
};

// Analysis
pub use callgraph::{
    analyze, analyze_file, analyze_files_parallel, analyze_tree, analyze_with, Analysis,
    CallGraphStats, CallRelation, Catalog, Denylist, ExportEdge, ExportGraph, ExportNode,
    FileAnalysis, FunctionKind, FunctionRecord,
};

// Logging
pub use logging::init_structured_logging;

// Parsing
pub use parse::{parse_source, SourceParser, SyntaxRef, SyntaxTree};

// Reporting
pub use report::{format_plain, print_json, print_plain, report_json};

// File scanning
pub use scan::{collect_inputs, gather_source_files, gather_source_files_with_excludes};

// DOT output
pub use visualize::generate_dot;

// Feature-gated re-exports
#[cfg(feature = "render")]
pub use render::{render_dot_file, InstallAttempt, RenderOutcome, Renderer};

#[cfg(feature = "rewrite")]
pub use rewrite::{remove_functions, RewriteResult};

#[cfg(test)]
mod tests;
