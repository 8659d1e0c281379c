//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use callmap_core::prelude::*;
//! ```

// Core analysis
pub use crate::callgraph::{analyze, analyze_with, Analysis, Catalog, Denylist, FunctionRecord};
pub use crate::error::{CallmapError, CallmapResult};

// Settings
pub use crate::config::{AnalysisConfig, DeadCodePolicy, DuplicatePolicy};

// Batch runs
pub use crate::builder::{Callmap, CallmapRun};
pub use crate::scan::gather_source_files;

// Output
pub use crate::report::{print_json, print_plain};
pub use crate::visualize::generate_dot;

#[cfg(feature = "rewrite")]
pub use crate::rewrite::{remove_functions, RewriteResult};
