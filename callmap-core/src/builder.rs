//! Builder pattern API for callmap analysis.
//!
//! Provides a fluent interface for configuring and running a batch analysis:
//!
//! ```rust,ignore
//! use callmap_core::prelude::*;
//!
//! let run = Callmap::new(["src/app.js", "web/"])
//!     .dead_code(DeadCodePolicy::UnreachableFromRoots)
//!     .allow(["map"])
//!     .analyze()?;
//!
//! for file in run.succeeded() {
//!     println!("{}: {} dead", file.0.display(), file.1.dead.len());
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::callgraph::{analyze_files_parallel, Analysis, Denylist, FileAnalysis};
use crate::config::{AnalysisConfig, DeadCodePolicy, DuplicatePolicy};
use crate::error::CallmapError;
use crate::scan::{collect_inputs, gather_source_files_with_excludes};

/// Builder for configuring a callmap run over files and directories.
#[derive(Debug, Clone)]
pub struct Callmap {
    /// Files and directories to analyze
    inputs: Vec<PathBuf>,

    /// Analysis settings passed to every file
    config: AnalysisConfig,

    /// Extra directory names to skip while walking
    excluded_dirs: Vec<String>,
}

impl Callmap {
    /// Create a new builder for the given inputs.
    pub fn new(inputs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            config: AnalysisConfig::default(),
            excluded_dirs: Vec::new(),
        }
    }

    /// Replace all analysis settings at once.
    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Choose how the dead set is derived.
    pub fn dead_code(mut self, policy: DeadCodePolicy) -> Self {
        self.config.dead_code = policy;
        self
    }

    /// Fail files that define two functions with the same name.
    pub fn reject_duplicates(mut self, enabled: bool) -> Self {
        self.config.duplicates = if enabled {
            DuplicatePolicy::Reject
        } else {
            DuplicatePolicy::LastWriterWins
        };
        self
    }

    /// Use a different denylist.
    pub fn denylist(mut self, denylist: Denylist) -> Self {
        self.config.denylist = denylist;
        self
    }

    /// Remove names from the current denylist.
    pub fn allow(mut self, names: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.config.denylist = self.config.denylist.without(names);
        self
    }

    /// Add directories to exclude from scanning.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// The settings every file is analyzed with.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Expand inputs into the sorted list of files to analyze.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        if self.excluded_dirs.is_empty() {
            return collect_inputs(&self.inputs);
        }

        let excludes: Vec<&str> = self.excluded_dirs.iter().map(String::as_str).collect();
        let mut files = Vec::new();
        for input in &self.inputs {
            if input.is_dir() {
                files.extend(gather_source_files_with_excludes(input, &excludes)?);
            } else {
                files.extend(collect_inputs(std::slice::from_ref(input))?);
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Run the analysis and return per-file results.
    pub fn analyze(&self) -> Result<CallmapRun> {
        let files = self.files().context("Failed to collect input files")?;
        tracing::info!(files = files.len(), "starting analysis");

        let results = analyze_files_parallel(&files, &self.config);
        Ok(CallmapRun { files: results })
    }

    /// Remove the named functions from one file's text (file is not written).
    #[cfg(feature = "rewrite")]
    pub fn rewrite_file<S: AsRef<str>>(
        &self,
        path: &Path,
        names: &[S],
    ) -> crate::error::CallmapResult<crate::rewrite::RewriteResult> {
        use crate::error::IoResultExt;

        let source = std::fs::read_to_string(path).with_path(path)?;
        let tree = crate::parse::parse_source(&source)?;
        let analysis = crate::callgraph::analyze_tree(&tree, &self.config)?;
        crate::rewrite::remove_functions(&tree, &analysis.catalog, names)
    }
}

/// Result of a batch run.
#[derive(Debug)]
pub struct CallmapRun {
    /// One entry per input file, in sorted path order
    pub files: Vec<FileAnalysis>,
}

impl CallmapRun {
    /// Files that analyzed cleanly.
    pub fn succeeded(&self) -> impl Iterator<Item = (&Path, &Analysis)> {
        self.files
            .iter()
            .filter_map(|f| f.result.as_ref().ok().map(|a| (f.path.as_path(), a)))
    }

    /// Files that failed, with their error.
    pub fn failed(&self) -> impl Iterator<Item = (&Path, &CallmapError)> {
        self.files
            .iter()
            .filter_map(|f| f.result.as_ref().err().map(|e| (f.path.as_path(), e)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    /// First failure that is not specific to its file, such as a grammar
    /// that could not be loaded. Reports from such a run are not trustworthy.
    pub fn fatal(&self) -> Option<(&Path, &CallmapError)> {
        self.failed().find(|(_, err)| !err.is_recoverable())
    }

    /// Total catalogued functions across successful files.
    pub fn total_functions(&self) -> usize {
        self.succeeded().map(|(_, a)| a.catalog.len()).sum()
    }
}
