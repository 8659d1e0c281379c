//! Analysis settings and configuration loading from callmap.toml.
//!
//! [`AnalysisConfig`] is the immutable value threaded through the analysis
//! passes. [`CallmapConfig`] mirrors the optional `callmap.toml` file and is
//! only read by collaborators (the CLI); the core never touches the
//! environment or the filesystem for settings.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::callgraph::Denylist;
use crate::error::{CallmapError, CallmapResult};

/// Config file name looked up next to the analyzed input.
pub const CONFIG_FILE_NAME: &str = "callmap.toml";

/// What to do when two catalogued functions share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The later definition (in document order) replaces the earlier one.
    #[default]
    LastWriterWins,
    /// Fail the analysis with `DuplicateName`.
    Reject,
}

/// How the dead set is derived from the call relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeadCodePolicy {
    /// Dead = never called by a catalogued function. Same predicate as roots.
    #[default]
    NeverCalled,
    /// Dead = not reachable from any root by following call edges.
    UnreachableFromRoots,
}

/// Settings for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub denylist: Denylist,
    pub duplicates: DuplicatePolicy,
    pub dead_code: DeadCodePolicy,
}

impl AnalysisConfig {
    pub fn with_denylist(mut self, denylist: Denylist) -> Self {
        self.denylist = denylist;
        self
    }

    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn with_dead_code(mut self, policy: DeadCodePolicy) -> Self {
        self.dead_code = policy;
        self
    }
}

/// Main configuration structure for callmap.toml.
#[derive(Debug, Deserialize, Default)]
pub struct CallmapConfig {
    /// Analysis tuning.
    pub analysis: Option<AnalysisSection>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
    /// External renderer configuration.
    pub render: Option<RenderConfig>,
    /// Function names to strip from a rewritten copy of the source.
    pub remove: Option<Vec<String>>,
}

/// `[analysis]` table.
#[derive(Debug, Deserialize, Default)]
pub struct AnalysisSection {
    pub duplicate_names: Option<DuplicatePolicy>,
    pub dead_code: Option<DeadCodePolicy>,
    /// Replaces the built-in denylist entirely.
    pub denylist: Option<Vec<String>>,
    /// Names added on top of the denylist.
    pub extra_denylist: Option<Vec<String>>,
    /// Names removed from the denylist.
    pub allow: Option<Vec<String>>,
}

/// `[output]` table.
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Directory for generated files.
    pub dir: Option<String>,
    /// Report format: "plain" or "json".
    pub format: Option<String>,
}

/// `[render]` table.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct RenderConfig {
    pub enabled: Option<bool>,
    /// Renderer executable, `dot` unless set.
    pub program: Option<String>,
    /// Image format passed as `-T<format>`, `png` unless set.
    pub format: Option<String>,
    /// Command run once when the renderer is not on PATH.
    pub install_command: Option<Vec<String>>,
}

impl RenderConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn program(&self) -> &str {
        self.program.as_deref().unwrap_or("dot")
    }

    pub fn format(&self) -> &str {
        self.format.as_deref().unwrap_or("png")
    }
}

impl CallmapConfig {
    /// Build the analysis settings described by the `[analysis]` table.
    pub fn analysis_config(&self) -> AnalysisConfig {
        let Some(section) = &self.analysis else {
            return AnalysisConfig::default();
        };

        let mut denylist = match &section.denylist {
            Some(names) => names.iter().cloned().collect(),
            None => Denylist::builtin(),
        };
        if let Some(extra) = &section.extra_denylist {
            denylist = denylist.extended(extra.iter().cloned());
        }
        if let Some(allow) = &section.allow {
            denylist = denylist.without(allow);
        }

        AnalysisConfig {
            denylist,
            duplicates: section.duplicate_names.unwrap_or_default(),
            dead_code: section.dead_code.unwrap_or_default(),
        }
    }

    /// Renderer settings, defaulted when the table is absent.
    pub fn render_config(&self) -> RenderConfig {
        self.render.clone().unwrap_or_default()
    }
}

/// Loads configuration from `dir/callmap.toml` if it exists.
pub fn load_config(dir: &Path) -> CallmapResult<Option<CallmapConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}

/// Loads configuration from an explicit file path.
pub fn load_config_file(path: &Path) -> CallmapResult<CallmapConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| CallmapError::config(path, format!("unreadable: {}", e)))?;
    toml::from_str(&content).map_err(|e| CallmapError::config(path, e.message()))
}
