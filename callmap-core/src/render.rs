//! Turning DOT text into an image with an external Graphviz renderer.
//!
//! Every external step runs at most once: one PATH probe, one optional
//! install attempt when the probe fails, one render. Each outcome comes back
//! as a [`RenderOutcome`] value and is logged; nothing here is fatal to an
//! analysis that already finished.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::RenderConfig;
use crate::error::CallmapError;

/// What happened to the install step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallAttempt {
    /// The renderer was already on PATH.
    NotNeeded,
    /// No install command is configured.
    Skipped,
    /// The install command ran and the renderer is now on PATH.
    Succeeded,
    /// The install command failed or the renderer is still missing.
    Failed(String),
}

/// Result of a render request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Rendering is turned off in the configuration.
    Disabled,
    /// The image was written.
    Rendered { output: PathBuf, install: InstallAttempt },
    /// The renderer could not be found (or installed).
    Unavailable { program: String, install: InstallAttempt },
    /// The renderer ran and failed.
    Failed { message: String },
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }

    /// The failure as an error value, if this outcome is one.
    pub fn to_error(&self) -> Option<CallmapError> {
        match self {
            Self::Disabled | Self::Rendered { .. } => None,
            Self::Unavailable { program, install } => Some(CallmapError::render(format!(
                "renderer `{}` not available (install: {:?})",
                program, install
            ))),
            Self::Failed { message } => Some(CallmapError::render(message.clone())),
        }
    }
}

/// External renderer driven by a [`RenderConfig`].
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Output format, e.g. `png`.
    pub fn format(&self) -> &str {
        self.config.format()
    }

    /// Look the renderer program up on PATH.
    pub fn probe(&self) -> Option<PathBuf> {
        which::which(self.config.program()).ok()
    }

    /// Run the configured install command once, then probe again.
    pub fn install(&self) -> InstallAttempt {
        let Some((cmd, args)) = self
            .config
            .install_command
            .as_deref()
            .and_then(|c| c.split_first())
        else {
            tracing::warn!(
                program = %self.config.program(),
                "renderer not found and no install command configured"
            );
            return InstallAttempt::Skipped;
        };

        tracing::info!(command = %cmd, "attempting renderer install");
        match Command::new(cmd).args(args).status() {
            Ok(status) if status.success() => {
                if self.probe().is_some() {
                    InstallAttempt::Succeeded
                } else {
                    InstallAttempt::Failed(format!(
                        "`{}` still not on PATH after install",
                        self.config.program()
                    ))
                }
            }
            Ok(status) => InstallAttempt::Failed(format!("install command exited with {}", status)),
            Err(e) => InstallAttempt::Failed(format!("failed to run `{}`: {}", cmd, e)),
        }
    }

    /// Render `dot_path` into `output`.
    pub fn render(&self, dot_path: &Path, output: &Path) -> RenderOutcome {
        if !self.config.is_enabled() {
            return RenderOutcome::Disabled;
        }

        let (program, install) = match self.probe() {
            Some(program) => (program, InstallAttempt::NotNeeded),
            None => {
                let install = self.install();
                match (&install, self.probe()) {
                    (InstallAttempt::Succeeded, Some(program)) => (program, install),
                    _ => {
                        let outcome = RenderOutcome::Unavailable {
                            program: self.config.program().to_string(),
                            install,
                        };
                        tracing::warn!(outcome = ?outcome, "rendering skipped");
                        return outcome;
                    }
                }
            }
        };

        let result = Command::new(&program)
            .arg(format!("-T{}", self.config.format()))
            .arg(dot_path)
            .arg("-o")
            .arg(output)
            .output();

        let outcome = match result {
            Ok(out) if out.status.success() && output.exists() => RenderOutcome::Rendered {
                output: output.to_path_buf(),
                install,
            },
            Ok(out) if out.status.success() => RenderOutcome::Failed {
                message: format!("renderer produced no file at {}", output.display()),
            },
            Ok(out) => RenderOutcome::Failed {
                message: format!(
                    "renderer exited with {}: {}",
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            },
            Err(e) => RenderOutcome::Failed {
                message: format!("failed to run {}: {}", program.display(), e),
            },
        };

        match &outcome {
            RenderOutcome::Rendered { output, .. } => {
                tracing::info!(output = %output.display(), "rendered call graph");
            }
            other => tracing::warn!(outcome = ?other, "rendering failed"),
        }
        outcome
    }
}

/// Render a DOT file with the given settings.
pub fn render_dot_file(config: &RenderConfig, dot_path: &Path, output: &Path) -> RenderOutcome {
    Renderer::new(config.clone()).render(dot_path, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_PROGRAM: &str = "callmap-no-such-renderer";

    fn missing_renderer() -> RenderConfig {
        RenderConfig {
            program: Some(MISSING_PROGRAM.to_string()),
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_disabled() {
        let cfg = RenderConfig {
            enabled: Some(false),
            ..RenderConfig::default()
        };
        let outcome = render_dot_file(&cfg, Path::new("in.dot"), Path::new("out.png"));
        assert_eq!(outcome, RenderOutcome::Disabled);
        assert!(outcome.to_error().is_none());
    }

    #[test]
    fn test_missing_renderer_without_install_command() {
        let outcome =
            render_dot_file(&missing_renderer(), Path::new("in.dot"), Path::new("out.png"));
        assert_eq!(
            outcome,
            RenderOutcome::Unavailable {
                program: MISSING_PROGRAM.to_string(),
                install: InstallAttempt::Skipped,
            }
        );
        assert!(matches!(outcome.to_error(), Some(CallmapError::Render { .. })));
    }

    #[test]
    fn test_install_command_that_cannot_run() {
        let cfg = RenderConfig {
            install_command: Some(vec!["callmap-no-such-installer".to_string()]),
            ..missing_renderer()
        };
        let renderer = Renderer::new(cfg);
        assert!(renderer.probe().is_none());
        assert!(matches!(renderer.install(), InstallAttempt::Failed(_)));
    }

    #[test]
    fn test_defaults() {
        let renderer = Renderer::default();
        assert_eq!(renderer.format(), "png");
        assert!(!RenderOutcome::Disabled.is_rendered());
    }
}
