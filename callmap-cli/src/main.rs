//! callmap CLI - call graph and dead function reporter for JavaScript and
//! TypeScript sources.
//!
//! Features:
//! - Files and directories as input (directories are walked in parallel)
//! - Plain text or JSON report on stdout
//! - Graphviz DOT file per input, rendered to an image when `dot` is available
//! - Optional pruned copy of each input with named functions removed

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use callmap_core::{
    generate_dot, init_structured_logging, load_config, load_config_file, print_json,
    print_plain, report_json, Analysis, AnalysisConfig, Callmap, CallmapConfig, CallmapError,
    CallmapResult, DeadCodePolicy, DuplicatePolicy, RenderConfig, RenderOutcome, Renderer,
};

/// `--dead-code` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DeadCodeArg {
    NeverCalled,
    UnreachableFromRoots,
}

impl From<DeadCodeArg> for DeadCodePolicy {
    fn from(arg: DeadCodeArg) -> Self {
        match arg {
            DeadCodeArg::NeverCalled => DeadCodePolicy::NeverCalled,
            DeadCodeArg::UnreachableFromRoots => DeadCodePolicy::UnreachableFromRoots,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Call graph and dead function reporter for JavaScript/TypeScript"
)]
pub struct Cli {
    /// Source files or directories to analyze
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Output the report in JSON format
    #[arg(long)]
    json: bool,

    /// Also print the Graphviz DOT text to stdout
    #[arg(long)]
    dot: bool,

    /// Directory for generated .dot, image and pruned files
    #[arg(long, value_name = "DIR")]
    out_dir: Option<String>,

    /// Do not invoke the Graphviz renderer
    #[arg(long)]
    no_render: bool,

    /// Image format for the rendered graph
    #[arg(long, value_parser = ["png", "svg", "pdf"])]
    format: Option<String>,

    /// Write a copy of each input with these functions removed
    #[arg(long, num_args = 1..)]
    remove: Vec<String>,

    /// Explicit config file (default: callmap.toml next to the first input)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// How dead functions are determined
    #[arg(long, value_enum)]
    dead_code: Option<DeadCodeArg>,

    /// Fail files that define the same function name twice
    #[arg(long)]
    reject_duplicates: bool,
}

/// Validates an output path for security issues.
///
/// Checks for:
/// - Null bytes (path injection)
/// - Path traversal (`..` components)
fn validate_output_path(path: &str) -> CallmapResult<PathBuf> {
    if path.contains('\0') {
        return Err(CallmapError::invalid_argument("Output path contains null bytes"));
    }

    let p = PathBuf::from(path);

    for component in p.components() {
        if matches!(component, std::path::Component::ParentDir) {
            return Err(CallmapError::invalid_argument(format!(
                "Path traversal (..) not allowed in output paths: {}",
                path
            )));
        }
    }

    let normalized = path.replace('\\', "/");
    if normalized.contains("/../") || normalized.starts_with("../") || normalized.ends_with("/..") {
        return Err(CallmapError::invalid_argument(format!(
            "Path traversal attempt detected: {}",
            path
        )));
    }

    Ok(p)
}

/// Directory whose `callmap.toml` applies to the given inputs.
fn config_dir(paths: &[PathBuf]) -> PathBuf {
    match paths.first() {
        Some(p) if p.is_dir() => p.clone(),
        Some(p) => p
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        None => PathBuf::from("."),
    }
}

fn load_file_config(cli: &Cli) -> CallmapResult<CallmapConfig> {
    match &cli.config {
        Some(path) => load_config_file(path),
        None => Ok(load_config(&config_dir(&cli.paths))?.unwrap_or_default()),
    }
}

/// Config file values with command-line flags applied on top.
fn analysis_settings(cli: &Cli, file: &CallmapConfig) -> AnalysisConfig {
    let mut config = file.analysis_config();
    if let Some(policy) = cli.dead_code {
        config = config.with_dead_code(policy.into());
    }
    if cli.reject_duplicates {
        config = config.with_duplicates(DuplicatePolicy::Reject);
    }
    config
}

fn render_settings(cli: &Cli, file: &CallmapConfig) -> RenderConfig {
    let mut render = file.render_config();
    if cli.no_render {
        render.enabled = Some(false);
    }
    if let Some(format) = &cli.format {
        render.format = Some(format.clone());
    }
    render
}

/// `<out_dir>/<stem><suffix>` for an input file.
fn artifact_path(out_dir: &Path, input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "callmap".to_string());
    out_dir.join(format!("{}{}", stem, suffix))
}

/// `.pruned.<ext>` suffix that keeps the input's extension.
fn pruned_suffix(input: &Path) -> String {
    match input.extension() {
        Some(ext) => format!(".pruned.{}", ext.to_string_lossy()),
        None => ".pruned".to_string(),
    }
}

/// Write the DOT file and try to render it. Failures are reported, not fatal.
fn write_graph(
    analysis: &Analysis,
    input: &Path,
    out_dir: &Path,
    renderer: &Renderer,
    print: bool,
) {
    let dot = generate_dot(&analysis.export());
    if print {
        println!("{}", dot);
    }

    let dot_path = artifact_path(out_dir, input, ".dot");
    if let Err(e) = fs::write(&dot_path, &dot) {
        eprintln!("[WARN] DOT write failed to {}: {}", dot_path.display(), e);
        return;
    }

    let image_path = artifact_path(out_dir, input, &format!(".{}", renderer.format()));
    match renderer.render(&dot_path, &image_path) {
        RenderOutcome::Rendered { output, .. } => {
            eprintln!("Graph rendered to: {}", output.display());
        }
        RenderOutcome::Disabled => {}
        other => {
            if let Some(err) = other.to_error() {
                eprintln!("[WARN] {} (DOT kept at {})", err, dot_path.display());
            }
        }
    }
}

/// Write `<stem>.pruned.<ext>` with the requested functions removed.
fn write_pruned(builder: &Callmap, input: &Path, out_dir: &Path, names: &[String]) -> Result<()> {
    let result = builder
        .rewrite_file(input, names)
        .with_context(|| format!("Failed to rewrite {}", input.display()))?;

    for name in &result.not_found {
        eprintln!("[WARN] {}: no function named `{}`", input.display(), name);
    }

    let target = artifact_path(out_dir, input, &pruned_suffix(input));
    fs::write(&target, &result.source)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    eprintln!(
        "Removed {} function(s), pruned copy at: {}",
        result.removed.len(),
        target.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] callmap internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
        std::process::exit(2);
    }));

    init_structured_logging();

    let cli = Cli::parse();

    // 1. Configuration (file, then flags)
    let file_config = load_file_config(&cli).context("Failed to load configuration")?;
    let analysis_config = analysis_settings(&cli, &file_config);
    let renderer = Renderer::new(render_settings(&cli, &file_config));
    let output = file_config.output.as_ref();
    let json = cli.json || output.and_then(|o| o.format.as_deref()) == Some("json");
    let remove: Vec<String> = if cli.remove.is_empty() {
        file_config.remove.clone().unwrap_or_default()
    } else {
        cli.remove.clone()
    };

    // 2. Output directory
    let out_dir = cli
        .out_dir
        .as_deref()
        .or_else(|| output.and_then(|o| o.dir.as_deref()))
        .unwrap_or(".");
    let out_dir = validate_output_path(out_dir)?;
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    // 3. Analysis (parallel over files)
    let builder = Callmap::new(cli.paths.clone()).with_config(analysis_config);
    let run = builder.analyze()?;
    if run.files.is_empty() {
        eprintln!("[WARN] No source files found.");
    }
    if let Some((path, err)) = run.fatal() {
        return Err(anyhow!("Analysis aborted: {}: {}", path.display(), err));
    }

    // 4. Reports
    let succeeded: Vec<(&Path, &Analysis)> = run.succeeded().collect();
    if json {
        if let [(_, analysis)] = succeeded.as_slice() {
            print_json(analysis);
        } else {
            let reports: Vec<_> = succeeded
                .iter()
                .map(|(path, analysis)| {
                    serde_json::json!({
                        "file": path.display().to_string(),
                        "report": report_json(analysis),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    } else {
        let many = run.files.len() > 1;
        for (path, analysis) in &succeeded {
            if many {
                println!("=== {} ===", path.display());
            }
            print_plain(analysis);
            if many {
                println!();
            }
        }
    }

    // 5. Artifacts
    for (path, analysis) in &succeeded {
        write_graph(analysis, path, &out_dir, &renderer, cli.dot);

        if !remove.is_empty() {
            if let Err(e) = write_pruned(&builder, path, &out_dir, &remove) {
                eprintln!("[ERROR] {:#}", e);
            }
        }
    }

    // 6. Failures and exit code
    let mut failed = false;
    for (path, err) in run.failed() {
        eprintln!("[ERROR] {}: {}", path.display(), err);
        failed = true;
    }

    std::process::exit(if failed { 1 } else { 0 });
}
