// Batch analysis driver
//
// `dls analyze <dir>` walks a directory tree, runs every .dml file
// through the shared DeviceAnalysis and prints a report. Diagnostics go
// to stdout, logs to stderr, and the exit code is 0 exactly when no
// error-severity diagnostics remain.

pub mod lint;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dls_core::diagnostic::{Diagnostic, Severity};
use dls_core::source::LineMap;
use dls_core::{CompileConfig, DeviceAnalysis};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::lint::{LintEngine, LintFinding};

#[derive(Parser)]
#[command(name = "dls")]
#[command(about = "DML language server batch analyzer", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze every DML file under a directory
    Analyze {
        /// Directory to scan for .dml files
        #[arg(value_name = "DIR")]
        directory: PathBuf,

        /// DML compile-commands JSON file
        #[arg(long, value_name = "PATH")]
        compile_info: Option<PathBuf>,

        /// Enable the lint pass (default)
        #[arg(long)]
        lint: bool,

        /// Disable the lint pass
        #[arg(long, conflicts_with = "lint")]
        no_lint: bool,

        /// Lint configuration JSON file
        #[arg(long, value_name = "PATH")]
        lint_cfg: Option<PathBuf>,

        /// Log more detail to stderr
        #[arg(short, long)]
        verbose: bool,

        /// Log nothing but errors to stderr
        #[arg(short, long, conflicts_with = "verbose")]
        quiet: bool,

        /// Only report error-severity diagnostics
        #[arg(long)]
        errors_only: bool,

        /// Report format
        #[arg(long, value_enum, default_value = "summary")]
        format: Format,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Summary,
    Detailed,
    Json,
}

/// One file's entry in the JSON report
#[derive(Serialize)]
struct FileReport {
    file: PathBuf,
    diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    lint: Vec<LintFinding>,
}

/// Run the CLI; the return value is the process exit code
pub fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Analyze {
            directory,
            compile_info,
            lint: _,
            no_lint,
            lint_cfg,
            verbose: _,
            quiet: _,
            errors_only,
            format,
        } => analyze_directory(
            &directory,
            compile_info.as_deref(),
            !no_lint,
            lint_cfg.as_deref(),
            errors_only,
            format,
        ),
    }
}

fn analyze_directory(
    directory: &Path,
    compile_info: Option<&Path>,
    lint_enabled: bool,
    lint_cfg: Option<&Path>,
    errors_only: bool,
    format: Format,
) -> Result<i32> {
    let config = match compile_info {
        Some(path) => CompileConfig::load(path)
            .with_context(|| format!("failed to load compile info from {}", path.display()))?,
        None => CompileConfig::new(),
    };
    let analysis = DeviceAnalysis::with_config(config);

    let lint_engine = if lint_enabled {
        Some(match lint_cfg {
            Some(path) => LintEngine::load(path)
                .with_context(|| format!("failed to load lint config from {}", path.display()))?,
            None => LintEngine::new(lint::LintConfig::default()),
        })
    } else {
        None
    };

    let files = discover_dml_files(directory);
    if files.is_empty() {
        warn!("no DML files found under {}", directory.display());
    } else {
        info!("analyzing {} DML files", files.len());
    }

    let mut sources: BTreeMap<PathBuf, String> = BTreeMap::new();
    let mut lint_findings: BTreeMap<PathBuf, Vec<LintFinding>> = BTreeMap::new();
    for file in &files {
        let text = match std::fs::read_to_string(file) {
            Ok(text) => text,
            Err(err) => {
                warn!("skipping {}: {}", file.display(), err);
                continue;
            }
        };
        debug!("analyzing {}", file.display());
        analysis.analyze(file, &text);
        if let Some(engine) = &lint_engine {
            let findings = engine.lint_file(file, &text);
            if !findings.is_empty() {
                lint_findings.insert(file.clone(), findings);
            }
        }
        sources.insert(file.clone(), text);
    }

    // diagnostics for every analyzed file, imports included
    let mut reports: BTreeMap<PathBuf, FileReport> = BTreeMap::new();
    for (file, diagnostics) in analysis.all_diagnostics() {
        let kept: Vec<Diagnostic> = diagnostics
            .into_iter()
            .filter(|d| !errors_only || d.severity == Severity::Error)
            .collect();
        reports.insert(
            file.clone(),
            FileReport {
                file,
                diagnostics: kept,
                lint: Vec::new(),
            },
        );
    }
    if !errors_only {
        for (file, findings) in lint_findings {
            reports
                .entry(file.clone())
                .or_insert_with(|| FileReport {
                    file,
                    diagnostics: Vec::new(),
                    lint: Vec::new(),
                })
                .lint = findings;
        }
    }

    let error_count: usize = reports
        .values()
        .map(|r| {
            r.diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Error)
                .count()
        })
        .sum();
    let warning_count: usize = reports
        .values()
        .map(|r| {
            r.diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Warning)
                .count()
                + r.lint.len()
        })
        .sum();

    match format {
        Format::Json => {
            let entries: Vec<&FileReport> = reports.values().collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&entries).context("failed to serialize report")?
            );
        }
        Format::Detailed => {
            for report in reports.values() {
                print_detailed(report, sources.get(&report.file));
            }
            println!("{} errors, {} warnings in {} files", error_count, warning_count, files.len());
        }
        Format::Summary => {
            for report in reports.values() {
                let errors = report
                    .diagnostics
                    .iter()
                    .filter(|d| d.severity == Severity::Error)
                    .count();
                if errors > 0 {
                    println!("{}: {} errors", report.file.display(), errors);
                }
            }
            println!("{} errors, {} warnings in {} files", error_count, warning_count, files.len());
        }
    }

    Ok(if error_count > 0 { 1 } else { 0 })
}

/// All .dml files under the directory, sorted for a stable report
pub fn discover_dml_files(directory: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(directory)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|extension| extension.eq_ignore_ascii_case("dml"))
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

fn print_detailed(report: &FileReport, source: Option<&String>) {
    let line_map = source.map(|text| LineMap::new(text));
    for diagnostic in &report.diagnostics {
        let position = diagnostic.span.to_one_indexed();
        println!(
            "{}:{}:{}: {} [{}] {}",
            report.file.display(),
            position.start().line,
            position.start().column,
            diagnostic.severity.as_str(),
            diagnostic.code(),
            diagnostic.message
        );
        if let (Some(map), Some(text)) = (&line_map, source) {
            if let Some(line) = map.line_text(diagnostic.span.start().line as usize, text) {
                println!("    | {}", line);
            }
        }
    }
    for finding in &report.lint {
        let position = finding.span.to_one_indexed();
        println!(
            "{}:{}:{}: {} [{}] {}",
            report.file.display(),
            position.start().line,
            position.start().column,
            finding.severity.as_str(),
            finding.rule,
            finding.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_dml_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("sub")).expect("mkdir");
        fs::write(dir.path().join("a.dml"), "dml 1.4;\ndevice a;\n").expect("write");
        fs::write(dir.path().join("sub/b.dml"), "dml 1.4;\ndevice b;\n").expect("write");
        fs::write(dir.path().join("notes.txt"), "not dml").expect("write");

        let files = discover_dml_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.dml"));
        assert!(files[1].ends_with("sub/b.dml"));
    }

    #[test]
    fn test_clean_tree_exits_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.dml"), "dml 1.4;\ndevice a;\n").expect("write");
        let code = analyze_directory(dir.path(), None, false, None, false, Format::Summary)
            .expect("analysis runs");
        assert_eq!(code, 0);
    }

    #[test]
    fn test_errors_exit_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("a.dml"),
            "dml 1.4;\nimport \"missing.dml\";\ndevice a;\n",
        )
        .expect("write");
        let code = analyze_directory(dir.path(), None, false, None, false, Format::Summary)
            .expect("analysis runs");
        assert_eq!(code, 1);
    }

    #[test]
    fn test_lint_does_not_affect_exit_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.dml"), "dml 1.4;\ndevice a;   \n").expect("write");
        let code = analyze_directory(dir.path(), None, true, None, false, Format::Summary)
            .expect("analysis runs");
        assert_eq!(code, 0);
    }
}
