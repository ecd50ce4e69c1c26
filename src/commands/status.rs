use crate::commands::ProjectContext;
use crate::io::FileWalker;
use crate::staleness::StalenessReport;
use anyhow::Result;
use colored::*;
use std::fmt::Write;

/// Check every source file under the project against its recorded digest.
///
/// Digests of new or modified files are recorded as a side effect, so a
/// second run without edits reports everything as fresh.
pub fn show_status(
    project: &ProjectContext,
    extra_excludes: &[String],
    json: bool,
) -> Result<String> {
    let engine = project.engine()?;

    let excludes: Vec<String> = project
        .config
        .incremental
        .exclude
        .iter()
        .chain(extra_excludes)
        .cloned()
        .collect();
    let files = FileWalker::new(project.root.clone())
        .with_extensions(&project.config.incremental.extensions)
        .with_exclude_patterns(&excludes)?
        .walk()?;

    let report = engine.oracle().partition(&files);

    if json {
        Ok(serde_json::to_string_pretty(&report)?)
    } else {
        Ok(format_status(&report))
    }
}

pub fn format_status(report: &StalenessReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} source file(s): {} to analyze, {} unchanged",
        report.total(),
        report.stale.len().to_string().yellow(),
        report.fresh.len().to_string().green()
    );
    for path in &report.stale {
        let _ = writeln!(out, "  {} {}", "M".yellow(), path.display());
    }
    out
}
