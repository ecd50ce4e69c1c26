use crate::commands::ProjectContext;
use crate::trends::{TrendCalculator, TrendDirection, TrendReport};
use crate::vcs::RevisionId;
use anyhow::{anyhow, Result};
use colored::*;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Serialize)]
struct TrendOutput<'a> {
    base: &'a RevisionId,
    current: &'a RevisionId,
    trends: &'a TrendReport,
}

pub fn show_trend(
    project: &ProjectContext,
    base: &str,
    current: &str,
    json: bool,
) -> Result<String> {
    let engine = project.engine()?;
    let base = project.revision(base)?;
    let current = project.revision(current)?;

    let missing = |rev: &RevisionId| {
        anyhow!(
            "No cached results for {}; run `qualiscan record --revision {}` first",
            rev.short(),
            rev
        )
    };
    let baseline = engine.load_run(&base).ok_or_else(|| missing(&base))?;
    let latest = engine.load_run(&current).ok_or_else(|| missing(&current))?;

    let report = TrendCalculator::diff(&baseline, &latest);

    if json {
        Ok(serde_json::to_string_pretty(&TrendOutput {
            base: &base,
            current: &current,
            trends: &report,
        })?)
    } else {
        Ok(format_trends(&base, &current, &report))
    }
}

pub fn format_trends(base: &RevisionId, current: &RevisionId, report: &TrendReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} → {}",
        "Trends".bold(),
        base.short(),
        current.short()
    );

    if report.is_empty() {
        let _ = writeln!(out, "No metric family is present in both runs.");
        return out;
    }

    for (metric, entry) in report.iter() {
        let arrow = if entry.delta > 0.0 { "↑" } else { "↓" };
        let marker = match entry.direction(metric) {
            TrendDirection::Improving => arrow.green(),
            TrendDirection::Regressing => arrow.red(),
            TrendDirection::Stable => "=".dimmed(),
        };
        let _ = write!(
            out,
            "  {} {:<22} {:>10.4} → {:<10.4} ({:+.4})",
            marker,
            metric.label(),
            entry.baseline,
            entry.current,
            entry.delta
        );
        if entry.low_confidence {
            let _ = write!(out, " {}", "low confidence".yellow());
        }
        out.push('\n');
    }
    out
}
