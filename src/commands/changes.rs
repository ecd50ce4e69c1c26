use crate::commands::ProjectContext;
use crate::vcs::ChangeSetInfo;
use anyhow::Result;
use colored::*;
use std::fmt::Write;

pub fn show_changes(
    project: &ProjectContext,
    base: Option<&str>,
    current: Option<&str>,
    json: bool,
) -> Result<String> {
    let engine = project.engine()?;
    let change_set = engine.change_set(base, current);

    if json {
        Ok(serde_json::to_string_pretty(&change_set)?)
    } else {
        Ok(format_change_set(&change_set))
    }
}

pub fn format_change_set(change_set: &ChangeSetInfo) -> String {
    let mut out = String::new();

    let Some(base) = change_set.base_revision() else {
        let _ = writeln!(
            out,
            "{}",
            "No revision history available; analyze the whole project.".yellow()
        );
        return out;
    };

    let _ = writeln!(out, "{}  {}", "Base:   ".bold(), base.short());
    match change_set.current_revision() {
        Some(current) if current.is_working_tree() => {
            let _ = writeln!(out, "{}  working tree", "Current:".bold());
        }
        Some(current) => {
            let _ = writeln!(out, "{}  {}", "Current:".bold(), current.short());
        }
        None => {
            let _ = writeln!(out, "{}  unknown", "Current:".bold());
        }
    }

    if change_set.is_empty() {
        let _ = writeln!(out, "No source files changed.");
        return out;
    }

    let _ = writeln!(out, "Changed files ({}):", change_set.changed_files().len());
    for path in change_set.changed_files() {
        let _ = writeln!(out, "  {}", path.display());
    }
    out
}
