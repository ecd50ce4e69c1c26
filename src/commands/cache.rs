use crate::cache::{CacheStats, CacheStrategy};
use crate::commands::ProjectContext;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct StatsOutput<'a> {
    location: &'a Path,
    project_id: &'a str,
    #[serde(flatten)]
    stats: CacheStats,
}

pub fn cache_stats(project: &ProjectContext, json: bool) -> Result<String> {
    let engine = project.engine()?;
    let location = engine.store().location();
    let stats = engine.store().stats();

    if json {
        return Ok(serde_json::to_string_pretty(&StatsOutput {
            location: location.cache_path(),
            project_id: &location.project_id,
            stats,
        })?);
    }

    let strategy = match &location.strategy {
        CacheStrategy::Shared => "shared",
        CacheStrategy::Custom(_) => "custom",
    };
    Ok(format!(
        "Cache location: {} ({})\n\
         Project id:     {}\n\
         Run entries:    {}\n\
         File digests:   {}\n\
         Total size:     {}",
        location.cache_path().display(),
        strategy,
        location.project_id,
        stats.run_entries,
        stats.file_entries,
        format_bytes(stats.total_bytes)
    ))
}

pub fn cache_clear(project: &ProjectContext) -> Result<String> {
    let engine = project.engine()?;
    let path = engine.store().location().cache_path().to_path_buf();
    engine
        .store()
        .clear()
        .with_context(|| format!("Failed to clear cache at {}", path.display()))?;
    Ok(format!("Cleared cache at {}", path.display()))
}

fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KIB {
        format!("{} B", bytes)
    } else if bytes_f < KIB * KIB {
        format!("{:.1} KiB", bytes_f / KIB)
    } else {
        format!("{:.1} MiB", bytes_f / (KIB * KIB))
    }
}
