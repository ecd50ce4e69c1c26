use crate::commands::ProjectContext;
use crate::results::AnalysisResultSet;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RecordConfig {
    pub results: PathBuf,
    pub revision: String,
    pub merge_base: Option<String>,
}

pub fn record_results(project: &ProjectContext, config: &RecordConfig) -> Result<String> {
    let contents = fs::read_to_string(&config.results)
        .with_context(|| format!("Failed to read results file: {}", config.results.display()))?;
    let fresh: AnalysisResultSet = serde_json::from_str(&contents).with_context(|| {
        format!(
            "Failed to parse results file: {}",
            config.results.display()
        )
    })?;

    let engine = project.engine()?;
    let revision = project.revision(&config.revision)?;

    let results = match &config.merge_base {
        Some(spec) => {
            let base = project.revision(spec)?;
            if !engine.store().has_run(&base) {
                log::warn!("No cached results for {}; recording fresh results only", base);
            }
            engine.merge_with_previous(Some(&base), &fresh)
        }
        None => fresh,
    };

    engine
        .record_run(&revision, &results)
        .with_context(|| format!("Failed to record results for {}", revision))?;

    Ok(format!(
        "Recorded {} analyzer result(s) for {}",
        results.len(),
        revision.short()
    ))
}
