//! Incremental analysis orchestration.
//!
//! [`IncrementalEngine`] wires the resolver, staleness oracle, cache store
//! and trend calculator together for one project root:
//!
//! 1. [`plan`](IncrementalEngine::plan) resolves the change set and splits it
//!    into files to analyze and files whose bytes are unchanged.
//! 2. The caller's analyzers produce results for `to_analyze`.
//! 3. [`merge_with_previous`](IncrementalEngine::merge_with_previous) overlays
//!    them on the base revision's cached run, and
//!    [`record_run`](IncrementalEngine::record_run) stores the result.
//! 4. [`annotate`](IncrementalEngine::annotate) attaches trends against the
//!    base revision's cached run.

use crate::cache::{CacheLocation, ResultCacheStore};
use crate::config::QualiscanConfig;
use crate::errors::{CacheError, ErrorReporter};
use crate::results::AnalysisResultSet;
use crate::staleness::StalenessOracle;
use crate::trends::{TrendCalculator, TrendReport};
use crate::vcs::{ChangeSetInfo, ChangeSetResolver, RevisionId, VcsProvider};
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a run needs to analyze.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisPlan {
    pub change_set: ChangeSetInfo,
    /// Changed files whose content differs from the last recorded digest
    pub to_analyze: Vec<PathBuf>,
    /// Changed files whose content is byte-identical to the last analysis
    pub unchanged: Vec<PathBuf>,
}

impl AnalysisPlan {
    /// No history to diff against: the caller should analyze everything.
    pub fn requires_full_analysis(&self) -> bool {
        self.change_set.base_revision().is_none()
    }
}

pub struct IncrementalEngine {
    project_root: PathBuf,
    resolver: ChangeSetResolver,
    oracle: StalenessOracle,
    store: Arc<ResultCacheStore>,
    default_base: Option<String>,
}

impl IncrementalEngine {
    pub fn new(
        project_root: &Path,
        config: &QualiscanConfig,
        vcs: Arc<dyn VcsProvider>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self> {
        let location = CacheLocation::resolve(project_root, config.cache.dir.as_deref())?;
        let store = Arc::new(ResultCacheStore::new(location, reporter.clone()));
        Ok(Self::with_store(project_root, config, vcs, store, reporter))
    }

    /// Build around an existing store handle.
    pub fn with_store(
        project_root: &Path,
        config: &QualiscanConfig,
        vcs: Arc<dyn VcsProvider>,
        store: Arc<ResultCacheStore>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let resolver = ChangeSetResolver::new(
            vcs,
            config.incremental.extensions.clone(),
            reporter.clone(),
        );
        let oracle = StalenessOracle::new(project_root, store.clone(), reporter);
        Self {
            project_root: project_root.to_path_buf(),
            resolver,
            oracle,
            store,
            default_base: config.incremental.base_revision.clone(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn store(&self) -> &Arc<ResultCacheStore> {
        &self.store
    }

    pub fn resolver(&self) -> &ChangeSetResolver {
        &self.resolver
    }

    pub fn oracle(&self) -> &StalenessOracle {
        &self.oracle
    }

    /// Resolve the change set; an unset `base` falls back to the configured
    /// base revision, then to the parent of HEAD.
    pub fn change_set(&self, base: Option<&str>, current: Option<&str>) -> ChangeSetInfo {
        let base = base.or(self.default_base.as_deref());
        self.resolver.resolve(&self.project_root, base, current)
    }

    pub fn plan(&self, base: Option<&str>, current: Option<&str>) -> AnalysisPlan {
        let change_set = self.change_set(base, current);
        let report = self.oracle.partition(change_set.changed_files());

        log::info!(
            "{} changed file(s): {} to analyze, {} unchanged since last analysis",
            report.total(),
            report.stale.len(),
            report.fresh.len()
        );

        AnalysisPlan {
            change_set,
            to_analyze: report.stale,
            unchanged: report.fresh,
        }
    }

    pub fn record_run(
        &self,
        revision: &RevisionId,
        results: &AnalysisResultSet,
    ) -> Result<(), CacheError> {
        self.store.put_run(revision, results)?;
        log::info!(
            "Recorded {} analyzer result(s) for {}",
            results.len(),
            revision.short()
        );
        Ok(())
    }

    pub fn load_run(&self, revision: &RevisionId) -> Option<AnalysisResultSet> {
        self.store.get_run(revision)
    }

    /// Cached results for `base` overlaid with `fresh`; just `fresh` when
    /// nothing is cached for `base`.
    pub fn merge_with_previous(
        &self,
        base: Option<&RevisionId>,
        fresh: &AnalysisResultSet,
    ) -> AnalysisResultSet {
        match base.and_then(|rev| self.store.get_run(rev)) {
            Some(previous) => previous.merged_with(fresh),
            None => fresh.clone(),
        }
    }

    /// Trends of `current` against the cached run of the change set's base.
    pub fn trends_for(
        &self,
        change_set: &ChangeSetInfo,
        current: &AnalysisResultSet,
    ) -> Option<TrendReport> {
        let base = change_set.base_revision()?;
        let baseline = self.store.get_run(base)?;
        Some(TrendCalculator::diff(&baseline, current))
    }

    /// `change_set` with trends attached when a baseline run is cached.
    pub fn annotate(
        &self,
        change_set: ChangeSetInfo,
        current: &AnalysisResultSet,
    ) -> ChangeSetInfo {
        match self.trends_for(&change_set, current) {
            Some(report) => change_set.with_trends(report.to_map()),
            None => change_set,
        }
    }
}
