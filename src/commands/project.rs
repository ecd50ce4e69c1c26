use crate::config::{load_config, QualiscanConfig};
use crate::errors::{CollectingReporter, DegradationSummary};
use crate::incremental::IncrementalEngine;
use crate::vcs::{Git2Provider, RevisionId, VcsProvider};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a command needs to know about the project it runs against.
pub struct ProjectContext {
    pub root: PathBuf,
    pub config: QualiscanConfig,
    pub vcs: Arc<dyn VcsProvider>,
    pub reporter: Arc<CollectingReporter>,
}

impl ProjectContext {
    pub fn load(path: &Path) -> Result<Self> {
        Self::with_vcs(path, Arc::new(Git2Provider::new()))
    }

    pub fn with_vcs(path: &Path, vcs: Arc<dyn VcsProvider>) -> Result<Self> {
        let root = path
            .canonicalize()
            .with_context(|| format!("Project path does not exist: {}", path.display()))?;
        let config = load_config(&root);
        Ok(Self {
            root,
            config,
            vcs,
            reporter: Arc::new(CollectingReporter::new()),
        })
    }

    pub fn engine(&self) -> Result<IncrementalEngine> {
        IncrementalEngine::new(
            &self.root,
            &self.config,
            self.vcs.clone(),
            self.reporter.clone(),
        )
        .context("Failed to set up the result cache")
    }

    /// Resolve a user-supplied revision. Outside version control the name
    /// is used verbatim, so results can still be recorded and compared.
    pub fn revision(&self, spec: &str) -> Result<RevisionId> {
        if !self.vcs.is_tracked(&self.root) {
            log::debug!("{} is not under version control", self.root.display());
            return Ok(RevisionId::new(spec));
        }
        self.vcs
            .resolve_revision(&self.root, spec)
            .with_context(|| format!("Failed to resolve revision '{}'", spec))
    }

    /// Drain collected degradations into a printable summary.
    pub fn degradation_summary(&self) -> Option<DegradationSummary> {
        let events = self.reporter.take();
        if events.is_empty() {
            None
        } else {
            Some(DegradationSummary::from_degradations(&events))
        }
    }
}
