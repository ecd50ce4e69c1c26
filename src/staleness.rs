//! Per-file staleness decisions.
//!
//! [`StalenessOracle::should_reanalyze`] compares a file's current digest
//! with the one recorded for the same path and records the new digest when
//! they differ. Any failure answers "re-analyze": skipping work is only ever
//! done on positive evidence that the bytes are unchanged.
//!
//! The compare-and-update is not atomic. Two concurrent checks of the same
//! path may both answer `true` and both write the same digest; that costs a
//! redundant analysis, never a wrong one. Distinct paths share no state.

use crate::cache::ResultCacheStore;
use crate::errors::{Degradation, DegradationKind, ErrorReporter};
use crate::hashing::digest_file;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of checking a batch of files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StalenessReport {
    /// Files that must be analyzed again
    pub stale: Vec<PathBuf>,
    /// Files whose content matches the recorded digest
    pub fresh: Vec<PathBuf>,
}

impl StalenessReport {
    pub fn total(&self) -> usize {
        self.stale.len() + self.fresh.len()
    }
}

pub struct StalenessOracle {
    project_root: PathBuf,
    store: Arc<ResultCacheStore>,
    reporter: Arc<dyn ErrorReporter>,
}

impl StalenessOracle {
    pub fn new(
        project_root: impl Into<PathBuf>,
        store: Arc<ResultCacheStore>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            store,
            reporter,
        }
    }

    /// Whether `path` must be analyzed again.
    ///
    /// `path` may be absolute or relative to the project root; digests are
    /// recorded under the project-relative form either way.
    pub fn should_reanalyze(&self, path: &Path) -> bool {
        let (absolute, relative) = self.locate(path);

        let current = match digest_file(&absolute) {
            Ok(digest) => digest,
            Err(e) => {
                self.reporter.report(Degradation::unreadable(&relative, &e));
                // keep the next readable check stale as well
                if let Err(e) = self.store.forget_digest(&relative) {
                    self.report_write_failure(&relative, &e);
                }
                return true;
            }
        };

        match self.store.get_digest(&relative) {
            Some(previous) if previous == current => {
                log::trace!("{} unchanged", relative.display());
                false
            }
            previous => {
                log::debug!(
                    "{} {}",
                    relative.display(),
                    if previous.is_some() { "changed" } else { "has no recorded digest" }
                );
                if let Err(e) = self.store.put_digest(&relative, &current) {
                    self.report_write_failure(&relative, &e);
                }
                true
            }
        }
    }

    /// Check many files in parallel, preserving input order within each list.
    pub fn partition(&self, paths: &[PathBuf]) -> StalenessReport {
        let decisions: Vec<bool> = paths
            .par_iter()
            .map(|path| self.should_reanalyze(path))
            .collect();

        let (stale, fresh): (Vec<_>, Vec<_>) = paths
            .iter()
            .cloned()
            .zip(decisions)
            .partition(|(_, stale)| *stale);

        StalenessReport {
            stale: stale.into_iter().map(|(path, _)| path).collect(),
            fresh: fresh.into_iter().map(|(path, _)| path).collect(),
        }
    }

    /// (path to read, path to key the digest by)
    fn locate(&self, path: &Path) -> (PathBuf, PathBuf) {
        if path.is_absolute() {
            let relative = path
                .strip_prefix(&self.project_root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.to_path_buf());
            (path.to_path_buf(), relative)
        } else {
            (self.project_root.join(path), path.to_path_buf())
        }
    }

    fn report_write_failure(&self, path: &Path, error: &impl std::fmt::Display) {
        self.reporter.report(
            Degradation::new(DegradationKind::CacheWriteFailed, error).with_path(path),
        );
    }
}
