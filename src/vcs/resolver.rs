//! Change-set resolution.
//!
//! Incremental analysis is an optimization, so nothing here fails: a missing
//! repository, a root commit or a broken VCS query each degrade to a smaller
//! (possibly empty) change set and a reported [`Degradation`]. The caller then
//! falls back to full analysis.

use crate::errors::{Degradation, DegradationKind, ErrorReporter, VcsError};
use crate::vcs::provider::VcsProvider;
use crate::vcs::types::{ChangeSetInfo, RevisionId};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source extensions considered when no configuration says otherwise.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts",
];

pub struct ChangeSetResolver {
    vcs: Arc<dyn VcsProvider>,
    extensions: Vec<String>,
    reporter: Arc<dyn ErrorReporter>,
}

impl ChangeSetResolver {
    pub fn new(
        vcs: Arc<dyn VcsProvider>,
        extensions: Vec<String>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self {
            vcs,
            extensions,
            reporter,
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Resolve the files that differ between `base` and `current`.
    ///
    /// - `base` unset: parent of HEAD, or HEAD itself on a root commit.
    /// - `current` unset: the working tree, reported back as HEAD's identity.
    pub fn resolve(
        &self,
        project_root: &Path,
        base: Option<&str>,
        current: Option<&str>,
    ) -> ChangeSetInfo {
        if !self.vcs.is_tracked(project_root) {
            self.reporter.report(Degradation::not_tracked(project_root));
            return ChangeSetInfo::empty();
        }

        let head = self.vcs.head(project_root);

        let base_revision = match self.resolve_base(project_root, base, &head) {
            Ok(revision) => revision,
            Err(e) => {
                self.report_vcs_failure(project_root, "resolving base revision", &e);
                return ChangeSetInfo::new(None, Self::settle_current(&head), Vec::new());
            }
        };

        let current_revision = match current {
            Some(spec) => match self.vcs.resolve_revision(project_root, spec) {
                Ok(revision) => revision,
                Err(e) => {
                    self.report_vcs_failure(project_root, "resolving current revision", &e);
                    return ChangeSetInfo::new(Some(base_revision), None, Vec::new());
                }
            },
            None => RevisionId::working_tree(),
        };

        let changed_files = match self
            .vcs
            .diff_paths(project_root, &base_revision, &current_revision)
        {
            Ok(paths) => self.filter_sources(paths),
            Err(e) => {
                self.report_vcs_failure(project_root, "listing changed paths", &e);
                Vec::new()
            }
        };

        let current_revision = if current_revision.is_working_tree() {
            Self::settle_current(&head)
        } else {
            Some(current_revision)
        };

        log::info!(
            "Change set {}..{}: {} source file(s)",
            base_revision.short(),
            current_revision
                .as_ref()
                .map(RevisionId::short)
                .unwrap_or("?"),
            changed_files.len()
        );

        ChangeSetInfo::new(Some(base_revision), current_revision, changed_files)
    }

    fn resolve_base(
        &self,
        project_root: &Path,
        base: Option<&str>,
        head: &Result<RevisionId, VcsError>,
    ) -> Result<RevisionId, VcsError> {
        if let Some(spec) = base {
            return self.vcs.resolve_revision(project_root, spec);
        }

        let head = match head {
            Ok(head) => head,
            Err(_) => return Err(VcsError::NoHead),
        };

        match self.vcs.parent_of(project_root, head) {
            Ok(parent) => Ok(parent),
            Err(e) => {
                self.reporter.report(
                    Degradation::new(
                        DegradationKind::NoParentRevision,
                        format!("{}; diffing against HEAD itself", e),
                    )
                    .with_path(project_root),
                );
                Ok(head.clone())
            }
        }
    }

    /// Concrete identity for the working tree: HEAD when it exists, the
    /// sentinel before the first commit.
    fn settle_current(head: &Result<RevisionId, VcsError>) -> Option<RevisionId> {
        Some(match head {
            Ok(head) => head.clone(),
            Err(_) => RevisionId::working_tree(),
        })
    }

    fn report_vcs_failure(&self, project_root: &Path, action: &str, error: &VcsError) {
        self.reporter.report(
            Degradation::new(
                DegradationKind::VcsQueryFailed,
                format!("{} failed: {}; treating as no changes", action, error),
            )
            .with_path(project_root),
        );
    }

    fn filter_sources(&self, paths: Vec<PathBuf>) -> Vec<PathBuf> {
        paths
            .into_iter()
            .filter(|path| self.is_source(path))
            .collect()
    }

    /// Whether a path carries one of the configured source extensions
    pub fn is_source(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|known| *known == ext)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CollectingReporter;
    use crate::testkit::FakeVcs;
    use pretty_assertions::assert_eq;

    fn resolver_with(vcs: FakeVcs) -> (ChangeSetResolver, Arc<CollectingReporter>) {
        let (resolver, _, reporter) = resolver_sharing(vcs);
        (resolver, reporter)
    }

    /// Like `resolver_with`, keeping a handle on the fake for call counts.
    fn resolver_sharing(
        vcs: FakeVcs,
    ) -> (ChangeSetResolver, Arc<FakeVcs>, Arc<CollectingReporter>) {
        let vcs = Arc::new(vcs);
        let reporter = Arc::new(CollectingReporter::new());
        let resolver = ChangeSetResolver::new(
            vcs.clone(),
            DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            reporter.clone(),
        );
        (resolver, vcs, reporter)
    }

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_untracked_directory_yields_empty_change_set() {
        let (resolver, vcs, reporter) = resolver_sharing(FakeVcs::untracked());

        let info = resolver.resolve(Path::new("/project"), None, None);

        assert_eq!(info, ChangeSetInfo::empty());
        assert_eq!(reporter.count_of(DegradationKind::NotTracked), 1);
        assert_eq!(vcs.diff_calls(), 0);
    }

    #[test]
    fn test_defaults_to_parent_of_head_against_working_tree() {
        let vcs = FakeVcs::new()
            .with_commit("c1", None)
            .with_commit("c2", Some("c1"))
            .with_head("c2")
            .with_working_tree_diff("c1", paths(&["src/lib.rs", "README.md", "src/app.ts"]));
        let (resolver, reporter) = resolver_with(vcs);

        let info = resolver.resolve(Path::new("/project"), None, None);

        assert_eq!(info.base_revision(), Some(&RevisionId::new("c1")));
        // working tree is reported as HEAD's identity
        assert_eq!(info.current_revision(), Some(&RevisionId::new("c2")));
        assert_eq!(info.changed_files(), paths(&["src/lib.rs", "src/app.ts"]).as_slice());
        assert!(reporter.is_empty());
    }

    #[test]
    fn test_root_commit_falls_back_to_head() {
        let vcs = FakeVcs::new()
            .with_commit("only", None)
            .with_head("only")
            .with_working_tree_diff("only", paths(&["main.py"]));
        let (resolver, reporter) = resolver_with(vcs);

        let info = resolver.resolve(Path::new("/project"), None, None);

        assert_eq!(info.base_revision(), Some(&RevisionId::new("only")));
        assert_eq!(info.changed_files(), paths(&["main.py"]).as_slice());
        assert_eq!(reporter.count_of(DegradationKind::NoParentRevision), 1);
    }

    #[test]
    fn test_explicit_revisions_diff_commit_to_commit() {
        let vcs = FakeVcs::new()
            .with_commit("c1", None)
            .with_commit("c2", Some("c1"))
            .with_commit("c3", Some("c2"))
            .with_head("c3")
            .with_diff("c1", "c3", paths(&["a.rs", "b.rs"]));
        let (resolver, _) = resolver_with(vcs);

        let info = resolver.resolve(Path::new("/project"), Some("c1"), Some("c3"));

        assert_eq!(info.base_revision(), Some(&RevisionId::new("c1")));
        assert_eq!(info.current_revision(), Some(&RevisionId::new("c3")));
        assert_eq!(info.changed_files(), paths(&["a.rs", "b.rs"]).as_slice());
    }

    #[test]
    fn test_diff_failure_degrades_to_no_changes() {
        let vcs = FakeVcs::new()
            .with_commit("c1", None)
            .with_commit("c2", Some("c1"))
            .with_head("c2")
            .failing_diffs();
        let (resolver, vcs, reporter) = resolver_sharing(vcs);

        let info = resolver.resolve(Path::new("/project"), None, None);

        assert_eq!(vcs.diff_calls(), 1);
        assert!(info.is_empty());
        assert_eq!(info.base_revision(), Some(&RevisionId::new("c1")));
        assert_eq!(reporter.count_of(DegradationKind::VcsQueryFailed), 1);
    }

    #[test]
    fn test_unknown_base_revision_degrades() {
        let (resolver, vcs, reporter) =
            resolver_sharing(FakeVcs::new().with_commit("c1", None).with_head("c1"));

        let info = resolver.resolve(Path::new("/project"), Some("nope"), None);

        assert!(info.is_empty());
        assert!(info.base_revision().is_none());
        assert_eq!(info.current_revision(), Some(&RevisionId::new("c1")));
        assert_eq!(reporter.count_of(DegradationKind::VcsQueryFailed), 1);
        assert_eq!(vcs.diff_calls(), 0);
    }

    #[test]
    fn test_repository_without_commits_keeps_sentinel() {
        let (resolver, reporter) = resolver_with(FakeVcs::new());

        let info = resolver.resolve(Path::new("/project"), None, None);

        assert!(info.is_empty());
        assert_eq!(info.current_revision(), Some(&RevisionId::working_tree()));
        assert_eq!(reporter.count_of(DegradationKind::VcsQueryFailed), 1);
    }

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        let reporter = Arc::new(CollectingReporter::new());
        let resolver = ChangeSetResolver::new(
            Arc::new(FakeVcs::untracked()),
            vec![".RS".to_string(), "py".to_string()],
            reporter,
        );

        assert!(resolver.is_source(Path::new("src/Main.rs")));
        assert!(resolver.is_source(Path::new("tool.PY")));
        assert!(!resolver.is_source(Path::new("Makefile")));
        assert!(!resolver.is_source(Path::new("index.js")));
        assert_eq!(resolver.extensions(), &["rs".to_string(), "py".to_string()]);
    }
}
