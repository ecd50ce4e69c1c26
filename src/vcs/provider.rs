use crate::errors::VcsError;
use crate::vcs::types::RevisionId;
use std::path::{Path, PathBuf};

/// Queries the change-set resolver needs from a version-control system.
///
/// Any VCS that answers these is a valid backend. Implementations must be
/// shareable across threads; [`crate::vcs::Git2Provider`] opens a fresh
/// repository handle per call for that reason.
pub trait VcsProvider: Send + Sync {
    /// Whether `root` lies inside a working tree.
    fn is_tracked(&self, root: &Path) -> bool;

    /// Resolve a revision expression (commit hash, branch, `HEAD~2`, ...) to
    /// a concrete identity.
    fn resolve_revision(&self, root: &Path, spec: &str) -> Result<RevisionId, VcsError>;

    /// Current HEAD. Fails with [`VcsError::NoHead`] before the first commit.
    fn head(&self, root: &Path) -> Result<RevisionId, VcsError> {
        self.resolve_revision(root, "HEAD")
    }

    /// First parent of `revision`. Fails with [`VcsError::NoParent`] on a
    /// root commit.
    fn parent_of(&self, root: &Path, revision: &RevisionId) -> Result<RevisionId, VcsError>;

    /// Repository-relative paths that differ between `base` and `current`.
    ///
    /// When `current` is the working-tree sentinel the diff covers
    /// uncommitted modifications of tracked files.
    fn diff_paths(
        &self,
        root: &Path,
        base: &RevisionId,
        current: &RevisionId,
    ) -> Result<Vec<PathBuf>, VcsError>;
}
