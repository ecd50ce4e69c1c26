//! libgit2-backed [`VcsProvider`].
//!
//! Queries go through libgit2 instead of spawning the git CLI: path handling
//! and error reporting stay inside Rust types, and there is no process
//! spawning overhead per query.
//!
//! `git2::Repository` is not `Sync`, so [`Git2Provider`] keeps no handle and
//! opens a fresh repository per operation. This keeps the provider usable
//! behind `Arc<dyn VcsProvider>` from rayon workers.

use crate::errors::VcsError;
use crate::vcs::provider::VcsProvider;
use crate::vcs::types::RevisionId;
use git2::{Delta, DiffOptions, ErrorCode, Repository, Tree};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct Git2Provider;

impl Git2Provider {
    pub fn new() -> Self {
        Self
    }

    /// Discover the repository containing `root`, rejecting bare repositories
    fn open_repo(root: &Path) -> Result<Repository, VcsError> {
        let repo = Repository::discover(root)
            .map_err(|_| VcsError::NotARepository(root.to_path_buf()))?;
        if repo.is_bare() {
            return Err(VcsError::NotARepository(root.to_path_buf()));
        }
        Ok(repo)
    }

    fn classify_revparse_error(spec: &str, error: git2::Error) -> VcsError {
        match error.code() {
            ErrorCode::UnbornBranch => VcsError::NoHead,
            ErrorCode::NotFound | ErrorCode::InvalidSpec | ErrorCode::Ambiguous => {
                if spec == "HEAD" {
                    VcsError::NoHead
                } else {
                    VcsError::UnknownRevision(spec.to_string())
                }
            }
            _ => VcsError::Git(error),
        }
    }

    fn tree_for<'r>(repo: &'r Repository, revision: &RevisionId) -> Result<Tree<'r>, VcsError> {
        let object = repo
            .revparse_single(revision.as_str())
            .map_err(|e| Self::classify_revparse_error(revision.as_str(), e))?;
        Ok(object.peel_to_tree()?)
    }

    /// Location of `root` inside the working directory, used to turn
    /// repository-relative diff paths into project-relative ones.
    fn project_prefix(repo: &Repository, root: &Path) -> PathBuf {
        let workdir = match repo.workdir() {
            Some(dir) => dir,
            None => return PathBuf::new(),
        };
        let workdir = workdir
            .canonicalize()
            .unwrap_or_else(|_| workdir.to_path_buf());
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        root.strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Pure: collect non-deleted paths under `prefix`, relative to it, sorted
    fn collect_paths<'a>(
        deltas: impl Iterator<Item = (Delta, Option<&'a Path>)>,
        prefix: &Path,
    ) -> Vec<PathBuf> {
        deltas
            .filter(|(status, _)| *status != Delta::Deleted)
            .filter_map(|(_, path)| path)
            .filter_map(|path| path.strip_prefix(prefix).ok())
            .map(Path::to_path_buf)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl VcsProvider for Git2Provider {
    fn is_tracked(&self, root: &Path) -> bool {
        Self::open_repo(root).is_ok()
    }

    fn resolve_revision(&self, root: &Path, spec: &str) -> Result<RevisionId, VcsError> {
        let repo = Self::open_repo(root)?;
        let object = repo
            .revparse_single(spec)
            .map_err(|e| Self::classify_revparse_error(spec, e))?;
        let commit = object.peel_to_commit()?;
        Ok(RevisionId::new(commit.id().to_string()))
    }

    fn head(&self, root: &Path) -> Result<RevisionId, VcsError> {
        let repo = Self::open_repo(root)?;
        let head = repo.head().map_err(|e| match e.code() {
            ErrorCode::UnbornBranch | ErrorCode::NotFound => VcsError::NoHead,
            _ => VcsError::Git(e),
        })?;
        let commit = head.peel_to_commit()?;
        Ok(RevisionId::new(commit.id().to_string()))
    }

    fn parent_of(&self, root: &Path, revision: &RevisionId) -> Result<RevisionId, VcsError> {
        let repo = Self::open_repo(root)?;
        let commit = repo
            .revparse_single(revision.as_str())
            .map_err(|e| Self::classify_revparse_error(revision.as_str(), e))?
            .peel_to_commit()?;

        if commit.parent_count() == 0 {
            return Err(VcsError::NoParent(revision.to_string()));
        }
        Ok(RevisionId::new(commit.parent_id(0)?.to_string()))
    }

    fn diff_paths(
        &self,
        root: &Path,
        base: &RevisionId,
        current: &RevisionId,
    ) -> Result<Vec<PathBuf>, VcsError> {
        let repo = Self::open_repo(root)?;
        let base_tree = Self::tree_for(&repo, base)?;
        let mut opts = DiffOptions::new();
        opts.include_typechange(true);

        let diff = if current.is_working_tree() {
            repo.diff_tree_to_workdir_with_index(Some(&base_tree), Some(&mut opts))?
        } else {
            let current_tree = Self::tree_for(&repo, current)?;
            repo.diff_tree_to_tree(Some(&base_tree), Some(&current_tree), Some(&mut opts))?
        };

        let prefix = Self::project_prefix(&repo, root);
        let paths = Self::collect_paths(
            diff.deltas().map(|delta| (delta.status(), delta.new_file().path())),
            &prefix,
        );

        log::debug!(
            "git diff {}..{} touched {} path(s)",
            base.short(),
            current.short(),
            paths.len()
        );
        Ok(paths)
    }
}
