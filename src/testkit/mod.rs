//! Test doubles for the incremental analysis engine.
//!
//! [`FakeVcs`] is an in-memory [`VcsProvider`] with a fluent builder, so
//! resolver and engine tests run without a real repository or subprocess.
//!
//! ```rust
//! use qualiscan::testkit::FakeVcs;
//! use qualiscan::vcs::{VcsProvider, RevisionId};
//! use std::path::{Path, PathBuf};
//!
//! let vcs = FakeVcs::new()
//!     .with_commit("c1", None)
//!     .with_commit("c2", Some("c1"))
//!     .with_head("c2")
//!     .with_working_tree_diff("c1", vec![PathBuf::from("src/lib.rs")]);
//!
//! let root = Path::new(".");
//! assert_eq!(vcs.head(root).unwrap(), RevisionId::new("c2"));
//! assert_eq!(vcs.parent_of(root, &RevisionId::new("c2")).unwrap(), RevisionId::new("c1"));
//! ```

use crate::errors::VcsError;
use crate::vcs::{RevisionId, VcsProvider, WORKING_TREE};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct FakeVcs {
    tracked: bool,
    head: Option<String>,
    /// commit id -> first parent
    commits: HashMap<String, Option<String>>,
    diffs: HashMap<(String, String), Vec<PathBuf>>,
    fail_diffs: bool,
    diff_calls: AtomicUsize,
}

impl FakeVcs {
    /// A tracked repository with no commits yet.
    pub fn new() -> Self {
        Self {
            tracked: true,
            ..Self::default()
        }
    }

    /// A directory outside any working tree.
    pub fn untracked() -> Self {
        Self::default()
    }

    pub fn with_commit(mut self, id: &str, parent: Option<&str>) -> Self {
        self.commits
            .insert(id.to_string(), parent.map(str::to_string));
        self
    }

    pub fn with_head(mut self, id: &str) -> Self {
        self.head = Some(id.to_string());
        self
    }

    pub fn with_diff(mut self, base: &str, current: &str, paths: Vec<PathBuf>) -> Self {
        self.diffs
            .insert((base.to_string(), current.to_string()), paths);
        self
    }

    pub fn with_working_tree_diff(self, base: &str, paths: Vec<PathBuf>) -> Self {
        self.with_diff(base, WORKING_TREE, paths)
    }

    /// Every `diff_paths` call fails.
    pub fn failing_diffs(mut self) -> Self {
        self.fail_diffs = true;
        self
    }

    pub fn diff_calls(&self) -> usize {
        self.diff_calls.load(Ordering::SeqCst)
    }
}

impl VcsProvider for FakeVcs {
    fn is_tracked(&self, _root: &Path) -> bool {
        self.tracked
    }

    fn resolve_revision(&self, root: &Path, spec: &str) -> Result<RevisionId, VcsError> {
        if !self.tracked {
            return Err(VcsError::NotARepository(root.to_path_buf()));
        }
        if spec == "HEAD" {
            return self.head.as_deref().map(RevisionId::new).ok_or(VcsError::NoHead);
        }
        if self.commits.contains_key(spec) {
            Ok(RevisionId::new(spec))
        } else {
            Err(VcsError::UnknownRevision(spec.to_string()))
        }
    }

    fn parent_of(&self, _root: &Path, revision: &RevisionId) -> Result<RevisionId, VcsError> {
        match self.commits.get(revision.as_str()) {
            Some(Some(parent)) => Ok(RevisionId::new(parent.as_str())),
            Some(None) => Err(VcsError::NoParent(revision.to_string())),
            None => Err(VcsError::UnknownRevision(revision.to_string())),
        }
    }

    fn diff_paths(
        &self,
        _root: &Path,
        base: &RevisionId,
        current: &RevisionId,
    ) -> Result<Vec<PathBuf>, VcsError> {
        self.diff_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_diffs {
            return Err(VcsError::Other("simulated diff failure".to_string()));
        }
        Ok(self
            .diffs
            .get(&(base.to_string(), current.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
