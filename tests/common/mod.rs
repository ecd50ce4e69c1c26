// Shared fixtures for qualiscan integration tests
#![allow(dead_code)]

use git2::{IndexAddOption, Repository, Signature};
use qualiscan::cache::{CacheLocation, CacheStrategy};
use qualiscan::errors::CollectingReporter;
use qualiscan::{IncrementalEngine, QualiscanConfig, ResultCacheStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A throwaway git repository with helpers to edit and commit files.
pub struct GitFixture {
    pub dir: TempDir,
    pub repo: Repository,
}

impl GitFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        create_test_file(self.path(), rel, content)
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.path().join(rel)).unwrap();
    }

    /// Stage one path without committing it.
    pub fn stage(&self, rel: &str) {
        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(rel)).unwrap();
        index.write().unwrap();
    }

    /// Stage every change (additions, edits, deletions) and commit; returns
    /// the new commit id.
    pub fn commit_all(&self, message: &str) -> String {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.update_all(["*"].iter(), None).unwrap();
        index.write().unwrap();

        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let signature = Signature::now("Test Author", "test@example.com").unwrap();
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap()
            .to_string()
    }
}

/// Helper to create a test file (and its parent directories) with content
pub fn create_test_file(dir: &Path, rel: &str, content: &str) -> PathBuf {
    let file_path = dir.join(rel);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&file_path, content).unwrap();
    file_path
}

/// Engine over `project` with its cache in `cache_dir`.
pub fn engine_for(
    project: &Path,
    cache_dir: &Path,
    vcs: Arc<dyn qualiscan::VcsProvider>,
) -> (IncrementalEngine, Arc<CollectingReporter>) {
    let reporter = Arc::new(CollectingReporter::new());
    let location = CacheLocation::resolve_with_strategy(
        project,
        CacheStrategy::Custom(cache_dir.to_path_buf()),
    )
    .unwrap();
    let store = Arc::new(ResultCacheStore::new(location, reporter.clone()));
    let engine = IncrementalEngine::with_store(
        project,
        &QualiscanConfig::default(),
        vcs,
        store,
        reporter.clone(),
    );
    (engine, reporter)
}
