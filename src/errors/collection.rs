//! Degradation records and the reporter capability that receives them.
//!
//! Every recovery path in the engine produces one [`Degradation`]. Instead of
//! a process-wide handler, each component holds an `Arc<dyn ErrorReporter>`,
//! which keeps tests isolated and lets several project roots share a process.

use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};

/// What the engine had to fall back from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DegradationKind {
    /// Project root is not inside a working tree; change set is empty.
    NotTracked,
    /// Base revision has no parent; HEAD was used as the base.
    NoParentRevision,
    /// A VCS query failed; treated as "no changes".
    VcsQueryFailed,
    /// A source file could not be read; treated as changed.
    UnreadableFile,
    /// A cache entry could not be read; treated as a miss.
    CacheReadFailed,
    /// A cache entry could not be written; the work is simply redone next time.
    CacheWriteFailed,
    /// A cache entry exists but does not deserialize; treated as a miss.
    CorruptEntry,
}

impl DegradationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotTracked => "Not tracked",
            Self::NoParentRevision => "No parent revision",
            Self::VcsQueryFailed => "VCS query failed",
            Self::UnreadableFile => "Unreadable file",
            Self::CacheReadFailed => "Cache read failed",
            Self::CacheWriteFailed => "Cache write failed",
            Self::CorruptEntry => "Corrupt cache entry",
        }
    }
}

impl fmt::Display for DegradationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recovered failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degradation {
    pub kind: DegradationKind,
    pub path: Option<PathBuf>,
    pub detail: String,
}

impl Degradation {
    pub fn new(kind: DegradationKind, detail: impl fmt::Display) -> Self {
        Self {
            kind,
            path: None,
            detail: detail.to_string(),
        }
    }

    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn not_tracked(root: &Path) -> Self {
        Self::new(
            DegradationKind::NotTracked,
            "not a version-controlled working tree; incremental analysis disabled",
        )
        .with_path(root)
    }

    pub fn unreadable(path: &Path, error: &anyhow::Error) -> Self {
        // `{:#}` keeps the whole context chain on one line
        Self::new(DegradationKind::UnreadableFile, format!("{:#}", error)).with_path(path)
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} ({}): {}", self.kind, path.display(), self.detail),
            None => write!(f, "{}: {}", self.kind, self.detail),
        }
    }
}

/// Capability that receives degradations.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, degradation: Degradation);
}

/// One `warn` line per degradation, nothing kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, degradation: Degradation) {
        log::warn!("{}", degradation);
    }
}

/// Logs like [`LogReporter`] and also keeps everything it receives, for
/// end-of-run summaries and tests.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<Degradation>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Degradation> {
        self.events.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn count_of(&self, kind: DegradationKind) -> usize {
        self.events.lock().iter().filter(|d| d.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn take(&self) -> Vec<Degradation> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, degradation: Degradation) {
        LogReporter.report(degradation.clone());
        self.events.lock().push(degradation);
    }
}
