//! Error types for the incremental analysis engine.
//!
//! Two kinds of failure exist here:
//!
//! - **Typed failures** ([`VcsError`], [`CacheError`]) returned by the leaf
//!   components so callers can tell what went wrong.
//! - **Degradations** ([`Degradation`]) recorded whenever the engine recovers
//!   from one of those failures by falling back to slower, always-correct
//!   behavior (empty change set, cache miss, "treat file as changed").
//!
//! No error in the engine is fatal. Degradations are delivered to an
//! [`ErrorReporter`] handed to each component at construction.

pub mod collection;
pub mod summary;

pub use collection::{
    CollectingReporter, Degradation, DegradationKind, ErrorReporter, LogReporter,
};
pub use summary::DegradationSummary;

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a version-control provider.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("not inside a version-controlled working tree: {0}")]
    NotARepository(PathBuf),

    #[error("unknown revision: {0}")]
    UnknownRevision(String),

    #[error("revision {0} has no parent")]
    NoParent(String),

    #[error("repository has no commits yet")]
    NoHead,

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("{0}")]
    Other(String),
}

/// Failures raised by the result cache store.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize cache entry '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vcs_error_messages() {
        let err = VcsError::NoParent("abc123".to_string());
        assert_eq!(err.to_string(), "revision abc123 has no parent");

        let err = VcsError::NotARepository(PathBuf::from("/tmp/project"));
        assert!(err.to_string().contains("/tmp/project"));
    }

    #[test]
    fn test_cache_error_keeps_path() {
        let err = CacheError::io(
            "/cache/files/src%2Flib.rs.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("src%2Flib.rs.json"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_git_error_converts() {
        let err: VcsError = git2::Error::from_str("boom").into();
        assert!(matches!(err, VcsError::Git(_)));
    }
}
