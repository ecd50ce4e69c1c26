//! Incremental analysis planning and result caching for code-quality
//! analyzers.
//!
//! The engine answers three questions for an analyzer run:
//!
//! - which source files differ between two revisions ([`vcs`]),
//! - which of those actually changed since they were last analyzed
//!   ([`staleness`], backed by [`cache`] and [`hashing`]),
//! - how aggregate metrics moved between two recorded runs ([`trends`]).
//!
//! [`IncrementalEngine`] packages that flow for one project root.

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod hashing;
pub mod incremental;
pub mod io;
pub mod results;
pub mod staleness;
pub mod testkit;
pub mod trends;
pub mod vcs;

pub use crate::cache::{CacheLocation, CacheStrategy, ResultCacheStore};
pub use crate::config::{load_config, QualiscanConfig};
pub use crate::errors::{
    CacheError, CollectingReporter, Degradation, DegradationKind, ErrorReporter, LogReporter,
    VcsError,
};
pub use crate::hashing::{digest, digest_file, FileDigest};
pub use crate::incremental::{AnalysisPlan, IncrementalEngine};
pub use crate::results::{AnalysisResultSet, AnalyzerResult};
pub use crate::staleness::{StalenessOracle, StalenessReport};
pub use crate::trends::{TrendCalculator, TrendDirection, TrendMetric, TrendReport};
pub use crate::vcs::{ChangeSetInfo, ChangeSetResolver, Git2Provider, RevisionId, VcsProvider};
