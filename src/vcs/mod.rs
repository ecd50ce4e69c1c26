//! Version-control access and change-set resolution.
//!
//! - [`VcsProvider`]: the queries the engine needs from a VCS
//! - [`Git2Provider`]: libgit2 implementation
//! - [`ChangeSetResolver`]: turns two revisions into a filtered [`ChangeSetInfo`]

pub mod git;
pub mod provider;
pub mod resolver;
pub mod types;

pub use git::Git2Provider;
pub use provider::VcsProvider;
pub use resolver::{ChangeSetResolver, DEFAULT_EXTENSIONS};
pub use types::{ChangeSetInfo, RevisionId, WORKING_TREE};
