//! Command implementations behind the `qualiscan` binary.
//!
//! Available commands:
//! - **changes**: print the change set between two revisions
//! - **status**: check every source file against its recorded digest
//! - **record**: store an analyzer result set under a revision
//! - **trend**: compare the cached runs of two revisions
//! - **cache**: show statistics for, or clear, the project's cache
//!
//! Handlers return their output as a `String` so they can be tested without
//! capturing stdout; `main` prints it.

pub mod cache;
pub mod changes;
pub mod project;
pub mod record;
pub mod status;
pub mod trend;

pub use cache::{cache_clear, cache_stats};
pub use changes::show_changes;
pub use project::ProjectContext;
pub use record::{record_results, RecordConfig};
pub use status::show_status;
pub use trend::show_trend;
