use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "qualiscan")]
#[command(about = "Incremental analysis planner and result cache", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub plain: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the files that changed between two revisions
    Changes {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Base revision (defaults to the configured base, then HEAD's parent)
        #[arg(long)]
        base: Option<String>,

        /// Current revision (defaults to the working tree)
        #[arg(long)]
        current: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Check every source file against its recorded digest
    Status {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Glob patterns to skip, in addition to the configured ones
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Store an analyzer result set under a revision
    Record {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// JSON file holding the result set
        #[arg(long)]
        results: PathBuf,

        /// Revision to record under
        #[arg(long, default_value = "HEAD")]
        revision: String,

        /// Overlay the results on the run cached for this revision first
        #[arg(long = "merge-base")]
        merge_base: Option<String>,
    },

    /// Compare the cached runs of two revisions
    Trend {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Baseline revision
        #[arg(long)]
        base: String,

        /// Revision to compare against the baseline
        #[arg(long, default_value = "HEAD")]
        current: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Inspect or clear the project's cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show entry counts and size
    Stats {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Remove every cached entry for the project
    Clear {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

/// Log filter for a `-v` count
pub fn log_level(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_changes_defaults() {
        let cli = Cli::parse_from(["qualiscan", "changes"]);
        match cli.command {
            Commands::Changes {
                path,
                base,
                current,
                json,
            } => {
                assert_eq!(path, PathBuf::from("."));
                assert!(base.is_none());
                assert!(current.is_none());
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_verbosity_after_subcommand() {
        let cli = Cli::parse_from(["qualiscan", "status", "-vv", "--exclude", "a/**,b/**"]);
        assert_eq!(cli.verbosity, 2);
        match cli.command {
            Commands::Status { exclude, .. } => assert_eq!(exclude, vec!["a/**", "b/**"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_record_requires_results() {
        assert!(Cli::try_parse_from(["qualiscan", "record"]).is_err());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0), log::LevelFilter::Warn);
        assert_eq!(log_level(1), log::LevelFilter::Info);
        assert_eq!(log_level(7), log::LevelFilter::Trace);
    }
}
