use anyhow::Result;
use clap::Parser;
use colored::*;
use qualiscan::cli::{log_level, CacheAction, Cli, Commands};
use qualiscan::commands::{self, ProjectContext, RecordConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);
    if cli.plain {
        colored::control::set_override(false);
    }

    let (project, output) = run(cli.command)?;
    println!("{}", output);

    if let Some(summary) = project.degradation_summary() {
        eprint!("{}", summary.report().yellow());
    }
    Ok(())
}

/// `RUST_LOG` wins over the `-v` count when set.
fn init_logging(verbosity: u8) {
    env_logger::Builder::new()
        .filter_level(log_level(verbosity))
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(command: Commands) -> Result<(ProjectContext, String)> {
    match command {
        Commands::Changes {
            path,
            base,
            current,
            json,
        } => {
            let project = ProjectContext::load(&path)?;
            let output =
                commands::show_changes(&project, base.as_deref(), current.as_deref(), json)?;
            Ok((project, output))
        }
        Commands::Status {
            path,
            exclude,
            json,
        } => {
            let project = ProjectContext::load(&path)?;
            let output = commands::show_status(&project, &exclude, json)?;
            Ok((project, output))
        }
        Commands::Record {
            path,
            results,
            revision,
            merge_base,
        } => {
            let project = ProjectContext::load(&path)?;
            let config = RecordConfig {
                results,
                revision,
                merge_base,
            };
            let output = commands::record_results(&project, &config)?;
            Ok((project, output))
        }
        Commands::Trend {
            path,
            base,
            current,
            json,
        } => {
            let project = ProjectContext::load(&path)?;
            let output = commands::show_trend(&project, &base, &current, json)?;
            Ok((project, output))
        }
        Commands::Cache { action } => match action {
            CacheAction::Stats { path, json } => {
                let project = ProjectContext::load(&path)?;
                let output = commands::cache_stats(&project, json)?;
                Ok((project, output))
            }
            CacheAction::Clear { path } => {
                let project = ProjectContext::load(&path)?;
                let output = commands::cache_clear(&project)?;
                Ok((project, output))
            }
        },
    }
}
