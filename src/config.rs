//! `.qualiscan.toml` configuration.
//!
//! ```toml
//! [incremental]
//! extensions = ["rs", "py"]
//! base_revision = "origin/main"
//!
//! [cache]
//! dir = "/var/cache/qualiscan"
//! ```
//!
//! The file is looked up in the start directory and its ancestors. A missing
//! file means defaults; an unreadable or malformed one is reported and also
//! means defaults.

use crate::vcs::DEFAULT_EXTENSIONS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".qualiscan.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualiscanConfig {
    pub incremental: IncrementalConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncrementalConfig {
    /// Source extensions considered by change-set resolution and scans
    pub extensions: Vec<String>,
    /// Base revision used when none is given explicitly
    pub base_revision: Option<String>,
    /// Glob patterns excluded from full scans
    pub exclude: Vec<String>,
}

impl Default for IncrementalConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            base_revision: None,
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root; `QUALISCAN_CACHE_DIR` takes precedence
    pub dir: Option<PathBuf>,
}

/// Parse configuration from TOML text
pub fn parse_config(contents: &str) -> Result<QualiscanConfig, String> {
    let config = toml::from_str::<QualiscanConfig>(contents)
        .map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))?;

    if config.incremental.extensions.is_empty() {
        return Err(format!(
            "{}: [incremental] extensions must not be empty",
            CONFIG_FILE_NAME
        ));
    }

    Ok(config)
}

/// Try loading config from a specific file path
pub fn try_load_config_from_path(config_path: &Path) -> Option<QualiscanConfig> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            // Only log actual errors, not "file not found"
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
            }
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// `start` and up to `max_depth - 1` of its ancestors
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Load configuration for a project rooted at (or below) `start`.
pub fn load_config(start: &Path) -> QualiscanConfig {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());

    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No {} found after checking {} directories. Using default config.",
                CONFIG_FILE_NAME,
                MAX_TRAVERSAL_DEPTH
            );
            QualiscanConfig::default()
        })
}
