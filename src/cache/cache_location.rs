use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the cache root.
pub const CACHE_DIR_ENV: &str = "QUALISCAN_CACHE_DIR";

/// Sub-directory holding per-file digest records.
pub const FILES_NAMESPACE_DIR: &str = "files";

/// Strategy for cache storage location
#[derive(Debug, Clone, PartialEq)]
pub enum CacheStrategy {
    /// Store cache in the platform's shared cache directory (default)
    Shared,
    /// Store cache under a user-specified directory
    Custom(PathBuf),
}

/// Where one project's cache lives.
#[derive(Debug, Clone)]
pub struct CacheLocation {
    pub strategy: CacheStrategy,
    pub base_path: PathBuf,
    pub project_id: String,
}

impl CacheLocation {
    /// Resolve the cache location for `project_root`.
    ///
    /// Precedence: `QUALISCAN_CACHE_DIR`, then `configured`, then the shared
    /// platform directory.
    pub fn resolve(project_root: &Path, configured: Option<&Path>) -> Result<Self> {
        let strategy = Self::choose_strategy(std::env::var(CACHE_DIR_ENV).ok(), configured);
        Self::resolve_with_strategy(project_root, strategy)
    }

    pub fn resolve_with_strategy(project_root: &Path, strategy: CacheStrategy) -> Result<Self> {
        let project_id = Self::generate_project_id(project_root);

        let base_path = match &strategy {
            CacheStrategy::Shared => Self::shared_cache_dir()
                .join("projects")
                .join(&project_id),
            CacheStrategy::Custom(path) => path
                .join("qualiscan")
                .join("projects")
                .join(&project_id),
        };

        Ok(Self {
            strategy,
            base_path,
            project_id,
        })
    }

    /// Pure strategy selection from the environment value and configuration
    pub fn choose_strategy(env_value: Option<String>, configured: Option<&Path>) -> CacheStrategy {
        match env_value.filter(|v| !v.trim().is_empty()) {
            Some(dir) => CacheStrategy::Custom(PathBuf::from(dir)),
            None => configured
                .map(|dir| CacheStrategy::Custom(dir.to_path_buf()))
                .unwrap_or(CacheStrategy::Shared),
        }
    }

    /// Platform cache directory, falling back to the temp directory
    fn shared_cache_dir() -> PathBuf {
        if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
            return PathBuf::from(xdg_cache).join("qualiscan");
        }

        dirs::cache_dir()
            .map(|dir| dir.join("qualiscan"))
            .unwrap_or_else(|| std::env::temp_dir().join("qualiscan_cache"))
    }

    /// Stable project id: first 16 hex chars of SHA-256 over the canonical
    /// project path.
    ///
    /// Per-file digests are working-tree state, so two clones of the same
    /// repository must not share a cache.
    pub fn generate_project_id(project_root: &Path) -> String {
        let abs_path = project_root
            .canonicalize()
            .unwrap_or_else(|_| project_root.to_path_buf());
        let mut hasher = Sha256::new();
        hasher.update(abs_path.to_string_lossy().as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        hash[..16].to_string()
    }

    pub fn cache_path(&self) -> &Path {
        &self.base_path
    }

    pub fn files_path(&self) -> PathBuf {
        self.base_path.join(FILES_NAMESPACE_DIR)
    }

    /// Create the cache directory structure
    pub fn ensure_directories(&self) -> Result<()> {
        let files = self.files_path();
        std::fs::create_dir_all(&files)
            .with_context(|| format!("Failed to create cache directory: {}", files.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_strategy_precedence() {
        let configured = PathBuf::from("/configured");

        assert_eq!(
            CacheLocation::choose_strategy(Some("/from-env".into()), Some(&configured)),
            CacheStrategy::Custom(PathBuf::from("/from-env"))
        );
        assert_eq!(
            CacheLocation::choose_strategy(None, Some(&configured)),
            CacheStrategy::Custom(configured.clone())
        );
        assert_eq!(
            CacheLocation::choose_strategy(Some("  ".into()), None),
            CacheStrategy::Shared
        );
        assert_eq!(CacheLocation::choose_strategy(None, None), CacheStrategy::Shared);
    }

    #[test]
    fn test_project_id_generation() {
        let temp_dir = TempDir::new().unwrap();
        let id = CacheLocation::generate_project_id(temp_dir.path());
        assert_eq!(id.len(), 16);
        assert_eq!(id, CacheLocation::generate_project_id(temp_dir.path()));

        let other = TempDir::new().unwrap();
        assert_ne!(id, CacheLocation::generate_project_id(other.path()));
    }

    #[test]
    fn test_custom_layout_and_directories() {
        let project = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let location = CacheLocation::resolve_with_strategy(
            project.path(),
            CacheStrategy::Custom(cache.path().to_path_buf()),
        )
        .unwrap();

        assert!(location.cache_path().starts_with(cache.path()));
        assert!(location.cache_path().ends_with(&location.project_id));

        location.ensure_directories().unwrap();
        assert!(location.files_path().is_dir());
    }
}
