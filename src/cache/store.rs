//! Durable key → payload store for analysis results.
//!
//! ## Layout
//!
//! ```text
//! <cache root>/
//!   <escaped revision>.json        whole-run AnalysisResultSet
//!   files/<escaped path>.json      per-file FileDigest
//! ```
//!
//! Keys are escaped into a single file-name token, so a path key never
//! implies sub-directories and the two namespaces cannot collide.
//!
//! ## Failure model
//!
//! Reads never fail: a missing entry is `None`, and an unreadable or corrupt
//! entry is reported and also `None`. Writes return [`CacheError`] so the
//! caller can decide; every caller in this crate reports and carries on.
//! Writes land in a temporary sibling and are renamed into place, so a
//! concurrent reader sees either the old or the new entry. Concurrent writers
//! to one key race with last-write-wins.

use crate::cache::cache_location::CacheLocation;
use crate::errors::{CacheError, Degradation, DegradationKind, ErrorReporter};
use crate::hashing::FileDigest;
use crate::results::AnalysisResultSet;
use crate::vcs::RevisionId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const ENTRY_EXTENSION: &str = "json";

/// Escaped keys longer than this are shortened with a content hash.
const MAX_TOKEN_LEN: usize = 200;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Key families within one store root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Whole-run results keyed by revision id
    Runs,
    /// Per-file digests keyed by project-relative path
    Files,
}

/// One persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub key: String,
    pub written_at: DateTime<Utc>,
    pub payload: T,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub run_entries: usize,
    pub file_entries: usize,
    pub total_bytes: u64,
}

pub struct ResultCacheStore {
    location: CacheLocation,
    reporter: Arc<dyn ErrorReporter>,
}

impl std::fmt::Debug for ResultCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCacheStore")
            .field("location", &self.location)
            .finish()
    }
}

impl ResultCacheStore {
    /// Directories are created lazily on first write.
    pub fn new(location: CacheLocation, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { location, reporter }
    }

    pub fn location(&self) -> &CacheLocation {
        &self.location
    }

    /// File backing `key` in `namespace`
    pub fn entry_path(&self, namespace: Namespace, key: &str) -> PathBuf {
        let dir = match namespace {
            Namespace::Runs => self.location.cache_path().to_path_buf(),
            Namespace::Files => self.location.files_path(),
        };
        dir.join(format!("{}.{}", escape_key(key), ENTRY_EXTENSION))
    }

    /// Store `payload` under `key`, replacing any previous entry.
    pub fn put<T: Serialize>(
        &self,
        namespace: Namespace,
        key: &str,
        payload: &T,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            key: key.to_string(),
            written_at: Utc::now(),
            payload,
        };
        let bytes = serde_json::to_vec(&entry).map_err(|source| CacheError::Serialize {
            key: key.to_string(),
            source,
        })?;

        let path = self.entry_path(namespace, key);
        write_atomic(&path, &bytes)?;
        log::debug!("Cached {:?} entry '{}' ({} bytes)", namespace, key, bytes.len());
        Ok(())
    }

    /// Payload stored under `key`, or `None` on miss, unreadable or corrupt
    /// entry.
    pub fn get<T: DeserializeOwned>(&self, namespace: Namespace, key: &str) -> Option<T> {
        self.get_entry(namespace, key).map(|entry| entry.payload)
    }

    pub fn get_entry<T: DeserializeOwned>(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> Option<CacheEntry<T>> {
        let path = self.entry_path(namespace, key);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                self.reporter.report(
                    Degradation::new(DegradationKind::CacheReadFailed, e).with_path(&path),
                );
                return None;
            }
        };

        match serde_json::from_slice::<CacheEntry<T>>(&bytes) {
            Ok(entry) if entry.key == key => Some(entry),
            Ok(entry) => {
                log::debug!(
                    "Cache token collision: wanted '{}', found '{}'",
                    key,
                    entry.key
                );
                None
            }
            Err(e) => {
                self.reporter
                    .report(Degradation::new(DegradationKind::CorruptEntry, e).with_path(&path));
                None
            }
        }
    }

    /// Whether an entry file is present, readable or not.
    pub fn exists(&self, namespace: Namespace, key: &str) -> bool {
        self.entry_path(namespace, key).is_file()
    }

    /// Remove one entry. Removing a missing entry is not an error.
    pub fn delete(&self, namespace: Namespace, key: &str) -> Result<(), CacheError> {
        let path = self.entry_path(namespace, key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// Remove every entry for this project.
    pub fn clear(&self) -> Result<(), CacheError> {
        let root = self.location.cache_path();
        match fs::remove_dir_all(root) {
            Ok(()) => {
                log::info!("Cleared cache at {}", root.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(root, e)),
        }
    }

    pub fn stats(&self) -> CacheStats {
        let (run_entries, run_bytes) = count_entries(self.location.cache_path());
        let (file_entries, file_bytes) = count_entries(&self.location.files_path());
        CacheStats {
            run_entries,
            file_entries,
            total_bytes: run_bytes + file_bytes,
        }
    }

    // Whole-run results

    pub fn put_run(
        &self,
        revision: &RevisionId,
        results: &AnalysisResultSet,
    ) -> Result<(), CacheError> {
        self.put(Namespace::Runs, revision.as_str(), results)
    }

    pub fn get_run(&self, revision: &RevisionId) -> Option<AnalysisResultSet> {
        self.get(Namespace::Runs, revision.as_str())
    }

    /// True only when a readable result set is stored for `revision`.
    pub fn has_run(&self, revision: &RevisionId) -> bool {
        self.get_run(revision).is_some()
    }

    // Per-file digests

    pub fn put_digest(&self, path: &Path, digest: &FileDigest) -> Result<(), CacheError> {
        self.put(Namespace::Files, &path_key(path), digest)
    }

    pub fn get_digest(&self, path: &Path) -> Option<FileDigest> {
        let key = path_key(path);
        let digest: FileDigest = self.get(Namespace::Files, &key)?;
        if digest.is_well_formed() {
            Some(digest)
        } else {
            self.reporter.report(
                Degradation::new(DegradationKind::CorruptEntry, "malformed digest record")
                    .with_path(path),
            );
            None
        }
    }

    pub fn forget_digest(&self, path: &Path) -> Result<(), CacheError> {
        self.delete(Namespace::Files, &path_key(path))
    }
}

/// Platform-independent key for a project-relative path
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Escape a key into a single file-name token.
///
/// Bytes outside `[A-Za-z0-9_.~+@=,-]` become `%XX`, as does a leading `.`,
/// so the mapping is injective and never yields a separator or a hidden
/// file. Tokens that would exceed the file-name budget keep a readable
/// prefix followed by `#` and the SHA-256 of the key; `#` never appears in a
/// regular token.
pub fn escape_key(key: &str) -> String {
    if key.is_empty() {
        return "%".to_string();
    }

    let mut token = String::with_capacity(key.len());
    for (i, byte) in key.bytes().enumerate() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'_' | b'~' | b'+' | b'@' | b'=' | b',' | b'-')
            || (byte == b'.' && i > 0);
        if keep {
            token.push(byte as char);
        } else {
            token.push_str(&format!("%{:02X}", byte));
        }
    }

    if token.len() <= MAX_TOKEN_LEN {
        return token;
    }

    let mut cut = 120;
    // never split a %XX triple
    while token[..cut].ends_with('%') || token[..cut - 1].ends_with('%') {
        cut -= 1;
    }
    format!("{}#{}", &token[..cut], crate::hashing::digest(key.as_bytes()))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = dir.join(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    fs::write(&tmp, bytes).map_err(|e| CacheError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        CacheError::io(path, e)
    })
}

/// Count `*.json` entries directly inside `dir` and their total size
fn count_entries(dir: &Path) -> (usize, u64) {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return (0, 0);
    };

    read_dir
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let path = entry.path();
            path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION)
                && !entry.file_name().to_string_lossy().starts_with('.')
        })
        .filter_map(|entry| entry.metadata().ok())
        .filter(|meta| meta.is_file())
        .fold((0, 0), |(count, bytes), meta| (count + 1, bytes + meta.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::cache_location::CacheStrategy;
    use crate::errors::CollectingReporter;
    use crate::hashing::digest;
    use crate::results::{AnalyzerResult, DuplicationResult};
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> (ResultCacheStore, Arc<CollectingReporter>) {
        let location = CacheLocation::resolve_with_strategy(
            dir.path(),
            CacheStrategy::Custom(dir.path().join("cache")),
        )
        .unwrap();
        let reporter = Arc::new(CollectingReporter::new());
        (ResultCacheStore::new(location, reporter.clone()), reporter)
    }

    fn sample_results() -> AnalysisResultSet {
        let mut results = AnalysisResultSet::new();
        results.insert(
            "duplication",
            AnalyzerResult::Duplication(DuplicationResult {
                duplication_rate: 0.125,
                duplicated_lines: 25,
                total_lines: 200,
                blocks: 3,
            }),
        );
        results
    }

    #[test]
    fn test_round_trip_run() {
        let dir = TempDir::new().unwrap();
        let (store, reporter) = store_in(&dir);
        let revision = RevisionId::new("4f2a9c");

        store.put_run(&revision, &sample_results()).unwrap();

        assert!(store.has_run(&revision));
        assert_eq!(store.get_run(&revision), Some(sample_results()));
        assert!(reporter.is_empty());
    }

    #[test]
    fn test_miss_is_absent_not_error() {
        let dir = TempDir::new().unwrap();
        let (store, reporter) = store_in(&dir);

        assert_eq!(store.get_run(&RevisionId::new("never-written")), None);
        assert!(!store.has_run(&RevisionId::new("never-written")));
        assert!(reporter.is_empty());
    }

    #[test]
    fn test_overwrite_is_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_in(&dir);

        store.put(Namespace::Runs, "k", &1u32).unwrap();
        store.put(Namespace::Runs, "k", &2u32).unwrap();

        assert_eq!(store.get::<u32>(Namespace::Runs, "k"), Some(2));
    }

    #[test]
    fn test_corrupt_entry_reads_as_miss() {
        let dir = TempDir::new().unwrap();
        let (store, reporter) = store_in(&dir);
        let revision = RevisionId::new("abc");
        store.put_run(&revision, &sample_results()).unwrap();

        fs::write(
            store.entry_path(Namespace::Runs, "abc"),
            b"{\"key\": \"abc\", trunc",
        )
        .unwrap();

        assert_eq!(store.get_run(&revision), None);
        assert_eq!(reporter.count_of(DegradationKind::CorruptEntry), 1);
    }

    #[test]
    fn test_corrupt_run_is_present_but_not_recorded() {
        let dir = TempDir::new().unwrap();
        let (store, reporter) = store_in(&dir);
        let revision = RevisionId::new("half-written");
        store.put_run(&revision, &sample_results()).unwrap();
        fs::write(store.entry_path(Namespace::Runs, "half-written"), b"[1, 2").unwrap();

        assert!(store.exists(Namespace::Runs, "half-written"));
        assert!(!store.has_run(&revision));
        assert_eq!(reporter.count_of(DegradationKind::CorruptEntry), 1);
    }

    #[test]
    fn test_unreadable_entry_reports_read_failure() {
        let dir = TempDir::new().unwrap();
        let (store, reporter) = store_in(&dir);
        let revision = RevisionId::new("rev");
        // a directory where the entry file should be cannot be read as one
        fs::create_dir_all(store.entry_path(Namespace::Runs, "rev")).unwrap();

        assert_eq!(store.get_run(&revision), None);
        assert_eq!(reporter.count_of(DegradationKind::CacheReadFailed), 1);
        assert_eq!(reporter.count_of(DegradationKind::CorruptEntry), 0);
        assert!(!store.has_run(&revision));
    }

    #[test]
    fn test_wrong_payload_shape_reads_as_miss() {
        let dir = TempDir::new().unwrap();
        let (store, reporter) = store_in(&dir);
        store.put(Namespace::Runs, "rev", &"not a result set").unwrap();

        assert_eq!(store.get_run(&RevisionId::new("rev")), None);
        assert_eq!(reporter.count_of(DegradationKind::CorruptEntry), 1);
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_in(&dir);

        store.put(Namespace::Runs, "same", &"run").unwrap();
        store.put(Namespace::Files, "same", &"file").unwrap();

        assert_eq!(store.get::<String>(Namespace::Runs, "same").as_deref(), Some("run"));
        assert_eq!(store.get::<String>(Namespace::Files, "same").as_deref(), Some("file"));
    }

    #[test]
    fn test_digest_records_are_flat() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_in(&dir);
        let path = Path::new("src/cache/store.rs");
        let d = digest(b"content");

        store.put_digest(path, &d).unwrap();

        let entry = store.entry_path(Namespace::Files, &path_key(path));
        assert_eq!(entry.parent().unwrap(), store.location().files_path());
        assert_eq!(store.get_digest(path), Some(d));

        store.forget_digest(path).unwrap();
        assert_eq!(store.get_digest(path), None);
        // forgetting twice is fine
        store.forget_digest(path).unwrap();
    }

    #[test]
    fn test_malformed_digest_reads_as_miss() {
        let dir = TempDir::new().unwrap();
        let (store, reporter) = store_in(&dir);
        store.put(Namespace::Files, "src/lib.rs", &"not-a-digest").unwrap();

        assert_eq!(store.get_digest(Path::new("src/lib.rs")), None);
        assert_eq!(reporter.count_of(DegradationKind::CorruptEntry), 1);
    }

    #[test]
    fn test_stats_and_clear() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_in(&dir);
        store.put_run(&RevisionId::new("r1"), &sample_results()).unwrap();
        store.put_run(&RevisionId::new("r2"), &sample_results()).unwrap();
        store.put_digest(Path::new("a.rs"), &digest(b"a")).unwrap();

        let stats = store.stats();
        assert_eq!(stats.run_entries, 2);
        assert_eq!(stats.file_entries, 1);
        assert!(stats.total_bytes > 0);

        store.clear().unwrap();
        assert_eq!(store.stats(), CacheStats::default());
        assert_eq!(store.get_run(&RevisionId::new("r1")), None);
        // clearing an absent cache is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_escape_key_examples() {
        assert_eq!(escape_key("src/lib.rs"), "src%2Flib.rs");
        assert_eq!(escape_key("src\\lib.rs"), "src%5Clib.rs");
        assert_eq!(escape_key(".hidden"), "%2Ehidden");
        assert_eq!(escape_key("100%"), "100%25");
        assert_eq!(escape_key(""), "%");
        assert_eq!(escape_key("a1b2c3"), "a1b2c3");
    }

    #[test]
    fn test_long_keys_are_shortened() {
        let long = "deeply/nested/".repeat(40) + "file.rs";
        let token = escape_key(&long);
        assert!(token.len() <= MAX_TOKEN_LEN);
        assert!(token.contains('#'));
        assert_ne!(token, escape_key(&(long.clone() + "x")));
    }

    proptest! {
        #[test]
        fn escaped_tokens_are_single_path_components(key in ".{0,80}") {
            let token = escape_key(&key);
            prop_assert!(!token.contains('/'));
            prop_assert!(!token.contains('\\'));
            prop_assert!(!token.starts_with('.'));
            prop_assert!(!token.is_empty());
        }

        #[test]
        fn escaping_is_injective(a in "[a-z/%.\\\\]{0,12}", b in "[a-z/%.\\\\]{0,12}") {
            if a != b {
                prop_assert_ne!(escape_key(&a), escape_key(&b));
            }
        }
    }
}
