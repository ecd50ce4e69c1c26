//! Content hashing for staleness detection.
//!
//! A [`FileDigest`] fingerprints the exact bytes of a file. Nothing is
//! normalized: whitespace, line endings and encoding changes all produce a
//! different digest. Inputs are trusted local files, so SHA-256 is used for
//! integrity only.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Fixed-length lowercase hex fingerprint of file content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileDigest(String);

impl FileDigest {
    /// Parse a previously rendered digest.
    ///
    /// Returns `None` unless the input is exactly [`DIGEST_HEX_LEN`] lowercase
    /// hex characters, so a damaged record reads back as absent.
    pub fn parse(hex: &str) -> Option<Self> {
        let valid = hex.len() == DIGEST_HEX_LEN
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(hex.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this value still has the shape of a digest. Deserialized
    /// values bypass [`FileDigest::parse`] and are checked with this.
    pub fn is_well_formed(&self) -> bool {
        Self::parse(&self.0).is_some()
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest an in-memory byte sequence.
pub fn digest(bytes: &[u8]) -> FileDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    FileDigest(format!("{:x}", hasher.finalize()))
}

/// Digest the current contents of a file.
///
/// Fails if the file cannot be read. Callers must treat a failure as
/// "changed", never as "unchanged".
pub fn digest_file(path: &Path) -> Result<FileDigest> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(digest(&bytes))
}
