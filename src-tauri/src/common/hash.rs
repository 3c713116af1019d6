// Hash utilities for APK fingerprinting
//
// Every parsed package is fingerprinted with MD5, SHA-1 and SHA-256 computed
// in a single streaming pass over the file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use md5::Md5;
use sha1::{Sha1, Digest};
use sha2::Sha256;
use tracing::{debug, instrument};

use super::BUFFER_SIZE;
use crate::error::ApkMetaResult;

// =============================================================================
// Hash Algorithm Enum
// =============================================================================

/// Hash algorithms reported for every package
/// - MD5: 128-bit, still the most common identifier in malware feeds
/// - SHA1: 160-bit, used by v1 JAR signing and many app stores
/// - SHA256: 256-bit, the modern reference fingerprint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// All algorithms, in table column order
    pub const ALL: [HashAlgorithm; 3] = [HashAlgorithm::Md5, HashAlgorithm::Sha1, HashAlgorithm::Sha256];

    /// Get the canonical algorithm name (also the table column header)
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha256 => "SHA256",
        }
    }

}

/// Parses a column or CLI name such as `SHA-256` (case and dashes ignored)
impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(algorithm: &str) -> Result<Self, Self::Err> {
        match algorithm.trim().to_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" | "sha-1" => Ok(HashAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            _ => Err(format!(
                "Unsupported hash algorithm: '{}'. Supported: md5, sha1, sha256",
                algorithm
            )),
        }
    }
}

// =============================================================================
// Streaming Hasher
// =============================================================================

/// A streaming hasher for a single algorithm
pub enum StreamingHasher {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
}

impl StreamingHasher {
    /// Start an empty digest
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => StreamingHasher::Md5(Md5::new()),
            HashAlgorithm::Sha1 => StreamingHasher::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => StreamingHasher::Sha256(Sha256::new()),
        }
    }

    /// Feed one chunk
    pub fn update(&mut self, data: &[u8]) {
        match self {
            StreamingHasher::Md5(h) => Digest::update(h, data),
            StreamingHasher::Sha1(h) => Digest::update(h, data),
            StreamingHasher::Sha256(h) => Digest::update(h, data),
        }
    }

    /// Finalize and return the hash as a lowercase hex string
    pub fn finalize(self) -> String {
        match self {
            StreamingHasher::Md5(h) => hex::encode(h.finalize()),
            StreamingHasher::Sha1(h) => hex::encode(h.finalize()),
            StreamingHasher::Sha256(h) => hex::encode(h.finalize()),
        }
    }
}

/// MD5, SHA1 and SHA256 fed from the same chunks
pub struct TripleHasher {
    md5: StreamingHasher,
    sha1: StreamingHasher,
    sha256: StreamingHasher,
}

impl TripleHasher {
    pub fn new() -> Self {
        Self {
            md5: StreamingHasher::new(HashAlgorithm::Md5),
            sha1: StreamingHasher::new(HashAlgorithm::Sha1),
            sha256: StreamingHasher::new(HashAlgorithm::Sha256),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.md5.update(data);
        self.sha1.update(data);
        self.sha256.update(data);
    }

    pub fn finalize(self) -> FileDigests {
        FileDigests {
            md5: self.md5.finalize(),
            sha1: self.sha1.finalize(),
            sha256: self.sha256.finalize(),
        }
    }
}

impl Default for TripleHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// The three digests of one file, lowercase hex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigests {
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
}

impl FileDigests {
    /// Digest for a single algorithm
    pub fn get(&self, algorithm: HashAlgorithm) -> &str {
        match algorithm {
            HashAlgorithm::Md5 => &self.md5,
            HashAlgorithm::Sha1 => &self.sha1,
            HashAlgorithm::Sha256 => &self.sha256,
        }
    }
}

/// Digest an in-memory buffer
pub fn compute_hash(data: &[u8], algorithm: HashAlgorithm) -> String {
    let mut hasher = StreamingHasher::new(algorithm);
    hasher.update(data);
    hasher.finalize()
}

/// Hash a file with MD5, SHA1 and SHA256 in one pass
///
/// # Arguments
/// * `path` - Path to the file to hash
/// * `progress_callback` - Called with (bytes_processed, total_bytes)
///
/// The file handle lives only for the duration of this call. A failed open or
/// a read error partway through returns `Io` and no digests.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn hash_file_with_progress<F>(path: &Path, mut progress_callback: F) -> ApkMetaResult<FileDigests>
where
    F: FnMut(u64, u64),
{
    let file = File::open(path)?;
    let total_size = file.metadata()?.len();

    debug!(total_size, "Starting file hash");

    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = TripleHasher::new();
    let mut bytes_read_total = 0u64;

    loop {
        let buf = reader.fill_buf()?;
        let len = buf.len();
        if len == 0 {
            break;
        }

        hasher.update(buf);
        reader.consume(len);

        bytes_read_total += len as u64;
        progress_callback(bytes_read_total, total_size);
    }

    let digests = hasher.finalize();
    debug!(sha256 = %digests.sha256, "File hash complete");
    Ok(digests)
}

/// [`hash_file_with_progress`] without a callback
pub fn hash_file(path: &Path) -> ApkMetaResult<FileDigests> {
    hash_file_with_progress(path, |_, _| {})
}
