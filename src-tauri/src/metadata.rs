//! Per-file metadata records
//!
//! A [`Record`] is one table row: path information, the four manifest fields
//! and the three file digests. Fields the package does not declare are empty
//! strings.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::apk::PackageParser;
use crate::common::hash_file;
use crate::error::ApkMetaResult;

/// Extension matched when discovering packages (compared case-insensitively)
pub const APK_EXTENSION: &str = "apk";

/// Column headers, in display and export order
pub const COLUMNS: [&str; 9] = [
    "File Name",
    "File Path",
    "Package Name",
    "App Name",
    "Version Name",
    "Version Code",
    "MD5",
    "SHA1",
    "SHA256",
];

/// One row of the results table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    pub file_name: String,
    pub file_path: String,
    pub package_name: String,
    pub app_name: String,
    pub version_name: String,
    pub version_code: String,
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
}

impl Record {
    /// Value of column `index` (see [`COLUMNS`])
    pub fn field(&self, index: usize) -> Option<&str> {
        let value = match index {
            0 => &self.file_name,
            1 => &self.file_path,
            2 => &self.package_name,
            3 => &self.app_name,
            4 => &self.version_name,
            5 => &self.version_code,
            6 => &self.md5,
            7 => &self.sha1,
            8 => &self.sha256,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// All nine values in column order
    pub fn values(&self) -> [&str; 9] {
        [
            self.file_name.as_str(),
            self.file_path.as_str(),
            self.package_name.as_str(),
            self.app_name.as_str(),
            self.version_name.as_str(),
            self.version_code.as_str(),
            self.md5.as_str(),
            self.sha1.as_str(),
            self.sha256.as_str(),
        ]
    }
}

/// Check whether a path names an APK by extension
pub fn is_apk_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(APK_EXTENSION))
}

/// Parse `path` with `parser`, hash it, and build its record
///
/// The parser runs first; a parse failure is returned before any hashing.
pub fn extract_record(path: &Path, parser: &dyn PackageParser) -> ApkMetaResult<Record> {
    let info = parser.parse(path)?;
    let digests = hash_file(path)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!(file = %file_name, package = info.package_name.as_deref().unwrap_or(""), "Extracted record");

    Ok(Record {
        file_name,
        file_path: path.display().to_string(),
        package_name: info.package_name.unwrap_or_default(),
        app_name: info.app_name.unwrap_or_default(),
        version_name: info.version_name.unwrap_or_default(),
        version_code: info.version_code.unwrap_or_default(),
        md5: digests.md5,
        sha1: digests.sha1,
        sha256: digests.sha256,
    })
}
