//! Android Package (APK) parsing
//!
//! An APK is a ZIP archive. The four fields shown in the table come from the
//! binary `AndroidManifest.xml`; string references in it are resolved through
//! `resources.arsc` when present.
//!
//! ## Module Structure
//! - `types`    - Chunk types, value types, framework attribute IDs
//! - `strings`  - String pool decoding (UTF-8 and UTF-16)
//! - `axml`     - Binary XML element/attribute decoding
//! - `arsc`     - Resource table lookups
//! - `manifest` - Manifest field extraction and label fallback

pub mod arsc;
pub mod axml;
pub mod manifest;
pub mod strings;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::{debug, instrument, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{ApkMetaError, ApkMetaResult};

use self::arsc::ResourceTable;
use self::manifest::Manifest;

pub const MANIFEST_ENTRY: &str = "AndroidManifest.xml";
pub const RESOURCES_ENTRY: &str = "resources.arsc";

/// Fields read from a package; any of them may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    pub package_name: Option<String>,
    pub app_name: Option<String>,
    pub version_name: Option<String>,
    pub version_code: Option<String>,
}

/// Reads package metadata from a file
pub trait PackageParser: Send + Sync {
    fn parse(&self, path: &Path) -> ApkMetaResult<PackageInfo>;
}

/// Parser for APK files on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct ApkParser;

impl ApkParser {
    pub fn new() -> Self {
        Self
    }
}

impl PackageParser for ApkParser {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn parse(&self, path: &Path) -> ApkMetaResult<PackageInfo> {
        let file = File::open(path)
            .map_err(|e| ApkMetaError::parse(format!("Cannot open {}: {}", path.display(), e)))?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let manifest_bytes = read_entry(&mut archive, MANIFEST_ENTRY)?
            .ok_or_else(|| ApkMetaError::parse(format!("{} not found in archive", MANIFEST_ENTRY)))?;
        let manifest = Manifest::parse(&manifest_bytes)?;

        let resources = read_entry(&mut archive, RESOURCES_ENTRY)?;
        let table = match resources.as_deref().map(ResourceTable::parse) {
            Some(Ok(table)) => Some(table),
            Some(Err(e)) => {
                warn!(error = %e, "Ignoring unreadable resource table");
                None
            }
            None => None,
        };

        let info = manifest.resolve(table.as_ref());
        debug!(
            package = info.package_name.as_deref().unwrap_or(""),
            version = info.version_name.as_deref().unwrap_or(""),
            "Parsed manifest"
        );
        Ok(info)
    }
}

/// Largest manifest or resource table read from an archive
pub const MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

/// Read a whole archive entry; `None` if the archive has no such entry
fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> ApkMetaResult<Option<Vec<u8>>> {
    read_entry_limited(archive, name, MAX_ENTRY_SIZE)
}

/// Like [`read_entry`], failing once more than `limit` bytes come out
///
/// The declared size only sizes the initial buffer; it is not trusted.
fn read_entry_limited<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    limit: u64,
) -> ApkMetaResult<Option<Vec<u8>>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut buf = Vec::with_capacity(entry.size().min(limit) as usize);
    entry
        .by_ref()
        .take(limit + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ApkMetaError::parse(format!("Failed to read {}: {}", name, e)))?;
    if buf.len() as u64 > limit {
        return Err(ApkMetaError::parse(format!(
            "{} is larger than {} bytes",
            name, limit
        )));
    }
    Ok(Some(buf))
}
