//! Recursive package discovery

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{ApkMetaError, ApkMetaResult};
use crate::logging::is_debug_enabled;
use crate::metadata::is_apk_path;

/// Find every regular file under `root` whose name ends in `.apk` (any case)
///
/// Results are in directory traversal order. Entries that cannot be read are
/// logged and skipped.
pub fn discover_packages(root: &Path) -> ApkMetaResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(ApkMetaError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Directory not found: {}", root.display()),
        )));
    }
    if !root.is_dir() {
        return Err(ApkMetaError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Path is not a directory: {}", root.display()),
        )));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() && is_apk_path(entry.path()) {
            found.push(entry.into_path());
        }
    }

    if is_debug_enabled() {
        let first: Vec<String> = found.iter().take(3).map(|p| p.display().to_string()).collect();
        debug!(root = %root.display(), count = found.len(), ?first, "Package discovery complete");
    }
    Ok(found)
}
