//! CSV export
//!
//! Files start with a UTF-8 byte order mark so spreadsheet applications pick
//! the right encoding, followed by the header row and one row per record.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, TimeZone};
use tracing::{info, instrument};

use crate::error::{ApkMetaError, ApkMetaResult};
use crate::metadata::{Record, COLUMNS};

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write `rows` to `path` as CSV, replacing any existing file
#[instrument(skip_all, fields(path = %path.display(), rows = rows.len()))]
pub fn export_csv(rows: &[Record], path: &Path) -> ApkMetaResult<()> {
    let file = File::create(path)
        .map_err(|e| ApkMetaError::write(format!("Cannot create {}: {}", path.display(), e)))?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM)
        .map_err(|e| ApkMetaError::write(e.to_string()))?;

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(COLUMNS)?;
    for record in rows {
        writer.write_record(record.values())?;
    }
    writer
        .flush()
        .map_err(|e| ApkMetaError::write(e.to_string()))?;

    info!("CSV exported");
    Ok(())
}

/// Suggested file name for an export started at `now`
pub fn default_export_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("apkmeta_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Append `.csv` when the file name has no extension at all
pub fn ensure_csv_extension(path: &Path) -> std::path::PathBuf {
    if path.extension().is_some() {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".csv");
    name.into()
}
