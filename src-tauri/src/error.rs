//! Error types for APK metadata extraction and export

use std::fmt;
use std::io;

/// Result type alias for ApkMeta operations
pub type ApkMetaResult<T> = Result<T, ApkMetaError>;

/// Errors that can occur while hashing, parsing or exporting
#[derive(Debug)]
pub enum ApkMetaError {
    /// I/O error (file unreadable, directory not walkable)
    Io(io::Error),
    /// Archive is corrupt, not a ZIP, or its manifest cannot be decoded
    Parse(String),
    /// Export destination cannot be created or written
    Write(String),
}

impl ApkMetaError {
    /// Build a parse error from anything printable
    pub fn parse(msg: impl Into<String>) -> Self {
        ApkMetaError::Parse(msg.into())
    }

    /// Build a write error from anything printable
    pub fn write(msg: impl Into<String>) -> Self {
        ApkMetaError::Write(msg.into())
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, ApkMetaError::Parse(_))
    }
}

impl fmt::Display for ApkMetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApkMetaError::Io(e) => write!(f, "I/O error: {}", e),
            ApkMetaError::Parse(e) => write!(f, "Parse error: {}", e),
            ApkMetaError::Write(e) => write!(f, "Write error: {}", e),
        }
    }
}

impl std::error::Error for ApkMetaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApkMetaError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ApkMetaError {
    fn from(err: io::Error) -> Self {
        ApkMetaError::Io(err)
    }
}

impl From<zip::result::ZipError> for ApkMetaError {
    fn from(err: zip::result::ZipError) -> Self {
        ApkMetaError::Parse(format!("Invalid APK archive: {}", err))
    }
}

impl From<csv::Error> for ApkMetaError {
    fn from(err: csv::Error) -> Self {
        ApkMetaError::Write(err.to_string())
    }
}
