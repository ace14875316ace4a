//! Custom error types and result handling for comicscript operations.
//!
//! This module defines the error handling system used throughout the crate.
//! All operations return a [`Result<T>`] which is a type alias for `std::result::Result<T, Error>`.
//!
use std::path::PathBuf;

/// Type alias for Results with comicscript errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all comicscript operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Regular expression parsing errors
    #[error(transparent)]
    Regex(#[from] regex::Error),
    /// ZIP file operation errors
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// Async task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Semaphore(#[from] tokio::sync::AcquireError),
    #[error(transparent)]
    ScanBuilder(#[from] crate::scanner::ScanConfigBuilderError),
    /// Error for a direct call on a file whose extension is neither a
    /// recognized image nor a recognized archive format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    /// Error for an archive that failed its integrity check
    #[error("Archive failed integrity check: {0:?}")]
    CorruptArchive(PathBuf),
    /// Error for a partial or total extraction failure
    #[error("Failed to extract archive {0:?}: {1}")]
    ExtractionFailed(PathBuf, String),
    /// Opaque failure propagated from the external page recognizer
    #[error("Recognition failed for page {0:?}: {1}")]
    Recognizer(PathBuf, String),
    /// Error for a configuration key or value that could not be interpreted
    #[error("Invalid configuration value for '{0}': {1}")]
    InvalidConfigValue(String, String),
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// Error for resources that couldn't be found (e.g., source directory)
    #[error("Not found: {0}")]
    NotFound(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

// Basic From<String> conversion for convenience
impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
