//! Path classification for the ingestion pipeline.
//!
//! Every filesystem entry the scanner encounters is classified by its
//! extension into one of three kinds: a comic page image, an archive of
//! pages, or something the pipeline does not handle. Classification is
//! purely lexical; no file content is inspected.

use std::path::Path;

/// Image extensions the pipeline dispatches to the recognizer.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "png", "bmp", "tiff"];
/// Archive extensions the pipeline expands before recursing.
pub const ARCHIVE_EXTENSIONS: [&str; 3] = ["rar", "cbr", "zip"];

/// The pipeline-relevant kind of a filesystem path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathKind {
    /// A comic page image, dispatched directly to the recognizer.
    Image,
    /// An archive of pages, expanded into a workspace and recursed into.
    Archive,
    /// Anything else. Skipped during traversal, rejected on direct calls.
    Unrecognized,
}

/// Classifies a path by its extension, case as given.
///
/// Extensions are compared literally (`page.JPG` is `Unrecognized`), matching
/// the behavior of the extension tables above.
pub fn classify(path: &Path) -> PathKind {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return PathKind::Unrecognized;
    };
    if IMAGE_EXTENSIONS.contains(&ext) {
        PathKind::Image
    } else if ARCHIVE_EXTENSIONS.contains(&ext) {
        PathKind::Archive
    } else {
        PathKind::Unrecognized
    }
}

/// Renders the extension of a path the way error messages name it,
/// with a leading dot (e.g. `".gif"`). Empty for extensionless paths.
pub fn displayed_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// The logical source identifier for a real filesystem path.
pub fn source_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// The final path component, used when rewriting workspace paths into
/// `archive/pageName` identifiers.
pub fn page_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
