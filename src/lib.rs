//! Comicscript - Comic Script Extraction Library
//!
//! This crate provides an asynchronous pipeline for extracting textual
//! script from comic-book page images. It accepts a single image, an
//! archive of images (CBR/CBZ/ZIP), or a directory tree containing
//! either, and produces per-page text results optionally persisted to a
//! comma-delimited output file.
//!
//! The optical character recognition step itself is an external
//! collaborator: implement the [`Recognizer`](recognizer::Recognizer)
//! trait and hand it to the scan entry points. Archive decompression is
//! likewise pluggable via [`ArchiveTool`](archive::ArchiveTool), with a
//! ZIP-backed implementation built in.
//!
//! # Getting Started
//!
//! Configure a scan task via the [`ScanConfig`] builder, then execute it
//! with one of the `read_*` methods.
//!
//! ```rust,no_run
//! use comicscript::prelude::*;
//! use std::path::Path;
//!
//! struct MyOcr;
//!
//! #[async_trait::async_trait]
//! impl Recognizer for MyOcr {
//!     async fn recognize(
//!         &self,
//!         page: &Path,
//!         _config: &RecognizerConfig,
//!     ) -> comicscript::error::Result<Vec<String>> {
//!         // Call into your OCR engine of choice here.
//!         Ok(vec![format!("text from {:?}", page)])
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> comicscript::error::Result<()> {
//!     let recognizer: Arc<dyn Recognizer> = Arc::new(MyOcr);
//!
//!     // 1. Configure the scan using the builder
//!     let config = ScanConfig::builder()
//!         .failure_policy(FailurePolicy::CollectAndContinue)
//!         .output_path("./scripts.csv")
//!         .build()?;
//!
//!     // 2. Execute it against a directory tree of pages and archives
//!     let outcome = config
//!         .read_directory(&recognizer, Path::new("./my_comic_collection"))
//!         .await?;
//!
//!     for (source, script) in &outcome.scripts {
//!         println!("{}: {} lines", source, script.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For single files use [`ScanConfig::read_image`] or
//! [`ScanConfig::read_archive`]; [`ScanConfig::read_path`] dispatches on
//! whatever the path turns out to be.

pub mod archive;
pub mod classify;
pub mod config;
pub mod error;
pub mod recognizer;
pub mod scanner;
pub mod sink;
pub mod types;

// Publicly expose the main `ScanConfig` struct and its builder
pub use scanner::ScanConfig;
pub use scanner::ScanConfigBuilder;

// Re-export error and core types for direct access
pub use classify::{ARCHIVE_EXTENSIONS, IMAGE_EXTENSIONS, PathKind};
pub use config::{ConfigSource, ConfigValue, RecognitionMethod, RecognizerConfig};
pub use types::{FailurePolicy, PageFailure, PageScript, ScanOutcome, ScriptSet};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits, allowing you to
/// import everything you need with a single `use comicscript::prelude::*;` statement.
pub mod prelude {
    pub use super::{
        ARCHIVE_EXTENSIONS, ConfigSource, ConfigValue, FailurePolicy, IMAGE_EXTENSIONS,
        PageFailure, PageScript, PathKind, RecognitionMethod, RecognizerConfig, ScanConfig,
        ScanConfigBuilder, ScanOutcome, ScriptSet, error, types,
    };
    pub use crate::archive::{ArchiveTool, Workspace, ZipExtractor};
    pub use crate::recognizer::Recognizer;
    pub use crate::sink::{CsvSink, ScriptSink};
    pub use std::path::{Path, PathBuf};
    pub use std::sync::Arc;
}
