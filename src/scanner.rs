//! The scanning pipeline: classification, traversal, expansion, aggregation.
//!
//! [`ScanConfig`] is the main entry point, built declaratively with its
//! builder. One configuration can serve any number of independent scan
//! calls; each call produces its own [`ScanOutcome`].
//!
//! - [`read_image`](ScanConfig::read_image): recognize a single page image
//! - [`read_archive`](ScanConfig::read_archive): expand an archive and recognize every page inside
//! - [`read_directory`](ScanConfig::read_directory): recursively scan a directory tree
//! - [`read_path`](ScanConfig::read_path): dispatch on whatever the path turns out to be

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use tokio::fs::read_dir;
use tokio::spawn;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::archive::{self, ArchiveTool, ZipExtractor};
use crate::classify::{PathKind, classify, displayed_extension, page_name, source_key};
use crate::config::RecognizerConfig;
use crate::error::{Error, Result};
use crate::recognizer::Recognizer;
use crate::sink::{CsvSink, ScriptSink, flush_scripts};
use crate::types::{FailurePolicy, PageFailure, PageScript, ScanOutcome};

fn default_archive_tool() -> Arc<dyn ArchiveTool> {
    Arc::new(ZipExtractor::new())
}

fn default_max_concurrent_pages() -> usize {
    num_cpus::get().min(8)
}

/// The scan configuration, built declaratively using the builder pattern.
///
/// ## Builder Pattern
///
/// Use [`ScanConfig::builder()`](ScanConfig::builder) to create a new configuration:
///
/// ```rust,no_run
/// # use comicscript::prelude::*;
/// let config = ScanConfig::builder()
///     .failure_policy(FailurePolicy::CollectAndContinue)
///     .output_path("./scripts.csv")
///     .build()
///     .expect("Invalid configuration");
/// ```
#[derive(Clone, derive_builder::Builder)]
#[builder(setter(into, strip_option), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// The resolved recognizer configuration handed to the recognition
    /// port with every page. Textual and mapping inputs are normalized
    /// into this form at the boundary via
    /// [`ConfigSource::resolve`](crate::config::ConfigSource::resolve).
    #[builder(default)]
    pub recognizer_config: RecognizerConfig,

    /// How the scan reacts to a failing page or archive.
    ///
    /// [`FailurePolicy::FailFast`] (the default) aborts the whole call on
    /// the first failure anywhere in the tree. Transient workspaces are
    /// cleaned up on the way out either way.
    #[builder(default)]
    pub failure_policy: FailurePolicy,

    /// Upper bound on concurrently recognized pages within one directory.
    /// Must be at least 1.
    #[builder(default = "default_max_concurrent_pages()")]
    pub max_concurrent_pages: usize,

    /// The archive-extraction capability. Defaults to the built-in
    /// ZIP-backed tool; swap in a custom [`ArchiveTool`] for formats the
    /// default cannot read.
    #[builder(setter(custom), default = "default_archive_tool()")]
    pub archive_tool: Arc<dyn ArchiveTool>,

    /// Destination for recognized rows. When absent, results are only
    /// accumulated and returned.
    #[builder(setter(custom), default)]
    pub sink: Option<Arc<dyn ScriptSink>>,
}

impl std::fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanConfig")
            .field("recognizer_config", &self.recognizer_config)
            .field("failure_policy", &self.failure_policy)
            .field("max_concurrent_pages", &self.max_concurrent_pages)
            .field(
                "sink",
                if self.sink.is_some() {
                    &"Some(Sink)"
                } else {
                    &"None"
                },
            )
            .finish()
    }
}

impl ScanConfigBuilder {
    /// Installs a custom archive-extraction tool.
    pub fn archive_tool(&mut self, tool: Arc<dyn ArchiveTool>) -> &mut Self {
        self.archive_tool = Some(tool);
        self
    }

    /// Installs a custom sink for recognized rows.
    pub fn sink(&mut self, sink: Arc<dyn ScriptSink>) -> &mut Self {
        self.sink = Some(Some(sink));
        self
    }

    /// Convenience: appends recognized rows to a CSV file at `path`.
    pub fn output_path<P: Into<PathBuf>>(&mut self, path: P) -> &mut Self {
        self.sink(Arc::new(CsvSink::new(path.into())))
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(limit) = self.max_concurrent_pages {
            if limit == 0 {
                return Err("max_concurrent_pages must be at least 1".to_string());
            }
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Creates a new builder for configuring `ScanConfig`.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Extracts the script from a single comic page image.
    ///
    /// Fails with [`Error::UnsupportedFormat`] naming the offending
    /// extension when `image_path` is not a recognized image format.
    /// When a sink is configured the result is also appended there.
    pub async fn read_image(
        &self,
        recognizer: &Arc<dyn Recognizer>,
        image_path: &Path,
    ) -> Result<PageScript> {
        if classify(image_path) != PathKind::Image {
            return Err(Error::UnsupportedFormat(displayed_extension(image_path)));
        }
        log::info!("Reading from image file: {:?}", image_path);
        let script = recognizer
            .recognize(image_path, &self.recognizer_config)
            .await?;
        if let Some(sink) = &self.sink {
            sink.append(&source_key(image_path), &script).await?;
        }
        Ok(script)
    }

    /// Extracts the script from every page inside an archive file.
    ///
    /// The archive is verified, expanded into a transient workspace,
    /// scanned recursively, and the workspace removed again before this
    /// returns, on success and failure alike. Result keys are the logical
    /// `archivePath/pageName` identifiers, never workspace paths.
    pub async fn read_archive(
        &self,
        recognizer: &Arc<dyn Recognizer>,
        archive_path: &Path,
    ) -> Result<ScanOutcome> {
        if classify(archive_path) != PathKind::Archive {
            return Err(Error::UnsupportedFormat(displayed_extension(archive_path)));
        }
        log::info!("Reading from archive file: {:?}", archive_path);
        let outcome = self.process_archive(recognizer, archive_path).await?;
        self.flush(&outcome).await?;
        Ok(outcome)
    }

    /// Recursively extracts the script from all images and archives of
    /// images under a directory.
    ///
    /// Unrecognized entries are skipped silently; hidden entries are not
    /// visited. Pages within one directory are recognized concurrently,
    /// bounded by [`max_concurrent_pages`](ScanConfig::max_concurrent_pages).
    pub async fn read_directory(
        &self,
        recognizer: &Arc<dyn Recognizer>,
        directory: &Path,
    ) -> Result<ScanOutcome> {
        if !directory.exists() {
            return Err(Error::NotFound(format!(
                "Source directory does not exist: {:?}",
                directory
            )));
        }
        if !directory.is_dir() {
            return Err(Error::InvalidPath(
                directory.to_path_buf(),
                "Source path is not a directory.".to_string(),
            ));
        }
        log::info!("Reading from directory: {:?}", directory);
        let outcome = self.scan_directory(recognizer, directory).await?;
        self.flush(&outcome).await?;
        Ok(outcome)
    }

    /// Dispatches on what `path` is: a directory, an image, or an archive.
    ///
    /// A single image's result is keyed by its own path. Anything else
    /// fails with [`Error::UnsupportedFormat`].
    pub async fn read_path(
        &self,
        recognizer: &Arc<dyn Recognizer>,
        path: &Path,
    ) -> Result<ScanOutcome> {
        if path.is_dir() {
            return self.read_directory(recognizer, path).await;
        }
        match classify(path) {
            PathKind::Image => {
                let script = self.read_image(recognizer, path).await?;
                let mut outcome = ScanOutcome::default();
                outcome.scripts.insert(source_key(path), script);
                Ok(outcome)
            }
            PathKind::Archive => self.read_archive(recognizer, path).await,
            PathKind::Unrecognized => {
                Err(Error::UnsupportedFormat(displayed_extension(path)))
            }
        }
    }

    // --- Private helper methods for pipeline steps ---

    /// Expands an archive, scans its workspace, rewrites keys from
    /// workspace paths to `archivePath/pageName`, and releases the
    /// workspace. Keys are captured before the deletion, so no returned
    /// identifier ever references the removed directory.
    async fn process_archive(
        &self,
        recognizer: &Arc<dyn Recognizer>,
        archive_path: &Path,
    ) -> Result<ScanOutcome> {
        let workspace = archive::expand(self.archive_tool.as_ref(), archive_path).await?;
        let scanned = self.scan_directory(recognizer, workspace.path()).await;
        let released = workspace.release().await;
        let nested = scanned?;
        released?;

        let archive_key = source_key(archive_path);
        let mut outcome = ScanOutcome::default();
        outcome.absorb_rewritten(nested, |key| {
            format!("{}/{}", archive_key, page_name(Path::new(key)))
        });
        Ok(outcome)
    }

    /// The recursive traversal core.
    ///
    /// Entries of each directory are snapshotted before any processing,
    /// so a sibling workspace created while expanding an archive in this
    /// directory is never visited.
    fn scan_directory<'a>(
        &'a self,
        recognizer: &'a Arc<dyn Recognizer>,
        directory: &'a Path,
    ) -> BoxFuture<'a, Result<ScanOutcome>> {
        async move {
            let mut images: Vec<PathBuf> = Vec::new();
            let mut archives: Vec<PathBuf> = Vec::new();
            let mut subdirectories: Vec<PathBuf> = Vec::new();

            let mut entries = read_dir(directory).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();

                // Skip hidden files
                if let Some(file_name) = path.file_name() {
                    if file_name.to_string_lossy().starts_with('.') {
                        continue;
                    }
                }

                if entry.file_type().await?.is_dir() {
                    subdirectories.push(path);
                    continue;
                }
                match classify(&path) {
                    PathKind::Image => images.push(path),
                    PathKind::Archive => archives.push(path),
                    PathKind::Unrecognized => {
                        log::debug!("Skipping unrecognized entry: {:?}", path);
                    }
                }
            }

            let mut outcome = ScanOutcome::default();
            self.recognize_pages(recognizer, images, &mut outcome).await?;

            for archive_path in archives {
                match self.process_archive(recognizer, &archive_path).await {
                    Ok(nested) => outcome.absorb(nested),
                    Err(error) => match self.failure_policy {
                        FailurePolicy::FailFast => return Err(error),
                        FailurePolicy::CollectAndContinue => {
                            outcome.failures.push(PageFailure {
                                source: source_key(&archive_path),
                                reason: error.to_string(),
                            });
                        }
                    },
                }
            }

            for subdirectory in subdirectories {
                let nested = self.scan_directory(recognizer, &subdirectory).await?;
                outcome.absorb(nested);
            }

            Ok(outcome)
        }
        .boxed()
    }

    /// Recognizes a batch of pages concurrently under the semaphore and
    /// records the results, honoring the failure policy.
    async fn recognize_pages(
        &self,
        recognizer: &Arc<dyn Recognizer>,
        images: Vec<PathBuf>,
        outcome: &mut ScanOutcome,
    ) -> Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_pages));
        let mut handles: Vec<JoinHandle<Result<(PathBuf, Result<PageScript>)>>> = Vec::new();

        for image in images {
            let semaphore = Arc::clone(&semaphore);
            let recognizer = Arc::clone(recognizer);
            let recognizer_config = self.recognizer_config.clone();

            handles.push(spawn(async move {
                let _permit = semaphore.acquire().await?;
                log::info!("Reading from image file: {:?}", image);
                let script = recognizer.recognize(&image, &recognizer_config).await;
                Ok((image, script))
            }));
        }

        let joined = try_join_all(handles)
            .await
            .map_err(|e| Error::Other(format!("Failed to join page recognition tasks: {}", e)))?;

        for result in joined {
            let (image, script) = result?;
            match script {
                Ok(script) => {
                    outcome.scripts.insert(source_key(&image), script);
                }
                Err(error) => match self.failure_policy {
                    FailurePolicy::FailFast => return Err(error),
                    FailurePolicy::CollectAndContinue => {
                        outcome.failures.push(PageFailure {
                            source: source_key(&image),
                            reason: error.to_string(),
                        });
                    }
                },
            }
        }
        Ok(())
    }

    /// Appends an outcome's scripts to the configured sink, if any.
    /// Results are flushed exactly once per top-level call.
    async fn flush(&self, outcome: &ScanOutcome) -> Result<()> {
        if let Some(sink) = &self.sink {
            flush_scripts(sink.as_ref(), &outcome.scripts).await?;
        }
        Ok(())
    }
}
