//! Archive expansion into transient workspaces.
//!
//! Decompression itself is delegated to an external collaborator behind
//! the [`ArchiveTool`] trait; the crate only fixes the protocol it
//! expects (test integrity, list contents, extract into a directory)
//! and the lifecycle guarantees around it. A ZIP-backed implementation,
//! [`ZipExtractor`], ships as the default tool.
//!
//! Every expansion owns a [`Workspace`]: a uniquely named temporary
//! directory beside the archive that is removed when the expansion's
//! processing completes, whether by success or failure. Concurrent
//! expansions of archives in the same parent directory never collide.

use std::fs::File;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::{Rng, distributions::Alphanumeric};
use tokio::fs;
use tokio::task::spawn_blocking;

use crate::error::{Error, Result};

/// The archive-extraction capability the pipeline relies on.
///
/// Implementations get one attempt per call; any retry policy belongs to
/// the implementation, not the caller.
#[async_trait]
pub trait ArchiveTool: Send + Sync {
    /// Verifies the archive's integrity without extracting it.
    async fn verify_integrity(&self, archive: &Path) -> Result<()>;
    /// Lists the entry names contained in the archive. Diagnostic only.
    async fn list_contents(&self, archive: &Path) -> Result<Vec<String>>;
    /// Extracts all archive contents into `target`, which already exists.
    async fn extract_all(&self, archive: &Path, target: &Path) -> Result<()>;
}

/// ZIP-backed [`ArchiveTool`] built on the `zip` crate.
///
/// Content is dispatched by format, not by file name, so ZIP data inside
/// a `.cbr` or `.zip` file both work. Genuine RAR data fails the
/// integrity check; callers needing RAR supply their own tool.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl ZipExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArchiveTool for ZipExtractor {
    async fn verify_integrity(&self, archive: &Path) -> Result<()> {
        let path = archive.to_path_buf();
        spawn_blocking(move || {
            let verify = || -> std::result::Result<(), zip::result::ZipError> {
                let mut zip = zip::ZipArchive::new(File::open(&path)?)?;
                for index in 0..zip.len() {
                    // Reading an entry to its end checks the stored CRC.
                    let mut entry = zip.by_index(index)?;
                    std::io::copy(&mut entry, &mut std::io::sink())?;
                }
                Ok(())
            };
            verify().map_err(|_| Error::CorruptArchive(path))
        })
        .await?
    }

    async fn list_contents(&self, archive: &Path) -> Result<Vec<String>> {
        let path = archive.to_path_buf();
        spawn_blocking(move || {
            let zip = zip::ZipArchive::new(File::open(&path)?)?;
            Ok(zip.file_names().map(|name| name.to_string()).collect())
        })
        .await?
    }

    async fn extract_all(&self, archive: &Path, target: &Path) -> Result<()> {
        let path = archive.to_path_buf();
        let target = target.to_path_buf();
        spawn_blocking(move || {
            let extract = || -> std::result::Result<(), zip::result::ZipError> {
                let mut zip = zip::ZipArchive::new(File::open(&path)?)?;
                zip.extract(&target)?;
                Ok(())
            };
            extract().map_err(|e| Error::ExtractionFailed(path, e.to_string()))
        })
        .await?
    }
}

/// An owned, uniquely named temporary directory for one archive expansion.
///
/// The workspace lives beside the archive's parent directory under a
/// `tmp-<suffix>` name, so repeated or concurrent expansions never share
/// a path or pick up stale contents from an earlier failed run. It is
/// removed by [`release`](Workspace::release) on the normal path and
/// best-effort on `Drop`, covering every error path.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    released: bool,
}

impl Workspace {
    /// Creates a fresh workspace beside `archive`.
    pub async fn create(archive: &Path) -> Result<Self> {
        let parent = archive.parent().unwrap_or_else(|| Path::new("."));
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        let root = parent.join(format!("tmp-{}", suffix));
        fs::create_dir_all(&root).await?;
        Ok(Self { root, released: false })
    }

    /// The directory the archive was (or will be) extracted into.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Recursively removes the workspace directory.
    pub async fn release(mut self) -> Result<()> {
        log::info!("Removing temporary directory: {:?}", self.root);
        self.released = true;
        fs::remove_dir_all(&self.root).await?;
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.released {
            log::debug!("Cleaning up workspace on drop: {:?}", self.root);
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }
}

/// Verifies and expands `archive` into a fresh [`Workspace`].
///
/// Integrity failure surfaces as [`Error::CorruptArchive`] and is fatal
/// to this archive only. An extraction failure propagates as
/// [`Error::ExtractionFailed`], and the partially filled workspace is
/// removed before returning.
pub async fn expand(tool: &dyn ArchiveTool, archive: &Path) -> Result<Workspace> {
    tool.verify_integrity(archive).await?;
    let entries = tool.list_contents(archive).await?;
    log::debug!("Archive {:?} lists {} entries", archive, entries.len());

    let workspace = Workspace::create(archive).await?;
    log::info!("Extracting from {:?} to {:?}", archive, workspace.path());
    if let Err(error) = tool.extract_all(archive, workspace.path()).await {
        drop(workspace);
        return Err(error);
    }
    Ok(workspace)
}
