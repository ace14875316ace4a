//! The page recognition port.
//!
//! Turning a page image into text is delegated to an external
//! collaborator behind the [`Recognizer`] trait; the crate ships no OCR
//! engine of its own. The scanner calls `recognize` once per page and
//! treats the call as blocking and fallible, with no internal retry.

use std::path::Path;

use async_trait::async_trait;

use crate::config::RecognizerConfig;
use crate::error::Result;

/// Converts a single page image into an ordered sequence of text lines.
///
/// Implementations receive the resolved [`RecognizerConfig`] with every
/// call and should return lines in reading order. Failures on an
/// unreadable or unsupported page should surface as
/// [`Error::Recognizer`](crate::error::Error::Recognizer).
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, page: &Path, config: &RecognizerConfig) -> Result<Vec<String>>;
}

#[async_trait]
impl<F> Recognizer for F
where
    F: Fn(&Path, &RecognizerConfig) -> Result<Vec<String>> + Send + Sync,
{
    async fn recognize(&self, page: &Path, config: &RecognizerConfig) -> Result<Vec<String>> {
        self(page, config)
    }
}
