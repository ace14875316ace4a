//! Common test utilities and constants for the comicscript crate.
//!
//! Provides functions for setting up and tearing down test directories,
//! creating dummy page images and archives, and a stub recognizer port.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use comicscript::config::RecognizerConfig;
use comicscript::error::{Error, Result};
use comicscript::recognizer::Recognizer;
use image::{Rgb, RgbImage};
use rand::{Rng, distributions::Alphanumeric};
use tokio::fs;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";

/// Helper function to create a clean, uniquely named test directory with a
/// source subdirectory. Returns the base test path and the source path.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> (PathBuf, PathBuf) {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let unique_sub_path = format!("{}-{}", sub_path, rand_string);
    let test_dir = PathBuf::from(TEST_TMP_DIR).join(unique_sub_path);
    if test_dir.exists() {
        fs::remove_dir_all(&test_dir).await.unwrap();
    }
    let source_dir = test_dir.join("source");
    fs::create_dir_all(&source_dir).await.unwrap();

    (test_dir, source_dir)
}

/// Encodes a small solid-color JPEG in memory.
#[allow(dead_code)]
pub fn jpeg_bytes(color: Rgb<u8>) -> Vec<u8> {
    let mut img = RgbImage::new(40, 40);
    for pixel in img.pixels_mut() {
        *pixel = color;
    }
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Jpeg).unwrap();
    bytes.into_inner()
}

/// Creates a minimal dummy JPEG page image at the given path.
#[allow(dead_code)]
pub async fn create_dummy_page(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, jpeg_bytes(Rgb([255, 0, 0]))).await?;
    Ok(())
}

/// Builds a ZIP archive in memory from `(entry name, bytes)` pairs.
#[allow(dead_code)]
pub fn zip_bytes(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options: SimpleFileOptions = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (name, bytes) in entries {
        writer.start_file(name.to_string(), options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Creates a ZIP-format archive at `path` containing one dummy JPEG page
/// per entry name.
#[allow(dead_code)]
pub async fn create_page_archive(path: &Path, page_names: &[&str]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let entries: Vec<(&str, Vec<u8>)> = page_names
        .iter()
        .map(|name| (*name, jpeg_bytes(Rgb([0, 0, 255]))))
        .collect();
    fs::write(path, zip_bytes(&entries)).await?;
    Ok(())
}

/// Asserts that no leftover `tmp-` workspace directory exists anywhere
/// under `root`.
#[allow(dead_code)]
pub fn assert_no_workspace_left(root: &Path) {
    for entry in std::fs::read_dir(root).unwrap() {
        let entry = entry.unwrap();
        let name = entry.file_name().to_string_lossy().into_owned();
        assert!(
            !name.starts_with("tmp-"),
            "Leftover workspace directory: {:?}",
            entry.path()
        );
        if entry.path().is_dir() {
            assert_no_workspace_left(&entry.path());
        }
    }
}

/// A scripted recognizer port for tests.
///
/// Pages are matched by file name: explicitly scripted names return their
/// lines, names registered as failing return a recognizer error, and
/// anything else returns its uppercased file stem as a single line.
#[allow(dead_code)]
#[derive(Default)]
pub struct StubRecognizer {
    scripts: HashMap<String, Vec<String>>,
    fail_on: Vec<String>,
}

#[allow(dead_code)]
impl StubRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, file_name: &str, lines: &[&str]) -> Self {
        self.scripts.insert(
            file_name.to_string(),
            lines.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    pub fn failing_on(mut self, file_name: &str) -> Self {
        self.fail_on.push(file_name.to_string());
        self
    }

    pub fn into_port(self) -> std::sync::Arc<dyn Recognizer> {
        std::sync::Arc::new(self)
    }
}

#[async_trait]
impl Recognizer for StubRecognizer {
    async fn recognize(&self, page: &Path, _config: &RecognizerConfig) -> Result<Vec<String>> {
        let file_name = page
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_on.contains(&file_name) {
            return Err(Error::Recognizer(
                page.to_path_buf(),
                "stubbed recognition failure".to_string(),
            ));
        }
        if let Some(lines) = self.scripts.get(&file_name) {
            return Ok(lines.clone());
        }
        let stem = page
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(vec![stem.to_uppercase()])
    }
}
