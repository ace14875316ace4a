//! Persisted output for recognized scripts.
//!
//! A sink receives `(source identifier, line)` rows as traversal
//! completes; the only contract is append. [`CsvSink`] is the built-in
//! implementation, writing UTF-8 comma-delimited rows to a file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::types::ScriptSet;

/// Append-only destination for recognized script rows.
#[async_trait]
pub trait ScriptSink: Send + Sync {
    /// Appends one row per line of `script`, all under the same `source`
    /// identifier, preserving line order.
    async fn append(&self, source: &str, script: &[String]) -> Result<()>;
}

/// Appends `(source, line)` rows to a comma-delimited UTF-8 file.
///
/// Fields containing a comma, a double quote or a newline are quoted,
/// with embedded quotes doubled.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// The file rows are appended to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all rows back as `(source, line)` pairs, in file order.
    /// The inverse of [`append`](ScriptSink::append), used to verify
    /// what a scan persisted.
    pub async fn read_rows(&self) -> Result<Vec<(String, String)>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let mut rows = Vec::new();
        for record in parse_records(&content) {
            let mut fields = record.into_iter();
            let source = fields.next().unwrap_or_default();
            let line = fields.next().unwrap_or_default();
            rows.push((source, line));
        }
        Ok(rows)
    }
}

#[async_trait]
impl ScriptSink for CsvSink {
    async fn append(&self, source: &str, script: &[String]) -> Result<()> {
        log::info!("Writing to: {:?}", self.path);
        let mut buffer = String::new();
        for line in script {
            buffer.push_str(&quote_field(source));
            buffer.push(',');
            buffer.push_str(&quote_field(line));
            buffer.push('\n');
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(buffer.as_bytes()).await?;
        Ok(())
    }
}

/// Flushes every entry of a script set to the sink, one source at a time.
pub async fn flush_scripts(sink: &dyn ScriptSink, scripts: &ScriptSet) -> Result<()> {
    for (source, script) in scripts {
        sink.append(source, script).await?;
    }
    Ok(())
}

fn quote_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Parses comma-delimited records with doubled-quote escaping.
fn parse_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => record.push(std::mem::take(&mut field)),
                '\n' => {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                '\r' => {}
                c => field.push(c),
            }
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}
