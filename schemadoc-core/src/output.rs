//! Buffered text output for generated pages.

use crate::Result;
use crate::error::SchemaDocError;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Canonical name of the only supported output charset.
pub const UTF_8: &str = "UTF-8";

/// Normalizes a user-supplied charset name.
///
/// # Errors
/// Returns a configuration error for anything other than UTF-8.
pub fn canonical_charset(charset: &str) -> Result<&'static str> {
    match charset.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => Ok(UTF_8),
        _ => Err(SchemaDocError::configuration(format!(
            "Unsupported charset '{}': only UTF-8 output is supported",
            charset
        ))),
    }
}

/// Buffered writer for one generated text file.
///
/// Callers must finish with [`LineWriter::close`]; dropping the writer
/// discards whatever is still buffered.
#[derive(Debug)]
pub struct LineWriter {
    path: PathBuf,
    charset: &'static str,
    inner: BufWriter<File>,
}

impl LineWriter {
    /// Creates (or truncates) `path` for writing in `charset`.
    ///
    /// # Errors
    /// Returns a configuration error for an unsupported charset, checked
    /// before anything touches the filesystem, or an I/O error if the file
    /// cannot be created.
    pub async fn create(path: &Path, charset: &str) -> Result<Self> {
        let charset = canonical_charset(charset)?;
        let file = File::create(path).await.map_err(|e| {
            SchemaDocError::io(format!("Failed to create {}", path.display()), e)
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            charset,
            inner: BufWriter::new(file),
        })
    }

    /// Charset the file is written in, for `<meta charset>` tags.
    pub fn charset(&self) -> &'static str {
        self.charset
    }

    /// Path of the file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `text` verbatim.
    ///
    /// # Errors
    /// Returns an I/O error if the write fails.
    pub async fn write_str(&mut self, text: &str) -> Result<()> {
        self.inner
            .write_all(text.as_bytes())
            .await
            .map_err(|e| SchemaDocError::io(format!("Failed to write {}", self.path.display()), e))
    }

    /// Appends `line` followed by a newline.
    ///
    /// # Errors
    /// Returns an I/O error if the write fails.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        self.write_str(line).await?;
        self.write_str("\n").await
    }

    /// Flushes buffered output and closes the file.
    ///
    /// # Errors
    /// Returns an I/O error if the flush fails.
    pub async fn close(mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .map_err(|e| SchemaDocError::io(format!("Failed to close {}", self.path.display()), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_charset() {
        assert_eq!(canonical_charset("UTF-8").unwrap(), UTF_8);
        assert_eq!(canonical_charset("utf8").unwrap(), UTF_8);
        assert_eq!(canonical_charset("Utf-8").unwrap(), UTF_8);
        assert!(canonical_charset("ISO-8859-1").is_err());
    }

    #[tokio::test]
    async fn test_write_and_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");

        let mut writer = LineWriter::create(&path, "utf8").await.unwrap();
        assert_eq!(writer.charset(), UTF_8);
        writer.write_line("<p>first</p>").await.unwrap();
        writer.write_str("<p>second</p>").await.unwrap();
        writer.close().await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "<p>first</p>\n<p>second</p>");
    }

    #[tokio::test]
    async fn test_unsupported_charset_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");

        let result = LineWriter::create(&path, "EBCDIC").await;
        assert!(matches!(result, Err(SchemaDocError::Configuration { .. })));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_create_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("page.html");

        let result = LineWriter::create(&path, UTF_8).await;
        assert!(matches!(result, Err(SchemaDocError::Io { .. })));
    }
}
