//! Temporary staging of uploaded documents.

use std::io;
use std::path::Path;
use tempfile::TempPath;
use tracing::{debug, warn};

/// Document bytes staged in a temporary file for the duration of one request.
///
/// The file keeps the upload's extension (`.bin` when it has none) and is
/// removed when the value is dropped, whichever way the request ends.
/// Removal failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct ScopedDocument {
    // Some until drop
    path: Option<TempPath>,
    filename: String,
}

impl ScopedDocument {
    /// Writes `bytes` to a fresh temporary file.
    ///
    /// The bytes go through `tokio::fs`; a failed write removes the file again.
    pub async fn create(bytes: &[u8], filename: &str) -> io::Result<Self> {
        let suffix = Self::suffix_for(filename);
        let path = tempfile::Builder::new()
            .prefix("findoc-")
            .suffix(&suffix)
            .tempfile()?
            .into_temp_path();

        let staged = Self {
            path: Some(path),
            filename: filename.to_string(),
        };
        tokio::fs::write(staged.path(), bytes).await?;
        debug!(path = %staged.path().display(), bytes = bytes.len(), "Staged document");

        Ok(staged)
    }

    /// Suffix for the temporary file: the upload's extension or `.bin`.
    pub fn suffix_for(filename: &str) -> String {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_else(|| ".bin".to_string())
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Original upload name.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Reads the staged bytes back.
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path()).await
    }
}

impl Drop for ScopedDocument {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        let removed = path.to_path_buf();
        match path.close() {
            Ok(()) => debug!(path = %removed.display(), "Removed staged document"),
            Err(e) => warn!(path = %removed.display(), error = %e, "Failed to remove staged document"),
        }
    }
}
