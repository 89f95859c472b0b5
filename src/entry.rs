//! File-entry descriptors for completed downloads.
//!
//! The transfer engine treats the descriptor as opaque JSON; the host decides
//! what it means. [`LocalFileDescriber`] produces the usual local file entry.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Builds a descriptor for a file that was just written.
#[async_trait]
pub trait FileDescriber: Send + Sync {
    /// Describes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the file cannot be inspected.
    async fn describe(&self, path: &Path) -> std::io::Result<Value>;
}

/// Local file entry as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub is_file: bool,
    pub is_directory: bool,
    pub name: String,
    pub full_path: PathBuf,
}

/// Describes files by their on-disk metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileDescriber;

#[async_trait]
impl FileDescriber for LocalFileDescriber {
    async fn describe(&self, path: &Path) -> std::io::Result<Value> {
        let metadata = tokio::fs::metadata(path).await?;
        let full_path = tokio::fs::canonicalize(path).await?;
        let entry = FileEntry {
            is_file: metadata.is_file(),
            is_directory: metadata.is_dir(),
            name: full_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            full_path,
        };
        serde_json::to_value(entry).map_err(std::io::Error::other)
    }
}
