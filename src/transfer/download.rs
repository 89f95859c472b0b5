//! Streaming download of a remote resource to a local path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::client::{TransportConfig, build_client};
use super::constants::WRITE_BUFFER_SIZE;
use super::TransferFailure;
use crate::entry::{FileDescriber, LocalFileDescriber};
use crate::path::resolve_local_path;

/// A completed download.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResult {
    /// Where the file was written.
    pub local_path: PathBuf,
    /// Bytes written.
    pub size: u64,
    /// Descriptor produced by the [`FileDescriber`].
    pub metadata: Value,
}

/// Fetches remote resources with GET and writes them to disk.
#[derive(Clone)]
pub struct Downloader {
    transport: TransportConfig,
    describer: Arc<dyn FileDescriber>,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

impl Downloader {
    /// Creates a downloader that describes results with [`LocalFileDescriber`].
    #[must_use]
    pub fn new(transport: TransportConfig) -> Self {
        Self {
            transport,
            describer: Arc::new(LocalFileDescriber),
        }
    }

    /// Replaces the file describer.
    #[must_use]
    pub fn with_describer(mut self, describer: Arc<dyn FileDescriber>) -> Self {
        self.describer = describer;
        self
    }

    /// Downloads `source_url` to `target_path`, creating missing parent directories.
    ///
    /// The target file is flushed and closed before this returns. On any
    /// failure after the file was created, the partial file is removed.
    ///
    /// # Errors
    ///
    /// Returns [`TransferFailure`] when:
    /// - the target uses an unsupported scheme
    /// - the source URL is malformed
    /// - the connection fails or the server answers with a non-success status
    /// - creating directories, writing, or describing the file fails
    #[instrument(skip(self), fields(url = %source_url, target = %target_path))]
    pub async fn download(
        &self,
        source_url: &str,
        target_path: &str,
    ) -> Result<DownloadResult, TransferFailure> {
        let file_path = resolve_local_path(target_path)?;
        create_parent_dirs(&file_path).await?;

        let url =
            Url::parse(source_url).map_err(|_| TransferFailure::invalid_url(source_url))?;
        let client = build_client(&self.transport, false)?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| TransferFailure::connection(source_url, e))?;
        if !response.status().is_success() {
            return Err(TransferFailure::http_status(
                source_url,
                response.status().as_u16(),
            ));
        }
        debug!(path = %file_path.display(), "writing response body");

        let mut file = File::create(&file_path)
            .await
            .map_err(|e| TransferFailure::io(&file_path, e))?;
        let stream_result = stream_to_file(&mut file, response, source_url, &file_path).await;
        drop(file);

        let size = match stream_result {
            Ok(size) => size,
            Err(error) => {
                debug!(path = %file_path.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&file_path).await;
                return Err(error);
            }
        };

        let metadata = match self.describer.describe(&file_path).await {
            Ok(metadata) => metadata,
            Err(error) => {
                debug!(path = %file_path.display(), "removing file that could not be described");
                let _ = tokio::fs::remove_file(&file_path).await;
                return Err(TransferFailure::describe(&file_path, error));
            }
        };

        info!(path = %file_path.display(), bytes = size, "download complete");

        Ok(DownloadResult {
            local_path: file_path,
            size,
            metadata,
        })
    }
}

async fn create_parent_dirs(file_path: &Path) -> Result<(), TransferFailure> {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TransferFailure::io(parent, e)),
        _ => Ok(()),
    }
}

/// Streams the response body to `file`, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, TransferFailure> {
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| TransferFailure::connection(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| TransferFailure::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .shutdown()
        .await
        .map_err(|e| TransferFailure::io(file_path, e))?;

    Ok(bytes_written)
}
