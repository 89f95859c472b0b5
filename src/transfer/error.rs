//! Error types for the transfer engine.
//!
//! `TransferFailure` is the internal, context-rich failure raised anywhere in
//! the upload/download pipeline. It is never shown to the host directly; the
//! classifier in [`super::classify`] folds it into one of the stable codes.

use std::path::PathBuf;

use thiserror::Error;

use crate::path::PathError;

/// Failures raised while uploading or downloading.
#[derive(Debug, Error)]
pub enum TransferFailure {
    /// The local source file does not exist or cannot be opened.
    #[error("cannot open local file {path}: {source}")]
    FileNotFound {
        /// The resolved local path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The local path uses a scheme we cannot address.
    #[error(transparent)]
    UnsupportedPath(#[from] PathError),

    /// The provided URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Network-level error (DNS, refused connection, TLS handshake, timeout, body read).
    #[error("connection error talking to {url}: {source}")]
    Connection {
        /// The URL being contacted.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP transport could not be configured.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Download responded with a non-success status.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Local filesystem error while writing a download.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The downloaded file was written but could not be described.
    #[error("cannot describe downloaded file {path}: {source}")]
    Describe {
        /// The written file.
        path: PathBuf,
        /// The describer's error.
        #[source]
        source: std::io::Error,
    },

    /// A request field could not be encoded into the request body.
    #[error("cannot encode request field '{field}': {reason}")]
    Protocol {
        /// The field (form key) that failed.
        field: String,
        /// Why it failed.
        reason: String,
    },
}

impl TransferFailure {
    /// Creates a file-not-found error.
    pub fn file_not_found(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileNotFound {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a connection error from a reqwest error.
    pub fn connection(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Connection {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a describe error for a written download.
    pub fn describe(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Describe {
            path: path.into(),
            source,
        }
    }

    /// Creates a request encoding error.
    pub fn protocol(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Protocol {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// No `From<reqwest::Error>` or `From<std::io::Error>`: those variants need the
// url or path the source error doesn't carry. `PathError` is the exception, it
// already names the offending path.
