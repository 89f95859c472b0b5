//! Transfer Core Library
//!
//! This library moves files between a device and a remote HTTP server:
//! uploading a local file as a multipart form and downloading a remote
//! resource to local storage.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`path`] - Local path resolution for `file://` and plain paths
//! - [`transfer`] - Upload/download engine and error classification
//! - [`entry`] - File-entry descriptors for completed downloads
//! - [`service`] - Host command dispatch and result shaping
//! - [`auth`] - Cookie file loading for authenticated uploads

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod entry;
pub mod path;
pub mod service;
pub mod transfer;
mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use entry::{FileDescriber, FileEntry, LocalFileDescriber};
pub use path::{PathError, resolve_local_path};
pub use service::{
    Action, RequestError, ResultStatus, TransferOutcome, TransferRequest, TransferService,
    TransferSuccess,
};
pub use transfer::{
    DownloadResult, Downloader, ErrorCode, TransferError, TransferFailure, TransportConfig,
    UploadRequest, UploadResult, Uploader,
};
