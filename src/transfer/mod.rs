//! Transfer engine: multipart uploads and streaming downloads.
//!
//! # Features
//!
//! - Multipart upload with one file part followed by ordered text fields
//! - Cookie passthrough from a caller-supplied [`reqwest::cookie::CookieStore`]
//! - Per-call opt-in "trust all certificates" mode
//! - Streaming download with parent directory creation and partial-file cleanup
//! - Classification of every failure into a stable error code
//!
//! # Example
//!
//! ```no_run
//! use transfer_core::transfer::{Downloader, UploadRequest, Uploader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let result = Uploader::default()
//!     .upload(&UploadRequest::new("/sdcard/cat.jpg", "https://example.com/upload"))
//!     .await?;
//! println!("server answered {}", result.response_code);
//!
//! let file = Downloader::default()
//!     .download("https://example.com/cat.jpg", "./downloads/cat.jpg")
//!     .await?;
//! println!("wrote {} bytes", file.size);
//! # Ok(())
//! # }
//! ```

mod classify;
mod client;
pub mod constants;
mod download;
mod error;
mod upload;

pub use classify::{ErrorCode, TransferError, classify};
pub use client::TransportConfig;
pub use download::{DownloadResult, Downloader};
pub use error::TransferFailure;
pub use upload::{UploadRequest, UploadResult, Uploader};
