//! Maps internal transfer failures onto the stable, host-visible error codes.

use serde::{Serialize, Serializer};
use tracing::warn;

use super::TransferFailure;

/// Stable error codes reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Local source file absent or unreadable.
    FileNotFound = 1,
    /// Source/target string does not parse as a URL.
    InvalidUrl = 2,
    /// Network, TLS, transport or local write failure.
    ConnectionError = 3,
}

impl ErrorCode {
    /// Numeric value of the code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_i32())
    }
}

/// Structured transfer error handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferError {
    /// The stable error code.
    pub code: ErrorCode,
    /// The source string of the failed request.
    pub source: String,
    /// The target string of the failed request.
    pub target: String,
}

impl TransferError {
    /// Classifies a failure and pairs it with the request's source and target.
    #[must_use]
    pub fn from_failure(failure: &TransferFailure, source: &str, target: &str) -> Self {
        let code = classify(failure);
        warn!(code = code.as_i32(), error = %failure, "transfer failed");
        Self {
            code,
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// Returns the stable code for a failure. Total over [`TransferFailure`].
#[must_use]
pub fn classify(failure: &TransferFailure) -> ErrorCode {
    match failure {
        TransferFailure::FileNotFound { .. } | TransferFailure::UnsupportedPath(_) => {
            ErrorCode::FileNotFound
        }
        TransferFailure::InvalidUrl { .. } => ErrorCode::InvalidUrl,
        TransferFailure::Connection { .. }
        | TransferFailure::Client { .. }
        | TransferFailure::HttpStatus { .. }
        | TransferFailure::Io { .. }
        | TransferFailure::Describe { .. }
        | TransferFailure::Protocol { .. } => ErrorCode::ConnectionError,
    }
}
