//! Local path resolution for transfer sources and targets.
//!
//! Callers hand us whatever string the host passed in: a plain filesystem
//! path, a `file://` URI (possibly carrying a query string), or a
//! content-addressed `content:` URI which we cannot open. No existence check
//! happens here; the uploader opens the file and the downloader creates it.

use std::path::PathBuf;

use thiserror::Error;

/// Prefix of local file URIs.
const FILE_URI_PREFIX: &str = "file://";

/// Prefix of content-addressed storage URIs (not supported).
const CONTENT_URI_PREFIX: &str = "content:";

/// Errors that can occur while resolving a local path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The path uses a URI scheme this crate cannot address locally.
    #[error("unsupported path scheme in {path}: {scheme} is not supported")]
    UnsupportedScheme {
        /// Path string as given.
        path: String,
        /// The offending scheme marker.
        scheme: &'static str,
    },
}

/// Resolves a user-supplied source/target string into a local filesystem path.
///
/// - `content:` URIs are rejected with [`PathError::UnsupportedScheme`].
/// - `file://` URIs have the prefix stripped and anything from the first `?`
///   onwards dropped.
/// - Everything else is taken as a literal path.
///
/// # Errors
///
/// Returns [`PathError::UnsupportedScheme`] for content-addressed URIs.
pub fn resolve_local_path(path: &str) -> Result<PathBuf, PathError> {
    if path.starts_with(CONTENT_URI_PREFIX) {
        return Err(PathError::UnsupportedScheme {
            path: path.to_string(),
            scheme: CONTENT_URI_PREFIX,
        });
    }

    if let Some(rest) = path.strip_prefix(FILE_URI_PREFIX) {
        let local = rest.split_once('?').map_or(rest, |(before, _)| before);
        return Ok(PathBuf::from(local));
    }

    Ok(PathBuf::from(path))
}
