//! Constants for the transfer module (upload defaults, buffer sizes).

/// Form key of the file part when the caller gives none.
pub const DEFAULT_FILE_KEY: &str = "file";

/// File name reported to the server when the caller gives none.
pub const DEFAULT_FILE_NAME: &str = "image.jpg";

/// MIME type of the file part when the caller gives none.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Capacity of the buffered writer used when streaming downloads to disk.
pub const WRITE_BUFFER_SIZE: usize = 1024;
