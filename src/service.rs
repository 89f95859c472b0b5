//! Request dispatch and result shaping for the host bridge.
//!
//! The host hands over a command name and a positional JSON argument list.
//! [`TransferRequest::from_args`] validates that list once, then
//! [`TransferService`] runs the matching transfer and folds whatever happened
//! into a [`TransferOutcome`]. No state survives between calls.

use std::sync::Arc;

use reqwest::cookie::CookieStore;
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::entry::FileDescriber;
use crate::transfer::constants::{DEFAULT_FILE_KEY, DEFAULT_FILE_NAME, DEFAULT_MIME_TYPE};
use crate::transfer::{
    DownloadResult, Downloader, TransferError, TransportConfig, UploadRequest, UploadResult,
    Uploader,
};

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Upload,
    Download,
}

impl Action {
    /// Parses a host command name.
    #[must_use]
    pub fn from_command(command: &str) -> Option<Self> {
        match command {
            "upload" => Some(Self::Upload),
            "download" => Some(Self::Download),
            _ => None,
        }
    }

    /// Host command name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

/// The argument list could not be turned into a request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    /// A required argument is absent, null, or not a string.
    #[error("missing {name} (argument {index})")]
    MissingArgument {
        index: usize,
        name: &'static str,
    },

    /// An optional argument has the wrong JSON type.
    #[error("argument {index} ({name}) must be {expected}")]
    InvalidArgument {
        index: usize,
        name: &'static str,
        expected: &'static str,
    },
}

/// A validated transfer request.
///
/// Upload-only fields are ignored for downloads.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub action: Action,
    /// Local file (upload) or remote URL (download).
    pub source: String,
    /// Server URL (upload) or local path (download).
    pub target: String,
    pub file_key: String,
    pub file_name: String,
    pub mime_type: String,
    pub extra_params: Map<String, Value>,
    pub trust_all_certificates: bool,
    pub chunked_mode: bool,
}

impl TransferRequest {
    /// Creates an upload request with default options.
    #[must_use]
    pub fn upload(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::with_defaults(Action::Upload, source.into(), target.into())
    }

    /// Creates a download request.
    #[must_use]
    pub fn download(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::with_defaults(Action::Download, source.into(), target.into())
    }

    fn with_defaults(action: Action, source: String, target: String) -> Self {
        Self {
            action,
            source,
            target,
            file_key: DEFAULT_FILE_KEY.to_string(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            extra_params: Map::new(),
            trust_all_certificates: false,
            chunked_mode: false,
        }
    }

    /// Decodes the host's positional argument list.
    ///
    /// Layout: `[source, target, fileKey, fileName, mimeType, params,
    /// trustAllCertificates, chunkedMode]`; everything after `target` is
    /// upload-only and optional.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when `source`/`target` are missing or when
    /// `params` is present but not an object.
    pub fn from_args(action: Action, args: &[Value]) -> Result<Self, RequestError> {
        let source = required_string(args, 0, "source")?;
        let target = required_string(args, 1, "target")?;
        let mut request = Self::with_defaults(action, source, target);

        if action == Action::Upload {
            request.file_key = optional_string(args, 2, DEFAULT_FILE_KEY);
            request.file_name = optional_string(args, 3, DEFAULT_FILE_NAME);
            request.mime_type = optional_string(args, 4, DEFAULT_MIME_TYPE);
            request.extra_params = optional_object(args, 5, "params")?;
            request.trust_all_certificates = optional_flag(args, 6);
            request.chunked_mode = optional_flag(args, 7);
        }

        Ok(request)
    }

    fn to_upload_request(&self) -> UploadRequest {
        UploadRequest {
            file_path: self.source.clone(),
            server_url: self.target.clone(),
            file_key: self.file_key.clone(),
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            extra_params: self.extra_params.clone(),
            trust_all_certificates: self.trust_all_certificates,
            chunked_mode: self.chunked_mode,
        }
    }
}

fn required_string(args: &[Value], index: usize, name: &'static str) -> Result<String, RequestError> {
    args.get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(RequestError::MissingArgument { index, name })
}

/// Absent, JSON null, and the literal string "null" all select the default.
fn optional_string(args: &[Value], index: usize, default: &str) -> String {
    match args.get(index) {
        Some(Value::String(s)) if s != "null" => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => default.to_string(),
    }
}

fn optional_object(
    args: &[Value],
    index: usize,
    name: &'static str,
) -> Result<Map<String, Value>, RequestError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(RequestError::InvalidArgument {
            index,
            name,
            expected: "an object",
        }),
    }
}

fn optional_flag(args: &[Value], index: usize) -> bool {
    match args.get(index) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Status reported alongside every outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Ok,
    InvalidAction,
    MalformedRequest,
    IoError,
}

/// A successful transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferSuccess {
    Upload(UploadResult),
    Download(DownloadResult),
}

/// Terminal outcome of one host invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    Success(TransferSuccess),
    Failure(TransferError),
    Malformed(RequestError),
    InvalidAction(String),
}

impl From<Result<TransferSuccess, TransferError>> for TransferOutcome {
    fn from(result: Result<TransferSuccess, TransferError>) -> Self {
        match result {
            Ok(success) => Self::Success(success),
            Err(error) => Self::Failure(error),
        }
    }
}

/// Tag marking download payloads for resolution as a local file entry.
pub const LOCAL_FILE_ENTRY_TAG: &str = "local_file";

impl TransferOutcome {
    /// Status class of this outcome.
    #[must_use]
    pub fn status(&self) -> ResultStatus {
        match self {
            Self::Success(_) => ResultStatus::Ok,
            Self::Failure(_) => ResultStatus::IoError,
            Self::Malformed(_) => ResultStatus::MalformedRequest,
            Self::InvalidAction(_) => ResultStatus::InvalidAction,
        }
    }

    /// Payload handed back to the host.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::Success(TransferSuccess::Upload(result)) => {
                serde_json::to_value(result).unwrap_or_default()
            }
            Self::Success(TransferSuccess::Download(result)) => {
                let mut value = serde_json::to_value(result).unwrap_or_default();
                if let Value::Object(map) = &mut value {
                    map.insert("entry".to_string(), json!(LOCAL_FILE_ENTRY_TAG));
                }
                value
            }
            Self::Failure(error) => serde_json::to_value(error).unwrap_or_default(),
            Self::Malformed(error) => json!({ "message": error.to_string() }),
            Self::InvalidAction(action) => json!({ "message": format!("unknown action '{action}'") }),
        }
    }

    /// Status and payload as one JSON document.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({ "status": self.status(), "payload": self.payload() })
    }
}

/// Dispatches transfer requests to the uploader or downloader.
#[derive(Debug, Clone, Default)]
pub struct TransferService {
    uploader: Uploader,
    downloader: Downloader,
}

impl TransferService {
    /// Creates a service with the given transport settings.
    #[must_use]
    pub fn new(transport: TransportConfig) -> Self {
        Self {
            uploader: Uploader::new(transport.clone()),
            downloader: Downloader::new(transport),
        }
    }

    /// Cookie store consulted for uploads.
    #[must_use]
    pub fn with_cookie_store(mut self, store: Arc<dyn CookieStore>) -> Self {
        self.uploader = self.uploader.with_cookie_store(store);
        self
    }

    /// Describer for downloaded files.
    #[must_use]
    pub fn with_describer(mut self, describer: Arc<dyn FileDescriber>) -> Self {
        self.downloader = self.downloader.with_describer(describer);
        self
    }

    /// Runs a host command with its positional arguments.
    #[instrument(skip(self, args), fields(command = %command, args = args.len()))]
    pub async fn execute(&self, command: &str, args: &[Value]) -> TransferOutcome {
        let Some(action) = Action::from_command(command) else {
            warn!("unknown transfer action");
            return TransferOutcome::InvalidAction(command.to_string());
        };

        let request = match TransferRequest::from_args(action, args) {
            Ok(request) => request,
            Err(error) => {
                warn!(error = %error, "malformed transfer request");
                return TransferOutcome::Malformed(error);
            }
        };

        self.transfer(&request).await.into()
    }

    /// Runs a validated request.
    ///
    /// # Errors
    ///
    /// Returns a classified [`TransferError`] carrying the request's source and target.
    pub async fn transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferSuccess, TransferError> {
        debug!(action = request.action.as_str(), "dispatching transfer");
        let result = match request.action {
            Action::Upload => self
                .uploader
                .upload(&request.to_upload_request())
                .await
                .map(TransferSuccess::Upload),
            Action::Download => self
                .downloader
                .download(&request.source, &request.target)
                .await
                .map(TransferSuccess::Download),
        };

        match result {
            Ok(success) => {
                info!(action = request.action.as_str(), "transfer succeeded");
                Ok(success)
            }
            Err(failure) => Err(TransferError::from_failure(
                &failure,
                &request.source,
                &request.target,
            )),
        }
    }
}
